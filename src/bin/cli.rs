//! mpdlink CLI Client
//!
//! Sends a single protocol command to an MPD server and prints the
//! decoded response.

use std::io::Write;

use clap::Parser;
use mpdlink::{Arg, Config, MpdClient, Reply, Value};
use tracing_subscriber::{fmt, EnvFilter};

/// mpdlink CLI
#[derive(Parser, Debug)]
#[command(name = "mpdlink-cli")]
#[command(about = "Send a command to an MPD server")]
#[command(version)]
struct Args {
    /// Server host, Unix socket path, or @abstract socket name
    /// (defaults to MPD_HOST, then localhost)
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Server port (defaults to MPD_PORT, then 6600)
    #[arg(short, long)]
    port: Option<u16>,

    /// Per-operation socket timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Protocol command to send (e.g. "status", "playlistinfo")
    command: String,

    /// Command arguments
    args: Vec<String>,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,mpdlink=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Environment first, flags override
    let mut config = Config::from_env();
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(seconds) = args.timeout {
        config.socket_timeout = Some(std::time::Duration::from_secs(seconds));
    }

    let mut client = MpdClient::with_config(config);
    if let Err(e) = client.connect() {
        tracing::error!("connection failed: {}", e);
        std::process::exit(1);
    }

    let command_args: Vec<Arg> = args.args.iter().map(Arg::from).collect();
    let reply = match client.execute(&args.command, &command_args) {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!("'{}' failed: {}", args.command, e);
            std::process::exit(1);
        }
    };

    print_reply(reply);
    client.disconnect();
}

fn print_reply(reply: Reply) {
    match reply {
        Reply::None => {}
        Reply::Item(Some(value)) => println!("{value}"),
        Reply::Item(None) => {}
        Reply::List(values) => {
            for value in values {
                println!("{value}");
            }
        }
        Reply::Object(object) => print_object(&object),
        Reply::Objects(objects) => {
            for (index, object) in objects.iter().enumerate() {
                if index > 0 {
                    println!();
                }
                print_object(object);
            }
        }
        Reply::Binary(Some(chunk)) => {
            // Raw payload on stdout so it can be piped to a file
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = stdout.write_all(&chunk.data) {
                tracing::error!("writing payload failed: {}", e);
                std::process::exit(1);
            }
        }
        Reply::Binary(None) => {}
    }
}

fn print_object(object: &mpdlink::Object) {
    // Sorted for stable output; the wire order is not preserved by the
    // mapping anyway
    let mut keys: Vec<&String> = object.keys().collect();
    keys.sort();
    for key in keys {
        match &object[key] {
            Value::Text(text) => println!("{key}: {text}"),
            Value::Many(values) => {
                for value in values {
                    println!("{key}: {value}");
                }
            }
        }
    }
}
