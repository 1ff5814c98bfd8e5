//! Configuration for mpdlink
//!
//! Centralized connection settings with sensible defaults, plus the
//! conventional MPD environment resolution (`MPD_HOST`, `MPD_PORT`,
//! `MPD_TIMEOUT`, `XDG_RUNTIME_DIR` socket probing).

use std::env;
use std::path::Path;
use std::time::Duration;

/// Default MPD port
pub const DEFAULT_PORT: u16 = 6600;

/// Default host when nothing else is configured
pub const DEFAULT_HOST: &str = "localhost";

/// Seconds before a connection attempt times out
/// (overridden by the `MPD_TIMEOUT` environment variable)
pub const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for an [`MpdClient`](crate::MpdClient)
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Endpoint Configuration
    // -------------------------------------------------------------------------
    /// Hostname, IP, filesystem socket path, or `@name` abstract socket.
    /// A leading `/` or `@` selects the Unix-domain transport.
    pub host: String,

    /// TCP port (ignored for Unix-domain transports)
    pub port: u16,

    /// Password extracted from `MPD_HOST` (`password@host` form).
    ///
    /// Only a helper for callers; it is never sent implicitly. Pass it to
    /// the `password` command yourself.
    pub password: Option<String>,

    // -------------------------------------------------------------------------
    // Timeout Configuration
    // -------------------------------------------------------------------------
    /// Timeout for connection establishment and the handshake read
    pub connection_timeout: Duration,

    /// Per-operation socket timeout once connected (`None` disables it)
    pub socket_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            password: None,
            connection_timeout: CONNECTION_TIMEOUT,
            socket_timeout: None,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Resolve a config from the conventional MPD environment variables.
    ///
    /// - `MPD_HOST`: plain host, `password@host`, or `@name` for an
    ///   abstract socket. If unset, `${XDG_RUNTIME_DIR:-/run}/mpd/socket`
    ///   is used when that path exists, else `localhost`.
    /// - `MPD_PORT`: port number, defaults to 6600.
    /// - `MPD_TIMEOUT`: connection timeout in seconds, defaults to 30.
    ///
    /// Malformed values fall back to the defaults rather than failing.
    pub fn from_env() -> Self {
        let mut config = Config::default();

        match env::var("MPD_HOST") {
            Ok(raw) if !raw.is_empty() => {
                let (password, host) = parse_mpd_host(&raw);
                if password.is_some() {
                    tracing::debug!("password detected in MPD_HOST");
                    config.password = password;
                }
                if let Some(host) = host {
                    tracing::debug!("host detected in MPD_HOST: {}", host);
                    config.host = host;
                }
            }
            _ => {
                // No MPD_HOST: is the runtime-directory socket there?
                let runtime_dir =
                    env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/run".to_string());
                let rundir = format!("{}/mpd/socket", runtime_dir.trim_end_matches('/'));
                if Path::new(&rundir).exists() {
                    tracing::debug!("unix socket detected in runtime dir: {}", rundir);
                    config.host = rundir;
                }
            }
        }

        if let Ok(port) = env::var("MPD_PORT") {
            match port.parse::<u16>() {
                Ok(port) => config.port = port,
                Err(_) => tracing::warn!("ignoring invalid MPD_PORT value: {}", port),
            }
        }

        if let Ok(timeout) = env::var("MPD_TIMEOUT") {
            match timeout.parse::<u64>() {
                Ok(secs) => {
                    tracing::debug!("timeout detected in MPD_TIMEOUT: {}s", secs);
                    config.connection_timeout = Duration::from_secs(secs);
                }
                Err(_) => tracing::warn!("ignoring invalid MPD_TIMEOUT value: {}", timeout),
            }
        }

        config
    }
}

/// Split an `MPD_HOST` value into `(password, host)`.
///
/// The `password@host` form carries both; a leading `@` with no password
/// part designates an abstract socket and is kept as part of the host.
fn parse_mpd_host(raw: &str) -> (Option<String>, Option<String>) {
    match raw.split_once('@') {
        Some(("", "")) => (None, None),
        // Leading @ with no password part: abstract socket name
        Some(("", name)) => (None, Some(format!("@{name}"))),
        Some((password, "")) => (Some(password.to_string()), None),
        Some((password, host)) => (Some(password.to_string()), Some(host.to_string())),
        None => (None, Some(raw.to_string())),
    }
}

/// Builder for Config
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the host (hostname, IP, socket path, or `@name`)
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the TCP port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the password helper attribute
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = Some(password.into());
        self
    }

    /// Set the connection-establishment timeout
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.config.connection_timeout = timeout;
        self
    }

    /// Set the per-operation socket timeout (`None` disables it)
    pub fn socket_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.socket_timeout = timeout;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
