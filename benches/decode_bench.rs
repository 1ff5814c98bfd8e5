//! Benchmarks for response decoding

use std::io::{BufRead, Cursor, Read};

use bytes::Bytes;
use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use mpdlink::network::LineTransport;
use mpdlink::protocol::{decode, ResponseKind, Terminator};
use mpdlink::{MpdError, Result};

/// Replayable in-memory transport over a prebuilt response
struct BufferTransport {
    input: Cursor<Vec<u8>>,
}

impl BufferTransport {
    fn new(input: Vec<u8>) -> Self {
        Self {
            input: Cursor::new(input),
        }
    }

    fn rewind(&mut self) {
        self.input.set_position(0);
    }
}

impl LineTransport for BufferTransport {
    fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let read = self.input.read_line(&mut line)?;
        if read == 0 || !line.ends_with('\n') {
            return Err(MpdError::Connection("end of buffer".to_string()));
        }
        line.pop();
        Ok(line)
    }

    fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        let mut buf = vec![0u8; len];
        self.input
            .read_exact(&mut buf)
            .map_err(|_| MpdError::Connection("end of buffer".to_string()))?;
        Ok(Bytes::from(buf))
    }

    fn write_line(&mut self, _line: &str) -> Result<()> {
        Ok(())
    }
}

/// A synthetic playlist response of `songs` records
fn playlist_response(songs: usize) -> Vec<u8> {
    let mut response = String::new();
    for index in 0..songs {
        response.push_str(&format!(
            "file: music/album{}/track{:02}.flac\n\
             Artist: Artist {}\n\
             Album: Album {}\n\
             Title: Track {}\n\
             Time: 241\n\
             Pos: {}\n\
             Id: {}\n",
            index / 12,
            index % 12,
            index / 50,
            index / 12,
            index,
            index,
            index
        ));
    }
    response.push_str("OK\n");
    response.into_bytes()
}

fn decode_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for songs in [10usize, 100, 1000] {
        let response = playlist_response(songs);
        group.throughput(Throughput::Bytes(response.len() as u64));
        group.bench_function(format!("playlist_{songs}_songs"), |b| {
            let mut transport = BufferTransport::new(response.clone());
            b.iter(|| {
                transport.rewind();
                decode(
                    &mut transport,
                    ResponseKind::Objects(&["file"]),
                    Terminator::Single,
                )
                .unwrap()
            });
        });
    }

    let response = b"tag: somevalue\n".repeat(1000);
    let mut full = response.clone();
    full.extend_from_slice(b"OK\n");
    group.throughput(Throughput::Bytes(full.len() as u64));
    group.bench_function("list_1000_values", |b| {
        let mut transport = BufferTransport::new(full.clone());
        b.iter(|| {
            transport.rewind();
            decode(&mut transport, ResponseKind::List, Terminator::Single).unwrap()
        });
    });

    group.finish();
}

criterion_group!(benches, decode_benchmarks);
criterion_main!(benches);
