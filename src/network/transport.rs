//! Line transport
//!
//! Buffered, blocking I/O over a connected socket. The protocol mixes
//! line-oriented text with raw binary payloads, so the transport
//! exposes both framings over the same stream. End-of-stream anywhere
//! is a fatal connection error; short reads never reattempt.

use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::os::unix::io::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;
use std::time::Duration;

use bytes::Bytes;

use crate::error::{MpdError, Result};

/// A duplex byte stream speaking the protocol's dual framing.
///
/// Implementations must block until a full line (or the declared
/// binary length) arrives, and signal end-of-stream as a connection
/// error.
pub trait LineTransport {
    /// Read one newline-terminated line, without the newline
    fn read_line(&mut self) -> Result<String>;

    /// Read exactly `len` raw bytes
    fn read_bytes(&mut self, len: usize) -> Result<Bytes>;

    /// Write one line, appending the newline, and flush
    fn write_line(&mut self, line: &str) -> Result<()>;

    /// Release the underlying stream; errors are ignored
    fn close(&mut self) {}
}

/// The underlying socket, TCP or Unix-domain
#[derive(Debug)]
enum Socket {
    Tcp(TcpStream),
    Unix(UnixStream),
}

impl Socket {
    fn try_clone(&self) -> std::io::Result<Socket> {
        match self {
            Socket::Tcp(stream) => stream.try_clone().map(Socket::Tcp),
            Socket::Unix(stream) => stream.try_clone().map(Socket::Unix),
        }
    }

    fn set_read_timeout(&self, timeout: Option<Duration>) -> std::io::Result<()> {
        match self {
            Socket::Tcp(stream) => stream.set_read_timeout(timeout),
            Socket::Unix(stream) => stream.set_read_timeout(timeout),
        }
    }

    fn set_write_timeout(&self, timeout: Option<Duration>) -> std::io::Result<()> {
        match self {
            Socket::Tcp(stream) => stream.set_write_timeout(timeout),
            Socket::Unix(stream) => stream.set_write_timeout(timeout),
        }
    }

    fn shutdown(&self) -> std::io::Result<()> {
        match self {
            Socket::Tcp(stream) => stream.shutdown(Shutdown::Both),
            Socket::Unix(stream) => stream.shutdown(Shutdown::Both),
        }
    }
}

impl AsRawFd for Socket {
    fn as_raw_fd(&self) -> RawFd {
        match self {
            Socket::Tcp(stream) => stream.as_raw_fd(),
            Socket::Unix(stream) => stream.as_raw_fd(),
        }
    }
}

impl Read for Socket {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Socket::Tcp(stream) => stream.read(buf),
            Socket::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for Socket {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Socket::Tcp(stream) => stream.write(buf),
            Socket::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Socket::Tcp(stream) => stream.flush(),
            Socket::Unix(stream) => stream.flush(),
        }
    }
}

/// Buffered transport over a connected socket.
///
/// Reader and writer wrap separate clones of the same socket handle,
/// so buffering one direction never stalls the other.
#[derive(Debug)]
pub struct StreamTransport {
    reader: BufReader<Socket>,
    writer: BufWriter<Socket>,
}

impl StreamTransport {
    /// Connect over TCP, trying every resolved address in turn.
    ///
    /// Each attempt is bounded by `timeout`; the last failure is
    /// reported if none succeeds.
    pub fn connect_tcp(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        let addrs = (host, port)
            .to_socket_addrs()
            .map_err(|e| MpdError::Connection(format!("address resolution failed: {e}")))?;

        let mut last_err = None;
        for addr in addrs {
            tracing::debug!("opening socket {}", addr);
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    return Self::from_socket(Socket::Tcp(stream));
                }
                Err(e) => {
                    tracing::debug!("opening socket {} failed: {}", addr, e);
                    last_err = Some(e);
                }
            }
        }
        Err(match last_err {
            Some(e) => MpdError::Connection(e.to_string()),
            None => MpdError::Connection("address resolution returned an empty list".to_string()),
        })
    }

    /// Connect to a Unix-domain socket.
    ///
    /// A leading `@` selects the abstract namespace (Linux only).
    /// Connect establishment is effectively immediate for local
    /// sockets; the caller bounds the handshake with its timeout.
    pub fn connect_unix(path: &str) -> Result<Self> {
        let stream = match path.strip_prefix('@') {
            Some(name) => connect_abstract(name)?,
            None => UnixStream::connect(path)
                .map_err(|e| MpdError::Connection(format!("{path}: {e}")))?,
        };
        Self::from_socket(Socket::Unix(stream))
    }

    fn from_socket(socket: Socket) -> Result<Self> {
        let read_half = socket.try_clone()?;
        Ok(Self {
            reader: BufReader::new(read_half),
            writer: BufWriter::new(socket),
        })
    }

    /// Apply read and write timeouts to the socket (`None` disables)
    pub fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.reader.get_ref().set_read_timeout(timeout)?;
        self.writer.get_ref().set_write_timeout(timeout)?;
        Ok(())
    }
}

/// Descriptor of the read half, for callers multiplexing readiness
/// externally (poll this before a deferred fetch). Bytes already
/// buffered by the transport are not visible to the descriptor.
impl AsRawFd for StreamTransport {
    fn as_raw_fd(&self) -> RawFd {
        self.reader.get_ref().as_raw_fd()
    }
}

#[cfg(target_os = "linux")]
fn connect_abstract(name: &str) -> Result<UnixStream> {
    use std::os::linux::net::SocketAddrExt;
    use std::os::unix::net::SocketAddr;

    let addr = SocketAddr::from_abstract_name(name.as_bytes())
        .map_err(|e| MpdError::Connection(format!("@{name}: {e}")))?;
    UnixStream::connect_addr(&addr).map_err(|e| MpdError::Connection(format!("@{name}: {e}")))
}

#[cfg(not(target_os = "linux"))]
fn connect_abstract(_name: &str) -> Result<UnixStream> {
    Err(MpdError::Connection(
        "abstract sockets are only supported on Linux".to_string(),
    ))
}

impl LineTransport for StreamTransport {
    fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line)?;
        if read == 0 || !line.ends_with('\n') {
            return Err(MpdError::Connection(
                "connection lost while reading line".to_string(),
            ));
        }
        line.pop();
        Ok(line)
    }

    fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        let mut buf = vec![0u8; len];
        self.reader.read_exact(&mut buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                MpdError::Connection("connection lost while reading binary content".to_string())
            } else {
                MpdError::Io(e)
            }
        })?;
        Ok(Bytes::from(buf))
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Flush and shut the socket down, tolerating already-closed handles
    fn close(&mut self) {
        let _ = self.writer.flush();
        let _ = self.writer.get_ref().shutdown();
    }
}

// =============================================================================
// Test support
// =============================================================================

#[cfg(test)]
pub(crate) mod testing {
    use std::io::{BufRead, Cursor, Read};

    use bytes::Bytes;

    use crate::error::{MpdError, Result};

    use super::LineTransport;

    /// In-memory transport fed from a scripted byte stream.
    ///
    /// Reads come from the script; written lines are collected for
    /// assertion. Running off the end of the script behaves like a
    /// lost connection, matching the real transport.
    pub(crate) struct ScriptTransport {
        input: Cursor<Vec<u8>>,
        pub(crate) sent: Vec<String>,
    }

    impl ScriptTransport {
        pub(crate) fn new(script: &str) -> Self {
            Self::from_bytes(script.as_bytes().to_vec())
        }

        pub(crate) fn from_bytes(script: Vec<u8>) -> Self {
            Self {
                input: Cursor::new(script),
                sent: Vec::new(),
            }
        }
    }

    impl LineTransport for ScriptTransport {
        fn read_line(&mut self) -> Result<String> {
            let mut line = String::new();
            let read = self.input.read_line(&mut line)?;
            if read == 0 || !line.ends_with('\n') {
                return Err(MpdError::Connection(
                    "connection lost while reading line".to_string(),
                ));
            }
            line.pop();
            Ok(line)
        }

        fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
            let mut buf = vec![0u8; len];
            self.input.read_exact(&mut buf).map_err(|_| {
                MpdError::Connection("connection lost while reading binary content".to_string())
            })?;
            Ok(Bytes::from(buf))
        }

        fn write_line(&mut self, line: &str) -> Result<()> {
            self.sent.push(line.to_string());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptTransport;
    use super::*;

    #[test]
    fn test_script_read_line() {
        let mut t = ScriptTransport::new("OK MPD 0.23.5\nvolume: 63\n");
        assert_eq!(t.read_line().unwrap(), "OK MPD 0.23.5");
        assert_eq!(t.read_line().unwrap(), "volume: 63");
        assert!(matches!(t.read_line(), Err(MpdError::Connection(_))));
    }

    #[test]
    fn test_script_unterminated_line_is_connection_lost() {
        let mut t = ScriptTransport::new("no newline");
        assert!(matches!(t.read_line(), Err(MpdError::Connection(_))));
    }

    #[test]
    fn test_script_read_bytes() {
        let mut t = ScriptTransport::from_bytes(vec![1, 2, 3, 4]);
        assert_eq!(t.read_bytes(3).unwrap().as_ref(), &[1, 2, 3]);
        assert!(t.read_bytes(2).is_err());
    }
}
