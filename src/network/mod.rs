//! Network Module
//!
//! Owns the duplex byte stream the protocol runs over: line-oriented
//! reads and writes plus exact-length raw reads for binary payloads,
//! over TCP or a Unix-domain socket.

pub(crate) mod transport;

pub use transport::{LineTransport, StreamTransport};
