//! Protocol Module
//!
//! Implements the MPD wire protocol: request encoding, the command
//! registry, and the typed response decoders.
//!
//! ## Wire Format
//!
//! The protocol is line oriented. A request is a single line:
//!
//! ```text
//! <command> "<escaped arg>" ... <range-arg>\n
//! ```
//!
//! Arguments are double-quoted with `\` and `"` backslash-escaped;
//! range arguments render bare as `lower:upper`.
//!
//! A response is a sequence of `key: value` lines closed by a
//! terminator:
//!
//! ```text
//! file: song.ogg
//! Pos: 0
//! OK
//! ```
//!
//! - `OK` terminates a response (`list_OK` separates the entries of a
//!   command-list batch, whose whole stream ends with one final `OK`).
//! - A line starting with `ACK ` carries a single-line server error.
//! - Binary responses interleave a `binary: <len>` header with exactly
//!   `<len>` raw payload bytes, a newline, and the `OK` terminator.
//!
//! The first line on a fresh connection is the handshake
//! `OK MPD <version>`.

mod codec;
mod command;
mod range;
mod response;

pub use codec::{encode_command, escape, Arg};
pub use command::{lookup, resolve, CommandSpec, ResponseKind};
pub use range::Range;
pub use response::{decode, BinaryChunk, Object, Reply, Terminator, Value};

pub(crate) use response::{read_response_pair, ObjectSplitter};

/// Handshake prefix sent by the server on a fresh connection
pub const HELLO_PREFIX: &str = "OK MPD ";

/// Prefix of a server error line
pub const ERROR_PREFIX: &str = "ACK ";

/// Terminator of a normal response
pub const SUCCESS: &str = "OK";

/// Separator between batched responses inside a command list
pub const NEXT: &str = "list_OK";
