//! # mpdlink
//!
//! A blocking client library for the Music Player Daemon protocol with:
//! - Immediate, deferred (send/fetch) and batched calling conventions
//! - Lazy, on-demand decoding of large responses
//! - Binary responses (album art, embedded pictures)
//! - TCP, Unix-domain and abstract-namespace transports
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       MpdClient                              │
//! │       (connection lifecycle, sequencing, dispatch)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Protocol                                │
//! │     (command registry, request codec, response decoders)     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Transport                               │
//! │        (buffered line + binary I/O, TCP / Unix socket)       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use mpdlink::MpdClient;
//!
//! let mut client = MpdClient::new();
//! client.connect()?;
//! for song in client.playlistinfo(None)? {
//!     println!("{:?}", song.get("file"));
//! }
//! client.disconnect();
//! # Ok::<(), mpdlink::MpdError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod client;
pub mod network;
pub mod protocol;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use client::{MpdClient, ObjectIter, ValueIter};
pub use config::{Config, ConfigBuilder};
pub use error::{MpdError, Result};
pub use protocol::{Arg, BinaryChunk, Object, Range, Reply, Value};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of mpdlink
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
