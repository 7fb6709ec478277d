//! # MELSEC MC Protocol Library
//!
//! A Rust library for reading and writing Mitsubishi PLC devices with the MC
//! protocol, 3E frame in ASCII mode, over UDP or TCP.
//!
//! This is a **protocol-only** library with no polling, caching or
//! reconnection. Each call sends exactly 1 request and accepts 1 response.
//! The only automatic recovery is a single receive retry.
//!
//! ## Features
//!
//! - **Exact framing**: upper-case ASCII hex frames, byte-for-byte
//! - **Explicit outcomes**: transport failures, PLC end codes and success are
//!   distinct, and absent words are `None` rather than zero
//! - **No panics**: all errors returned as `Result<T, McError>`
//! - **Deterministic cleanup**: sockets close on [`Client::close`] or drop
//!
//! ## Quick Start
//!
//! ```no_run
//! use melsec_mc::{Client, ClientConfig};
//!
//! fn main() -> melsec_mc::Result<()> {
//!     // UDP, 3 second timeout
//!     let mut client = Client::new(ClientConfig::new("192.168.3.39", 5000))?;
//!
//!     // Read 2 words from D100
//!     let words = client.read("D*000100", 2)?;
//!     println!("D100-D101 = {:?}", words);
//!
//!     // Write one word
//!     client.write("D*000200", 0x1234)?;
//!
//!     client.close()
//! }
//! ```
//!
//! ## Frame Format
//!
//! Requests are built by [`Request`]:
//!
//! ```text
//! 500000FF03FF00 <len:4> <command:12> <device> <count:4> [<value:4>]
//! ```
//!
//! where `command` is [`READ_COMMAND`] or [`WRITE_COMMAND`] and `len` is the
//! hex length of everything after it. Responses are parsed by [`Response`]:
//! the end code sits at character 18 and data words start at character 22.
//!
//! ```
//! use melsec_mc::Request;
//!
//! let frame = Request::read("D0100", 2)?.encode();
//! assert_eq!(frame, "500000FF03FF000015001004010000D01000002");
//! # Ok::<(), melsec_mc::McError>(())
//! ```
//!
//! ## Error Handling
//!
//! ```no_run
//! use melsec_mc::{Client, ClientConfig, McError};
//!
//! let mut client = Client::new(ClientConfig::new("192.168.3.39", 5000))?;
//!
//! match client.read("D*000100", 4) {
//!     Ok(words) => println!("Data: {:?}", words),
//!     Err(McError::EndCode { code }) => println!("PLC rejected the request: {}", code),
//!     Err(e) if e.is_transport() => println!("Communication failure: {}", e),
//!     Err(e) => println!("Error: {}", e),
//! }
//! # Ok::<(), McError>(())
//! ```
//!
//! ## Logging
//!
//! Diagnostics go through the [`log`](https://docs.rs/log) facade. Install
//! any logger in the application to see them.

#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod client;
mod error;
mod frame;
mod response;
mod transport;

// Public re-exports
pub use client::{
    Client, ClientConfig, DEFAULT_BUFFER_SIZE, DEFAULT_RETRY_DELAY, RECEIVE_RETRIES,
};
pub use error::{McError, Result};
pub use frame::{Operation, Request, MAX_BODY_LEN, READ_COMMAND, SUBHEADER, WRITE_COMMAND};
pub use response::{Response, DATA_OFFSET, END_CODE_OFFSET, SUCCESS_END_CODE, WORD_CHARS};
pub use transport::{Mode, SocketTransport, Transport, DEFAULT_TIMEOUT};
