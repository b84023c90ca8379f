//! `mudline`: line-mode IO for MUD client connections.
//!
//! - CR/LF/CRLF line framing over any `AsyncRead`, with a hard per-line limit,
//! - optional telnet IAC stripping (raw `telnet` clients negotiate on connect),
//! - outbound message encoding (one `\n` per message).

pub mod line;
pub mod telnet;

pub use line::{DEFAULT_MAX_LINE_LEN, Input, LineReader, encode_line};
