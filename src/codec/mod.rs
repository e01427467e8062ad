//! Message codec: the resumable HTTP/1.1 parser and its sub-machines.
//!
//! # Architecture
//!
//! - [`MessageParser`]: the stateful parser; owns the input buffer, runs the
//!   state machine, dispatches per-field semantics, and reports framing
//! - `start_line`: request-line and status-line grammar
//! - `field_line`: the field scanner with obs-fold normalization, shared
//!   by the header block and the chunked trailer
//! - `chunked`: the chunked transfer-coding framer
//!
//! # Example
//!
//! ```
//! use http1_codec::codec::MessageParser;
//! use http1_codec::protocol::Status;
//!
//! let mut parser = MessageParser::response();
//! parser.feed(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nhi");
//!
//! assert_eq!(parser.parse_header().unwrap(), Status::Complete);
//! assert_eq!(parser.parse_body().unwrap(), Status::Complete);
//! assert_eq!(parser.body(), b"hi");
//! ```

mod chunked;
mod field_line;
mod start_line;

mod parser;
pub use parser::MessageParser;
pub use parser::ParserConfig;
pub use parser::State;
pub use parser::DEFAULT_HEADER_LIMIT;
