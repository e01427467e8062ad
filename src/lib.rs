//! Incremental HTTP/1.1 message processing.
//!
//! This crate is a container/algorithm toolkit for producers and consumers of
//! HTTP/1.1 messages. It performs no I/O: callers feed it bytes through a
//! prepare/commit cycle and it parses, validates, and materializes header
//! structures and message bodies.
//!
//! # Architecture
//!
//! - [`codec`]: the resumable message parser and the chunked-body framer
//! - [`protocol`]: the header container, field identifiers, and error types
//! - [`bnf`]: grammar-element contract used for token and list validation
//! - [`chars`]: byte classifiers for the RFC 7230 character sets
//!
//! # Example
//!
//! ```
//! use http1_codec::codec::MessageParser;
//! use http1_codec::protocol::{FieldId, Status};
//!
//! let mut parser = MessageParser::request();
//! let input = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
//!
//! let region = parser.prepare();
//! region[..input.len()].copy_from_slice(input);
//! parser.commit(input.len());
//!
//! assert_eq!(parser.parse_header().unwrap(), Status::Complete);
//! let fields = parser.fields().unwrap();
//! assert_eq!(fields.at(FieldId::Host).unwrap(), b"example.com");
//! ```

pub mod bnf;
pub mod chars;
pub mod codec;
pub mod protocol;

pub(crate) use help::ensure;

mod help {

    /// Early return with an error if a condition is not met.
    macro_rules! ensure {
        ($predicate:expr, $error:expr) => {
            if !$predicate {
                return Err($error);
            }
        };
    }
    pub(crate) use ensure;
}
