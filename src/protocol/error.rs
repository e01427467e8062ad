//! Error types for HTTP message processing.
//!
//! Two enums cover the crate:
//!
//! - [`ParseError`]: faults raised by the message parser. Syntax and policy
//!   variants move the parser to its failed state; only `reset` recovers.
//! - [`FieldError`]: faults raised by the header container's checked
//!   operations.
//!
//! "Need more input" is deliberately absent: it is not a failure, and parser
//! operations report it through their success channel.

use thiserror::Error;

/// Faults raised while parsing an HTTP/1.1 message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The start line does not carry `HTTP/1.0` or `HTTP/1.1`
    #[error("unsupported http version")]
    BadVersion,

    /// Malformed field name, missing colon, or malformed request method
    #[error("invalid header field")]
    BadField,

    /// Bare CR or LF, or CR not followed by LF
    #[error("invalid line ending")]
    BadLineEnding,

    /// Illegal byte or fold in a field value, or a malformed start-line part
    #[error("invalid field value: {reason}")]
    BadValue { reason: &'static str },

    /// Malformed, conflicting, or overflowing Content-Length
    #[error("invalid content-length: {reason}")]
    BadContentLength { reason: &'static str },

    /// Malformed Transfer-Encoding list, or chunked in non-final position
    #[error("invalid transfer-encoding: {reason}")]
    BadTransferEncoding { reason: &'static str },

    /// Malformed chunk framing
    #[error("invalid chunk: {reason}")]
    BadChunk { reason: &'static str },

    /// The message as a whole is self-contradictory
    #[error("malformed message: {reason}")]
    BadMessage { reason: &'static str },

    /// Start line plus fields exceed the configured header limit
    #[error("header size too large, current: {current} exceed the limit {max}")]
    HeaderLimit { current: usize, max: usize },

    /// Body exceeds the configured body limit
    #[error("body size too large, current: {current} exceed the limit {max}")]
    BodyLimit { current: u64, max: u64 },

    /// The input stream ended while the message required more bytes
    #[error("unexpected end of input")]
    Incomplete,
}

impl ParseError {
    /// Creates a new BadValue error
    pub fn bad_value(reason: &'static str) -> Self {
        Self::BadValue { reason }
    }

    /// Creates a new BadContentLength error
    pub fn bad_content_length(reason: &'static str) -> Self {
        Self::BadContentLength { reason }
    }

    /// Creates a new BadTransferEncoding error
    pub fn bad_transfer_encoding(reason: &'static str) -> Self {
        Self::BadTransferEncoding { reason }
    }

    /// Creates a new BadChunk error
    pub fn bad_chunk(reason: &'static str) -> Self {
        Self::BadChunk { reason }
    }

    /// Creates a new BadMessage error
    pub fn bad_message(reason: &'static str) -> Self {
        Self::BadMessage { reason }
    }

    /// Creates a new HeaderLimit error
    pub fn header_limit(current: usize, max: usize) -> Self {
        Self::HeaderLimit { current, max }
    }

    /// Creates a new BodyLimit error
    pub fn body_limit(current: u64, max: u64) -> Self {
        Self::BodyLimit { current, max }
    }
}

/// Faults raised by the header container's checked operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// No field matches the given id or name
    #[error("field not found")]
    NotFound,

    /// Index past the end of the container
    #[error("index {index} out of range, size is {size}")]
    OutOfRange { index: usize, size: usize },

    /// A name or value fails grammar validation
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: &'static str },
}

impl FieldError {
    /// Creates a new OutOfRange error
    pub fn out_of_range(index: usize, size: usize) -> Self {
        Self::OutOfRange { index, size }
    }

    /// Creates a new InvalidArgument error
    pub fn invalid_argument(reason: &'static str) -> Self {
        Self::InvalidArgument { reason }
    }
}
