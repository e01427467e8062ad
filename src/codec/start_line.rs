//! Start-line grammar: request-line and status-line.
//!
//! Both parsers operate on one complete line (the CRLF already located by
//! the caller) and return spans into the message buffer, so results survive
//! buffer relocation.

use crate::chars;
use crate::ensure;
use crate::protocol::{ParseError, Span, Version};

/// Parsed start line of either message kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StartLine {
    Request { method: Span, target: Span, version: Version },
    Response { version: Version, status: u16, reason: Span },
}

/// Parses `method SP request-target SP HTTP-version` from `buf[start..end]`.
///
/// The method is a token; the target is byte-preserving up to the next SP
/// but must stay within visible characters.
pub(crate) fn parse_request_line(
    buf: &[u8],
    start: usize,
    end: usize,
) -> Result<StartLine, ParseError> {
    let method_end = chars::skip_tchar(&buf[..end], start);
    ensure!(method_end > start, ParseError::BadField);
    ensure!(method_end < end && buf[method_end] == b' ', ParseError::BadField);

    let target_start = method_end + 1;
    let mut target_end = target_start;
    while target_end < end && buf[target_end] != b' ' {
        ensure!(
            chars::is_field_vchar(buf[target_end]),
            ParseError::bad_value("illegal byte in request target")
        );
        target_end += 1;
    }
    ensure!(target_end > target_start, ParseError::bad_value("empty request target"));
    ensure!(target_end < end, ParseError::bad_value("request line missing version"));

    let version = parse_version(&buf[target_end + 1..end])?;

    Ok(StartLine::Request {
        method: Span::new(start, method_end - start),
        target: Span::new(target_start, target_end - target_start),
        version,
    })
}

/// Parses `HTTP-version SP status-code [ SP reason-phrase ]` from
/// `buf[start..end]`.
///
/// The status code is exactly three digits. A line ending directly after
/// the code is accepted with an empty reason; the reason phrase itself may
/// contain HTAB, SP, VCHAR, and obs-text.
pub(crate) fn parse_status_line(
    buf: &[u8],
    start: usize,
    end: usize,
) -> Result<StartLine, ParseError> {
    const VERSION_LEN: usize = 8;
    ensure!(end - start >= VERSION_LEN, ParseError::BadVersion);
    let version = parse_version(&buf[start..start + VERSION_LEN])?;

    let mut at = start + VERSION_LEN;
    ensure!(
        at < end && buf[at] == b' ',
        ParseError::bad_value("status line missing space after version")
    );
    at += 1;

    ensure!(end - at >= 3, ParseError::bad_value("truncated status code"));
    let digits = &buf[at..at + 3];
    ensure!(
        digits.iter().all(|&b| chars::is_digit(b)),
        ParseError::bad_value("status code is not three digits")
    );
    let status = digits.iter().fold(0u16, |acc, &b| acc * 10 + (b - b'0') as u16);
    at += 3;

    let reason = if at == end {
        Span::new(at, 0)
    } else {
        ensure!(buf[at] == b' ', ParseError::bad_value("status code is not three digits"));
        at += 1;
        for &b in &buf[at..end] {
            ensure!(
                chars::is_ows(b) || chars::is_field_vchar(b),
                ParseError::bad_value("illegal byte in reason phrase")
            );
        }
        Span::new(at, end - at)
    };

    Ok(StartLine::Response { version, status, reason })
}

/// Recognizes exactly `HTTP/1.0` or `HTTP/1.1`.
fn parse_version(bytes: &[u8]) -> Result<Version, ParseError> {
    match bytes {
        b"HTTP/1.0" => Ok(Version::Http10),
        b"HTTP/1.1" => Ok(Version::Http11),
        _ => Err(ParseError::BadVersion),
    }
}
