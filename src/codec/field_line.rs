//! Field-line scanner: `field-name ":" OWS field-value OWS CRLF` with
//! obsolete line folding.
//!
//! The scanner examines `buf[start..committed]` without consuming anything;
//! the caller advances its cursor only when a whole line is accepted. A
//! CRLF followed by SP or HTAB does not end the field: the fold positions
//! are collected during the scan and rewritten to three SP bytes only once
//! the terminator is found, so a scan interrupted by `NeedMore` restarts
//! from an unmodified line and every input partition decodes identically.
//!
//! Deciding fold-versus-terminator needs the byte after the CRLF, which is
//! why the scanner demands three bytes of look-ahead before ruling on a CR.

use crate::chars;
use crate::protocol::{ParseError, Span};

/// Result of scanning one line of a field block.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum FieldScan {
    /// The line is not complete within the committed region.
    NeedMore,
    /// The line is the bare CRLF that terminates the block.
    BlockEnd { next: usize },
    /// A complete field line.
    Field { name: Span, value: Span, folds: Vec<usize>, next: usize },
}

/// Scans the line starting at `start`. Only bytes below `committed` are
/// examined.
pub(crate) fn scan_field_line(
    buf: &[u8],
    committed: usize,
    start: usize,
) -> Result<FieldScan, ParseError> {
    if start == committed {
        return Ok(FieldScan::NeedMore);
    }

    match buf[start] {
        b'\r' => {
            if start + 1 == committed {
                return Ok(FieldScan::NeedMore);
            }
            return if buf[start + 1] == b'\n' {
                Ok(FieldScan::BlockEnd { next: start + 2 })
            } else {
                Err(ParseError::BadLineEnding)
            };
        }
        b'\n' => return Err(ParseError::BadLineEnding),
        // a fold with no field to continue, or whitespace before the name
        b' ' | b'\t' => return Err(ParseError::BadField),
        _ => {}
    }

    let name_end = chars::skip_tchar(&buf[..committed], start);
    if name_end == committed {
        return Ok(FieldScan::NeedMore);
    }
    if name_end == start || buf[name_end] != b':' {
        return Err(ParseError::BadField);
    }
    let name = Span::new(start, name_end - start);

    let mut at = chars::skip_ows(&buf[..committed], name_end + 1);
    let mut value_start = None;
    let mut value_end = at;
    let mut pending_fold = false;
    let mut folds = Vec::new();

    loop {
        if at == committed {
            return Ok(FieldScan::NeedMore);
        }
        let b = buf[at];
        match b {
            b' ' | b'\t' => at += 1,
            b'\r' => {
                if at + 1 == committed {
                    return Ok(FieldScan::NeedMore);
                }
                if buf[at + 1] != b'\n' {
                    return Err(ParseError::BadLineEnding);
                }
                if at + 2 == committed {
                    return Ok(FieldScan::NeedMore);
                }
                if chars::is_ows(buf[at + 2]) {
                    // obs-fold; rewritten by the caller once accepted
                    folds.push(at);
                    pending_fold = true;
                    at += 3;
                } else {
                    if pending_fold {
                        return Err(ParseError::bad_value("folded line has no content"));
                    }
                    let value = match value_start {
                        Some(pos) => Span::new(pos, value_end - pos),
                        None => Span::new(at, 0),
                    };
                    return Ok(FieldScan::Field { name, value, folds, next: at + 2 });
                }
            }
            b'\n' => return Err(ParseError::BadLineEnding),
            _ if chars::is_field_vchar(b) => {
                value_start.get_or_insert(at);
                at += 1;
                value_end = at;
                pending_fold = false;
            }
            _ => return Err(ParseError::bad_value("illegal byte in field value")),
        }
    }
}

/// Rewrites each recorded fold (CR LF + continuation byte) to `SP SP SP`,
/// leaving the logical value byte-for-byte identical otherwise.
pub(crate) fn apply_folds(buf: &mut [u8], folds: &[usize]) {
    for &at in folds {
        buf[at] = b' ';
        buf[at + 1] = b' ';
        buf[at + 2] = b' ';
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(bytes: &[u8]) -> Result<FieldScan, ParseError> {
        scan_field_line(bytes, bytes.len(), 0)
    }

    fn field(bytes: &[u8]) -> (Span, Span, Vec<usize>, usize) {
        match scan(bytes).unwrap() {
            FieldScan::Field { name, value, folds, next } => (name, value, folds, next),
            other => panic!("expected a field, got {other:?}"),
        }
    }

    // scans include one byte past the CRLF: deciding fold-versus-end
    // needs it, and in a real block the next line always provides it

    #[test]
    fn plain_field() {
        let bytes = b"Host: example.com\r\n\r";
        let (name, value, folds, next) = field(bytes);
        assert_eq!(name.slice(bytes), b"Host");
        assert_eq!(value.slice(bytes), b"example.com");
        assert!(folds.is_empty());
        assert_eq!(next, bytes.len() - 1);
    }

    #[test]
    fn surrounding_ows_is_trimmed() {
        let bytes = b"X:  \t padded value \t \r\nY";
        let (_, value, _, _) = field(bytes);
        assert_eq!(value.slice(bytes), b"padded value");
    }

    #[test]
    fn empty_value() {
        let bytes = b"X:\r\n\r";
        let (_, value, _, next) = field(bytes);
        assert_eq!(value.len, 0);
        assert_eq!(next, 4);

        let bytes = b"X: \t\r\nY";
        let (_, value, _, _) = field(bytes);
        assert_eq!(value.len, 0);
    }

    #[test]
    fn block_end() {
        assert_eq!(scan(b"\r\nrest").unwrap(), FieldScan::BlockEnd { next: 2 });
    }

    #[test]
    fn fold_is_collected_and_rewritten() {
        let mut bytes = b"X: a\r\n b\r\n\r".to_vec();
        let (_, value, folds, next) = field(&bytes);
        assert_eq!(folds, vec![4]);
        assert_eq!(next, bytes.len() - 1);

        apply_folds(&mut bytes, &folds);
        assert_eq!(&bytes[..], b"X: a   b\r\n\r");
        assert_eq!(value.slice(&bytes), b"a   b");
    }

    #[test]
    fn fold_onto_blank_line_is_illegal() {
        assert_eq!(
            scan(b"X: a\r\n \r\n\r\n"),
            Err(ParseError::bad_value("folded line has no content"))
        );
    }

    #[test]
    fn need_more_at_every_truncation() {
        let bytes = b"Name: value\r\nx";
        // any prefix that cannot prove the terminator must suspend;
        // the final byte past the CRLF settles fold-versus-end
        for cut in 0..bytes.len() {
            let result = scan_field_line(bytes, cut, 0).unwrap();
            assert_eq!(result, FieldScan::NeedMore, "cut at {cut}");
        }
        match scan_field_line(bytes, bytes.len(), 0).unwrap() {
            FieldScan::Field { next, .. } => assert_eq!(next, 13),
            other => panic!("expected a field, got {other:?}"),
        }
    }

    #[test]
    fn grammar_faults() {
        assert_eq!(scan(b": v\r\n"), Err(ParseError::BadField));
        assert_eq!(scan(b" X: v\r\n"), Err(ParseError::BadField));
        assert_eq!(scan(b"Na me: v\r\n"), Err(ParseError::BadField));
        assert_eq!(scan(b"Name : v\r\n"), Err(ParseError::BadField));
        assert_eq!(scan(b"Name\n: v\r\n"), Err(ParseError::BadField));
        assert_eq!(scan(b"X: a\nb\r\n"), Err(ParseError::BadLineEnding));
        assert_eq!(scan(b"X: a\rb\r\n"), Err(ParseError::BadLineEnding));
        assert_eq!(scan(b"\n"), Err(ParseError::BadLineEnding));
        assert_eq!(scan(b"\rX"), Err(ParseError::BadLineEnding));
        assert_eq!(
            scan(b"X: a\x01\r\n"),
            Err(ParseError::bad_value("illegal byte in field value"))
        );
        assert_eq!(
            scan(b"X: a\x7f\r\n"),
            Err(ParseError::bad_value("illegal byte in field value"))
        );
    }
}
