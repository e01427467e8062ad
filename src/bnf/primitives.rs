//! Grammar productions used by the parser and the header container.
//!
//! Productions whose end is delimited by their character set (`token`,
//! `field-value`) treat end-of-input as a terminator; productions with an
//! explicit closing delimiter (`quoted-string`) report [`Step::NeedMore`]
//! when the input ends first.

use crate::bnf::{Element, List, ListStep, Step};
use crate::chars;

/// `token = 1*tchar`
pub struct Token;

impl Element for Token {
    fn parse(input: &[u8]) -> Step {
        let end = chars::skip_tchar(input, 0);
        if end == 0 {
            Step::Reject
        } else {
            Step::End(end)
        }
    }
}

/// The character constraint on a serialized field value: any mix of
/// `field-vchar`, SP, and HTAB. The empty value is legal.
pub struct FieldValue;

impl Element for FieldValue {
    fn parse(input: &[u8]) -> Step {
        for (i, &b) in input.iter().enumerate() {
            if !chars::is_field_vchar(b) && !chars::is_ows(b) {
                if i == 0 {
                    return Step::Reject;
                }
                return Step::End(i);
            }
        }
        Step::End(input.len())
    }
}

/// `quoted-string = DQUOTE *( qdtext / quoted-pair ) DQUOTE`
pub struct QuotedString;

impl QuotedString {
    fn is_qdtext(b: u8) -> bool {
        matches!(b, b'\t' | b' ' | 0x21 | 0x23..=0x5b | 0x5d..=0x7e) || chars::is_obs_text(b)
    }

    fn is_quotable(b: u8) -> bool {
        chars::is_ows(b) || chars::is_field_vchar(b)
    }
}

impl Element for QuotedString {
    fn parse(input: &[u8]) -> Step {
        if input.first() != Some(&b'"') {
            return Step::Reject;
        }
        let mut at = 1;
        loop {
            let Some(&b) = input.get(at) else {
                return Step::NeedMore;
            };
            match b {
                b'"' => return Step::End(at + 1),
                b'\\' => match input.get(at + 1) {
                    None => return Step::NeedMore,
                    Some(&esc) if Self::is_quotable(esc) => at += 2,
                    Some(_) => return Step::Reject,
                },
                _ if Self::is_qdtext(b) => at += 1,
                _ => return Step::Reject,
            }
        }
    }
}

/// Skips OWS and list separators, tolerating empty list elements
/// (`a,,b` and `a, ,b` both read as two elements).
fn skip_separators(input: &[u8], mut at: usize) -> usize {
    while at < input.len() && (chars::is_ows(input[at]) || input[at] == b',') {
        at += 1;
    }
    at
}

/// `#token`: a comma-separated token list with optional whitespace.
pub struct TokenList;

impl List for TokenList {
    fn begin(input: &[u8]) -> ListStep {
        let start = skip_separators(input, 0);
        token_item(input, start)
    }

    fn increment(input: &[u8], at: usize) -> ListStep {
        match expect_separator(input, at) {
            Ok(next) => token_item(input, next),
            Err(step) => step,
        }
    }
}

/// After one element, requires end-of-input or a comma separator before the
/// next, returning the position where the next element may start.
fn expect_separator(input: &[u8], at: usize) -> Result<usize, ListStep> {
    let at = chars::skip_ows(input, at);
    if at == input.len() {
        return Err(ListStep::End { next: at });
    }
    if input[at] != b',' {
        return Err(ListStep::Reject);
    }
    Ok(skip_separators(input, at))
}

fn token_item(input: &[u8], start: usize) -> ListStep {
    if start == input.len() {
        return ListStep::End { next: start };
    }
    let end = chars::skip_tchar(input, start);
    if end == start {
        return ListStep::Reject;
    }
    ListStep::Item { elem: start..end, next: end }
}

/// `1#transfer-coding` where
/// `transfer-coding = token *( OWS ";" OWS token BWS "=" BWS ( token / quoted-string ) )`.
///
/// The yielded element range covers the coding name only; parameters are
/// validated and skipped, so callers match names without reparsing.
pub struct TransferCodingList;

impl List for TransferCodingList {
    fn begin(input: &[u8]) -> ListStep {
        let start = skip_separators(input, 0);
        coding_item(input, start)
    }

    fn increment(input: &[u8], at: usize) -> ListStep {
        match expect_separator(input, at) {
            Ok(next) => coding_item(input, next),
            Err(step) => step,
        }
    }
}

fn coding_item(input: &[u8], start: usize) -> ListStep {
    if start == input.len() {
        return ListStep::End { next: start };
    }
    let name_end = chars::skip_tchar(input, start);
    if name_end == start {
        return ListStep::Reject;
    }
    match skip_parameters(input, name_end) {
        Some(next) => ListStep::Item { elem: start..name_end, next },
        None => ListStep::Reject,
    }
}

/// Skips `*( OWS ";" OWS token BWS "=" BWS ( token / quoted-string ) )`,
/// returning the position after the last parameter or `None` on bad syntax.
fn skip_parameters(input: &[u8], mut at: usize) -> Option<usize> {
    loop {
        let sep = chars::skip_ows(input, at);
        if sep == input.len() || input[sep] != b';' {
            return Some(at);
        }
        let mut cursor = chars::skip_ows(input, sep + 1);
        let name_end = chars::skip_tchar(input, cursor);
        if name_end == cursor {
            return None;
        }
        cursor = chars::skip_ows(input, name_end);
        if input.get(cursor) != Some(&b'=') {
            return None;
        }
        cursor = chars::skip_ows(input, cursor + 1);
        if input.get(cursor) == Some(&b'"') {
            match QuotedString::parse(&input[cursor..]) {
                Step::End(n) => at = cursor + n,
                _ => return None,
            }
        } else {
            let value_end = chars::skip_tchar(input, cursor);
            if value_end == cursor {
                return None;
            }
            at = value_end;
        }
    }
}

/// `1#protocol` where `protocol = protocol-name [ "/" protocol-version ]`,
/// both parts tokens. The yielded element covers the whole protocol.
pub struct ProtocolList;

impl List for ProtocolList {
    fn begin(input: &[u8]) -> ListStep {
        let start = skip_separators(input, 0);
        protocol_item(input, start)
    }

    fn increment(input: &[u8], at: usize) -> ListStep {
        match expect_separator(input, at) {
            Ok(next) => protocol_item(input, next),
            Err(step) => step,
        }
    }
}

fn protocol_item(input: &[u8], start: usize) -> ListStep {
    if start == input.len() {
        return ListStep::End { next: start };
    }
    let name_end = chars::skip_tchar(input, start);
    if name_end == start {
        return ListStep::Reject;
    }
    let end = if input.get(name_end) == Some(&b'/') {
        let version_end = chars::skip_tchar(input, name_end + 1);
        if version_end == name_end + 1 {
            return ListStep::Reject;
        }
        version_end
    } else {
        name_end
    };
    ListStep::Item { elem: start..end, next: end }
}

/// The chunk-extension run between a chunk size and its CRLF:
/// `*( BWS ";" BWS token [ BWS "=" BWS ( token / quoted-string ) ] )`.
///
/// Validated as a complete region once the size line is framed; the empty
/// region (no extensions) is legal.
pub struct ChunkExtList;

impl Element for ChunkExtList {
    fn parse(input: &[u8]) -> Step {
        let mut at = 0;
        loop {
            at = chars::skip_ows(input, at);
            if at == input.len() {
                return Step::End(at);
            }
            if input[at] != b';' {
                return Step::Reject;
            }
            at = chars::skip_ows(input, at + 1);
            let name_end = chars::skip_tchar(input, at);
            if name_end == at {
                return Step::Reject;
            }
            at = chars::skip_ows(input, name_end);
            if input.get(at) != Some(&b'=') {
                continue;
            }
            at = chars::skip_ows(input, at + 1);
            if input.get(at) == Some(&b'"') {
                match QuotedString::parse(&input[at..]) {
                    Step::End(n) => at += n,
                    Step::NeedMore => return Step::NeedMore,
                    _ => return Step::Reject,
                }
            } else {
                let value_end = chars::skip_tchar(input, at);
                if value_end == at {
                    return Step::Reject;
                }
                at = value_end;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bnf::{consume_list, is_valid, is_valid_list, list_items};

    #[test]
    fn token_rejects_separators() {
        assert_eq!(Token::parse(b"gzip;q=1"), Step::End(4));
        assert_eq!(Token::parse(b";gzip"), Step::Reject);
    }

    #[test]
    fn field_value_chars() {
        assert!(is_valid::<FieldValue>(b"text/html; charset=utf-8"));
        assert!(is_valid::<FieldValue>(b""));
        assert!(is_valid::<FieldValue>(b"sp and\ttab"));
        assert!(is_valid::<FieldValue>(&[b'a', 0x80, 0xff]));
        assert!(!is_valid::<FieldValue>(b"no\r\nnewlines"));
        assert!(!is_valid::<FieldValue>(&[0x7f]));
    }

    #[test]
    fn quoted_string() {
        assert_eq!(QuotedString::parse(b"\"hello\""), Step::End(7));
        assert_eq!(QuotedString::parse(b"\"a,b\" rest"), Step::End(5));
        assert_eq!(QuotedString::parse(b"\"esc \\\" quote\""), Step::End(14));
        assert_eq!(QuotedString::parse(b"\"open"), Step::NeedMore);
        assert_eq!(QuotedString::parse(b"plain"), Step::Reject);
        assert_eq!(QuotedString::parse(b"\"bad\x01\""), Step::Reject);
    }

    #[test]
    fn token_list_edges() {
        assert!(is_valid_list::<TokenList>(b""));
        assert!(is_valid_list::<TokenList>(b"close"));
        assert!(is_valid_list::<TokenList>(b" close , keep-alive "));
        assert!(is_valid_list::<TokenList>(b",,close,,"));
        assert!(!is_valid_list::<TokenList>(b"close;ext"));
    }

    #[test]
    fn transfer_coding_parameters() {
        assert!(is_valid_list::<TransferCodingList>(b"chunked"));
        assert!(is_valid_list::<TransferCodingList>(b"gzip, chunked"));
        assert!(is_valid_list::<TransferCodingList>(b"foo;bar=baz, chunked"));
        assert!(is_valid_list::<TransferCodingList>(b"foo;a=\"with, comma\", chunked"));
        assert!(!is_valid_list::<TransferCodingList>(b"foo;bar, chunked"));
        assert!(!is_valid_list::<TransferCodingList>(b"foo;=x"));

        let names: Vec<_> = list_items::<TransferCodingList>(b"gzip;q=1, chunked")
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(names, vec![&b"gzip"[..], b"chunked"]);
    }

    #[test]
    fn protocol_list() {
        assert!(is_valid_list::<ProtocolList>(b"websocket"));
        assert!(is_valid_list::<ProtocolList>(b"HTTP/2.0, SHTTP/1.3, IRC/6.9"));
        assert!(!is_valid_list::<ProtocolList>(b"bad/"));

        let protos: Vec<_> =
            list_items::<ProtocolList>(b"h2c, websocket").collect::<Result<_, _>>().unwrap();
        assert_eq!(protos, vec![&b"h2c"[..], b"websocket"]);
    }

    #[test]
    fn chunk_extensions() {
        assert!(is_valid::<ChunkExtList>(b""));
        assert!(is_valid::<ChunkExtList>(b";name"));
        assert!(is_valid::<ChunkExtList>(b";name=value"));
        assert!(is_valid::<ChunkExtList>(b" ; a=1 ; b=\"two;three\""));
        assert!(!is_valid::<ChunkExtList>(b"name"));
        assert!(!is_valid::<ChunkExtList>(b";=x"));
        assert_eq!(ChunkExtList::parse(b";a=\"open"), Step::NeedMore);
    }

    #[test]
    fn consume_list_returns_terminator() {
        assert_eq!(consume_list::<TokenList>(b"a, b"), 4);
        assert_eq!(consume_list::<TokenList>(b"a, b "), 5);
        assert_eq!(consume_list::<TokenList>(b"a, b\r\n"), 0);
    }
}
