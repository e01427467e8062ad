//! Framer for the chunked transfer coding.
//!
//! Decodes `chunk = chunk-size [ chunk-ext ] CRLF chunk-data CRLF` as
//! specified in [RFC 7230 Section 4.1](https://tools.ietf.org/html/rfc7230#section-4.1),
//! one state per protocol position. The framer reads through a cursor over
//! the parser's buffer and reports chunk data as stable byte ranges, so the
//! bytes are never copied or relocated by the framer itself.
//!
//! The zero-size chunk ends the framer's job: it reports [`ChunkEvent::Last`]
//! and the message parser takes over for the trailer section.

use crate::bnf;
use crate::chars;
use crate::protocol::{ParseError, Span};
use tracing::trace;
use ChunkedState::*;

/// Sub-state-machine for a chunked message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChunkedDecoder {
    state: ChunkedState,
    size: u64,
    digits: u32,
    remaining: u64,
    ext_start: usize,
    ext_end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    /// Read the chunk size in hex
    Size,
    /// Collect chunk extensions up to the CR
    Ext,
    /// Read LF after the chunk size line
    SizeLf,
    /// Hand out chunk data
    Data,
    /// Read CR after chunk data
    DataCr,
    /// Read LF after chunk data
    DataLf,
    /// Zero-size chunk consumed; the trailer section follows
    Done,
}

/// Which protocol position the framer currently occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChunkPhase {
    Header,
    Body,
    Done,
}

/// One framing event, reported as ranges into the parser buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChunkEvent {
    /// A chunk-size line was consumed; `ext` covers its extensions.
    Header { size: u64, ext: Span },
    /// Chunk data occupies `start..end`.
    Data { start: usize, end: usize },
    /// The zero-size chunk was consumed; trailer parsing begins.
    Last { ext: Span },
}

impl ChunkedDecoder {
    pub(crate) fn new() -> Self {
        Self { state: Size, size: 0, digits: 0, remaining: 0, ext_start: 0, ext_end: 0 }
    }

    pub(crate) fn phase(&self) -> ChunkPhase {
        match self.state {
            Size | Ext | SizeLf => ChunkPhase::Header,
            Data | DataCr | DataLf => ChunkPhase::Body,
            Done => ChunkPhase::Done,
        }
    }

    /// Advances through `buf[*parsed..committed]`, consuming what it can.
    ///
    /// Returns `Ok(None)` when more committed bytes are required; any
    /// deviation from the chunk grammar is [`ParseError::BadChunk`].
    pub(crate) fn next(
        &mut self,
        buf: &[u8],
        parsed: &mut usize,
        committed: usize,
    ) -> Result<Option<ChunkEvent>, ParseError> {
        loop {
            if self.state == Done {
                return Ok(None);
            }

            if self.state == Data {
                if self.remaining == 0 {
                    self.state = DataCr;
                    continue;
                }
                if *parsed == committed {
                    return Ok(None);
                }
                let avail = (committed - *parsed) as u64;
                let take = std::cmp::min(self.remaining, avail) as usize;
                let start = *parsed;
                *parsed += take;
                self.remaining -= take as u64;
                if self.remaining == 0 {
                    self.state = DataCr;
                }
                trace!(len = take, "read chunk data");
                return Ok(Some(ChunkEvent::Data { start, end: start + take }));
            }

            if *parsed == committed {
                return Ok(None);
            }
            let at = *parsed;
            let b = buf[at];

            match self.state {
                Size => {
                    if let Some(digit) = chars::hex_value(b) {
                        self.size = self
                            .size
                            .checked_mul(16)
                            .and_then(|n| n.checked_add(digit))
                            .ok_or(ParseError::bad_chunk("chunk size overflow"))?;
                        self.digits += 1;
                        *parsed += 1;
                    } else if self.digits == 0 {
                        return Err(ParseError::bad_chunk("chunk size missing"));
                    } else if b == b'\r' {
                        self.ext_start = at;
                        self.ext_end = at;
                        self.state = SizeLf;
                        *parsed += 1;
                    } else if b == b';' || chars::is_ows(b) {
                        self.ext_start = at;
                        self.state = Ext;
                        *parsed += 1;
                    } else {
                        return Err(ParseError::bad_chunk("invalid chunk size"));
                    }
                }
                Ext => {
                    if b == b'\r' {
                        self.ext_end = at;
                        self.state = SizeLf;
                    } else if b == b'\n' {
                        return Err(ParseError::bad_chunk("bare LF in chunk extension"));
                    }
                    *parsed += 1;
                }
                SizeLf => {
                    if b != b'\n' {
                        return Err(ParseError::bad_chunk("chunk size line missing LF"));
                    }
                    *parsed += 1;
                    let ext = Span::new(self.ext_start, self.ext_end - self.ext_start);
                    if !bnf::is_valid::<bnf::ChunkExtList>(ext.slice(buf)) {
                        return Err(ParseError::bad_chunk("malformed chunk extension"));
                    }
                    let size = self.size;
                    trace!(size, "parsed chunk header");
                    if size == 0 {
                        self.state = Done;
                        return Ok(Some(ChunkEvent::Last { ext }));
                    }
                    self.remaining = size;
                    self.state = Data;
                    return Ok(Some(ChunkEvent::Header { size, ext }));
                }
                DataCr => {
                    if b != b'\r' {
                        return Err(ParseError::bad_chunk("missing CR after chunk data"));
                    }
                    self.state = DataLf;
                    *parsed += 1;
                }
                DataLf => {
                    if b != b'\n' {
                        return Err(ParseError::bad_chunk("missing LF after chunk data"));
                    }
                    self.size = 0;
                    self.digits = 0;
                    self.state = Size;
                    *parsed += 1;
                }
                // handled before the match
                Data | Done => unreachable!(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(input: &[u8]) -> Result<(Vec<u8>, usize), ParseError> {
        let mut decoder = ChunkedDecoder::new();
        let mut parsed = 0;
        let mut body = Vec::new();
        loop {
            match decoder.next(input, &mut parsed, input.len())? {
                Some(ChunkEvent::Data { start, end }) => body.extend_from_slice(&input[start..end]),
                Some(ChunkEvent::Header { .. }) => {}
                Some(ChunkEvent::Last { .. }) => return Ok((body, parsed)),
                None => panic!("input exhausted before the last chunk"),
            }
        }
    }

    #[test]
    fn basic() {
        let (body, parsed) = decode_all(b"10\r\n1234567890abcdef\r\n0\r\n").unwrap();
        assert_eq!(body, b"1234567890abcdef");
        assert_eq!(parsed, 25);
    }

    #[test]
    fn multiple_chunks() {
        let (body, _) = decode_all(b"5\r\nhello\r\n7\r\n, world\r\n0\r\n").unwrap();
        assert_eq!(body, b"hello, world");
    }

    #[test]
    fn extensions_are_framed_and_validated() {
        let input = b"5;chunk-ext=value\r\nhello\r\n0\r\n";
        let mut decoder = ChunkedDecoder::new();
        let mut parsed = 0;
        match decoder.next(input, &mut parsed, input.len()).unwrap().unwrap() {
            ChunkEvent::Header { size, ext } => {
                assert_eq!(size, 5);
                assert_eq!(ext.slice(input), b";chunk-ext=value");
            }
            other => panic!("expected a header event, got {other:?}"),
        }

        assert_eq!(
            decode_all(b"5;bad ext\r\nhello\r\n0\r\n"),
            Err(ParseError::bad_chunk("malformed chunk extension"))
        );
    }

    #[test]
    fn whitespace_after_size_reads_as_extension_region() {
        let (body, _) = decode_all(b"5 \r\nhello\r\n0\r\n").unwrap();
        assert_eq!(body, b"hello");

        let (body, _) = decode_all(b"5 ;a=1\r\nhello\r\n0\r\n").unwrap();
        assert_eq!(body, b"hello");
    }

    #[test]
    fn data_split_across_commits() {
        let input = b"5\r\nhel";
        let mut decoder = ChunkedDecoder::new();
        let mut parsed = 0;

        let header = decoder.next(input, &mut parsed, input.len()).unwrap().unwrap();
        assert!(matches!(header, ChunkEvent::Header { size: 5, .. }));

        match decoder.next(input, &mut parsed, input.len()).unwrap().unwrap() {
            ChunkEvent::Data { start, end } => assert_eq!(&input[start..end], b"hel"),
            other => panic!("expected data, got {other:?}"),
        }
        assert_eq!(decoder.next(input, &mut parsed, input.len()).unwrap(), None);

        let input = b"5\r\nhello\r\n0\r\n";
        // cursor sits where the previous region ended
        match decoder.next(input, &mut parsed, input.len()).unwrap().unwrap() {
            ChunkEvent::Data { start, end } => assert_eq!(&input[start..end], b"lo"),
            other => panic!("expected data, got {other:?}"),
        }
        assert!(matches!(
            decoder.next(input, &mut parsed, input.len()).unwrap().unwrap(),
            ChunkEvent::Last { .. }
        ));
        assert_eq!(decoder.phase(), ChunkPhase::Done);
    }

    #[test]
    fn framing_faults() {
        assert_eq!(decode_all(b"xyz\r\n"), Err(ParseError::bad_chunk("chunk size missing")));
        assert_eq!(
            decode_all(b"5\r\nhelloBad"),
            Err(ParseError::bad_chunk("missing CR after chunk data"))
        );
        assert_eq!(
            decode_all(b"5\r\nhello\rX0\r\n"),
            Err(ParseError::bad_chunk("missing LF after chunk data"))
        );
        assert_eq!(
            decode_all(b"ffffffffffffffffff\r\n"),
            Err(ParseError::bad_chunk("chunk size overflow"))
        );
        assert_eq!(decode_all(b"5\nhello"), Err(ParseError::bad_chunk("invalid chunk size")));
    }

    #[test]
    fn size_zero_with_extension() {
        let input = b"0;final=1\r\n";
        let mut decoder = ChunkedDecoder::new();
        let mut parsed = 0;
        match decoder.next(input, &mut parsed, input.len()).unwrap().unwrap() {
            ChunkEvent::Last { ext } => assert_eq!(ext.slice(input), b";final=1"),
            other => panic!("expected the last chunk, got {other:?}"),
        }
    }
}
