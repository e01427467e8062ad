//! The resumable HTTP/1.1 message parser.
//!
//! [`MessageParser`] owns a growable byte buffer with two cursors:
//! `committed` (bytes supplied by the caller) and `parsed` (bytes consumed
//! by the state machine), with `0 <= parsed <= committed <= capacity` at all
//! times. Callers obtain a writable region from [`MessageParser::prepare`],
//! copy bytes in, [`MessageParser::commit`] a count, and call the `parse_*`
//! operations until they report [`Status::Complete`] or fail.
//!
//! `NeedMore` preserves all intermediate state: the next call resumes at the
//! same cursor, and every partition of the same input yields the same final
//! state, header container, and body bytes. Syntax and policy errors move
//! the parser to [`State::Failed`], which is terminal until
//! [`MessageParser::reset`].
//!
//! The parser never performs I/O and never references caller memory after
//! `commit` returns.

use bytes::BytesMut;
use tracing::trace;

use crate::bnf::{list_items, ProtocolList, TokenList, TransferCodingList};
use crate::chars;
use crate::codec::chunked::{ChunkEvent, ChunkPhase, ChunkedDecoder};
use crate::codec::field_line::{apply_folds, scan_field_line, FieldScan};
use crate::codec::start_line::{parse_request_line, parse_status_line, StartLine};
use crate::ensure;
use crate::protocol::{
    BodyPart, Entry, FieldId, Fields, Framing, MessageKind, ParseError, Span, Status, Version,
};

/// Fixed buffer growth increment.
const ALLOC_INCREMENT: usize = 4096;

/// Default cap on start-line + fields + terminating CRLF.
pub const DEFAULT_HEADER_LIMIT: usize = 8192;

/// Parser policy knobs. The message kind is chosen at construction.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Max size of start-line + fields + terminating CRLF, in bytes.
    /// The chunked trailer block is held to the same limit.
    pub header_limit: usize,
    /// Max body size once framing is known; `None` is unbounded.
    pub body_limit: Option<u64>,
    /// Whether containers produced by the parser validate `append` input.
    pub validate_field_characters: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self { header_limit: DEFAULT_HEADER_LIMIT, body_limit: None, validate_field_characters: true }
    }
}

/// Observable parser state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// No bytes seen yet
    NothingYet,
    /// Reading the request or status line
    StartLine,
    /// Reading header fields
    Fields,
    /// Reading a length-delimited or until-EOF body
    Body,
    /// Reading a chunk-size line
    ChunkHeader,
    /// Reading chunk data
    ChunkBody,
    /// Reading trailer fields
    ChunkTrailer,
    /// The message is fully parsed
    Complete,
    /// A fault occurred; terminal until `reset`
    Failed,
}

/// Outcome of a body-part operation, as buffer ranges. Slicing happens in
/// the public wrappers so the borrow does not span parser mutation.
enum PartOutcome {
    Part { start: usize, end: usize },
    Eof,
    NeedMore,
}

/// Incremental HTTP/1.1 message parser. See the module documentation.
pub struct MessageParser {
    kind: MessageKind,
    config: ParserConfig,
    state: State,

    buf: Vec<u8>,
    committed: usize,
    parsed: usize,
    eof: bool,

    version: Option<Version>,
    method: Option<Span>,
    target: Option<Span>,
    status: Option<u16>,
    reason: Option<Span>,
    fields_start: usize,

    entries: Vec<Entry>,
    content_length: Option<u64>,
    te_seen: bool,
    te_chunked: bool,
    conn_close: bool,
    conn_keep_alive: bool,
    keep_alive: bool,
    upgrade: bool,

    framing: Option<Framing>,
    remaining: u64,
    fields: Option<Fields>,

    chunked: ChunkedDecoder,
    chunk_ext: Option<Span>,
    trailer_start: usize,
    trailer_entries: Vec<Entry>,
    trailers: Option<Fields>,

    body_acc: BytesMut,
    body_total: u64,
}

impl MessageParser {
    /// Creates a parser for request messages with the default configuration.
    pub fn request() -> Self {
        Self::with_config(MessageKind::Request, ParserConfig::default())
    }

    /// Creates a parser for response messages with the default configuration.
    pub fn response() -> Self {
        Self::with_config(MessageKind::Response, ParserConfig::default())
    }

    /// Creates a parser for the given message kind and configuration.
    pub fn with_config(kind: MessageKind, config: ParserConfig) -> Self {
        Self {
            kind,
            config,
            state: State::NothingYet,
            buf: Vec::new(),
            committed: 0,
            parsed: 0,
            eof: false,
            version: None,
            method: None,
            target: None,
            status: None,
            reason: None,
            fields_start: 0,
            entries: Vec::new(),
            content_length: None,
            te_seen: false,
            te_chunked: false,
            conn_close: false,
            conn_keep_alive: false,
            keep_alive: true,
            upgrade: false,
            framing: None,
            remaining: 0,
            fields: None,
            chunked: ChunkedDecoder::new(),
            chunk_ext: None,
            trailer_start: 0,
            trailer_entries: Vec::new(),
            trailers: None,
            body_acc: BytesMut::new(),
            body_total: 0,
        }
    }

    //--------------------------------------------------------------------
    // Input
    //--------------------------------------------------------------------

    /// Returns a writable region of at least one byte.
    ///
    /// When the tail free space is exhausted the buffer grows by a fixed
    /// increment, relocating data up to `committed`; offsets into the
    /// buffer stay valid, previously returned slices do not.
    pub fn prepare(&mut self) -> &mut [u8] {
        if self.committed == self.buf.len() {
            let len = self.buf.len();
            self.buf.resize(len + ALLOC_INCREMENT, 0);
        }
        &mut self.buf[self.committed..]
    }

    /// Marks `n` bytes of the prepared region as delivered.
    ///
    /// `commit(0)` is a no-op.
    ///
    /// # Panics
    /// If `n` exceeds the prepared region.
    pub fn commit(&mut self, n: usize) {
        assert!(n <= self.buf.len() - self.committed, "commit exceeds the prepared region");
        self.committed += n;
    }

    /// Marks the input stream as ended. Parse operations that still need
    /// bytes afterwards report [`ParseError::Incomplete`]; an until-EOF
    /// body completes.
    pub fn commit_eof(&mut self) {
        self.eof = true;
    }

    /// Copies a whole slice through the prepare/commit cycle.
    pub fn feed(&mut self, mut bytes: &[u8]) {
        while !bytes.is_empty() {
            let region = self.prepare();
            let n = std::cmp::min(region.len(), bytes.len());
            region[..n].copy_from_slice(&bytes[..n]);
            self.commit(n);
            bytes = &bytes[n..];
        }
    }

    //--------------------------------------------------------------------
    // Parse operations
    //--------------------------------------------------------------------

    /// Advances through start line and fields until the header block is
    /// complete. Idempotent once complete.
    pub fn parse_header(&mut self) -> Result<Status, ParseError> {
        self.not_failed()?;
        self.fallible(Self::parse_header_inner)
    }

    /// Advances until the whole body is consumed, buffering it for
    /// [`MessageParser::body`]. Drives chunk framing and trailers when the
    /// message is chunked.
    pub fn parse_body(&mut self) -> Result<Status, ParseError> {
        self.not_failed()?;
        self.fallible(Self::parse_body_inner)
    }

    /// Yields the next available run of body bytes without copying, or
    /// `None` when more input is required. [`BodyPart::Eof`] marks body
    /// completion (for chunked messages, after the trailer block).
    pub fn parse_body_part(&mut self) -> Result<Option<BodyPart<'_>>, ParseError> {
        self.not_failed()?;
        let outcome = self.fallible(Self::body_part_outcome)?;
        Ok(self.into_part(outcome))
    }

    /// Returns the chunk-extension text of the current chunk, driving the
    /// framer through the chunk-size line if needed. `None` means more
    /// input is required.
    ///
    /// Calling this on a message whose body is not chunked is a usage
    /// fault; it reports `BadMessage` without failing the parser.
    pub fn parse_chunk_ext(&mut self) -> Result<Option<&[u8]>, ParseError> {
        self.not_failed()?;
        self.chunked_only()?;
        let span = self.fallible(Self::chunk_ext_outcome)?;
        Ok(span.map(|s| s.slice(&self.buf)))
    }

    /// Yields the next data slice of the current chunk sequence, or
    /// [`BodyPart::Eof`] once the zero-size chunk is consumed. Does not
    /// parse the trailer block.
    ///
    /// Calling this on a message whose body is not chunked is a usage
    /// fault; it reports `BadMessage` without failing the parser.
    pub fn parse_chunk_part(&mut self) -> Result<Option<BodyPart<'_>>, ParseError> {
        self.not_failed()?;
        self.chunked_only()?;
        let outcome = self.fallible(Self::chunk_part_outcome)?;
        Ok(self.into_part(outcome))
    }

    /// Parses the trailer block after the final chunk and returns the
    /// trailer container once complete. `None` means more input is
    /// required.
    pub fn parse_chunk_trailer(&mut self) -> Result<Option<&Fields>, ParseError> {
        self.not_failed()?;
        self.chunked_only()?;
        ensure!(
            !matches!(self.state, State::ChunkHeader | State::ChunkBody),
            ParseError::bad_message("chunk data pending")
        );
        if self.state == State::ChunkTrailer {
            let status = self.fallible(|p| {
                let status = p.parse_trailer_block()?;
                if status == Status::NeedMore && p.eof {
                    return Err(ParseError::Incomplete);
                }
                Ok(status)
            })?;
            if status == Status::NeedMore {
                return Ok(None);
            }
        }
        Ok(self.trailers.as_ref())
    }

    /// Returns to the initial state, discarding message state but keeping
    /// buffer capacity. Uncommitted and unparsed bytes are dropped; no
    /// prior state leaks into the next message.
    pub fn reset(&mut self) {
        self.state = State::NothingYet;
        self.committed = 0;
        self.parsed = 0;
        self.eof = false;
        self.version = None;
        self.method = None;
        self.target = None;
        self.status = None;
        self.reason = None;
        self.fields_start = 0;
        self.entries.clear();
        self.content_length = None;
        self.te_seen = false;
        self.te_chunked = false;
        self.conn_close = false;
        self.conn_keep_alive = false;
        self.keep_alive = true;
        self.upgrade = false;
        self.framing = None;
        self.remaining = 0;
        self.fields = None;
        self.chunked = ChunkedDecoder::new();
        self.chunk_ext = None;
        self.trailer_start = 0;
        self.trailer_entries.clear();
        self.trailers = None;
        self.body_acc.clear();
        self.body_total = 0;
    }

    //--------------------------------------------------------------------
    // Observers
    //--------------------------------------------------------------------

    /// The materialized body accumulated by [`MessageParser::parse_body`].
    /// Empty when the caller streamed the body instead.
    pub fn body(&self) -> &[u8] {
        &self.body_acc
    }

    /// The header container, once the header block is complete.
    pub fn fields(&self) -> Option<&Fields> {
        self.fields.as_ref()
    }

    /// Moves the header container out as an independent value.
    pub fn detach_fields(&mut self) -> Option<Fields> {
        self.fields.take()
    }

    /// The trailer container, once a chunked message is complete.
    pub fn trailers(&self) -> Option<&Fields> {
        self.trailers.as_ref()
    }

    /// Moves the trailer container out as an independent value.
    pub fn detach_trailers(&mut self) -> Option<Fields> {
        self.trailers.take()
    }

    /// The HTTP version from the start line.
    pub fn version(&self) -> Option<Version> {
        self.version
    }

    /// The request method, for request parsers.
    pub fn method(&self) -> Option<&str> {
        let span = self.method?;
        let bytes = span.slice(&self.buf);
        // SAFETY: the method is a tchar run, so it is ASCII
        Some(unsafe { std::str::from_utf8_unchecked(bytes) })
    }

    /// The request target, byte-preserving, for request parsers.
    pub fn target(&self) -> Option<&[u8]> {
        self.target.map(|s| s.slice(&self.buf))
    }

    /// The status code, for response parsers.
    pub fn status_code(&self) -> Option<u16> {
        self.status
    }

    /// The reason phrase (may contain obs-text), for response parsers.
    pub fn reason(&self) -> Option<&[u8]> {
        self.reason.map(|s| s.slice(&self.buf))
    }

    /// Connection disposition, meaningful once the header block is parsed.
    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    /// True if the message asked for a protocol upgrade.
    pub fn upgrade_requested(&self) -> bool {
        self.upgrade
    }

    /// The declared Content-Length, if any.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// The resolved body framing, once the header block is parsed.
    pub fn framing(&self) -> Option<Framing> {
        self.framing
    }

    /// True if the body uses chunked transfer coding.
    pub fn is_chunked(&self) -> bool {
        self.framing.is_some_and(|f| f.is_chunked())
    }

    /// True if the message carries body bytes.
    pub fn has_body(&self) -> bool {
        self.framing.is_some_and(|f| f.has_body())
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == State::Complete
    }

    pub fn is_failed(&self) -> bool {
        self.state == State::Failed
    }

    //--------------------------------------------------------------------
    // State machine
    //--------------------------------------------------------------------

    fn not_failed(&self) -> Result<(), ParseError> {
        ensure!(self.state != State::Failed, ParseError::bad_message("parser is in the failed state"));
        Ok(())
    }

    fn chunked_only(&self) -> Result<(), ParseError> {
        ensure!(
            matches!(self.framing, Some(Framing::Chunked)),
            ParseError::bad_message("message body is not chunked")
        );
        Ok(())
    }

    /// Runs a parse step, moving to `Failed` on any error.
    fn fallible<T>(
        &mut self,
        step: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        match step(self) {
            Err(e) => {
                self.state = State::Failed;
                Err(e)
            }
            ok => ok,
        }
    }

    /// Maps an outcome onto a borrowed body part.
    fn into_part(&self, outcome: PartOutcome) -> Option<BodyPart<'_>> {
        match outcome {
            PartOutcome::Part { start, end } => Some(BodyPart::Chunk(&self.buf[start..end])),
            PartOutcome::Eof => Some(BodyPart::Eof),
            PartOutcome::NeedMore => None,
        }
    }

    fn suspend(&self) -> Result<Status, ParseError> {
        if self.eof {
            Err(ParseError::Incomplete)
        } else {
            Ok(Status::NeedMore)
        }
    }

    fn check_header_limit(&self, current: usize) -> Result<(), ParseError> {
        ensure!(
            current <= self.config.header_limit,
            ParseError::header_limit(current, self.config.header_limit)
        );
        Ok(())
    }

    fn bump_body(&mut self, n: u64) -> Result<(), ParseError> {
        self.body_total += n;
        if let Some(limit) = self.config.body_limit {
            ensure!(self.body_total <= limit, ParseError::body_limit(self.body_total, limit));
        }
        Ok(())
    }

    fn parse_header_inner(&mut self) -> Result<Status, ParseError> {
        loop {
            match self.state {
                State::NothingYet => {
                    if self.parsed == self.committed {
                        return self.suspend();
                    }
                    self.state = State::StartLine;
                }
                State::StartLine => {
                    let Some((line_end, next)) = find_line(&self.buf, self.committed, self.parsed)?
                    else {
                        self.check_header_limit(self.committed)?;
                        return self.suspend();
                    };
                    self.check_header_limit(next)?;
                    let line = match self.kind {
                        MessageKind::Request => parse_request_line(&self.buf, self.parsed, line_end)?,
                        MessageKind::Response => parse_status_line(&self.buf, self.parsed, line_end)?,
                    };
                    match line {
                        StartLine::Request { method, target, version } => {
                            self.method = Some(method);
                            self.target = Some(target);
                            self.version = Some(version);
                        }
                        StartLine::Response { version, status, reason } => {
                            self.version = Some(version);
                            self.status = Some(status);
                            self.reason = Some(reason);
                        }
                    }
                    trace!(version = ?self.version, "parsed start line");
                    self.parsed = next;
                    self.fields_start = next;
                    self.state = State::Fields;
                }
                State::Fields => match scan_field_line(&self.buf, self.committed, self.parsed)? {
                    FieldScan::NeedMore => {
                        self.check_header_limit(self.committed)?;
                        return self.suspend();
                    }
                    FieldScan::BlockEnd { next } => {
                        self.check_header_limit(next)?;
                        self.parsed = next;
                        self.finish_headers()?;
                    }
                    FieldScan::Field { name, value, folds, next } => {
                        self.check_header_limit(next)?;
                        apply_folds(&mut self.buf, &folds);
                        let id = FieldId::from_name(name.slice(&self.buf));
                        self.on_field(id, value)?;
                        self.entries.push(Entry { id, name, value });
                        self.parsed = next;
                    }
                },
                _ => return Ok(Status::Complete),
            }
        }
    }

    /// Per-field semantic dispatch for the well-known framing fields.
    /// Handlers only ever halt parsing of the current message; they never
    /// mutate state recorded by earlier fields.
    fn on_field(&mut self, id: FieldId, value: Span) -> Result<(), ParseError> {
        match id {
            FieldId::Connection | FieldId::ProxyConnection => {
                let mut close = false;
                let mut keep_alive = false;
                let mut upgrade = false;
                for token in list_items::<TokenList>(value.slice(&self.buf)) {
                    let token =
                        token.map_err(|_| ParseError::bad_value("malformed connection list"))?;
                    if chars::eq_ignore_case(token, b"close") {
                        close = true;
                    } else if chars::eq_ignore_case(token, b"keep-alive") {
                        keep_alive = true;
                    } else if chars::eq_ignore_case(token, b"upgrade") {
                        upgrade = true;
                    }
                }
                self.conn_close |= close;
                self.conn_keep_alive |= keep_alive;
                self.upgrade |= upgrade;
            }
            FieldId::ContentLength => {
                let n = parse_content_length(value.slice(&self.buf))?;
                if let Some(prev) = self.content_length {
                    ensure!(prev == n, ParseError::bad_content_length("conflicting values"));
                }
                self.content_length = Some(n);
            }
            FieldId::TransferEncoding => {
                let mut chunked_last = self.te_chunked;
                for name in list_items::<TransferCodingList>(value.slice(&self.buf)) {
                    let name = name
                        .map_err(|_| ParseError::bad_transfer_encoding("malformed coding list"))?;
                    ensure!(
                        !chunked_last,
                        ParseError::bad_transfer_encoding("chunked must be the final coding")
                    );
                    chunked_last = chars::eq_ignore_case(name, b"chunked");
                }
                self.te_seen = true;
                self.te_chunked = chunked_last;
            }
            FieldId::Upgrade => {
                let mut any = false;
                for proto in list_items::<ProtocolList>(value.slice(&self.buf)) {
                    proto.map_err(|_| ParseError::bad_value("malformed upgrade list"))?;
                    any = true;
                }
                self.upgrade |= any;
            }
            _ => {}
        }
        Ok(())
    }

    /// Resolves framing and connection disposition, materializes the header
    /// container, and moves to the body phase.
    fn finish_headers(&mut self) -> Result<(), ParseError> {
        ensure!(
            !(self.te_seen && self.content_length.is_some()),
            ParseError::bad_message("transfer-encoding with content-length")
        );
        let Some(version) = self.version else {
            return Err(ParseError::bad_message("missing start line"));
        };

        self.keep_alive = match version {
            Version::Http11 => !self.conn_close,
            Version::Http10 => self.conn_keep_alive && !self.conn_close,
        };

        let framing = if self.te_chunked {
            Framing::Chunked
        } else if let Some(n) = self.content_length {
            Framing::Length(n)
        } else {
            match self.kind {
                MessageKind::Request => Framing::None,
                MessageKind::Response => Framing::UntilEof,
            }
        };
        self.framing = Some(framing);

        let entries = std::mem::take(&mut self.entries);
        self.fields = Some(Fields::from_parsed(
            &self.buf[..self.parsed],
            self.fields_start,
            entries,
            self.config.validate_field_characters,
        ));

        trace!(?framing, keep_alive = self.keep_alive, "parsed header block");

        self.state = match framing {
            Framing::Chunked => State::ChunkHeader,
            Framing::Length(0) | Framing::None => State::Complete,
            Framing::Length(n) => {
                self.remaining = n;
                State::Body
            }
            Framing::UntilEof => State::Body,
        };
        Ok(())
    }

    fn parse_body_inner(&mut self) -> Result<Status, ParseError> {
        loop {
            match self.state {
                State::NothingYet | State::StartLine | State::Fields => return Ok(Status::NeedMore),
                State::Complete => return Ok(Status::Complete),
                State::Body => return self.parse_plain_body(),
                State::ChunkHeader | State::ChunkBody => {
                    match self.chunked.next(&self.buf, &mut self.parsed, self.committed)? {
                        Some(ChunkEvent::Header { ext, .. }) => {
                            self.chunk_ext = Some(ext);
                            self.sync_chunk_state();
                        }
                        Some(ChunkEvent::Data { start, end }) => {
                            self.bump_body((end - start) as u64)?;
                            self.body_acc.extend_from_slice(&self.buf[start..end]);
                            self.sync_chunk_state();
                        }
                        Some(ChunkEvent::Last { ext }) => {
                            self.chunk_ext = Some(ext);
                            self.trailer_start = self.parsed;
                            self.state = State::ChunkTrailer;
                        }
                        None => return self.suspend(),
                    }
                }
                State::ChunkTrailer => {
                    return if self.parse_trailer_block()?.is_complete() {
                        Ok(Status::Complete)
                    } else {
                        self.suspend()
                    };
                }
                State::Failed => {
                    return Err(ParseError::bad_message("parser is in the failed state"))
                }
            }
        }
    }

    /// One pass over a length-delimited or until-EOF body, buffering into
    /// the accumulator.
    fn parse_plain_body(&mut self) -> Result<Status, ParseError> {
        let avail = self.committed - self.parsed;
        match self.framing {
            Some(Framing::Length(_)) => {
                let take = std::cmp::min(self.remaining, avail as u64) as usize;
                if take > 0 {
                    self.bump_body(take as u64)?;
                    let start = self.parsed;
                    self.body_acc.extend_from_slice(&self.buf[start..start + take]);
                    self.parsed += take;
                    self.remaining -= take as u64;
                }
                if self.remaining == 0 {
                    self.state = State::Complete;
                    trace!(len = self.body_total, "body complete");
                    return Ok(Status::Complete);
                }
                self.suspend()
            }
            Some(Framing::UntilEof) => {
                if avail > 0 {
                    self.bump_body(avail as u64)?;
                    let start = self.parsed;
                    self.body_acc.extend_from_slice(&self.buf[start..start + avail]);
                    self.parsed += avail;
                }
                if self.eof {
                    self.state = State::Complete;
                    trace!(len = self.body_total, "body complete at eof");
                    return Ok(Status::Complete);
                }
                Ok(Status::NeedMore)
            }
            _ => Err(ParseError::bad_message("no body framing")),
        }
    }

    fn body_part_outcome(&mut self) -> Result<PartOutcome, ParseError> {
        loop {
            match self.state {
                State::NothingYet | State::StartLine | State::Fields => {
                    return Ok(PartOutcome::NeedMore)
                }
                State::Complete => return Ok(PartOutcome::Eof),
                State::Body => return self.plain_body_part(),
                State::ChunkHeader | State::ChunkBody => {
                    if let Some(outcome) = self.chunk_step()? {
                        return Ok(outcome);
                    }
                    // the framer reached the trailer section; loop
                }
                State::ChunkTrailer => {
                    return if self.parse_trailer_block()?.is_complete() {
                        Ok(PartOutcome::Eof)
                    } else if self.eof {
                        Err(ParseError::Incomplete)
                    } else {
                        Ok(PartOutcome::NeedMore)
                    };
                }
                State::Failed => {
                    return Err(ParseError::bad_message("parser is in the failed state"))
                }
            }
        }
    }

    /// One streamed part of a length-delimited or until-EOF body.
    fn plain_body_part(&mut self) -> Result<PartOutcome, ParseError> {
        let avail = self.committed - self.parsed;
        match self.framing {
            Some(Framing::Length(_)) => {
                let take = std::cmp::min(self.remaining, avail as u64) as usize;
                if take == 0 {
                    return if self.eof {
                        Err(ParseError::Incomplete)
                    } else {
                        Ok(PartOutcome::NeedMore)
                    };
                }
                self.bump_body(take as u64)?;
                let start = self.parsed;
                self.parsed += take;
                self.remaining -= take as u64;
                if self.remaining == 0 {
                    self.state = State::Complete;
                }
                Ok(PartOutcome::Part { start, end: start + take })
            }
            Some(Framing::UntilEof) => {
                if avail == 0 {
                    if self.eof {
                        self.state = State::Complete;
                        return Ok(PartOutcome::Eof);
                    }
                    return Ok(PartOutcome::NeedMore);
                }
                self.bump_body(avail as u64)?;
                let start = self.parsed;
                self.parsed += avail;
                Ok(PartOutcome::Part { start, end: start + avail })
            }
            _ => Err(ParseError::bad_message("no body framing")),
        }
    }

    /// Advances the chunk framer one event. `Ok(None)` means the framer
    /// entered the trailer section and the caller should continue there.
    fn chunk_step(&mut self) -> Result<Option<PartOutcome>, ParseError> {
        match self.chunked.next(&self.buf, &mut self.parsed, self.committed)? {
            Some(ChunkEvent::Header { ext, .. }) => {
                self.chunk_ext = Some(ext);
                self.sync_chunk_state();
                self.chunk_step()
            }
            Some(ChunkEvent::Data { start, end }) => {
                self.bump_body((end - start) as u64)?;
                self.sync_chunk_state();
                Ok(Some(PartOutcome::Part { start, end }))
            }
            Some(ChunkEvent::Last { ext }) => {
                self.chunk_ext = Some(ext);
                self.trailer_start = self.parsed;
                self.state = State::ChunkTrailer;
                Ok(None)
            }
            None => {
                if self.eof {
                    Err(ParseError::Incomplete)
                } else {
                    Ok(Some(PartOutcome::NeedMore))
                }
            }
        }
    }

    fn chunk_part_outcome(&mut self) -> Result<PartOutcome, ParseError> {
        match self.state {
            State::ChunkHeader | State::ChunkBody => match self.chunk_step()? {
                Some(outcome) => Ok(outcome),
                None => Ok(PartOutcome::Eof),
            },
            State::ChunkTrailer | State::Complete => Ok(PartOutcome::Eof),
            _ => Err(ParseError::bad_message("no chunked body pending")),
        }
    }

    fn chunk_ext_outcome(&mut self) -> Result<Option<Span>, ParseError> {
        match self.state {
            State::ChunkHeader => {
                match self.chunked.next(&self.buf, &mut self.parsed, self.committed)? {
                    Some(ChunkEvent::Header { ext, .. }) => {
                        self.chunk_ext = Some(ext);
                        self.sync_chunk_state();
                        Ok(Some(ext))
                    }
                    Some(ChunkEvent::Last { ext }) => {
                        self.chunk_ext = Some(ext);
                        self.trailer_start = self.parsed;
                        self.state = State::ChunkTrailer;
                        Ok(Some(ext))
                    }
                    Some(ChunkEvent::Data { .. }) => unreachable!("data before the chunk-size line"),
                    None => {
                        if self.eof {
                            Err(ParseError::Incomplete)
                        } else {
                            Ok(None)
                        }
                    }
                }
            }
            State::ChunkBody | State::ChunkTrailer | State::Complete => Ok(self.chunk_ext),
            _ => Err(ParseError::bad_message("no chunked body pending")),
        }
    }

    fn sync_chunk_state(&mut self) {
        self.state = match self.chunked.phase() {
            ChunkPhase::Header => State::ChunkHeader,
            ChunkPhase::Body => State::ChunkBody,
            ChunkPhase::Done => State::ChunkTrailer,
        };
    }

    /// Parses trailer fields with the header field grammar, building the
    /// trailer container at the closing CRLF.
    fn parse_trailer_block(&mut self) -> Result<Status, ParseError> {
        loop {
            match scan_field_line(&self.buf, self.committed, self.parsed)? {
                FieldScan::NeedMore => {
                    self.check_header_limit(self.committed - self.trailer_start)?;
                    return Ok(Status::NeedMore);
                }
                FieldScan::BlockEnd { next } => {
                    self.check_header_limit(next - self.trailer_start)?;
                    self.parsed = next;
                    let mut entries = std::mem::take(&mut self.trailer_entries);
                    for entry in &mut entries {
                        entry.name.pos -= self.trailer_start;
                        entry.value.pos -= self.trailer_start;
                    }
                    self.trailers = Some(Fields::from_parsed(
                        &self.buf[self.trailer_start..next],
                        0,
                        entries,
                        self.config.validate_field_characters,
                    ));
                    self.state = State::Complete;
                    trace!("parsed chunk trailer");
                    return Ok(Status::Complete);
                }
                FieldScan::Field { name, value, folds, next } => {
                    self.check_header_limit(next - self.trailer_start)?;
                    apply_folds(&mut self.buf, &folds);
                    let id = FieldId::from_name(name.slice(&self.buf));
                    self.trailer_entries.push(Entry { id, name, value });
                    self.parsed = next;
                }
            }
        }
    }
}

/// Locates the CRLF ending the line at `start`, returning the CR position
/// and the position after the LF. Bare CR or LF is a fault; an unfinished
/// CR at the committed edge is not yet decidable.
fn find_line(
    buf: &[u8],
    committed: usize,
    start: usize,
) -> Result<Option<(usize, usize)>, ParseError> {
    let mut at = start;
    while at < committed {
        match buf[at] {
            b'\r' => {
                if at + 1 == committed {
                    return Ok(None);
                }
                return if buf[at + 1] == b'\n' {
                    Ok(Some((at, at + 2)))
                } else {
                    Err(ParseError::BadLineEnding)
                };
            }
            b'\n' => return Err(ParseError::BadLineEnding),
            _ => at += 1,
        }
    }
    Ok(None)
}

/// Parses Content-Length as a strict unsigned decimal: no sign, no
/// whitespace, no empty value.
fn parse_content_length(bytes: &[u8]) -> Result<u64, ParseError> {
    ensure!(!bytes.is_empty(), ParseError::bad_content_length("empty value"));
    let mut n: u64 = 0;
    for &b in bytes {
        ensure!(chars::is_digit(b), ParseError::bad_content_length("not an unsigned decimal"));
        n = n
            .checked_mul(10)
            .and_then(|n| n.checked_add((b - b'0') as u64))
            .ok_or(ParseError::bad_content_length("value overflow"))?;
    }
    Ok(n)
}
