//! Append-only header field container.
//!
//! [`Fields`] stores a message's field block in one contiguous byte buffer
//! holding an optional prefix region (reserved for start-line text), the
//! serialized field lines, and the terminating CRLF. A parallel table of
//! entries records `(id, name span, value span)` triples as offsets into
//! that buffer, so buffer growth never invalidates the table.
//!
//! Properties:
//!
//! - Field order is preserved: insertion order equals on-wire order.
//! - Multiple entries with the same id or name are permitted; iteration
//!   yields them in order.
//! - [`Fields::str_bytes`] returns the exact on-wire serialization, and
//!   parsing it back yields the same sequence of fields.
//! - Name lookups are ASCII case-insensitive; value bytes are verbatim.
//! - Read-only observation never allocates.

use bytes::BytesMut;

use crate::bnf;
use crate::chars;
use crate::protocol::{FieldError, FieldId};

/// An offset+length window into the container buffer.
///
/// Spans are indices rather than pointers so that buffer relocation only
/// invalidates external views, never the table itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    pub(crate) pos: usize,
    pub(crate) len: usize,
}

impl Span {
    pub(crate) fn new(pos: usize, len: usize) -> Self {
        Self { pos, len }
    }

    pub(crate) fn slice<'a>(&self, buf: &'a [u8]) -> &'a [u8] {
        &buf[self.pos..self.pos + self.len]
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub(crate) id: FieldId,
    pub(crate) name: Span,
    pub(crate) value: Span,
}

/// One field as seen through the container: id, name, and verbatim value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field<'a> {
    id: FieldId,
    name: &'a str,
    value: &'a [u8],
}

impl<'a> Field<'a> {
    #[inline]
    pub fn id(&self) -> FieldId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &'a str {
        self.name
    }

    #[inline]
    pub fn value(&self) -> &'a [u8] {
        self.value
    }
}

/// Lookup key: either a well-known id or a (case-insensitive) name.
#[derive(Debug, Clone, Copy)]
pub enum Key<'a> {
    Id(FieldId),
    Name(&'a str),
}

impl From<FieldId> for Key<'static> {
    fn from(id: FieldId) -> Self {
        Key::Id(id)
    }
}

impl<'a> From<&'a str> for Key<'a> {
    fn from(name: &'a str) -> Self {
        Key::Name(name)
    }
}

/// The header container. See the module documentation.
#[derive(Debug)]
pub struct Fields {
    buf: BytesMut,
    prefix: usize,
    entries: Vec<Entry>,
    validate: bool,
}

impl Default for Fields {
    fn default() -> Self {
        Self::new()
    }
}

const BLOCK_END: &[u8] = b"\r\n";

impl Fields {
    /// Creates an empty container with `append` validation enabled.
    pub fn new() -> Self {
        Self::with_validation(true)
    }

    /// Creates an empty container, choosing whether `append` validates
    /// names and values against the field grammar.
    ///
    /// Disabling validation is for trusted serialization paths only; the
    /// round-trip invariant on [`Fields::str_bytes`] is then the caller's
    /// responsibility.
    pub fn with_validation(validate: bool) -> Self {
        let mut buf = BytesMut::with_capacity(BLOCK_END.len());
        buf.extend_from_slice(BLOCK_END);
        Self { buf, prefix: 0, entries: Vec::new(), validate }
    }

    /// Builds a container from a parsed region: `buf` holds
    /// prefix + field lines + terminating CRLF, with entry spans relative
    /// to the start of `buf`. The region is copied; the result never
    /// aliases parser storage.
    pub(crate) fn from_parsed(
        buf: &[u8],
        prefix: usize,
        entries: Vec<Entry>,
        validate: bool,
    ) -> Self {
        let mut owned = BytesMut::with_capacity(buf.len());
        owned.extend_from_slice(buf);
        Self { buf: owned, prefix, entries, validate }
    }

    /// Number of fields in the container.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the i-th field.
    ///
    /// # Panics
    /// If `i >= len()`; use [`Fields::try_get`] for a checked lookup.
    pub fn get(&self, i: usize) -> Field<'_> {
        self.field_at(&self.entries[i])
    }

    /// Returns the i-th field, or `OutOfRange`.
    pub fn try_get(&self, i: usize) -> Result<Field<'_>, FieldError> {
        self.entries
            .get(i)
            .map(|e| self.field_at(e))
            .ok_or_else(|| FieldError::out_of_range(i, self.entries.len()))
    }

    /// Returns true if any field matches.
    pub fn exists<'k>(&self, key: impl Into<Key<'k>>) -> bool {
        let key = key.into();
        self.entries.iter().any(|e| self.matches(e, &key))
    }

    /// Returns the number of matching fields.
    pub fn count<'k>(&self, key: impl Into<Key<'k>>) -> usize {
        let key = key.into();
        self.entries.iter().filter(|e| self.matches(e, &key)).count()
    }

    /// Returns the value of the first matching field, or `NotFound`.
    pub fn at<'k>(&self, key: impl Into<Key<'k>>) -> Result<&[u8], FieldError> {
        self.find(key).map(|f| f.value).ok_or(FieldError::NotFound)
    }

    /// Returns the value of the first matching field, or the given default.
    pub fn value_or<'a, 'k>(&'a self, key: impl Into<Key<'k>>, default: &'a [u8]) -> &'a [u8] {
        self.find(key).map(|f| f.value).unwrap_or(default)
    }

    /// Returns the first matching field, or `None`.
    pub fn find<'k>(&self, key: impl Into<Key<'k>>) -> Option<Field<'_>> {
        let key = key.into();
        self.entries.iter().find(|e| self.matches(e, &key)).map(|e| self.field_at(e))
    }

    /// Returns a forward iterator over all matching fields, in insertion
    /// order.
    pub fn matching<'s, 'k>(&'s self, key: impl Into<Key<'k>>) -> Matching<'s, 'k> {
        Matching { fields: self, key: key.into(), at: 0 }
    }

    /// Iterates every field in insertion order.
    pub fn iter(&self) -> Iter<'_> {
        Iter { fields: self, at: 0 }
    }

    /// The exact serialized form: prefix + field lines + terminating CRLF.
    pub fn str_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// The prefix region reserved via [`Fields::resize_prefix`].
    pub fn prefix(&self) -> &[u8] {
        &self.buf[..self.prefix]
    }

    /// Reserves exactly `n` bytes of prefix and returns the writable
    /// region. Previously returned views are invalidated; field bytes are
    /// preserved. A grown prefix is zero-filled.
    pub fn resize_prefix(&mut self, n: usize) -> &mut [u8] {
        let old = self.prefix;
        if n > old {
            let grow = n - old;
            let tail = self.buf.len() - old;
            self.buf.resize(self.buf.len() + grow, 0);
            self.buf.copy_within(old..old + tail, n);
            self.buf[old..n].fill(0);
            for entry in &mut self.entries {
                entry.name.pos += grow;
                entry.value.pos += grow;
            }
        } else if n < old {
            let shrink = old - n;
            self.buf.copy_within(old.., n);
            let len = self.buf.len() - shrink;
            self.buf.truncate(len);
            for entry in &mut self.entries {
                entry.name.pos -= shrink;
                entry.value.pos -= shrink;
            }
        }
        self.prefix = n;
        &mut self.buf[..n]
    }

    /// Reserves capacity for at least `n` additional bytes of storage.
    pub fn reserve(&mut self, n: usize) {
        self.buf.reserve(n);
    }

    /// Drops excess capacity by reallocating to the used size.
    pub fn shrink_to_fit(&mut self) {
        if self.buf.capacity() > self.buf.len() {
            let mut exact = BytesMut::with_capacity(self.buf.len());
            exact.extend_from_slice(&self.buf);
            self.buf = exact;
        }
    }

    /// Removes all fields and the prefix, keeping capacity.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.prefix = 0;
        self.buf.clear();
        self.buf.extend_from_slice(BLOCK_END);
    }

    /// Appends a well-known field, preserving multi-value order.
    ///
    /// The value must satisfy the field-content grammar when validation is
    /// enabled. `FieldId::Unknown` has no canonical name and is rejected.
    pub fn append(&mut self, id: FieldId, value: &[u8]) -> Result<(), FieldError> {
        let name = id
            .canonical()
            .ok_or(FieldError::invalid_argument("field id has no canonical name"))?;
        self.append_entry(id, name, value)
    }

    /// Appends a field by name, preserving multi-value order.
    ///
    /// The name must be a token and the value must satisfy the
    /// field-content grammar when validation is enabled.
    pub fn append_named(&mut self, name: &str, value: &[u8]) -> Result<(), FieldError> {
        self.append_entry(FieldId::from_name(name.as_bytes()), name, value)
    }

    fn append_entry(&mut self, id: FieldId, name: &str, value: &[u8]) -> Result<(), FieldError> {
        if self.validate {
            bnf::validate::<bnf::Token>(name.as_bytes())?;
            bnf::validate::<bnf::FieldValue>(value)?;
        }
        let line_start = self.buf.len() - BLOCK_END.len();
        self.buf.truncate(line_start);
        self.buf.extend_from_slice(name.as_bytes());
        self.buf.extend_from_slice(b": ");
        self.buf.extend_from_slice(value);
        self.buf.extend_from_slice(b"\r\n");
        self.buf.extend_from_slice(BLOCK_END);
        self.entries.push(Entry {
            id,
            name: Span::new(line_start, name.len()),
            value: Span::new(line_start + name.len() + 2, value.len()),
        });
        Ok(())
    }

    fn field_at(&self, entry: &Entry) -> Field<'_> {
        let name_bytes = entry.name.slice(&self.buf);
        // SAFETY: names are tchar runs on both construction paths (parser
        // grammar and validated/`&str` append), so they are ASCII.
        let name = unsafe { std::str::from_utf8_unchecked(name_bytes) };
        Field { id: entry.id, name, value: entry.value.slice(&self.buf) }
    }

    fn matches(&self, entry: &Entry, key: &Key<'_>) -> bool {
        match key {
            Key::Id(id) => entry.id == *id,
            Key::Name(name) => {
                chars::eq_ignore_case(entry.name.slice(&self.buf), name.as_bytes())
            }
        }
    }
}

/// Forward iterator over every field, in insertion order.
pub struct Iter<'a> {
    fields: &'a Fields,
    at: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = Field<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.fields.entries.get(self.at)?;
        self.at += 1;
        Some(self.fields.field_at(entry))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.fields.entries.len() - self.at;
        (rest, Some(rest))
    }
}

impl<'a> ExactSizeIterator for Iter<'a> {}

impl<'a> IntoIterator for &'a Fields {
    type Item = Field<'a>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Forward iterator over the fields matching one key, in insertion order.
pub struct Matching<'a, 'k> {
    fields: &'a Fields,
    key: Key<'k>,
    at: usize,
}

impl<'a, 'k> Iterator for Matching<'a, 'k> {
    type Item = Field<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(entry) = self.fields.entries.get(self.at) {
            self.at += 1;
            if self.fields.matches(entry, &self.key) {
                return Some(self.fields.field_at(entry));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Fields {
        let mut fields = Fields::new();
        fields.append(FieldId::Host, b"example.com").unwrap();
        fields.append(FieldId::SetCookie, b"a=1").unwrap();
        fields.append(FieldId::SetCookie, b"b=2").unwrap();
        fields.append_named("X-Widget", b"on").unwrap();
        fields
    }

    #[test]
    fn empty_serializes_to_crlf() {
        let fields = Fields::new();
        assert_eq!(fields.str_bytes(), b"\r\n");
        assert_eq!(fields.len(), 0);
        assert!(fields.is_empty());
    }

    #[test]
    fn append_preserves_wire_order() {
        let fields = sample();
        assert_eq!(
            fields.str_bytes(),
            &b"Host: example.com\r\nSet-Cookie: a=1\r\nSet-Cookie: b=2\r\nX-Widget: on\r\n\r\n"[..]
        );
        let names: Vec<_> = fields.iter().map(|f| f.name().to_owned()).collect();
        assert_eq!(names, vec!["Host", "Set-Cookie", "Set-Cookie", "X-Widget"]);
    }

    #[test]
    fn lookup_by_id_and_name() {
        let fields = sample();
        assert!(fields.exists(FieldId::Host));
        assert!(fields.exists("host"));
        assert!(fields.exists("HOST"));
        assert!(!fields.exists(FieldId::Date));

        assert_eq!(fields.count(FieldId::SetCookie), 2);
        assert_eq!(fields.count("set-cookie"), 2);

        assert_eq!(fields.at(FieldId::Host).unwrap(), b"example.com");
        assert_eq!(fields.at("sEt-CoOkIe").unwrap(), b"a=1");
        assert_eq!(fields.at("missing"), Err(FieldError::NotFound));

        assert_eq!(fields.value_or("missing", b"fallback"), b"fallback");
        assert_eq!(fields.value_or(FieldId::Host, b"fallback"), b"example.com");
    }

    #[test]
    fn matching_yields_in_order() {
        let fields = sample();
        let cookies: Vec<_> = fields.matching(FieldId::SetCookie).map(|f| f.value()).collect();
        assert_eq!(cookies, vec![&b"a=1"[..], b"b=2"]);

        let by_name: Vec<_> = fields.matching("Set-Cookie").map(|f| f.value()).collect();
        assert_eq!(by_name, cookies);
    }

    #[test]
    fn indexed_access() {
        let fields = sample();
        assert_eq!(fields.get(0).name(), "Host");
        assert_eq!(fields.try_get(1).unwrap().value(), b"a=1");
        assert_eq!(fields.try_get(9), Err(FieldError::out_of_range(9, 4)));
    }

    #[test]
    fn unknown_fields_keep_their_name() {
        let fields = sample();
        let widget = fields.find("x-widget").unwrap();
        assert_eq!(widget.id(), FieldId::Unknown);
        assert_eq!(widget.name(), "X-Widget");
        assert_eq!(widget.value(), b"on");
    }

    #[test]
    fn prefix_resizing_preserves_fields() {
        let mut fields = sample();
        let before: Vec<u8> = fields.str_bytes()[..].to_vec();

        let prefix = fields.resize_prefix(16);
        assert_eq!(prefix.len(), 16);
        prefix.copy_from_slice(b"GET / HTTP/1.1\r\n");

        assert_eq!(&fields.str_bytes()[..16], b"GET / HTTP/1.1\r\n");
        assert_eq!(&fields.str_bytes()[16..], &before[..]);
        assert_eq!(fields.at(FieldId::Host).unwrap(), b"example.com");

        fields.resize_prefix(0);
        assert_eq!(fields.str_bytes(), &before[..]);
        assert_eq!(fields.at(FieldId::Host).unwrap(), b"example.com");
    }

    #[test]
    fn clear_keeps_nothing() {
        let mut fields = sample();
        fields.resize_prefix(4);
        fields.clear();
        assert!(fields.is_empty());
        assert_eq!(fields.str_bytes(), b"\r\n");
        fields.append(FieldId::Date, b"now").unwrap();
        assert_eq!(fields.str_bytes(), b"Date: now\r\n\r\n");
    }

    #[test]
    fn append_validates_grammar() {
        let mut fields = Fields::new();
        assert!(fields.append_named("bad name", b"x").is_err());
        assert!(fields.append_named("ok", b"bad\r\nvalue").is_err());
        assert!(fields.append(FieldId::Unknown, b"x").is_err());
        assert!(fields.append_named("ok", b"").is_ok());

        let mut trusted = Fields::with_validation(false);
        assert!(trusted.append_named("ok", b"anything goes\x01").is_ok());
    }

    #[test]
    fn shrink_and_reserve() {
        let mut fields = sample();
        fields.reserve(4096);
        let reserved = fields.buf.capacity();
        assert!(reserved >= fields.buf.len() + 4096);
        fields.shrink_to_fit();
        assert!(fields.buf.capacity() < reserved);
        assert_eq!(fields.at(FieldId::Host).unwrap(), b"example.com");
    }
}
