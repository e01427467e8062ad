//! Well-known HTTP field identifiers.
//!
//! [`FieldId`] is a closed enumeration of the common HTTP field names plus an
//! [`FieldId::Unknown`] variant. Name-to-id lookup is ASCII case-insensitive
//! and runs a binary search over a frozen, lowercase-sorted table; the set is
//! compile-time known, so no hashing or allocation is involved.

use std::cmp::Ordering;

/// Identifier for a well-known HTTP field, or `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum FieldId {
    Accept,
    AcceptCharset,
    AcceptEncoding,
    AcceptLanguage,
    AcceptRanges,
    AccessControlAllowCredentials,
    AccessControlAllowHeaders,
    AccessControlAllowMethods,
    AccessControlAllowOrigin,
    AccessControlExposeHeaders,
    AccessControlMaxAge,
    AccessControlRequestHeaders,
    AccessControlRequestMethod,
    Age,
    Allow,
    AltSvc,
    Authorization,
    CacheControl,
    Connection,
    ContentDisposition,
    ContentEncoding,
    ContentLanguage,
    ContentLength,
    ContentLocation,
    ContentRange,
    ContentSecurityPolicy,
    ContentType,
    Cookie,
    Date,
    Etag,
    Expect,
    Expires,
    Forwarded,
    From,
    Host,
    IfMatch,
    IfModifiedSince,
    IfNoneMatch,
    IfRange,
    IfUnmodifiedSince,
    KeepAlive,
    LastModified,
    Link,
    Location,
    MaxForwards,
    Origin,
    Pragma,
    ProxyAuthenticate,
    ProxyAuthorization,
    ProxyConnection,
    Range,
    Referer,
    RetryAfter,
    Server,
    SetCookie,
    StrictTransportSecurity,
    Te,
    Trailer,
    TransferEncoding,
    Upgrade,
    UserAgent,
    Vary,
    Via,
    Warning,
    WwwAuthenticate,
    XContentTypeOptions,
    XForwardedFor,
    XForwardedHost,
    XForwardedProto,
    XFrameOptions,
    /// A field name outside the well-known set.
    Unknown,
}

/// Canonical names, sorted ASCII-case-insensitively for binary search.
static TABLE: &[(&str, FieldId)] = &[
    ("Accept", FieldId::Accept),
    ("Accept-Charset", FieldId::AcceptCharset),
    ("Accept-Encoding", FieldId::AcceptEncoding),
    ("Accept-Language", FieldId::AcceptLanguage),
    ("Accept-Ranges", FieldId::AcceptRanges),
    ("Access-Control-Allow-Credentials", FieldId::AccessControlAllowCredentials),
    ("Access-Control-Allow-Headers", FieldId::AccessControlAllowHeaders),
    ("Access-Control-Allow-Methods", FieldId::AccessControlAllowMethods),
    ("Access-Control-Allow-Origin", FieldId::AccessControlAllowOrigin),
    ("Access-Control-Expose-Headers", FieldId::AccessControlExposeHeaders),
    ("Access-Control-Max-Age", FieldId::AccessControlMaxAge),
    ("Access-Control-Request-Headers", FieldId::AccessControlRequestHeaders),
    ("Access-Control-Request-Method", FieldId::AccessControlRequestMethod),
    ("Age", FieldId::Age),
    ("Allow", FieldId::Allow),
    ("Alt-Svc", FieldId::AltSvc),
    ("Authorization", FieldId::Authorization),
    ("Cache-Control", FieldId::CacheControl),
    ("Connection", FieldId::Connection),
    ("Content-Disposition", FieldId::ContentDisposition),
    ("Content-Encoding", FieldId::ContentEncoding),
    ("Content-Language", FieldId::ContentLanguage),
    ("Content-Length", FieldId::ContentLength),
    ("Content-Location", FieldId::ContentLocation),
    ("Content-Range", FieldId::ContentRange),
    ("Content-Security-Policy", FieldId::ContentSecurityPolicy),
    ("Content-Type", FieldId::ContentType),
    ("Cookie", FieldId::Cookie),
    ("Date", FieldId::Date),
    ("ETag", FieldId::Etag),
    ("Expect", FieldId::Expect),
    ("Expires", FieldId::Expires),
    ("Forwarded", FieldId::Forwarded),
    ("From", FieldId::From),
    ("Host", FieldId::Host),
    ("If-Match", FieldId::IfMatch),
    ("If-Modified-Since", FieldId::IfModifiedSince),
    ("If-None-Match", FieldId::IfNoneMatch),
    ("If-Range", FieldId::IfRange),
    ("If-Unmodified-Since", FieldId::IfUnmodifiedSince),
    ("Keep-Alive", FieldId::KeepAlive),
    ("Last-Modified", FieldId::LastModified),
    ("Link", FieldId::Link),
    ("Location", FieldId::Location),
    ("Max-Forwards", FieldId::MaxForwards),
    ("Origin", FieldId::Origin),
    ("Pragma", FieldId::Pragma),
    ("Proxy-Authenticate", FieldId::ProxyAuthenticate),
    ("Proxy-Authorization", FieldId::ProxyAuthorization),
    ("Proxy-Connection", FieldId::ProxyConnection),
    ("Range", FieldId::Range),
    ("Referer", FieldId::Referer),
    ("Retry-After", FieldId::RetryAfter),
    ("Server", FieldId::Server),
    ("Set-Cookie", FieldId::SetCookie),
    ("Strict-Transport-Security", FieldId::StrictTransportSecurity),
    ("TE", FieldId::Te),
    ("Trailer", FieldId::Trailer),
    ("Transfer-Encoding", FieldId::TransferEncoding),
    ("Upgrade", FieldId::Upgrade),
    ("User-Agent", FieldId::UserAgent),
    ("Vary", FieldId::Vary),
    ("Via", FieldId::Via),
    ("Warning", FieldId::Warning),
    ("WWW-Authenticate", FieldId::WwwAuthenticate),
    ("X-Content-Type-Options", FieldId::XContentTypeOptions),
    ("X-Forwarded-For", FieldId::XForwardedFor),
    ("X-Forwarded-Host", FieldId::XForwardedHost),
    ("X-Forwarded-Proto", FieldId::XForwardedProto),
    ("X-Frame-Options", FieldId::XFrameOptions),
];

/// ASCII case-insensitive ordering, folding only `A..Z` onto `a..z`.
fn cmp_ignore_case(a: &[u8], b: &[u8]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        match x.to_ascii_lowercase().cmp(&y.to_ascii_lowercase()) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

impl FieldId {
    /// Looks up the id for a field name, case-insensitively.
    ///
    /// Names outside the well-known set map to [`FieldId::Unknown`].
    pub fn from_name(name: &[u8]) -> FieldId {
        match TABLE.binary_search_by(|(entry, _)| cmp_ignore_case(entry.as_bytes(), name)) {
            Ok(i) => TABLE[i].1,
            Err(_) => FieldId::Unknown,
        }
    }

    /// Returns the canonical on-wire spelling, or `None` for
    /// [`FieldId::Unknown`].
    pub fn canonical(&self) -> Option<&'static str> {
        if *self == FieldId::Unknown {
            return None;
        }
        TABLE.iter().find(|(_, id)| id == self).map(|(name, _)| *name)
    }
}
