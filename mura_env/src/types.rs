//! Session identity for the MÜRA viewer.

use crate::error::SessionError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier of one shared tracking session.
///
/// Comes from the `id` query parameter of the share link. The viewer never
/// interprets it beyond equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps an id, rejecting the empty string.
    pub fn new(id: impl Into<String>) -> Result<Self, SessionError> {
        let id = id.into();
        if id.is_empty() {
            return Err(SessionError::EmptyId);
        }
        Ok(Self(id))
    }

    /// Creates a fresh random id, as the sharing phone does for a new session.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Extracts the id from a link's query string (`?id=...&...`).
    ///
    /// The first `id` parameter wins. `+` decodes to a space and `%XX`
    /// escapes are decoded.
    pub fn from_query(query: &str) -> Result<Self, SessionError> {
        let query = query.strip_prefix('?').unwrap_or(query);

        for pair in query.split('&') {
            let (key, value) = match pair.split_once('=') {
                Some((k, v)) => (k, v),
                None => (pair, ""),
            };
            if decode_component(key)? == "id" {
                return Self::new(decode_component(value)?);
            }
        }

        Err(SessionError::MissingId)
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of reading a share link.
///
/// An invalid link is a distinct, legitimate input: the page shows an
/// "invalid link" status and attaches no event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionLink {
    Valid(SessionId),
    Invalid(SessionError),
}

impl SessionLink {
    /// Parses a link's query string.
    pub fn from_query(query: &str) -> Self {
        match SessionId::from_query(query) {
            Ok(id) => SessionLink::Valid(id),
            Err(e) => SessionLink::Invalid(e),
        }
    }

    /// Returns the session id if the link names one.
    pub fn session(&self) -> Option<&SessionId> {
        match self {
            SessionLink::Valid(id) => Some(id),
            SessionLink::Invalid(_) => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, SessionLink::Valid(_))
    }
}

/// Decodes one `application/x-www-form-urlencoded` component.
fn decode_component(raw: &str) -> Result<String, SessionError> {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' => {
                let hex = bytes
                    .get(i + 1..i + 3)
                    .filter(|h| h.iter().all(u8::is_ascii_hexdigit))
                    .and_then(|h| std::str::from_utf8(h).ok())
                    .and_then(|h| u8::from_str_radix(h, 16).ok())
                    .ok_or(SessionError::MalformedEncoding)?;
                out.push(hex);
                i += 3;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    String::from_utf8(out).map_err(|_| SessionError::MalformedEncoding)
}
