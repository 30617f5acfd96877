//! Attribute-value payload grammar.
//!
//! Bodies are ASCII text of the form `key@=value/key@=value/`. Keys are
//! lowercase identifiers; values are arbitrary text excluding `/`. The first
//! `type@=` pair names the message kind; everything else is free-form.

use std::collections::HashMap;

/// Attribute naming the message kind. A body without it is not a message.
pub const TYPE_KEY: &str = "type";

/// Error returned by [`parse`].
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    /// The body carries no `type@=` pair at all. The dispatcher treats this
    /// as "not a recognized message" and drops the frame, not the stream.
    #[error("payload has no type@= attribute")]
    MissingType,
}

/// Parse a frame body into a key → value map.
///
/// Segments without `@=` are skipped rather than rejected. Duplicate keys
/// keep the first occurrence. Non-UTF-8 bytes are replaced lossily; the
/// protocol is ASCII with UTF-8 chat text.
///
/// # Errors
///
/// Returns [`PayloadError::MissingType`] when no `type@=` pair exists.
pub fn parse(body: &[u8]) -> Result<HashMap<String, String>, PayloadError> {
    let text = String::from_utf8_lossy(body);

    let mut fields = HashMap::new();
    for segment in text.split('/') {
        if segment.is_empty() {
            continue;
        }
        let Some((key, value)) = segment.split_once("@=") else {
            continue;
        };
        fields
            .entry(key.to_owned())
            .or_insert_with(|| value.to_owned());
    }

    if !fields.contains_key(TYPE_KEY) {
        return Err(PayloadError::MissingType);
    }
    Ok(fields)
}

/// Serialize ordered pairs into `key@=value/` text.
#[must_use]
pub fn serialize(pairs: &[(&str, &str)]) -> Vec<u8> {
    let mut out = String::new();
    for (key, value) in pairs {
        out.push_str(key);
        out.push_str("@=");
        out.push_str(value);
        out.push('/');
    }
    out.into_bytes()
}

#[cfg(test)]
#[path = "payload_test.rs"]
mod tests;
