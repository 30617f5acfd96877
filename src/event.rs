//! Event classification — typed events decoded from frame payloads.
//!
//! DESIGN
//! ======
//! `classify` is a pure total function over a parsed field map. Unknown
//! message kinds (barrages, gifts, broadcast notices the client does not
//! interpret yet) fall through to [`Event::Other`] carrying the raw fields.
//! Field extraction fails soft: a missing `nn` or `txt` yields an empty
//! string rather than aborting dispatch of the surrounding stream.

use std::collections::HashMap;

use crate::payload::TYPE_KEY;

/// A decoded inbound message, carrying only what its handler needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Login acknowledgement. `live_stat` is informational only: the
    /// upstream field reads `0` whether or not the stream is live, so no
    /// decision logic may hang off it.
    LoginResult { live_stat: String },
    /// Server-initiated keepalive probe (`keeplive`, distinct from the
    /// client's own `mrkl`). The session answers it synchronously.
    KeepaliveTick,
    /// Ping probe. The correct response format is unknown upstream, so the
    /// client deliberately sends nothing.
    PingRequest,
    /// A user entered the room.
    UserEnter { nickname: String, level: String },
    /// A chat message.
    ChatMessage { nickname: String, text: String },
    /// Anything else, raw fields retained for embedders that want to look.
    Other(HashMap<String, String>),
}

/// Classify a parsed payload by its `type` attribute.
///
/// Total: a map without a `type` key (or with an unrecognized value)
/// classifies as [`Event::Other`], never an error.
#[must_use]
pub fn classify(mut fields: HashMap<String, String>) -> Event {
    let kind = fields.remove(TYPE_KEY).unwrap_or_default();

    match kind.as_str() {
        "loginres" => Event::LoginResult { live_stat: take(&mut fields, "live_stat") },
        "keeplive" => Event::KeepaliveTick,
        "pingreq" => Event::PingRequest,
        "uenter" => Event::UserEnter {
            nickname: take(&mut fields, "nn"),
            level: take(&mut fields, "level"),
        },
        "chatmsg" => Event::ChatMessage {
            nickname: take(&mut fields, "nn"),
            text: take(&mut fields, "txt"),
        },
        _ => {
            if !kind.is_empty() {
                fields.insert(TYPE_KEY.to_owned(), kind);
            }
            Event::Other(fields)
        }
    }
}

fn take(fields: &mut HashMap<String, String>, key: &str) -> String {
    fields.remove(key).unwrap_or_default()
}

#[cfg(test)]
#[path = "event_test.rs"]
mod tests;
