//! Wire frame codec for the barrage TCP protocol.
//!
//! DESIGN
//! ======
//! Every frame is `[len u32 LE][len u32 LE][type u32 LE][body][0x00]`.
//! The declared length is written twice (a quirk the server expects) and
//! covers the body plus one length field, the type field and the terminator
//! byte. Inbound frames are not trusted to carry an accurate length: frame
//! boundaries are recovered from the `/` + `0x00` terminator that ends every
//! attribute-value body, which also serves as the resynchronization point
//! after a corrupt header.
//!
//! `feed` is a pure function over "all bytes seen so far"; the session owns
//! the receive buffer and carries the returned remainder into the next read,
//! so frames split across arbitrarily many socket deliveries reassemble.

/// Message type tag carried by every client-originated frame.
pub const MESSAGE_TYPE: u32 = 689;

/// Bytes the declared length covers beyond the body: one length field,
/// the type field and the terminator byte (4 + 4 + 1).
const LENGTH_OVERHEAD: usize = 9;

/// Envelope in front of each body: two length fields plus the type field.
const HEADER_LEN: usize = 12;

/// Every body ends with `/`; the frame ends with `/` followed by `0x00`.
const TERMINATOR: &[u8] = &[b'/', 0x00];

/// Encode a payload body into a complete wire frame.
///
/// Infallible; an empty body is a valid (if useless) frame.
#[must_use]
pub fn encode(body: &[u8]) -> Vec<u8> {
    let total = u32::try_from(body.len() + LENGTH_OVERHEAD).unwrap_or(u32::MAX);

    let mut out = Vec::with_capacity(HEADER_LEN + body.len() + 1);
    out.extend_from_slice(&total.to_le_bytes());
    out.extend_from_slice(&total.to_le_bytes());
    out.extend_from_slice(&MESSAGE_TYPE.to_le_bytes());
    out.extend_from_slice(body);
    out.push(0x00);
    out
}

/// Split accumulated bytes into complete frame bodies and an unconsumed tail.
///
/// Returns each complete body in arrival order (envelope header stripped,
/// trailing `/` retained) plus the remainder to prepend to the next read.
/// An input without any terminator is not an error: it yields zero frames
/// and the whole input back, meaning "more data needed".
///
/// Restartable: feeding the same stream in one call or split across many
/// calls (carrying remainders forward) yields the same body sequence.
#[must_use]
pub fn feed(buf: &[u8]) -> (Vec<Vec<u8>>, Vec<u8>) {
    let mut bodies = Vec::new();
    let mut start = 0;

    while let Some(pos) = find_terminator(&buf[start..]) {
        // Keep the trailing `/`, consume the 0x00.
        let chunk = &buf[start..=start + pos];
        bodies.push(strip_header(chunk).to_vec());
        start += pos + TERMINATOR.len();
    }

    (bodies, buf[start..].to_vec())
}

fn find_terminator(buf: &[u8]) -> Option<usize> {
    buf.windows(TERMINATOR.len()).position(|w| w == TERMINATOR)
}

/// Drop envelope bytes in front of a body. The envelope is binary and can
/// itself contain a false `/` + `0x00` pair (a declared length of 47 puts
/// one in the LE length fields), so a chunk is not guaranteed to start at a
/// frame boundary. The body prefix is therefore located by scanning for the
/// first `key@=` attribute start instead of assuming a fixed envelope
/// width. A chunk with no attribute at all (header splinters between false
/// terminators) passes through untouched for the payload parser to reject.
fn strip_header(chunk: &[u8]) -> &[u8] {
    match find_attribute_start(chunk) {
        Some(pos) => &chunk[pos..],
        None => chunk,
    }
}

/// First position where a `key@=` attribute begins: a run of lowercase
/// letters, digits or underscores immediately followed by `@=`.
fn find_attribute_start(chunk: &[u8]) -> Option<usize> {
    let mut key_start = None;
    for (i, &byte) in chunk.iter().enumerate() {
        if byte.is_ascii_lowercase() || byte.is_ascii_digit() || byte == b'_' {
            if key_start.is_none() {
                key_start = Some(i);
            }
        } else if byte == b'@' && chunk.get(i + 1) == Some(&b'=') && key_start.is_some() {
            return key_start;
        } else {
            key_start = None;
        }
    }
    None
}

#[cfg(test)]
#[path = "codec_test.rs"]
mod tests;
