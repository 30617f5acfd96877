use super::*;

#[test]
fn encode_writes_length_twice_then_type_then_body_then_nul() {
    let body = b"type@=mrkl/";
    let bytes = encode(body);

    let total = u32::try_from(body.len() + 9).expect("fits");
    assert_eq!(&bytes[0..4], &total.to_le_bytes());
    assert_eq!(&bytes[4..8], &total.to_le_bytes());
    assert_eq!(&bytes[8..12], &MESSAGE_TYPE.to_le_bytes());
    assert_eq!(&bytes[12..12 + body.len()], body);
    assert_eq!(bytes[bytes.len() - 1], 0x00);
    assert_eq!(bytes.len(), 12 + body.len() + 1);
}

#[test]
fn encode_accepts_empty_body() {
    let bytes = encode(b"");
    assert_eq!(&bytes[0..4], &9u32.to_le_bytes());
    assert_eq!(bytes.len(), 13);
    assert_eq!(bytes[12], 0x00);
}

#[test]
fn feed_returns_single_complete_body() {
    let bytes = encode(b"type@=loginres/live_stat@=0/");
    let (bodies, rest) = feed(&bytes);

    assert_eq!(bodies, vec![b"type@=loginres/live_stat@=0/".to_vec()]);
    assert!(rest.is_empty());
}

#[test]
fn feed_without_terminator_returns_everything_as_remainder() {
    let partial = b"type@=chatmsg/nn@=Ali";
    let (bodies, rest) = feed(partial);

    assert!(bodies.is_empty());
    assert_eq!(rest, partial.to_vec());
}

#[test]
fn feed_returns_concatenated_bodies_in_arrival_order() {
    let mut stream = encode(b"type@=uenter/nn@=uux/level@=22/");
    stream.extend_from_slice(&encode(b"type@=chatmsg/nn@=Alice/txt@=hello/"));

    let (bodies, rest) = feed(&stream);

    assert_eq!(
        bodies,
        vec![
            b"type@=uenter/nn@=uux/level@=22/".to_vec(),
            b"type@=chatmsg/nn@=Alice/txt@=hello/".to_vec(),
        ]
    );
    assert!(rest.is_empty());
}

#[test]
fn feed_holds_back_partial_trailing_frame() {
    let mut stream = encode(b"type@=keeplive/tick@=1700000000/");
    let second = encode(b"type@=chatmsg/nn@=Bob/txt@=hi/");
    // Split byte-for-byte inside the second frame.
    stream.extend_from_slice(&second[..10]);

    let (bodies, rest) = feed(&stream);
    assert_eq!(bodies, vec![b"type@=keeplive/tick@=1700000000/".to_vec()]);
    assert_eq!(rest, second[..10].to_vec());

    // Prepending the remainder to the rest of the stream recovers frame two.
    let mut next = rest;
    next.extend_from_slice(&second[10..]);
    let (bodies, rest) = feed(&next);
    assert_eq!(bodies, vec![b"type@=chatmsg/nn@=Bob/txt@=hi/".to_vec()]);
    assert!(rest.is_empty());
}

#[test]
fn feed_is_idempotent_under_arbitrary_chunking() {
    let frames = [
        b"type@=loginres/live_stat@=0/".to_vec(),
        b"type@=uenter/rid@=97376/uid@=11880384/nn@=uux/level@=22/".to_vec(),
        b"type@=chatmsg/nn@=Alice/txt@=hello/".to_vec(),
    ];
    let mut stream = Vec::new();
    for body in &frames {
        stream.extend_from_slice(&encode(body));
    }

    let (whole, rest) = feed(&stream);
    assert_eq!(whole, frames.to_vec());
    assert!(rest.is_empty());

    // Same stream delivered one byte at a time, carrying the remainder.
    for chunk_len in [1, 2, 3, 7, 16] {
        let mut acc: Vec<u8> = Vec::new();
        let mut collected = Vec::new();
        for chunk in stream.chunks(chunk_len) {
            acc.extend_from_slice(chunk);
            let (bodies, rest) = feed(&acc);
            collected.extend(bodies);
            acc = rest;
        }
        assert_eq!(collected, frames.to_vec(), "chunk_len {chunk_len}");
        assert!(acc.is_empty());
    }
}

#[test]
fn feed_survives_false_terminator_inside_the_length_header() {
    // A 38-byte body declares length 47 (0x2F = `/`), so the LE length
    // fields contain `/` followed by 0x00 — a false terminator inside the
    // envelope. The real body must still come through with its type@=
    // prefix intact; the header splinters carry no attributes and are left
    // for the payload parser to reject.
    let body = b"type@=chatmsg/nn@=ab/txt@=helloworld1/";
    assert_eq!(body.len(), 38);

    let (bodies, rest) = feed(&encode(body));
    assert!(rest.is_empty());

    let expected = body.to_vec();
    assert!(bodies.contains(&expected));
    for splinter in bodies.iter().filter(|b| **b != expected) {
        assert!(crate::payload::parse(splinter).is_err());
    }
}

#[test]
fn feed_recovers_body_whose_chunk_starts_mid_envelope() {
    // Header remnant bytes in front of the body must not eat into it.
    let chunk = b"\x00\x00\xb1\x02\x00\x00type@=uenter/nn@=uux/\x00";
    let (bodies, rest) = feed(chunk);
    assert_eq!(bodies, vec![b"type@=uenter/nn@=uux/".to_vec()]);
    assert!(rest.is_empty());
}

#[test]
fn feed_passes_short_chunk_through_for_parser_to_reject() {
    // Stray bytes between terminators, shorter than an envelope header.
    let stream = b"abc/\x00";
    let (bodies, rest) = feed(stream);
    assert_eq!(bodies, vec![b"abc/".to_vec()]);
    assert!(rest.is_empty());
}
