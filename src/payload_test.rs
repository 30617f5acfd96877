use super::*;

#[test]
fn parse_splits_pairs_on_slash_and_first_at_equals() {
    let fields = parse(b"type@=chatmsg/nn@=Alice/txt@=hello/").expect("parse");

    assert_eq!(fields.get("type").map(String::as_str), Some("chatmsg"));
    assert_eq!(fields.get("nn").map(String::as_str), Some("Alice"));
    assert_eq!(fields.get("txt").map(String::as_str), Some("hello"));
}

#[test]
fn parse_serialize_round_trip() {
    let pairs = [
        ("type", "uenter"),
        ("rid", "97376"),
        ("nn", "uux"),
        ("level", "22"),
        ("empty", ""),
    ];

    let fields = parse(&serialize(&pairs)).expect("parse");
    assert_eq!(fields.len(), pairs.len());
    for (key, value) in pairs {
        assert_eq!(fields.get(key).map(String::as_str), Some(value), "key {key}");
    }
}

#[test]
fn parse_rejects_body_without_type() {
    let err = parse(b"nn@=Alice/txt@=hello/").expect_err("should fail");
    assert!(matches!(err, PayloadError::MissingType));
}

#[test]
fn parse_skips_segments_without_separator() {
    let fields = parse(b"garbage/type@=chatmsg/alsogarbage/nn@=Bob/").expect("parse");
    assert_eq!(fields.get("type").map(String::as_str), Some("chatmsg"));
    assert_eq!(fields.get("nn").map(String::as_str), Some("Bob"));
    assert!(!fields.contains_key("garbage"));
}

#[test]
fn parse_keeps_first_occurrence_of_duplicate_keys() {
    let fields = parse(b"type@=chatmsg/nn@=first/nn@=second/").expect("parse");
    assert_eq!(fields.get("nn").map(String::as_str), Some("first"));
}

#[test]
fn parse_keeps_extra_at_equals_inside_value() {
    let fields = parse(b"type@=chatmsg/txt@=a@=b/").expect("parse");
    assert_eq!(fields.get("txt").map(String::as_str), Some("a@=b"));
}

#[test]
fn parse_allows_empty_value() {
    let fields = parse(b"type@=loginres/live_stat@=/").expect("parse");
    assert_eq!(fields.get("live_stat").map(String::as_str), Some(""));
}

#[test]
fn serialize_concatenates_in_order() {
    let bytes = serialize(&[("type", "joingroup"), ("rid", "9999"), ("gid", "-9999")]);
    assert_eq!(bytes, b"type@=joingroup/rid@=9999/gid@=-9999/".to_vec());
}

#[test]
fn serialize_of_nothing_is_empty() {
    assert!(serialize(&[]).is_empty());
}
