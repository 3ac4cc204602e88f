use serde_json::Value;

use crate::{Error, Payload, VALUE_KEY, decode_fields};

#[test]
fn test_round_trip_through_fields() {
    let data = Payload::default().encode().unwrap();
    let fields = decode_fields(&data).unwrap();

    assert_eq!(fields.len(), 2);
    // integer 10 and float 10.0, not both integers
    assert!(fields["a"].is_u64() || fields["a"].is_i64());
    assert_eq!(fields["a"].as_i64(), Some(10));
    assert!(fields["b"].is_f64());
    assert_eq!(fields["b"].as_f64(), Some(10.0));
    assert_eq!(fields, Payload::default().fields());
}

#[test]
fn test_decode_json_object() {
    let fields = decode_fields(br#"{"x": 1, "y": 2.5, "name": "kitchen"}"#).unwrap();

    assert_eq!(fields["x"].as_i64(), Some(1));
    assert_eq!(fields["y"].as_f64(), Some(2.5));
    assert_eq!(fields["name"], Value::from("kitchen"));
}

#[test]
fn test_decode_plain_integer() {
    let fields = decode_fields(b"42").unwrap();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[VALUE_KEY].as_i64(), Some(42));
}

#[test]
fn test_decode_plain_float() {
    let fields = decode_fields(b"21.5\n").unwrap();
    assert!(fields[VALUE_KEY].is_f64());
    assert_eq!(fields[VALUE_KEY].as_f64(), Some(21.5));
}

#[test]
fn test_decode_negative_integer() {
    let fields = decode_fields(b"-7").unwrap();
    assert_eq!(fields[VALUE_KEY].as_i64(), Some(-7));
}

#[test]
fn test_decode_unrecognized() {
    assert!(matches!(decode_fields(b"hello"), Err(Error::Unrecognized)));
    assert!(matches!(decode_fields(b""), Err(Error::Unrecognized)));
    assert!(matches!(decode_fields(b"1.2.3"), Err(Error::Unrecognized)));
    assert!(matches!(decode_fields(&[0xc1]), Err(Error::Unrecognized)));
}

#[test]
fn test_msgpack_array_is_not_a_map() {
    let data = rmp_serde::to_vec(&(1, 2)).unwrap();
    assert!(matches!(decode_fields(&data), Err(Error::Unrecognized)));
}
