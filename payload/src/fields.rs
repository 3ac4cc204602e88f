//! Tolerant decoding of captured payloads into a field map.
//!
//! Ingestion accepts three payload shapes, tried in order:
//!
//! 1. a MessagePack map with string keys
//! 2. a JSON object
//! 3. a bare number in text form, stored under the key `value`
//!
//! Text containing a `.` is read as a float, anything else as an integer.

use serde_json::{Map, Number, Value};
use tracing::debug;

use crate::error::{Error, Result};

/// Decoded payload fields keyed by name.
pub type Fields = Map<String, Value>;

/// Key used for payloads that carry a single bare number.
pub const VALUE_KEY: &str = "value";

/// Decodes `data` as MessagePack, then JSON, then a plain number.
pub fn decode_fields(data: &[u8]) -> Result<Fields> {
    match rmp_serde::from_slice::<Fields>(data) {
        Ok(fields) => return Ok(fields),
        Err(e) => debug!("not a msgpack map: {}", e),
    }

    match serde_json::from_slice::<Fields>(data) {
        Ok(fields) => return Ok(fields),
        Err(e) => debug!("not a json object: {}", e),
    }

    let value = parse_number(data).ok_or(Error::Unrecognized)?;
    let mut fields = Fields::new();
    fields.insert(VALUE_KEY.to_string(), value);
    Ok(fields)
}

fn parse_number(data: &[u8]) -> Option<Value> {
    let text = std::str::from_utf8(data).ok()?.trim();

    if text.contains('.') {
        let f = text.parse::<f64>().ok()?;
        Number::from_f64(f).map(Value::Number)
    } else {
        text.parse::<i64>().ok().map(Value::from)
    }
}
