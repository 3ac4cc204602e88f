//! The fixed test payload published to the pipeline.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::fields::Fields;

/// Topic the test payload is published to.
pub const TOPIC: &str = "mqforward/a/b";

/// A two-field record: integer `a` and float `b`.
///
/// `Payload::default()` is the test literal `{a: 10, b: 10.0}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Payload {
    pub a: i64,
    pub b: f64,
}

impl Default for Payload {
    fn default() -> Self {
        Self { a: 10, b: 10.0 }
    }
}

impl Payload {
    /// Encodes the payload as a MessagePack map keyed by field name.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    /// Decodes a MessagePack map with exactly the keys `a` and `b`.
    pub fn decode(data: &[u8]) -> Result<Self> {
        Ok(rmp_serde::from_slice(data)?)
    }

    /// Returns the payload as a dynamic field map.
    pub fn fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("a".to_string(), Value::from(self.a));
        fields.insert("b".to_string(), Value::from(self.b));
        fields
    }
}

/// Encodes bytes as lowercase hex.
pub fn to_hex(data: &[u8]) -> String {
    hex::encode(data)
}

/// Decodes hex text, ignoring whitespace and an optional `0x` prefix.
pub fn from_hex(text: &str) -> Result<Vec<u8>> {
    let text = text.trim();
    let text = text.strip_prefix("0x").unwrap_or(text);
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(compact).map_err(Error::from)
}
