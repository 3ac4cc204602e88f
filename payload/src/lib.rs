//! Message payload for the mqforward pipeline.
//!
//! - [`Payload`]: the fixed `{a: 10, b: 10.0}` record and its MessagePack codec
//! - [`decode_fields`]: tolerant decoding of captured payloads (MessagePack, JSON, bare numbers)
//!
//! # Example
//!
//! ```rust
//! use mqforward_payload::{Payload, decode_fields};
//!
//! let data = Payload::default().encode().unwrap();
//! let fields = decode_fields(&data).unwrap();
//! assert_eq!(fields["a"].as_i64(), Some(10));
//! assert_eq!(fields["b"].as_f64(), Some(10.0));
//! ```

mod error;
mod fields;
mod payload;

pub use error::{Error, Result};
pub use fields::{Fields, VALUE_KEY, decode_fields};
pub use payload::{Payload, TOPIC, from_hex, to_hex};

#[cfg(test)]
mod tests;
