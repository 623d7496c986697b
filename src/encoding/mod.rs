//! # Binary encoder and decoder
//!
//! The wire format is a concatenation of value encodings with no outer
//! framing. Each value starts with one tag byte; tag bytes `1..=201` inline
//! the integers `-100..=100`, which doubles as the compact form for every
//! length, count, and back-reference index embedded in the format.
//!
//! # Example
//!
//! ```
//! use tangle::{deserialize, serialize, Value};
//!
//! // small integers cost a single byte
//! let bytes = serialize(&[Value::from(0)]).unwrap();
//! assert_eq!(bytes, vec![101]);
//!
//! // and everything round-trips
//! let decoded = deserialize(&bytes).unwrap();
//! assert_eq!(decoded, vec![Value::from(0)]);
//! ```

use crate::{
    errors::{DecodeError, EncodeError},
    Codec, Value,
};

pub(crate) mod constants;
pub(crate) mod de;
pub(crate) mod ser;

/// Serializes a tuple of values with a fresh, registration-free codec.
///
/// Use [`Codec::serialize`] instead when custom types, resources, or
/// procedure hooks are in play.
pub fn serialize(values: &[Value]) -> Result<Vec<u8>, EncodeError> {
    Codec::new().serialize(values)
}

/// Serializes a tuple of values into `out` with a fresh, registration-free
/// codec.
pub fn serialize_into(values: &[Value], out: &mut Vec<u8>) -> Result<(), EncodeError> {
    Codec::new().serialize_into(values, out)
}

/// Decodes every value in `data` with a fresh, registration-free codec.
pub fn deserialize(data: &[u8]) -> Result<Vec<Value>, DecodeError> {
    Codec::new().deserialize(data)
}

/// Decodes at most `limit` values from the front of `data` with a fresh,
/// registration-free codec.
pub fn deserialize_n(data: &[u8], limit: usize) -> Result<Vec<Value>, DecodeError> {
    Codec::new().deserialize_n(data, limit)
}
