//! # tangle
//!
//! A binary codec for dynamically typed value graphs. Nested tables, shared
//! substructure, cycles, registered host types, and named resources all
//! survive the round trip — shared references come back shared.
//!
//! # Example
//!
//! ```
//! use tangle::{deserialize, serialize, Value};
//!
//! // a tuple of values
//! let values = [
//!     Value::from(45),
//!     Value::seq([Value::from(4), Value::from(8), Value::from(12), Value::from(16)]),
//!     Value::from("Hello, World!"),
//! ];
//!
//! // one self-describing byte string
//! let bytes = serialize(&values).unwrap();
//!
//! // and back
//! let decoded = deserialize(&bytes).unwrap();
//! assert_eq!(decoded.len(), 3);
//! assert_eq!(decoded[0], Value::from(45));
//! assert_eq!(decoded[2], Value::from("Hello, World!"));
//! ```
//!
//! Registered types, resources, and procedure hooks live on a
//! [`Codec`] instance; instances created by [`Codec::new`] share nothing.

/// Codec instances and the registration surface.
pub mod codec;
/// Class identities and the opaque host value holders.
pub mod custom;
/// Binary encoder and decoder.
pub mod encoding;
/// Error types.
pub mod errors;
/// Prelude.
pub mod prelude;
/// Type and resource registries.
pub mod registry;
/// The table container.
pub mod table;
/// Per-type key schemas.
pub mod template;
/// Helper macros.
pub mod util;

pub use bytes::Bytes;
pub use codec::Codec;
pub use custom::{ClassDescriptor, ClassHandle, Custom, Proc};
pub use encoding::{deserialize, deserialize_n, serialize, serialize_into};
pub use errors::{DecodeError, EncodeError, RegistryError};
pub use registry::{DecodeFn, EncodeFn, ProcDumpFn, ProcLoadFn, TypeDef};
pub use table::{Table, TableRef};
pub use template::{Template, TemplatePart};

use std::rc::Rc;

#[derive(Clone, Debug)]
/// A value the codec is closed over.
pub enum Value {
    /// The absent/null singleton.
    Null,
    /// Boolean.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// IEEE-754 double.
    Float(f64),
    /// Immutable byte string; shares by content.
    Str(Bytes),
    /// Container; shares by reference.
    Table(TableRef),
    /// Opaque host value tagged with a class; shares by reference.
    Custom(Rc<Custom>),
    /// Opaque procedure; shares by reference.
    Proc(Rc<Proc>),
}

use Value::*;

impl Value {
    /// Indicates whether a value is `Null`.
    ///
    /// # Example
    ///
    /// ```
    /// use tangle::Value;
    ///
    /// assert!(Value::Null.is_null());
    /// assert!(!Value::Bool(false).is_null());
    /// ```
    pub fn is_null(&self) -> bool { matches!(self, Null) }

    /// Tries to convert the value to a `bool`.
    /// This will return `None` if the value is not a boolean.
    pub fn to_bool(&self) -> Option<bool> {
        match self {
            Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Tries to convert the value to an `i64`.
    /// This will return `None` if the value is not an integer.
    ///
    /// # Example
    ///
    /// ```
    /// use tangle::Value;
    ///
    /// assert_eq!(Value::from(5).to_int(), Some(5));
    /// assert_eq!(Value::Float(5.0).to_int(), None);
    /// ```
    pub fn to_int(&self) -> Option<i64> {
        match self {
            Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Tries to convert the value to an `f64`.
    /// This will return `None` if the value is not a float.
    pub fn to_float(&self) -> Option<f64> {
        match self {
            Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Borrows the value's string payload, if it is a string.
    pub fn to_bytes(&self) -> Option<&Bytes> {
        match self {
            Str(b) => Some(b),
            _ => None,
        }
    }

    /// Clones out the table handle, if the value is a table.
    pub fn to_table(&self) -> Option<TableRef> {
        match self {
            Table(t) => Some(t.clone()),
            _ => None,
        }
    }

    /// Builds a table value from a sequence of values.
    ///
    /// # Example
    ///
    /// ```
    /// use tangle::Value;
    ///
    /// let v = Value::seq([Value::from(1), Value::from(2)]);
    /// let t = v.to_table().unwrap();
    /// assert_eq!(t.borrow().seq_len(), 2);
    /// ```
    pub fn seq<I: IntoIterator<Item = Value>>(items: I) -> Value {
        let mut t = table::Table::new();
        for v in items {
            t.push(v);
        }
        Table(t.into_ref())
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Null => "null",
            Bool(_) => "a boolean",
            Int(_) => "an integer",
            Float(_) => "a float",
            Str(_) => "a string",
            Table(_) => "a table",
            Custom(_) => "a custom object",
            Proc(_) => "a procedure",
        }
    }

    /// Pointer identity for the kinds that share by reference.
    pub(crate) fn ref_key(&self) -> Option<RefKey> {
        match self {
            Table(t) => Some(RefKey::Table(Rc::as_ptr(t) as usize)),
            Custom(c) => Some(RefKey::Custom(Rc::as_ptr(c) as *const () as usize)),
            Proc(p) => Some(RefKey::Proc(Rc::as_ptr(p) as *const () as usize)),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) enum RefKey {
    Table(usize),
    Custom(usize),
    Proc(usize),
}

impl PartialEq for Value {
    /// Structural equality, except that custom objects and procedures
    /// compare by reference. Cycles are fine: a pair of tables already
    /// under comparison counts as equal, so two graphs are unequal only
    /// when something reachable actually differs.
    fn eq(&self, other: &Value) -> bool {
        table::value_eq(self, other, &mut hashbrown::HashSet::new())
    }
}

macro_rules! try_from_ctor {
    ($from:ty, $to:ty, $ctor:tt) => {
        impl TryFrom<$from> for $to {
            type Error = $from;

            fn try_from(from: $from) -> Result<$to, $from> {
                match from {
                    $ctor(a) => Ok(a),
                    f => Err(f),
                }
            }
        }
    };
}

from_fn!(Value, bool, Bool);
try_from_ctor!(Value, bool, Bool);
from_fn!(Value, i64, Int);
try_from_ctor!(Value, i64, Int);
from_fn!(Value, f64, Float);
try_from_ctor!(Value, f64, Float);
from_fn!(Value, Bytes, Str);
try_from_ctor!(Value, Bytes, Str);
from_fn!(Value, TableRef, Table);
try_from_ctor!(Value, TableRef, Table);

from_as!(Value, i8, i64);
from_as!(Value, i16, i64);
from_as!(Value, i32, i64);
from_as!(Value, u8, i64);
from_as!(Value, u16, i64);
from_as!(Value, u32, i64);
from_as!(Value, f32, f64);

impl From<&str> for Value {
    fn from(s: &str) -> Value { Str(Bytes::copy_from_slice(s.as_bytes())) }
}

impl From<String> for Value {
    fn from(s: String) -> Value { Str(Bytes::from(s.into_bytes())) }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Value { Str(Bytes::copy_from_slice(b)) }
}

impl From<table::Table> for Value {
    fn from(t: table::Table) -> Value { Table(t.into_ref()) }
}

impl From<custom::Custom> for Value {
    fn from(c: custom::Custom) -> Value { Custom(c.into_ref()) }
}

impl From<custom::Proc> for Value {
    fn from(p: custom::Proc) -> Value { Proc(p.into_ref()) }
}

impl From<()> for Value {
    fn from(_: ()) -> Value { Null }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trivial_tests() {
        assert!(Value::Null.is_null());

        assert_eq!(Value::from(5).to_int(), Some(5));

        assert!(Value::from(true).to_bool().unwrap());

        assert_eq!(
            Value::from("word").to_bytes().unwrap(),
            &Bytes::from_static(b"word")
        );
    }

    #[test]
    fn tables_compare_structurally() {
        let a = Value::seq([Value::from(1), Value::from(2)]);
        let b = Value::seq([Value::from(1), Value::from(2)]);
        assert_eq!(a, b);

        let c = Value::seq([Value::from(1)]);
        assert_ne!(a, c);
    }

    #[test]
    fn customs_compare_by_reference() {
        let class = ClassHandle::new();
        let a = Value::from(custom::Custom::new(class.clone(), 1u8));
        let b = a.clone();
        let c = Value::from(custom::Custom::new(class, 1u8));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
