//! A prelude for the glob-importing crowd.
pub use crate::{
    codec::Codec,
    custom::{ClassDescriptor, ClassHandle, Custom, Proc},
    encoding::{deserialize, deserialize_n, serialize, serialize_into},
    errors::{DecodeError, EncodeError, RegistryError},
    registry::TypeDef,
    table::{Table, TableRef},
    template::{Template, TemplatePart},
    Bytes, Value,
};
