use crate::{
    custom::{ClassHandle, Proc},
    errors::{DecodeError, EncodeError, RegistryError},
    template::Template,
    RefKey, Value,
};
use bytes::Bytes;
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::debug;

/// Serializer callback: turns a value into its reconstruction arguments.
pub type EncodeFn = Rc<dyn Fn(&Value) -> Result<Vec<Value>, EncodeError>>;

/// Deserializer callback: rebuilds a value from its reconstruction arguments.
pub type DecodeFn = Rc<dyn Fn(Vec<Value>) -> Result<Value, DecodeError>>;

/// Host hook that dumps an opaque procedure body to bytes.
pub type ProcDumpFn = Rc<dyn Fn(&Proc) -> Result<Vec<u8>, EncodeError>>;

/// Host hook that rebuilds an opaque procedure from its dumped body.
pub type ProcLoadFn = Rc<dyn Fn(&[u8]) -> Result<Proc, DecodeError>>;

#[derive(Default, Clone)]
/// Optional behavior attached to a type registration.
///
/// With neither callbacks nor a template, the default codec applies: the
/// object's fields travel as a flat key/value argument list and decode
/// rebuilds a table tagged with the registered class.
pub struct TypeDef {
    /// Custom serializer; wins over the template when both are set.
    pub encode: Option<EncodeFn>,
    /// Custom deserializer.
    pub decode: Option<DecodeFn>,
    /// Key schema applied by the default codec.
    pub template: Option<Template>,
}

impl TypeDef {
    /// A definition with no custom behavior (the default codec).
    pub fn new() -> TypeDef { TypeDef::default() }

    /// Attaches a custom serializer.
    pub fn with_encode<F>(mut self, f: F) -> TypeDef
    where
        F: Fn(&Value) -> Result<Vec<Value>, EncodeError> + 'static,
    {
        self.encode = Some(Rc::new(f));
        self
    }

    /// Attaches a custom deserializer.
    pub fn with_decode<F>(mut self, f: F) -> TypeDef
    where
        F: Fn(Vec<Value>) -> Result<Value, DecodeError> + 'static,
    {
        self.decode = Some(Rc::new(f));
        self
    }

    /// Attaches a key schema.
    pub fn with_template(mut self, template: Template) -> TypeDef {
        self.template = Some(template);
        self
    }
}

pub(crate) struct TypeEntry {
    pub(crate) class: ClassHandle,
    pub(crate) wire_name: Bytes,
    pub(crate) def: TypeDef,
}

#[derive(Default)]
/// Bidirectional `name ↔ class` registry; both directions unique.
pub(crate) struct TypeRegistry {
    by_name: HashMap<Bytes, TypeEntry>,
    names: HashMap<usize, Bytes>,
}

impl TypeRegistry {
    pub(crate) fn insert(
        &mut self,
        class: ClassHandle,
        name: &str,
        def: TypeDef,
    ) -> Result<(), RegistryError> {
        let wire = Bytes::copy_from_slice(name.as_bytes());
        if self.by_name.contains_key(&wire) {
            return Err(RegistryError::DuplicateName(name.to_string()));
        }
        if let Some(existing) = self.names.get(&class.key()) {
            return Err(RegistryError::DuplicateIdentity(
                String::from_utf8_lossy(existing).into_owned(),
            ));
        }
        debug!(name, class = ?class, "registering type");
        self.names.insert(class.key(), wire.clone());
        self.by_name.insert(
            wire.clone(),
            TypeEntry {
                class,
                wire_name: wire,
                def,
            },
        );
        Ok(())
    }

    pub(crate) fn remove_name(&mut self, name: &str) -> bool {
        match self.by_name.remove(name.as_bytes()) {
            Some(entry) => {
                self.names.remove(&entry.class.key());
                debug!(name, "unregistered type");
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove_class(&mut self, class: &ClassHandle) -> bool {
        match self.names.remove(&class.key()) {
            Some(name) => {
                self.by_name.remove(&name);
                debug!(class = ?class, "unregistered type");
                true
            }
            None => false,
        }
    }

    pub(crate) fn get(&self, name: &[u8]) -> Option<&TypeEntry> { self.by_name.get(name) }

    pub(crate) fn entry_for_class(&self, class: &ClassHandle) -> Option<&TypeEntry> {
        self.names
            .get(&class.key())
            .and_then(|name| self.by_name.get(name))
    }
}

#[derive(Default)]
/// `name ↔ identity` registry for values that serialize by reference only.
pub(crate) struct ResourceRegistry {
    by_name: HashMap<Bytes, Value>,
    names: HashMap<RefKey, Bytes>,
}

impl ResourceRegistry {
    pub(crate) fn insert(&mut self, name: &str, value: Value) -> Result<(), RegistryError> {
        let key = value.ref_key().ok_or(RegistryError::NotShareable)?;
        let wire = Bytes::copy_from_slice(name.as_bytes());
        if self.by_name.contains_key(&wire) {
            return Err(RegistryError::DuplicateName(name.to_string()));
        }
        if let Some(existing) = self.names.get(&key) {
            return Err(RegistryError::DuplicateIdentity(
                String::from_utf8_lossy(existing).into_owned(),
            ));
        }
        debug!(name, "registering resource");
        self.names.insert(key, wire.clone());
        self.by_name.insert(wire, value);
        Ok(())
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<Value> {
        let value = self.by_name.remove(name.as_bytes())?;
        if let Some(key) = value.ref_key() {
            self.names.remove(&key);
        }
        debug!(name, "unregistered resource");
        Some(value)
    }

    pub(crate) fn name_of(&self, key: &RefKey) -> Option<&Bytes> { self.names.get(key) }

    pub(crate) fn get(&self, name: &[u8]) -> Option<&Value> { self.by_name.get(name) }
}
