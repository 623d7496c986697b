use crate::{
    custom::{ClassDescriptor, ClassHandle},
    encoding::{de::Decoder, ser::Encoder},
    errors::{DecodeError, EncodeError, RegistryError},
    registry::{ProcDumpFn, ProcLoadFn, ResourceRegistry, TypeDef, TypeRegistry},
    Value,
};

/// Decoder recursion limit a fresh instance starts with.
pub const DEFAULT_RECURSION_LIMIT: usize = 512;

/// An independent codec instance: type and resource registries, procedure
/// hooks, and wire options. Instances share nothing, so two libraries in
/// one process can register the same type name to different codecs.
///
/// The crate-level [`serialize`](crate::serialize) and
/// [`deserialize`](crate::deserialize) functions run on a fresh,
/// registration-free instance.
///
/// # Example
///
/// ```
/// use tangle::{ClassHandle, Codec, Table, TypeDef, Value};
///
/// let class = ClassHandle::named("point");
/// let mut codec = Codec::new();
/// codec.register(class.clone(), "point", TypeDef::new()).unwrap();
///
/// let mut t = Table::with_class(class.clone());
/// t.set(Value::from("x"), Value::from(3));
///
/// let bytes = codec.serialize(&[Value::from(t)]).unwrap();
/// let back = codec.deserialize(&bytes).unwrap();
/// let table = back[0].to_table().unwrap();
/// assert_eq!(table.borrow().class(), Some(&class));
/// ```
pub struct Codec {
    pub(crate) types: TypeRegistry,
    pub(crate) resources: ResourceRegistry,
    pub(crate) proc_dump: Option<ProcDumpFn>,
    pub(crate) proc_load: Option<ProcLoadFn>,
    pub(crate) legacy_floats: bool,
    pub(crate) recursion_limit: usize,
}

impl Default for Codec {
    fn default() -> Codec {
        Codec {
            types: TypeRegistry::default(),
            resources: ResourceRegistry::default(),
            proc_dump: None,
            proc_load: None,
            legacy_floats: false,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }
}

impl Codec {
    /// Creates an instance with empty registries.
    pub fn new() -> Codec { Codec::default() }

    /// Serializes a tuple of values into a fresh byte string.
    ///
    /// Shared substructure is numbered on first sight and back-referenced
    /// after that, across the whole tuple.
    pub fn serialize(&self, values: &[Value]) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::new();
        self.serialize_into(values, &mut out)?;
        Ok(out)
    }

    /// Serializes a tuple of values, appending to `out`.
    ///
    /// On error, bytes already appended are garbage and should be discarded.
    pub fn serialize_into(&self, values: &[Value], out: &mut Vec<u8>) -> Result<(), EncodeError> {
        let mut enc = Encoder::new(self, out);
        for v in values {
            enc.put_value(v)?;
        }
        Ok(())
    }

    /// Decodes every value in `data`.
    pub fn deserialize(&self, data: &[u8]) -> Result<Vec<Value>, DecodeError> {
        self.deserialize_n(data, usize::MAX)
    }

    /// Decodes at most `limit` values from the front of `data`; trailing
    /// bytes are left unread.
    pub fn deserialize_n(&self, data: &[u8], limit: usize) -> Result<Vec<Value>, DecodeError> {
        let mut dec = Decoder::new(self, data);
        let mut out = Vec::new();
        while out.len() < limit && dec.has_remaining() {
            out.push(dec.read_value()?);
        }
        Ok(out)
    }

    /// Registers `class` under `name`. Fails if either the name or the
    /// class is already registered.
    pub fn register(
        &mut self,
        class: ClassHandle,
        name: &str,
        def: TypeDef,
    ) -> Result<(), RegistryError> {
        self.types.insert(class, name, def)
    }

    /// Resolves a class descriptor to its instance identity and registers
    /// it; the name falls back to the descriptor's own.
    pub fn register_class(
        &mut self,
        desc: &dyn ClassDescriptor,
        name: Option<&str>,
        def: TypeDef,
    ) -> Result<(), RegistryError> {
        let class = desc.instance_class();
        match name {
            Some(name) => self.types.insert(class, name, def),
            None => match desc.class_name() {
                Some(name) => self.types.insert(class, name, def),
                None => Err(RegistryError::MissingName),
            },
        }
    }

    /// Removes the registration under `name`. Returns whether one existed.
    pub fn unregister(&mut self, name: &str) -> bool { self.types.remove_name(name) }

    /// Removes the registration for `class`. Returns whether one existed.
    pub fn unregister_class(&mut self, class: &ClassHandle) -> bool {
        self.types.remove_class(class)
    }

    /// Registers `value` as a resource: it will serialize as `name` alone
    /// and re-resolve against this registry on decode. The value must be a
    /// table, custom object, or procedure.
    pub fn register_resource(&mut self, name: &str, value: Value) -> Result<(), RegistryError> {
        self.resources.insert(name, value)
    }

    /// Removes the resource under `name`, returning it if present.
    pub fn unregister_resource(&mut self, name: &str) -> Option<Value> {
        self.resources.remove(name)
    }

    /// Installs the host hook pair for opaque procedures. Without hooks,
    /// procedures fail to encode and their tag is rejected on decode.
    pub fn set_proc_hooks(&mut self, dump: ProcDumpFn, load: ProcLoadFn) {
        self.proc_dump = Some(dump);
        self.proc_load = Some(load);
    }

    /// Switches floats to the legacy text form (`203 text 203`) on both the
    /// encode and decode side of this instance.
    pub fn set_legacy_floats(&mut self, on: bool) { self.legacy_floats = on; }

    /// Bounds decoder nesting; adversarially deep input errors out instead
    /// of exhausting the stack.
    pub fn set_recursion_limit(&mut self, limit: usize) { self.recursion_limit = limit; }
}
