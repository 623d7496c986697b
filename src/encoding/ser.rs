use super::constants::*;
use crate::{
    errors::EncodeError,
    registry::TypeEntry,
    table::Table,
    template::{Template, TemplatePart},
    Codec, RefKey, TableRef, Value,
};
use bytes::Bytes;
use hashbrown::HashMap;
use smallvec::SmallVec;
use tracing::trace;

/// Graph-walking encoder; lives for one `serialize` call.
///
/// Shareable values are numbered on first sight (strings by content, the
/// reference kinds by pointer) and every later encounter emits a
/// back-reference. Plain tables are numbered before their contents so
/// cycles resolve; custom objects are numbered after their arguments, which
/// is why an argument graph reaching back into the object is an error.
pub(crate) struct Encoder<'a> {
    codec: &'a Codec,
    out: &'a mut Vec<u8>,
    seen_strs: HashMap<Bytes, u64>,
    seen_refs: HashMap<RefKey, u64>,
    open: SmallVec<[RefKey; 8]>,
    next: u64,
}

impl<'a> Encoder<'a> {
    pub(crate) fn new(codec: &'a Codec, out: &'a mut Vec<u8>) -> Encoder<'a> {
        Encoder {
            codec,
            out,
            seen_strs: HashMap::new(),
            seen_refs: HashMap::new(),
            open: SmallVec::new(),
            next: 1,
        }
    }

    #[inline(always)]
    fn next_index(&mut self) -> u64 {
        let idx = self.next;
        self.next += 1;
        idx
    }

    pub(crate) fn put_value(&mut self, v: &Value) -> Result<(), EncodeError> {
        if let Some(key) = v.ref_key() {
            return self.put_shared(v, key);
        }
        match v {
            Value::Null => self.out.push(TAG_NULL),
            Value::Bool(true) => self.out.push(TAG_TRUE),
            Value::Bool(false) => self.out.push(TAG_FALSE),
            Value::Int(i) => self.put_int(*i),
            Value::Float(f) => self.put_float(*f),
            Value::Str(b) => self.put_str(b),
            Value::Table(_) | Value::Custom(_) | Value::Proc(_) => {}
        }
        Ok(())
    }

    #[inline(always)]
    fn put_int(&mut self, i: i64) {
        if (INLINE_MIN..=INLINE_MAX).contains(&i) {
            self.out.push((i + INLINE_BIAS) as u8);
        } else {
            self.out.push(TAG_INT64);
            self.out.extend_from_slice(&i.to_be_bytes());
        }
    }

    #[inline(always)]
    fn put_len(&mut self, n: usize) { self.put_int(n as i64) }

    fn put_float(&mut self, f: f64) {
        self.out.push(TAG_FLOAT);
        if self.codec.legacy_floats {
            if f.is_nan() {
                self.out.extend_from_slice(b"NaN");
            } else {
                let text = format!("{:e}", f);
                self.out.extend_from_slice(text.as_bytes());
            }
            self.out.push(TAG_FLOAT);
        } else {
            let bits = if f.is_nan() { CANONICAL_NAN } else { f.to_bits() };
            self.out.extend_from_slice(&bits.to_be_bytes());
        }
    }

    fn put_str(&mut self, b: &Bytes) {
        if let Some(&idx) = self.seen_strs.get(b) {
            self.put_ref(idx);
            return;
        }
        let idx = self.next_index();
        self.seen_strs.insert(b.clone(), idx);
        self.out.push(TAG_STR);
        self.put_len(b.len());
        self.out.extend_from_slice(b);
    }

    #[inline(always)]
    fn put_ref(&mut self, idx: u64) {
        self.out.push(TAG_REF);
        self.put_int(idx as i64);
    }

    fn put_shared(&mut self, v: &Value, key: RefKey) -> Result<(), EncodeError> {
        if let Some(&idx) = self.seen_refs.get(&key) {
            self.put_ref(idx);
            return Ok(());
        }
        if self.open.contains(&key) {
            return Err(EncodeError::InfiniteConstructor(self.describe(v)));
        }
        let codec = self.codec;
        if let Some(name) = codec.resources.name_of(&key) {
            trace!(name = %String::from_utf8_lossy(name), "resource hit");
            self.out.push(TAG_RESOURCE);
            self.put_str(name);
            return Ok(());
        }
        match v {
            Value::Table(t) => {
                let entry = {
                    let tb = t.borrow();
                    match tb.class() {
                        Some(class) => codec.types.entry_for_class(class),
                        None => None,
                    }
                };
                match entry {
                    Some(entry) => self.put_custom(key, entry, v),
                    None => self.put_table(key, t),
                }
            }
            Value::Custom(c) => match codec.types.entry_for_class(c.class()) {
                Some(entry) => self.put_custom(key, entry, v),
                None => Err(EncodeError::Unserializable(
                    "a custom object with no registered type",
                )),
            },
            Value::Proc(p) => match &codec.proc_dump {
                Some(dump) => {
                    let body = dump(p)?;
                    let idx = self.next_index();
                    self.seen_refs.insert(key, idx);
                    self.out.push(TAG_PROC);
                    self.put_len(body.len());
                    self.out.extend_from_slice(&body);
                    Ok(())
                }
                None => Err(EncodeError::Unserializable(
                    "a procedure (no dump hook installed)",
                )),
            },
            _ => Err(EncodeError::Unserializable(v.kind())),
        }
    }

    fn put_table(&mut self, key: RefKey, t: &TableRef) -> Result<(), EncodeError> {
        let idx = self.next_index();
        self.seen_refs.insert(key, idx);
        self.out.push(TAG_TABLE);
        let tb = t.borrow();
        self.put_len(tb.seq_len());
        for v in tb.array_part() {
            self.put_value(v)?;
        }
        self.put_len(tb.map_part().len());
        for (k, v) in tb.map_part() {
            self.put_value(k)?;
            self.put_value(v)?;
        }
        Ok(())
    }

    /// Custom objects are numbered only after their arguments went out; the
    /// decoder cannot resolve a reference to an object its deserializer has
    /// not produced yet.
    fn put_custom(
        &mut self,
        key: RefKey,
        entry: &'a TypeEntry,
        v: &Value,
    ) -> Result<(), EncodeError> {
        self.open.push(key);
        let result = self.put_custom_body(entry, v);
        self.open.pop();
        result?;
        let idx = self.next_index();
        self.seen_refs.insert(key, idx);
        Ok(())
    }

    fn put_custom_body(&mut self, entry: &'a TypeEntry, v: &Value) -> Result<(), EncodeError> {
        self.out.push(TAG_CUSTOM);
        self.put_str(&entry.wire_name);
        if let Some(encode) = &entry.def.encode {
            let args = encode(v)?;
            self.put_len(args.len());
            for arg in &args {
                self.put_value(arg)?;
            }
            Ok(())
        } else if let Some(template) = &entry.def.template {
            let t = match v {
                Value::Table(t) => t,
                _ => {
                    return Err(EncodeError::Unserializable(
                        "a templated value that is not a table",
                    ))
                }
            };
            self.put_len(template.len());
            let tb = t.borrow();
            self.put_template(template, &tb)
        } else {
            let t = match v {
                Value::Table(t) => t,
                _ => {
                    return Err(EncodeError::Unserializable(
                        "a custom object with no encode callback",
                    ))
                }
            };
            let tb = t.borrow();
            self.put_len(tb.len() * 2);
            for (k, val) in tb.iter() {
                self.put_value(&k)?;
                self.put_value(val)?;
            }
            Ok(())
        }
    }

    /// Emits a table through a template: claimed values bare and in order,
    /// nested sub-tables flattened, then the unclaimed fields as a tail.
    fn put_template(&mut self, template: &Template, t: &Table) -> Result<(), EncodeError> {
        for part in template.parts() {
            match part {
                TemplatePart::Key(k) => match t.get(k) {
                    Some(v) => self.put_value(v)?,
                    None => self.out.push(TAG_NULL),
                },
                TemplatePart::Nested(k, sub) => match t.get(k) {
                    Some(Value::Table(s)) => {
                        let sb = s.borrow();
                        self.put_template(sub, &sb)?;
                    }
                    _ => self.put_template_absent(sub),
                },
            }
        }
        let tail: Vec<(Value, &Value)> =
            t.iter().filter(|(k, _)| !template.covers(k)).collect();
        self.put_len(tail.len());
        for (k, v) in tail {
            self.put_value(&k)?;
            self.put_value(v)?;
        }
        Ok(())
    }

    fn put_template_absent(&mut self, template: &Template) {
        for part in template.parts() {
            match part {
                TemplatePart::Key(_) => self.out.push(TAG_NULL),
                TemplatePart::Nested(_, sub) => self.put_template_absent(sub),
            }
        }
        self.put_len(0);
    }

    fn describe(&self, v: &Value) -> String {
        let codec = self.codec;
        let name = match v {
            Value::Table(t) => {
                let tb = t.borrow();
                tb.class()
                    .and_then(|class| codec.types.entry_for_class(class))
                    .map(|e| String::from_utf8_lossy(&e.wire_name).into_owned())
            }
            Value::Custom(c) => codec
                .types
                .entry_for_class(c.class())
                .map(|e| String::from_utf8_lossy(&e.wire_name).into_owned()),
            _ => None,
        };
        name.unwrap_or_else(|| v.kind().to_string())
    }
}
