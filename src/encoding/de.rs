use super::constants::*;
use crate::{
    errors::DecodeError,
    table::Table,
    template::{Template, TemplatePart},
    Codec, Value,
};
use bytes::Bytes;
use std::{cell::RefCell, rc::Rc};

/// Cursor-driven recursive-descent decoder; lives for one `deserialize`
/// call and mirrors the encoder's identity numbering.
///
/// Every read is bounds-checked, every length is validated against the
/// remaining input, and nesting is capped by the codec's recursion limit,
/// so arbitrary input either decodes or raises a typed error.
pub(crate) struct Decoder<'a> {
    codec: &'a Codec,
    data: Bytes,
    pos: usize,
    seen: Vec<Value>,
    depth: usize,
}

impl<'a> Decoder<'a> {
    pub(crate) fn new(codec: &'a Codec, data: &[u8]) -> Decoder<'a> {
        Decoder {
            codec,
            data: Bytes::copy_from_slice(data),
            pos: 0,
            seen: Vec::new(),
            depth: 0,
        }
    }

    pub(crate) fn has_remaining(&self) -> bool { self.pos < self.data.len() }

    fn remaining(&self) -> usize { self.data.len() - self.pos }

    #[inline(always)]
    fn need(&self, n: usize) -> Result<(), DecodeError> {
        if self.remaining() < n {
            Err(DecodeError::Truncated {
                offset: self.pos,
                needed: n,
                remaining: self.remaining(),
            })
        } else {
            Ok(())
        }
    }

    #[inline(always)]
    fn take_u8(&mut self) -> Result<u8, DecodeError> {
        self.need(1)?;
        let b = self.data[self.pos];
        self.pos += 1;
        Ok(b)
    }

    #[inline(always)]
    fn take_slice(&mut self, n: usize) -> Result<Bytes, DecodeError> {
        self.need(n)?;
        let b = self.data.slice(self.pos..self.pos + n);
        self.pos += n;
        Ok(b)
    }

    #[inline(always)]
    fn take_array(&mut self) -> Result<[u8; 8], DecodeError> {
        self.need(8)?;
        let mut a = [0u8; 8];
        a.copy_from_slice(&self.data[self.pos..self.pos + 8]);
        self.pos += 8;
        Ok(a)
    }

    pub(crate) fn read_value(&mut self) -> Result<Value, DecodeError> {
        if self.depth >= self.codec.recursion_limit {
            return Err(DecodeError::DepthLimit {
                offset: self.pos,
                limit: self.codec.recursion_limit,
            });
        }
        self.depth += 1;
        let v = self.read_value_inner();
        self.depth -= 1;
        v
    }

    fn read_value_inner(&mut self) -> Result<Value, DecodeError> {
        let off = self.pos;
        let tag = self.take_u8()?;
        match tag {
            1..=INLINE_TOP => Ok(Value::Int(tag as i64 - INLINE_BIAS)),
            TAG_NULL => Ok(Value::Null),
            TAG_TRUE => Ok(Value::Bool(true)),
            TAG_FALSE => Ok(Value::Bool(false)),
            TAG_FLOAT => self.read_float(off),
            TAG_INT64 => Ok(Value::Int(i64::from_be_bytes(self.take_array()?))),
            TAG_STR => {
                let len = self.read_len()?;
                let v = Value::Str(self.take_slice(len)?);
                self.seen.push(v.clone());
                Ok(v)
            }
            TAG_TABLE => self.read_table(),
            TAG_REF => self.read_backref(),
            TAG_CUSTOM => self.read_custom(),
            TAG_PROC => self.read_proc(off),
            TAG_RESOURCE => self.read_resource(),
            _ => Err(DecodeError::BadTag { tag, offset: off }),
        }
    }

    fn read_float(&mut self, off: usize) -> Result<Value, DecodeError> {
        if self.codec.legacy_floats {
            let rest = &self.data[self.pos..];
            let end = rest
                .iter()
                .position(|&b| b == TAG_FLOAT)
                .ok_or(DecodeError::Truncated {
                    offset: self.data.len(),
                    needed: 1,
                    remaining: 0,
                })?;
            let parsed = std::str::from_utf8(&rest[..end])
                .ok()
                .and_then(|s| s.parse::<f64>().ok());
            self.pos += end + 1;
            match parsed {
                Some(f) => Ok(Value::Float(f)),
                None => Err(DecodeError::MalformedNumber { offset: off }),
            }
        } else {
            Ok(Value::Float(f64::from_bits(u64::from_be_bytes(
                self.take_array()?,
            ))))
        }
    }

    /// Lengths, counts, and indices are full value encodings. Exactly
    /// integral non-negative floats are accepted too, for encoders that
    /// write their embedded integers as doubles.
    fn read_len(&mut self) -> Result<usize, DecodeError> {
        let off = self.pos;
        match self.read_value()? {
            Value::Int(i) if i >= 0 && (i as u64) <= self.remaining() as u64 => Ok(i as usize),
            Value::Int(i) => Err(DecodeError::BadLength { offset: off, len: i }),
            Value::Float(f) if f >= 0.0 && f.fract() == 0.0 && f <= self.remaining() as f64 => {
                Ok(f as usize)
            }
            Value::Float(f) => Err(DecodeError::BadLength {
                offset: off,
                len: f as i64,
            }),
            _ => Err(DecodeError::BadLength { offset: off, len: -1 }),
        }
    }

    fn read_backref(&mut self) -> Result<Value, DecodeError> {
        let off = self.pos;
        let index = match self.read_value()? {
            Value::Int(i) => i,
            Value::Float(f) if f.fract() == 0.0 => f as i64,
            _ => {
                return Err(DecodeError::BadReference {
                    offset: off,
                    index: -1,
                    len: self.seen.len(),
                })
            }
        };
        if index >= 1 && (index as u64) <= self.seen.len() as u64 {
            Ok(self.seen[index as usize - 1].clone())
        } else {
            Err(DecodeError::BadReference {
                offset: off,
                index,
                len: self.seen.len(),
            })
        }
    }

    /// The fresh table is installed in the identity table before its
    /// contents decode, so back-references inside them resolve.
    fn read_table(&mut self) -> Result<Value, DecodeError> {
        let t = Rc::new(RefCell::new(Table::new()));
        self.seen.push(Value::Table(t.clone()));
        let alen = self.read_len()?;
        for i in 1..=alen {
            let v = self.read_value()?;
            t.borrow_mut().set(Value::Int(i as i64), v);
        }
        let msize = self.read_len()?;
        for _ in 0..msize {
            let k = self.read_value()?;
            let v = self.read_value()?;
            t.borrow_mut().set(k, v);
        }
        Ok(Value::Table(t))
    }

    /// Custom objects join the identity table only after the deserializer
    /// has produced them, matching the encoder's numbering.
    fn read_custom(&mut self) -> Result<Value, DecodeError> {
        let name_off = self.pos;
        let name = match self.read_value()? {
            Value::Str(b) => b,
            _ => return Err(DecodeError::BadName { offset: name_off }),
        };
        let codec = self.codec;
        let entry = codec
            .types
            .get(&name)
            .ok_or_else(|| DecodeError::UnknownType {
                name: String::from_utf8_lossy(&name).into_owned(),
            })?;
        let count_off = self.pos;
        let count = self.read_len()?;
        let v = if let Some(decode) = &entry.def.decode {
            let mut args = Vec::with_capacity(count);
            for _ in 0..count {
                args.push(self.read_value()?);
            }
            decode(args)?
        } else if let Some(template) = &entry.def.template {
            if count != template.len() {
                return Err(DecodeError::BadLength {
                    offset: count_off,
                    len: count as i64,
                });
            }
            let t = Rc::new(RefCell::new(Table::with_class(entry.class.clone())));
            self.read_template(template, &t)?;
            Value::Table(t)
        } else {
            if count % 2 != 0 {
                return Err(DecodeError::BadLength {
                    offset: count_off,
                    len: count as i64,
                });
            }
            let t = Rc::new(RefCell::new(Table::with_class(entry.class.clone())));
            for _ in 0..count / 2 {
                let k = self.read_value()?;
                let v = self.read_value()?;
                t.borrow_mut().set(k, v);
            }
            Value::Table(t)
        };
        self.seen.push(v.clone());
        Ok(v)
    }

    fn read_template(
        &mut self,
        template: &Template,
        t: &Rc<RefCell<Table>>,
    ) -> Result<(), DecodeError> {
        for part in template.parts() {
            match part {
                TemplatePart::Key(k) => {
                    let v = self.read_value()?;
                    t.borrow_mut().set(k.clone(), v);
                }
                TemplatePart::Nested(k, sub) => {
                    let s = Rc::new(RefCell::new(Table::new()));
                    self.read_template(sub, &s)?;
                    t.borrow_mut().set(k.clone(), Value::Table(s));
                }
            }
        }
        let tail = self.read_len()?;
        for _ in 0..tail {
            let k = self.read_value()?;
            let v = self.read_value()?;
            t.borrow_mut().set(k, v);
        }
        Ok(())
    }

    fn read_proc(&mut self, off: usize) -> Result<Value, DecodeError> {
        let codec = self.codec;
        let load = match &codec.proc_load {
            Some(load) => load,
            None => {
                return Err(DecodeError::BadTag {
                    tag: TAG_PROC,
                    offset: off,
                })
            }
        };
        let len = self.read_len()?;
        let body = self.take_slice(len)?;
        let v = Value::Proc(Rc::new(load(&body)?));
        self.seen.push(v.clone());
        Ok(v)
    }

    /// Resources resolve by name against the current registry and are not
    /// identity-tracked; the name string itself is, by the string rule.
    fn read_resource(&mut self) -> Result<Value, DecodeError> {
        let off = self.pos;
        let name = match self.read_value()? {
            Value::Str(b) => b,
            _ => return Err(DecodeError::BadName { offset: off }),
        };
        let codec = self.codec;
        codec
            .resources
            .get(&name)
            .cloned()
            .ok_or_else(|| DecodeError::UnknownResource {
                name: String::from_utf8_lossy(&name).into_owned(),
            })
    }
}
