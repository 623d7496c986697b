use crate::{custom::ClassHandle, Value};
use hashbrown::HashSet;
use std::{cell::RefCell, rc::Rc};

/// Shared handle to a [`Table`]; this is what [`Value::Table`] holds.
pub type TableRef = Rc<RefCell<Table>>;

#[derive(Default, Debug, Clone)]
/// A dynamically keyed container with a dense 1-based array part and an
/// insertion-ordered map part, optionally tagged with a [`ClassHandle`].
///
/// The split is kept normalized on every write: assigning to key `len + 1`
/// grows the array part (pulling any now-contiguous integer keys out of the
/// map part), and assigning null removes a key entirely — removing from the
/// middle of the array part pushes the tail into the map part, which is
/// exactly the "stop at the first absent index" shape serialization wants.
///
/// # Example
///
/// ```
/// use tangle::{Table, Value};
///
/// let mut t = Table::new();
/// t.push(Value::from(4));
/// t.push(Value::from(8));
/// t.set(Value::from("name"), Value::from("edge"));
///
/// assert_eq!(t.seq_len(), 2);
/// assert_eq!(t.get(&Value::from("name")), Some(&Value::from("edge")));
/// ```
pub struct Table {
    arr: Vec<Value>,
    map: Vec<(Value, Value)>,
    class: Option<ClassHandle>,
}

impl Table {
    /// Creates an empty table.
    pub fn new() -> Table { Table::default() }

    /// Creates an empty table tagged with `class`.
    pub fn with_class(class: ClassHandle) -> Table {
        Table {
            class: Some(class),
            ..Table::default()
        }
    }

    /// The table's class, if any.
    pub fn class(&self) -> Option<&ClassHandle> { self.class.as_ref() }

    /// Tags or untags the table with a class.
    pub fn set_class(&mut self, class: Option<ClassHandle>) { self.class = class; }

    /// Number of entries across both parts.
    pub fn len(&self) -> usize { self.arr.len() + self.map.len() }

    /// Indicates whether the table holds no entries.
    pub fn is_empty(&self) -> bool { self.arr.is_empty() && self.map.is_empty() }

    /// Length of the dense 1-based integer prefix (the array part).
    pub fn seq_len(&self) -> usize { self.arr.len() }

    /// Looks up `key`. Float keys with an exact integer value are treated as
    /// that integer.
    pub fn get(&self, key: &Value) -> Option<&Value> {
        if let KeyView::Int(i) = key_view(key) {
            if i >= 1 && (i as u64) <= self.arr.len() as u64 {
                return Some(&self.arr[i as usize - 1]);
            }
        }
        self.map.iter().find(|(k, _)| key_eq(k, key)).map(|(_, v)| v)
    }

    /// Appends `val` at the next array-part position.
    pub fn push(&mut self, val: Value) {
        let next = self.arr.len() as i64 + 1;
        self.set(Value::Int(next), val);
    }

    /// Assigns `val` at `key`; assigning [`Value::Null`] removes the key.
    pub fn set(&mut self, key: Value, val: Value) {
        if let KeyView::Int(i) = key_view(&key) {
            let len = self.arr.len() as i64;
            if i >= 1 && i <= len {
                let idx = (i - 1) as usize;
                if val.is_null() {
                    // split: the tail after the removed slot moves to the map part
                    let tail = self.arr.split_off(idx + 1);
                    self.arr.pop();
                    for (j, v) in tail.into_iter().enumerate() {
                        self.map.push((Value::Int(i + 1 + j as i64), v));
                    }
                } else {
                    self.arr[idx] = val;
                }
                return;
            }
            if i == len + 1 && !val.is_null() {
                self.arr.push(val);
                self.migrate();
                return;
            }
            self.set_map(Value::Int(i), val);
            return;
        }
        self.set_map(key, val);
    }

    fn set_map(&mut self, key: Value, val: Value) {
        if let Some(pos) = self.map.iter().position(|(k, _)| key_eq(k, &key)) {
            if val.is_null() {
                self.map.remove(pos);
            } else {
                self.map[pos].1 = val;
            }
        } else if !val.is_null() {
            self.map.push((key, val));
        }
    }

    /// Pulls integer keys that became contiguous with the array part out of
    /// the map part.
    fn migrate(&mut self) {
        loop {
            let next = Value::Int(self.arr.len() as i64 + 1);
            match self.map.iter().position(|(k, _)| key_eq(k, &next)) {
                Some(pos) => {
                    let (_, v) = self.map.remove(pos);
                    self.arr.push(v);
                }
                None => break,
            }
        }
    }

    /// Iterates all entries: array part first (with materialized integer
    /// keys), then the map part in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Value, &Value)> {
        self.arr
            .iter()
            .enumerate()
            .map(|(i, v)| (Value::Int(i as i64 + 1), v))
            .chain(self.map.iter().map(|(k, v)| (k.clone(), v)))
    }

    pub(crate) fn array_part(&self) -> &[Value] { &self.arr }

    pub(crate) fn map_part(&self) -> &[(Value, Value)] { &self.map }

    /// Wraps the table in the shared handle [`Value::Table`] expects.
    pub fn into_ref(self) -> TableRef { Rc::new(RefCell::new(self)) }
}

impl PartialEq for Table {
    fn eq(&self, other: &Table) -> bool { table_eq(self, other, &mut HashSet::new()) }
}

/// Structural equality over possibly-cyclic graphs.
///
/// `open` holds the table pairs currently under comparison; re-entering an
/// open pair counts as equal, so a pair is unequal only if some reachable
/// part of the graphs actually differs. Pairs stay in the set once entered,
/// which also spares re-walking shared substructure.
pub(crate) fn value_eq(a: &Value, b: &Value, open: &mut HashSet<(usize, usize)>) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Table(x), Value::Table(y)) => {
            if Rc::ptr_eq(x, y) {
                return true;
            }
            if !open.insert((Rc::as_ptr(x) as usize, Rc::as_ptr(y) as usize)) {
                return true;
            }
            table_eq(&x.borrow(), &y.borrow(), open)
        }
        (Value::Custom(x), Value::Custom(y)) => Rc::ptr_eq(x, y),
        (Value::Proc(x), Value::Proc(y)) => Rc::ptr_eq(x, y),
        _ => false,
    }
}

pub(crate) fn table_eq(a: &Table, b: &Table, open: &mut HashSet<(usize, usize)>) -> bool {
    if a.class != b.class || a.arr.len() != b.arr.len() || a.map.len() != b.map.len() {
        return false;
    }
    a.arr.iter().zip(&b.arr).all(|(x, y)| value_eq(x, y, open))
        && a.map
            .iter()
            .all(|(k, v)| b.get(k).map_or(false, |o| value_eq(v, o, open)))
}

#[derive(PartialEq)]
enum KeyView<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Float(u64),
    Str(&'a [u8]),
    Ref(usize),
}

/// Canonical view of a value used as a key: floats carrying an exact integer
/// collapse to that integer, remaining floats compare by bit pattern, and
/// reference kinds compare by pointer.
fn key_view(v: &Value) -> KeyView<'_> {
    match v {
        Value::Null => KeyView::Null,
        Value::Bool(b) => KeyView::Bool(*b),
        Value::Int(i) => KeyView::Int(*i),
        Value::Float(f) => {
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                KeyView::Int(*f as i64)
            } else {
                KeyView::Float(f.to_bits())
            }
        }
        Value::Str(b) => KeyView::Str(b),
        Value::Table(t) => KeyView::Ref(Rc::as_ptr(t) as usize),
        Value::Custom(c) => KeyView::Ref(Rc::as_ptr(c) as *const () as usize),
        Value::Proc(p) => KeyView::Ref(Rc::as_ptr(p) as *const () as usize),
    }
}

pub(crate) fn key_eq(a: &Value, b: &Value) -> bool { key_view(a) == key_view(b) }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts_stay_normalized() {
        let mut t = Table::new();
        t.push(Value::from(1));
        t.push(Value::from(2));
        // a gap: key 4 lands in the map part
        t.set(Value::from(4), Value::from(4));
        assert_eq!(t.seq_len(), 2);

        // filling the gap migrates key 4 into the array part
        t.set(Value::from(3), Value::from(3));
        assert_eq!(t.seq_len(), 4);
        assert_eq!(t.map_part().len(), 0);
    }

    #[test]
    fn null_assignment_splits_the_array() {
        let mut t = Table::new();
        for i in 1..=4 {
            t.push(Value::from(i));
        }
        t.set(Value::from(3), Value::Null);
        assert_eq!(t.seq_len(), 2);
        assert_eq!(t.get(&Value::from(3)), None);
        assert_eq!(t.get(&Value::from(4)), Some(&Value::from(4)));
    }

    #[test]
    fn integral_float_keys_collapse() {
        let mut t = Table::new();
        t.set(Value::Float(2.0), Value::from("two"));
        assert_eq!(t.get(&Value::Int(2)), Some(&Value::from("two")));
        // -0.0 is integer key 0
        t.set(Value::Float(-0.0), Value::from("zero"));
        assert_eq!(t.get(&Value::Int(0)), Some(&Value::from("zero")));
    }

    #[test]
    fn null_value_removes() {
        let mut t = Table::new();
        t.set(Value::from("k"), Value::from(1));
        t.set(Value::from("k"), Value::Null);
        assert_eq!(t.get(&Value::from("k")), None);
        assert!(t.is_empty());
    }
}
