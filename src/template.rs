use crate::{table::key_eq, Value};

#[derive(Debug, Clone, Default)]
/// A per-type key schema: an ordered list of keys whose values travel bare,
/// letting the codec omit the key strings for well-known fields.
///
/// Entries may nest: a [`TemplatePart::Nested`] flattens the sub-table at
/// its key through a sub-template of its own. Fields a template does not
/// claim still travel, as a key/value tail.
///
/// # Example
///
/// ```
/// use tangle::{Template, TemplatePart, Value};
///
/// let point = Template::keys(["x", "y"]);
/// let shot = Template::new(vec![
///     TemplatePart::Key(Value::from("damage")),
///     TemplatePart::Nested(Value::from("pos"), point),
/// ]);
/// assert_eq!(shot.len(), 2);
/// ```
pub struct Template {
    parts: Vec<TemplatePart>,
}

#[derive(Debug, Clone)]
/// One entry of a [`Template`].
pub enum TemplatePart {
    /// The value at this key travels bare, in template order.
    Key(Value),
    /// The sub-table at this key is flattened through the given template.
    Nested(Value, Template),
}

impl TemplatePart {
    /// The key this entry claims.
    pub fn key(&self) -> &Value {
        match self {
            TemplatePart::Key(k) => k,
            TemplatePart::Nested(k, _) => k,
        }
    }
}

impl Template {
    /// Builds a template from explicit parts.
    pub fn new(parts: Vec<TemplatePart>) -> Template { Template { parts } }

    /// Convenience constructor for a flat template of string keys.
    pub fn keys<I, S>(keys: I) -> Template
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Template {
            parts: keys
                .into_iter()
                .map(|k| TemplatePart::Key(Value::from(k.as_ref())))
                .collect(),
        }
    }

    /// The top-level entries in order.
    pub fn parts(&self) -> &[TemplatePart] { &self.parts }

    /// Number of top-level entries.
    pub fn len(&self) -> usize { self.parts.len() }

    /// Indicates whether the template has no entries.
    pub fn is_empty(&self) -> bool { self.parts.is_empty() }

    /// Whether `key` is claimed by a top-level entry.
    pub(crate) fn covers(&self, key: &Value) -> bool {
        self.parts.iter().any(|p| key_eq(p.key(), key))
    }
}
