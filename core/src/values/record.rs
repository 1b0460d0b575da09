use std::collections::BTreeMap;
use std::rc::Rc;

use ecow::EcoString;

use super::Value;

/// An immutable record with keys kept in sorted order.
#[derive(Clone, Default)]
pub struct Record(Rc<BTreeMap<EcoString, Value>>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EcoString, &Value)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &EcoString> {
        self.0.keys()
    }

    /// Returns a copy of this record with `key` set to `value`.
    pub fn with(&self, key: impl Into<EcoString>, value: Value) -> Self {
        let mut map = (*self.0).clone();
        map.insert(key.into(), value);
        Self(Rc::new(map))
    }

    pub fn structural_eq(&self, other: &Record) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
            || (self.len() == other.len()
                && self
                    .iter()
                    .zip(other.iter())
                    .all(|((ka, va), (kb, vb))| ka == kb && va.structural_eq(vb)))
    }
}

impl<K: Into<EcoString>> FromIterator<(K, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(Rc::new(
            iter.into_iter().map(|(key, value)| (key.into(), value)).collect(),
        ))
    }
}
