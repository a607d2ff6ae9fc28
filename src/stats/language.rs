use std::collections::btree_map::{self, BTreeMap};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::counters::{Edits, TimeAllocation};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct CodingLanguage {
    pub time: TimeAllocation,
    pub edits: Edits,
}

impl CodingLanguage {
    pub fn from_partial(value: &Value) -> Self {
        Self {
            time: value
                .get("time")
                .map(TimeAllocation::from_partial)
                .unwrap_or_default(),
            edits: value
                .get("edits")
                .map(Edits::from_partial)
                .unwrap_or_default(),
        }
    }

    pub fn combine(&mut self, other: &CodingLanguage) {
        self.time.combine(&other.time);
        self.edits.combine(&other.edits);
    }
}

impl From<Value> for CodingLanguage {
    fn from(value: Value) -> Self {
        Self::from_partial(&value)
    }
}

/// Per-language stats keyed by the editor's language identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LanguageCollection(BTreeMap<String, CodingLanguage>);

impl LanguageCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_partial(value: &Value) -> Self {
        let mut languages = BTreeMap::new();
        if let Value::Object(entries) = value {
            for (name, language) in entries {
                languages.insert(name.clone(), CodingLanguage::from_partial(language));
            }
        }
        Self(languages)
    }

    pub fn get(&self, name: &str) -> Option<&CodingLanguage> {
        self.0.get(name)
    }

    pub fn get_or_create(&mut self, name: &str) -> &mut CodingLanguage {
        self.0.entry(name.to_string()).or_default()
    }

    /// Merges every language of `other` into this collection, inserting the
    /// ones not yet present.
    pub fn combine(&mut self, other: &LanguageCollection) {
        for (name, language) in &other.0 {
            match self.0.get_mut(name) {
                Some(existing) => existing.combine(language),
                None => {
                    self.0.insert(name.clone(), *language);
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, CodingLanguage> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a LanguageCollection {
    type Item = (&'a String, &'a CodingLanguage);
    type IntoIter = btree_map::Iter<'a, String, CodingLanguage>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Serialize for LanguageCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for LanguageCollection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_partial(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::NetAddRemove;
    use serde_json::json;

    fn language(total: f64, active: f64, lines_added: i64) -> CodingLanguage {
        CodingLanguage {
            time: TimeAllocation {
                total_time: total,
                active_time: active,
            },
            edits: Edits {
                lines: NetAddRemove::new(lines_added, 0),
                ..Edits::default()
            },
        }
    }

    #[test]
    fn partial_language_defaults_missing_parts() {
        let parsed = CodingLanguage::from_partial(&json!({ "time": { "totalTime": 40 } }));
        assert_eq!(parsed.time.total_time, 40.0);
        assert_eq!(parsed.edits, Edits::default());
        assert_eq!(CodingLanguage::from_partial(&json!(null)), CodingLanguage::default());
    }

    #[test]
    fn collection_ignores_non_object_input() {
        assert!(LanguageCollection::from_partial(&json!([1, 2])).is_empty());
        let parsed = LanguageCollection::from_partial(&json!({ "rust": {}, "go": 7 }));
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.get("go"), Some(&CodingLanguage::default()));
    }

    #[test]
    fn combine_merges_or_inserts() {
        let mut current = LanguageCollection::new();
        *current.get_or_create("javascript") = language(100.0, 50.0, 3);
        *current.get_or_create("rust") = language(10.0, 10.0, 1);

        let mut other = LanguageCollection::new();
        *other.get_or_create("javascript") = language(20.0, 5.0, 2);
        *other.get_or_create("typescript") = language(7.0, 7.0, 9);

        current.combine(&other);

        assert_eq!(current.len(), 3);
        assert_eq!(current.get("javascript"), Some(&language(120.0, 55.0, 5)));
        assert_eq!(current.get("rust"), Some(&language(10.0, 10.0, 1)));
        assert_eq!(current.get("typescript"), Some(&language(7.0, 7.0, 9)));
    }

    #[test]
    fn serializes_as_a_plain_map() {
        let mut languages = LanguageCollection::new();
        languages.get_or_create("rust").time.add(5.0, true);
        let value = serde_json::to_value(&languages).unwrap();
        assert_eq!(value["rust"]["time"]["activeTime"], json!(5.0));
    }
}
