//! Ordered multi-map of submitted form fields.
//!
//! Browsers submit forms as a sequence of `key=value` pairs in document order, and a key may
//! repeat (checkbox groups, table rows). [`FormData`] keeps that sequence intact so builders can
//! process fields in submission order and the transport layer can tell single values from
//! repeated ones.

use crate::{FormsError, FormsResult};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

/// A single `(key, value)` pair from a form submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldEntry {
    pub key: String,
    pub value: String,
}

impl FieldEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormData {
    entries: Vec<FieldEntry>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a form from pairs in submission order.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| FieldEntry::new(k, v))
                .collect(),
        }
    }

    /// Parse an `application/x-www-form-urlencoded` body.
    ///
    /// `+` decodes to a space and percent escapes are decoded as UTF-8. A pair without `=`
    /// is kept with an empty value, matching how browsers submit valueless fields.
    ///
    /// # Errors
    ///
    /// Returns [`FormsError::InvalidEncoding`] if a percent escape does not decode to UTF-8.
    pub fn from_urlencoded(body: &str) -> FormsResult<Self> {
        fn decode(part: &str) -> FormsResult<String> {
            let spaced = part.replace('+', " ");
            urlencoding::decode(&spaced)
                .map(|cow| cow.into_owned())
                .map_err(|e| FormsError::InvalidEncoding(format!("'{part}': {e}")))
        }

        let mut form = Self::new();
        for pair in body.trim().split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            form.append(decode(key)?, decode(value)?);
        }
        Ok(form)
    }

    /// Render as an `application/x-www-form-urlencoded` body.
    pub fn to_urlencoded(&self) -> String {
        self.entries
            .iter()
            .map(|e| {
                format!(
                    "{}={}",
                    urlencoding::encode(&e.key),
                    urlencoding::encode(&e.value)
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push(FieldEntry::new(key, value));
    }

    /// Replace every value of `key` with a single value, keeping the position of the first
    /// occurrence (or appending if the key is new).
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter().position(|e| e.key == key) {
            Some(first) => {
                self.entries[first].value = value;
                let mut index = 0;
                self.entries.retain(|e| {
                    let keep = index <= first || e.key != key;
                    index += 1;
                    keep
                });
            }
            None => self.append(key, value),
        }
    }

    /// Remove every value of `key`.
    pub fn delete(&mut self, key: &str) {
        self.entries.retain(|e| e.key != key);
    }

    /// First value submitted for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }

    /// Every value submitted for `key`, in submission order.
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.key == key)
            .map(|e| e.value.as_str())
            .collect()
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }

    /// Distinct keys in order of first occurrence.
    pub fn keys(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .map(|e| e.key.as_str())
            .filter(|key| seen.insert(*key))
            .collect()
    }

    /// Values grouped by key, keys in order of first occurrence and values in submission
    /// order. One pass over the form.
    pub fn grouped(&self) -> Vec<(&str, Vec<&str>)> {
        let mut groups: Vec<(&str, Vec<&str>)> = Vec::new();
        let mut slots: HashMap<&str, usize> = HashMap::new();
        for entry in &self.entries {
            match slots.entry(entry.key.as_str()) {
                Entry::Occupied(slot) => groups[*slot.get()].1.push(entry.value.as_str()),
                Entry::Vacant(slot) => {
                    slot.insert(groups.len());
                    groups.push((entry.key.as_str(), vec![entry.value.as_str()]));
                }
            }
        }
        groups
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a FormData {
    type Item = &'a FieldEntry;
    type IntoIter = std::slice::Iter<'a, FieldEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<FieldEntry> for FormData {
    fn from_iter<I: IntoIterator<Item = FieldEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_urlencoded_body_in_order() {
        let form = FormData::from_urlencoded(
            "transaction_amount=12.5&note=hello+world&city=S%C3%A3o%20Paulo&flag&&tag=a&tag=b",
        )
        .expect("parse form");

        assert_eq!(form.len(), 6);
        assert_eq!(form.get("transaction_amount"), Some("12.5"));
        assert_eq!(form.get("note"), Some("hello world"));
        assert_eq!(form.get("city"), Some("São Paulo"));
        assert_eq!(form.get("flag"), Some(""));
        assert_eq!(form.get_all("tag"), vec!["a", "b"]);
        assert_eq!(
            form.keys(),
            vec!["transaction_amount", "note", "city", "flag", "tag"]
        );
    }

    #[test]
    fn groups_repeated_keys_in_first_seen_order() {
        let form = FormData::from_pairs([("b", "1"), ("a", "2"), ("b", "3"), ("c", ""), ("a", "4")]);
        assert_eq!(form.keys(), vec!["b", "a", "c"]);
        assert_eq!(
            form.grouped(),
            vec![("b", vec!["1", "3"]), ("a", vec!["2", "4"]), ("c", vec![""])]
        );
    }

    #[test]
    fn rejects_invalid_utf8_escapes() {
        let err = FormData::from_urlencoded("name=%FF%FE").expect_err("invalid utf-8");
        assert!(matches!(err, FormsError::InvalidEncoding(_)));
    }

    #[test]
    fn urlencoded_round_trip_preserves_values() {
        let form = FormData::from_pairs([("json:identity", "{\"a\": [1, 2]}"), ("sent_at", "now & then")]);
        let reparsed = FormData::from_urlencoded(&form.to_urlencoded()).expect("reparse");
        assert_eq!(form, reparsed);
    }

    #[test]
    fn set_replaces_all_values_at_first_position() {
        let mut form = FormData::from_pairs([("a", "1"), ("b", "2"), ("a", "3"), ("c", "4")]);
        form.set("a", "9");
        assert_eq!(
            form.iter().map(|e| (e.key.as_str(), e.value.as_str())).collect::<Vec<_>>(),
            vec![("a", "9"), ("b", "2"), ("c", "4")]
        );

        form.set("d", "5");
        assert_eq!(form.get("d"), Some("5"));

        form.delete("b");
        assert!(!form.has("b"));
        assert_eq!(form.len(), 3);
    }
}
