//! Header sets and default-header composition.

use crate::error::{Error, Result};

/// The `Content-Type` field name.
pub const CONTENT_TYPE: &str = "Content-Type";

/// An ordered mapping of header names to values.
///
/// Names are kept exactly as supplied and compared case-sensitively.
/// Inserting an existing name replaces its value in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<(String, String)>,
}

impl HeaderSet {
    /// Create an empty header set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header, replacing any value stored under the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Get the value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    /// Check whether `name` is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of headers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Build a header set from a JSON object.
    ///
    /// String values are taken verbatim; numbers and booleans are rendered
    /// as text. `null`, arrays and objects are rejected.
    pub fn from_json_object(object: &serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        use serde_json::Value;

        let mut headers = Self::new();
        for (name, value) in object {
            let value = match value {
                Value::String(text) => text.clone(),
                Value::Number(number) => number.to_string(),
                Value::Bool(flag) => flag.to_string(),
                Value::Null | Value::Array(_) | Value::Object(_) => {
                    return Err(Error::invalid_option(
                        name.clone(),
                        "header values must be strings, numbers or booleans",
                    ));
                }
            };
            headers.insert(name.clone(), value);
        }
        Ok(headers)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for HeaderSet {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

/// Merge instance defaults under per-call headers.
///
/// Call headers always win. A default `Content-Type` is skipped whenever an
/// explicit content type is in effect; that one name is matched
/// case-insensitively.
pub fn compose_headers(
    defaults: Option<&HeaderSet>,
    call: Option<&HeaderSet>,
    content_type_override: Option<&str>,
) -> HeaderSet {
    let mut composed = call.cloned().unwrap_or_default();

    for (name, value) in defaults.into_iter().flat_map(|headers| headers.iter()) {
        if composed.contains(name) {
            continue;
        }
        if content_type_override.is_some() && name.eq_ignore_ascii_case(CONTENT_TYPE) {
            continue;
        }
        composed.insert(name, value);
    }

    composed
}
