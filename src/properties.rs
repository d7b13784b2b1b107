//! Ordered multimap of string properties.
//!
//! Used for request and response headers, the configuration file and the
//! media-type table. Keys may repeat; lookups take an occurrence index so the
//! Nth value stored under a key can be retrieved.

use std::path::Path;

use anyhow::Context;

/// Ordered list of `(key, value)` pairs with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyStore {
    entries: Vec<(String, String)>,
}

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pair. Earlier pairs with the same key are kept.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Returns the value of the `occurrence`-th pair whose key matches `key`
    /// (ASCII case-insensitive), counting from zero.
    ///
    /// # Example
    ///
    /// ```
    /// # use docroot::properties::PropertyStore;
    /// let mut props = PropertyStore::new();
    /// props.put("Accept", "text/html");
    /// props.put("accept", "text/plain");
    /// assert_eq!(props.find("ACCEPT", 1), Some("text/plain"));
    /// assert_eq!(props.find("Accept", 2), None);
    /// ```
    pub fn find(&self, key: &str, occurrence: usize) -> Option<&str> {
        self.entries
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(key))
            .nth(occurrence)
            .map(|(_, v)| v.as_str())
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.find(key, 0)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parses `key: value` or `key<TAB>value` lines.
    ///
    /// The separator is whichever of `:` and TAB appears first on the line.
    /// Blank lines and `#` comments are ignored, lines without a separator or
    /// with an empty key are skipped.
    pub fn parse(text: &str) -> Self {
        let mut props = Self::new();

        for line in text.lines() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            let Some(sep) = line.find([':', '\t']) else {
                continue;
            };

            let key = line[..sep].trim();
            if key.is_empty() {
                continue;
            }
            props.put(key, line[sep + 1..].trim());
        }

        props
    }

    /// Reads and parses a property file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Missing configuration file '{}'", path.display()))?;
        Ok(Self::parse(&text))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PropertyStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Self::new();
        for (k, v) in iter {
            props.put(k, v);
        }
        props
    }
}
