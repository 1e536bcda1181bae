//! Key/value lookup tables referenced as `{mapName:key}` in templates.

use std::collections::HashMap;
use std::sync::Arc;

use unicase::UniCase;

/// Named table of case-insensitive keys to replacement values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RewriteMap {
    name: String,
    default_value: Option<String>,
    entries: HashMap<UniCase<String>, String>,
}

impl RewriteMap {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Value returned when a key is missing. Empty when unset.
    pub fn default_value<S: Into<String>>(mut self, value: S) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn entry<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.entries.insert(UniCase::new(key.into()), value.into());
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a key, falling back to the default value.
    pub fn lookup(&self, key: &str) -> &str {
        self.entries
            .get(&UniCase::new(key.to_owned()))
            .or(self.default_value.as_ref())
            .map(|v| v.as_str())
            .unwrap_or("")
    }
}

/// Collection of [`RewriteMap`]s addressable by case-insensitive name.
#[derive(Clone, Debug, Default)]
pub struct RewriteMaps(HashMap<UniCase<String>, Arc<RewriteMap>>);

impl RewriteMaps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a map, replacing any earlier map with the same name.
    pub fn insert(&mut self, map: RewriteMap) {
        self.0
            .insert(UniCase::new(map.name.clone()), Arc::new(map));
    }

    /// Add a map only when no map of that name is registered yet.
    pub(crate) fn insert_missing(&mut self, map: RewriteMap) {
        self.0
            .entry(UniCase::new(map.name.clone()))
            .or_insert_with(|| Arc::new(map));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<RewriteMap>> {
        self.0.get(&UniCase::new(name.to_owned()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<RewriteMap> for RewriteMaps {
    fn from_iter<T: IntoIterator<Item = RewriteMap>>(iter: T) -> Self {
        let mut maps = Self::new();
        iter.into_iter().for_each(|m| maps.insert(m));
        maps
    }
}
