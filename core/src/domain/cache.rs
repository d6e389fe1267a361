//! Per-run memoization of remote checks.

use std::collections::HashMap;

/// Key prefix for remote file existence checks.
pub const FILE_EXISTS_PREFIX: &str = "remote-file-exists";

/// Key prefix for remote directory existence checks.
pub const DIR_EXISTS_PREFIX: &str = "remote-dir-exists";

/// Build a cache key of the form `<prefix>-<path>`.
#[must_use]
pub fn cache_key(prefix: &str, path: &str) -> String {
    format!("{prefix}-{path}")
}

/// Boolean results of checks keyed by `<prefix>-<path>`.
///
/// One entry per key; inserting again overwrites.
#[derive(Debug, Default, Clone)]
pub struct CheckCache {
    entries: HashMap<String, bool>,
}

impl CheckCache {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<bool> {
        self.entries.get(key).copied()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: bool) {
        self.entries.insert(key.into(), value);
    }

    /// Remove an entry, returning the evicted value if there was one.
    pub fn remove(&mut self, key: &str) -> Option<bool> {
        self.entries.remove(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
