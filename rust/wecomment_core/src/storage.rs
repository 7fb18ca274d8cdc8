//! Persisted key/value storage seam.

use std::collections::HashMap;

/// Storage scope. Settings and credentials live apart so either can be
/// cleared without touching the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Sync,
    Local,
}

pub trait KeyValueStore {
    fn get(&self, scope: Scope, key: &str) -> Option<String>;
    fn set(&mut self, scope: Scope, key: &str, value: &str);
    fn remove(&mut self, scope: Scope, key: &str);
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<(Scope, String), String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, scope: Scope, key: &str) -> Option<String> {
        self.entries.get(&(scope, key.to_string())).cloned()
    }

    fn set(&mut self, scope: Scope, key: &str, value: &str) {
        self.entries.insert((scope, key.to_string()), value.to_string());
    }

    fn remove(&mut self, scope: Scope, key: &str) {
        self.entries.remove(&(scope, key.to_string()));
    }
}
