//! Revisioned key/value cache holding the published route set

use std::collections::BTreeMap;
use tokio::sync::watch;
use tracing::debug;

/// RouteCache is the authoritative key -> CIDR map handed to the store.
///
/// Every insert or delete bumps the revision by exactly one and notifies
/// subscribers, which lets observers count mutations without diffing content.
#[derive(Debug)]
pub struct RouteCache {
    entries: BTreeMap<String, String>,
    revision: u64,
    notify: watch::Sender<u64>,
}

impl RouteCache {
    pub fn new() -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            entries: BTreeMap::new(),
            revision: 0,
            notify,
        }
    }

    /// Write an entry
    pub fn write(&mut self, key: String, value: String) {
        debug!("Cache write {} = {}", key, value);
        self.entries.insert(key, value);
        self.bump();
    }

    /// Delete an entry. Deleting an absent key is not a mutation.
    pub fn delete(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            debug!("Cache delete {}", key);
            self.bump();
            true
        } else {
            false
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy of the current entries
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries.clone()
    }

    /// Receiver that observes every revision change
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.notify.subscribe()
    }

    fn bump(&mut self) {
        self.revision += 1;
        self.notify.send_replace(self.revision);
    }
}

impl Default for RouteCache {
    fn default() -> Self {
        Self::new()
    }
}
