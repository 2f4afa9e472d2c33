//! Reference counting for routes claimed by more than one source

use std::collections::HashMap;
use std::hash::Hash;

/// RefCountLedger counts how many independent reasons justify an entry.
///
/// Entries exist only while their count is positive. Releasing an entry that
/// was never required is a bookkeeping bug in the caller and panics.
#[derive(Clone, Debug)]
pub struct RefCountLedger<K> {
    counts: HashMap<K, usize>,
}

impl<K: Hash + Eq + Clone + std::fmt::Debug> RefCountLedger<K> {
    pub fn new() -> Self {
        Self {
            counts: HashMap::new(),
        }
    }

    /// Add a reference. Returns true when the entry went from 0 to 1.
    pub fn require(&mut self, key: K) -> bool {
        let count = self.counts.entry(key).or_insert(0);
        *count += 1;
        *count == 1
    }

    /// Drop a reference. Returns true when the entry reached 0 and was removed.
    pub fn release(&mut self, key: &K) -> bool {
        let Some(count) = self.counts.get_mut(key) else {
            panic!("refcount underflow: released {:?} with no outstanding references", key);
        };
        *count -= 1;
        if *count == 0 {
            self.counts.remove(key);
            true
        } else {
            false
        }
    }

    pub fn count(&self, key: &K) -> usize {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.counts.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl<K: Hash + Eq + Clone + std::fmt::Debug> Default for RefCountLedger<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_release_transitions() {
        let mut ledger = RefCountLedger::new();
        assert!(ledger.require("a"));
        assert!(!ledger.require("a"));
        assert_eq!(ledger.count(&"a"), 2);

        assert!(!ledger.release(&"a"));
        assert!(ledger.contains(&"a"));
        assert!(ledger.release(&"a"));
        assert!(!ledger.contains(&"a"));
        assert_eq!(ledger.count(&"a"), 0);
        assert!(ledger.is_empty());
    }

    #[test]
    #[should_panic(expected = "refcount underflow")]
    fn test_release_absent_panics() {
        let mut ledger: RefCountLedger<&str> = RefCountLedger::new();
        ledger.release(&"missing");
    }
}
