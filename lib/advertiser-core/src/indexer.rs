//! Point-lookup access to watched Kubernetes objects

use kube::ResourceExt;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// namespace/name identity shared by a Service and its Endpoints
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceKey {
    pub namespace: String,
    pub name: String,
}

impl ServiceKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Key of any namespaced object; a missing namespace means "default"
    pub fn of<K: ResourceExt>(obj: &K) -> Self {
        Self {
            namespace: obj.namespace().unwrap_or_else(|| "default".to_string()),
            name: obj.name_any(),
        }
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// ObjectIndexer is a read-only view of the latest known objects of one kind.
///
/// It may lag the cluster briefly; callers treat a miss as "nothing yet".
pub trait ObjectIndexer<K>: Send + Sync {
    /// Look up an object by key
    fn get(&self, key: &ServiceKey) -> Option<Arc<K>>;

    /// Keys of all known objects
    fn keys(&self) -> Vec<ServiceKey>;
}

/// MemoryIndexer keeps objects in a map, for embedding and tests
pub struct MemoryIndexer<K> {
    // Map of namespace/name to object
    objects: RwLock<HashMap<ServiceKey, Arc<K>>>,
}

impl<K: ResourceExt> MemoryIndexer<K> {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or replace an object
    pub fn add(&self, obj: K) {
        let key = ServiceKey::of(&obj);
        debug!("Indexed {}", key);
        self.objects.write().insert(key, Arc::new(obj));
    }

    /// Remove an object by key
    pub fn delete(&self, key: &ServiceKey) -> Option<Arc<K>> {
        let removed = self.objects.write().remove(key);
        if removed.is_some() {
            debug!("Removed {} from index", key);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

impl<K: ResourceExt> Default for MemoryIndexer<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ResourceExt + Send + Sync> ObjectIndexer<K> for MemoryIndexer<K> {
    fn get(&self, key: &ServiceKey) -> Option<Arc<K>> {
        self.objects.read().get(key).cloned()
    }

    fn keys(&self) -> Vec<ServiceKey> {
        self.objects.read().keys().cloned().collect()
    }
}
