//! Object indexers backed by kube-runtime reflector stores

use advertiser_core::{ObjectIndexer, ServiceKey};
use kube::Resource;
use kube_runtime::reflector::{ObjectRef, Store};
use std::sync::Arc;

/// Read side of a reflector store keyed by namespace and name
#[derive(Clone)]
pub struct ReflectorIndexer<K>
where
    K: Resource<DynamicType = ()> + Clone + 'static,
{
    store: Store<K>,
}

impl<K> ReflectorIndexer<K>
where
    K: Resource<DynamicType = ()> + Clone + 'static,
{
    pub fn new(store: Store<K>) -> Self {
        Self { store }
    }
}

impl<K> ObjectIndexer<K> for ReflectorIndexer<K>
where
    K: Resource<DynamicType = ()> + Clone + Send + Sync + 'static,
{
    fn get(&self, key: &ServiceKey) -> Option<Arc<K>> {
        self.store
            .get(&ObjectRef::new(&key.name).within(&key.namespace))
    }

    fn keys(&self) -> Vec<ServiceKey> {
        self.store.state().iter().map(|obj| ServiceKey::of(&**obj)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::Service;
    use kube::api::ObjectMeta;
    use kube_runtime::reflector;
    use kube_runtime::watcher::Event;

    fn service(namespace: &str, name: &str) -> Service {
        Service {
            metadata: ObjectMeta {
                namespace: Some(namespace.to_string()),
                name: Some(name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_lookup_by_namespace_and_name() {
        let (store, mut writer) = reflector::store::<Service>();
        writer.apply_watcher_event(&Event::Apply(service("foo", "bar")));
        writer.apply_watcher_event(&Event::Apply(service("other", "bar")));

        let index = ReflectorIndexer::new(store);
        let found = index.get(&ServiceKey::new("foo", "bar")).unwrap();
        assert_eq!(found.metadata.namespace.as_deref(), Some("foo"));
        assert!(index.get(&ServiceKey::new("foo", "missing")).is_none());

        let mut keys = index.keys();
        keys.sort();
        assert_eq!(keys, vec![ServiceKey::new("foo", "bar"), ServiceKey::new("other", "bar")]);
    }

    #[test]
    fn test_delete_removes_object() {
        let (store, mut writer) = reflector::store::<Service>();
        writer.apply_watcher_event(&Event::Apply(service("foo", "bar")));
        writer.apply_watcher_event(&Event::Delete(service("foo", "bar")));

        let index = ReflectorIndexer::new(store);
        assert!(index.get(&ServiceKey::new("foo", "bar")).is_none());
        assert!(index.keys().is_empty());
    }
}
