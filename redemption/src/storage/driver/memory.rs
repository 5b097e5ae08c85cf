//! In-process object store. Backs the `MEMORY` storage type and the tests.

use std::collections::HashMap;

use crate::storage::{ObjectStore, Precondition, StorageError, StoredObject};
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    objects: HashMap<String, (Vec<u8>, u64)>,
    next_version: u64,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryStore {
    async fn get_object(&self, key: &str) -> Result<Option<StoredObject>, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner.objects.get(key).map(|(data, version)| StoredObject {
            data: data.clone(),
            version: Some(version.to_string()),
        }))
    }

    async fn put_object(
        &self,
        key: &str,
        data: Vec<u8>,
        precondition: Precondition,
    ) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        if let Precondition::IfMatch(expected) = &precondition {
            let current = inner.objects.get(key).map(|(_, v)| v.to_string());
            if current.as_deref() != Some(expected.as_str()) {
                return Err(StorageError::PreconditionFailed(key.to_string()));
            }
        }
        inner.next_version += 1;
        let version = inner.next_version;
        inner.objects.insert(key.to_string(), (data, version));
        Ok(())
    }
}
