use crate::config::{Config, StorageKind};
use crate::domain::token::{ObjectTokenRepository, TokenRepository};
use crate::storage::ObjectStore;
use crate::storage::driver::{filesystem::FilesystemStore, memory::MemoryStore, s3::S3Store};
use crate::storage::paths::KeyManager;
use std::sync::Arc;

/// Shared, immutable request state. The store client is built once and
/// reused by every request.
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<dyn TokenRepository>,
}

impl AppState {
    pub async fn new(config: Config) -> Self {
        let store: Arc<dyn ObjectStore> = match config.storage {
            StorageKind::S3 => Arc::new(S3Store::new(&config.bucket, config.s3.clone()).await),
            StorageKind::Filesystem => Arc::new(FilesystemStore::new(&config.root_dir)),
            StorageKind::Memory => Arc::new(MemoryStore::new()),
        };
        Self::with_store(config, store)
    }

    pub fn with_store(config: Config, store: Arc<dyn ObjectStore>) -> Self {
        let repo = ObjectTokenRepository::new(
            store,
            KeyManager::new(config.key_prefix),
            config.conditional_writes,
        );
        AppState {
            tokens: Arc::new(repo),
        }
    }
}
