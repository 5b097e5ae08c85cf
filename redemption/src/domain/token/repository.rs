use crate::domain::token::{PairingToken, VersionedToken};
use crate::error::AppError;
use crate::storage::paths::KeyManager;
use crate::storage::{ObjectStore, Precondition, StorageError};
use std::sync::Arc;

type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// A conditional write lost against a concurrent writer.
    Conflict,
}

#[async_trait::async_trait]
pub trait TokenRepository: Send + Sync {
    async fn find_token(&self, token: &str) -> Result<Option<VersionedToken>>;

    /// Writes the record back under the key of `token`, the token it was
    /// looked up by. `expected_version` is the version the record was read
    /// at; whether it is enforced depends on the repository.
    async fn save_token(
        &self,
        token: &str,
        record: &PairingToken,
        expected_version: Option<&str>,
    ) -> Result<SaveOutcome>;
}

pub struct ObjectTokenRepository {
    store: Arc<dyn ObjectStore>,
    keys: KeyManager,
    conditional_writes: bool,
}

impl ObjectTokenRepository {
    pub fn new(store: Arc<dyn ObjectStore>, keys: KeyManager, conditional_writes: bool) -> Self {
        Self {
            store,
            keys,
            conditional_writes,
        }
    }
}

#[async_trait::async_trait]
impl TokenRepository for ObjectTokenRepository {
    async fn find_token(&self, token: &str) -> Result<Option<VersionedToken>> {
        let key = self.keys.token_key(token);
        let Some(object) = self
            .store
            .get_object(&key)
            .await
            .map_err(AppError::StorageRead)?
        else {
            return Ok(None);
        };

        let mut record: PairingToken = serde_json::from_slice(&object.data).map_err(|e| {
            AppError::StorageRead(StorageError::Malformed {
                key: key.clone(),
                reason: e.to_string(),
            })
        })?;
        if record.token.is_empty() {
            record.token = token.to_string();
        }

        Ok(Some(VersionedToken {
            record,
            version: object.version,
        }))
    }

    async fn save_token(
        &self,
        token: &str,
        record: &PairingToken,
        expected_version: Option<&str>,
    ) -> Result<SaveOutcome> {
        let key = self.keys.token_key(token);
        let body = serde_json::to_vec(record).map_err(|e| {
            AppError::StorageWrite(StorageError::Malformed {
                key: key.clone(),
                reason: e.to_string(),
            })
        })?;

        let precondition = match expected_version {
            Some(version) if self.conditional_writes => Precondition::IfMatch(version.to_string()),
            _ => Precondition::Any,
        };

        match self.store.put_object(&key, body, precondition).await {
            Ok(()) => Ok(SaveOutcome::Saved),
            Err(StorageError::PreconditionFailed(_)) => Ok(SaveOutcome::Conflict),
            Err(e) => Err(AppError::StorageWrite(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::token::TokenStatus;
    use crate::storage::driver::memory::MemoryStore;

    async fn seeded(body: &str) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .put_object("tok.json", body.as_bytes().to_vec(), Precondition::Any)
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn find_missing_token() {
        let repo = ObjectTokenRepository::new(Arc::new(MemoryStore::new()), KeyManager::default(), true);
        assert!(repo.find_token("tok").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_fills_token_from_key_when_absent() {
        let store = seeded(r#"{"gifter":"a","giftee":"b"}"#).await;
        let repo = ObjectTokenRepository::new(store, KeyManager::default(), true);

        let found = repo.find_token("tok").await.unwrap().unwrap();
        assert_eq!(found.record.token, "tok");
        assert_eq!(found.record.status, TokenStatus::Issued);
        assert!(found.version.is_some());
    }

    #[tokio::test]
    async fn malformed_body_is_a_read_error() {
        let store = seeded("not json").await;
        let repo = ObjectTokenRepository::new(store, KeyManager::default(), true);

        let err = repo.find_token("tok").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::StorageRead(StorageError::Malformed { .. })
        ));
    }

    #[tokio::test]
    async fn stale_version_is_a_conflict_when_conditional() {
        let store = seeded(r#"{"token":"tok","gifter":"a","giftee":"b","status":"issued"}"#).await;
        let repo = ObjectTokenRepository::new(store, KeyManager::default(), true);
        let found = repo.find_token("tok").await.unwrap().unwrap();

        let mut record = found.record.clone();
        record.consume();
        let first = repo
            .save_token("tok", &record, found.version.as_deref())
            .await
            .unwrap();
        let second = repo
            .save_token("tok", &record, found.version.as_deref())
            .await
            .unwrap();

        assert_eq!(first, SaveOutcome::Saved);
        assert_eq!(second, SaveOutcome::Conflict);
    }

    #[tokio::test]
    async fn stale_version_is_ignored_when_unconditional() {
        let store = seeded(r#"{"token":"tok","gifter":"a","giftee":"b","status":"issued"}"#).await;
        let repo = ObjectTokenRepository::new(store, KeyManager::default(), false);
        let found = repo.find_token("tok").await.unwrap().unwrap();

        for _ in 0..2 {
            let outcome = repo
                .save_token("tok", &found.record, found.version.as_deref())
                .await
                .unwrap();
            assert_eq!(outcome, SaveOutcome::Saved);
        }
    }

    #[tokio::test]
    async fn save_writes_under_the_requested_key() {
        let store = seeded(r#"{"token":"other","gifter":"a","giftee":"b","status":"issued"}"#).await;
        let repo = ObjectTokenRepository::new(store.clone(), KeyManager::default(), true);
        let found = repo.find_token("tok").await.unwrap().unwrap();

        let mut record = found.record.clone();
        record.consume();
        let outcome = repo
            .save_token("tok", &record, found.version.as_deref())
            .await
            .unwrap();

        assert_eq!(outcome, SaveOutcome::Saved);
        assert!(store.get_object("other.json").await.unwrap().is_none());
        let again = repo.find_token("tok").await.unwrap().unwrap();
        assert_eq!(again.record.status, TokenStatus::Used);
        assert_eq!(again.record.token, "other");
    }
}
