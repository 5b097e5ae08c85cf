use crate::domain::token::{Pairing, SaveOutcome, TokenRepository};
use crate::error::{AppError, TOKEN_REQUIRED};
use crate::utils::state::AppState;
use crate::utils::validation::validate_token;
use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct RedeemQuery {
    token: Option<String>,
}

/// `GET /pairing?token=<token>`
pub async fn redeem_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RedeemQuery>, QueryRejection>,
) -> Result<Json<Pairing>, AppError> {
    let Query(query) = query.map_err(|e| {
        tracing::debug!("rejecting unparseable query: {e}");
        AppError::InvalidRequest(TOKEN_REQUIRED)
    })?;
    let pairing = redeem_token(state.tokens.as_ref(), query.token.as_deref()).await?;
    Ok(Json(pairing))
}

/// Exchanges a token for its pairing and marks it used.
///
/// The record is read, checked and written back. With a repository that
/// enforces versions, a concurrent redemption that commits first turns this
/// one into `AlreadyUsed`; otherwise both may succeed.
pub async fn redeem_token(
    tokens: &dyn TokenRepository,
    token: Option<&str>,
) -> Result<Pairing, AppError> {
    let token = validate_token(token)?;

    let Some(found) = tokens.find_token(token).await? else {
        tracing::info!(token, "token not found");
        return Err(AppError::NotFound(token.to_string()));
    };

    let mut record = found.record;
    let Some(pairing) = record.consume() else {
        tracing::info!(token, "token has already been used");
        return Err(AppError::AlreadyUsed(token.to_string()));
    };

    match tokens
        .save_token(token, &record, found.version.as_deref())
        .await?
    {
        SaveOutcome::Saved => {
            tracing::info!(token, "token redeemed");
            Ok(pairing)
        }
        SaveOutcome::Conflict => {
            tracing::warn!(token, "lost a concurrent redemption race");
            Err(AppError::AlreadyUsed(token.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::token::{ObjectTokenRepository, PairingToken, TokenStatus};
    use crate::storage::driver::memory::MemoryStore;
    use crate::storage::paths::KeyManager;
    use crate::storage::{ObjectStore, Precondition, StorageError, StoredObject};

    async fn store_with(record: &PairingToken) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .put_object(
                &format!("{}.json", record.token),
                serde_json::to_vec(record).unwrap(),
                Precondition::Any,
            )
            .await
            .unwrap();
        store
    }

    async fn stored_status(store: &dyn ObjectStore, token: &str) -> TokenStatus {
        let obj = store
            .get_object(&format!("{token}.json"))
            .await
            .unwrap()
            .unwrap();
        serde_json::from_slice::<PairingToken>(&obj.data)
            .unwrap()
            .status
    }

    fn repo(store: Arc<dyn ObjectStore>) -> ObjectTokenRepository {
        ObjectTokenRepository::new(store, KeyManager::default(), true)
    }

    #[tokio::test]
    async fn missing_token_is_invalid() {
        let repo = repo(Arc::new(MemoryStore::new()));
        let err = redeem_token(&repo, None).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn unknown_token_is_not_found() {
        let repo = repo(Arc::new(MemoryStore::new()));
        let err = redeem_token(&repo, Some("ghost")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(t) if t == "ghost"));
    }

    #[tokio::test]
    async fn issued_token_is_redeemed_once() {
        let store = store_with(&PairingToken::new("t1", "alice", "bob")).await;
        let repo = repo(store.clone());

        let pairing = redeem_token(&repo, Some("t1")).await.unwrap();
        assert_eq!(
            pairing,
            Pairing {
                gifter: "alice".into(),
                giftee: "bob".into()
            }
        );
        assert_eq!(stored_status(store.as_ref(), "t1").await, TokenStatus::Used);

        let err = redeem_token(&repo, Some("t1")).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyUsed(_)));
    }

    #[tokio::test]
    async fn used_token_is_not_rewritten() {
        let mut record = PairingToken::new("t2", "alice", "bob");
        record.status = TokenStatus::Used;
        let store = store_with(&record).await;
        let before = store.get_object("t2.json").await.unwrap().unwrap();

        let err = redeem_token(&repo(store.clone()), Some("t2")).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyUsed(_)));

        let after = store.get_object("t2.json").await.unwrap().unwrap();
        assert_eq!(before, after);
    }

    /// Reads from the wrapped store, refuses every write.
    struct ReadOnly(Arc<MemoryStore>);

    #[async_trait::async_trait]
    impl ObjectStore for ReadOnly {
        async fn get_object(&self, key: &str) -> Result<Option<StoredObject>, StorageError> {
            self.0.get_object(key).await
        }

        async fn put_object(
            &self,
            _key: &str,
            _data: Vec<u8>,
            _precondition: Precondition,
        ) -> Result<(), StorageError> {
            Err(StorageError::Backend("access denied".into()))
        }
    }

    #[tokio::test]
    async fn failed_write_leaves_token_issued() {
        let store = store_with(&PairingToken::new("t3", "alice", "bob")).await;
        let repo = repo(Arc::new(ReadOnly(store.clone())));

        let err = redeem_token(&repo, Some("t3")).await.unwrap_err();
        assert!(matches!(err, AppError::StorageWrite(_)));
        assert_eq!(stored_status(store.as_ref(), "t3").await, TokenStatus::Issued);
    }

    #[tokio::test]
    async fn body_token_mismatch_still_consumes_the_requested_key() {
        for conditional_writes in [true, false] {
            let store = Arc::new(MemoryStore::new());
            let record = PairingToken::new("other", "alice", "bob");
            store
                .put_object(
                    "abc.json",
                    serde_json::to_vec(&record).unwrap(),
                    Precondition::Any,
                )
                .await
                .unwrap();
            let repo =
                ObjectTokenRepository::new(store.clone(), KeyManager::default(), conditional_writes);

            redeem_token(&repo, Some("abc")).await.unwrap();
            assert_eq!(stored_status(store.as_ref(), "abc").await, TokenStatus::Used);
            assert!(store.get_object("other.json").await.unwrap().is_none());

            let err = redeem_token(&repo, Some("abc")).await.unwrap_err();
            assert!(matches!(err, AppError::AlreadyUsed(_)));
        }
    }
}
