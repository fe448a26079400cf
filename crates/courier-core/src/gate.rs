//! Access gate guarding every privileged operation.
//!
//! A single predicate: the user record exists, a credential ciphertext is
//! present, and the most recent validation accepted it.  Handlers evaluate
//! this immediately before each privileged operation rather than caching
//! the answer, since validity can change between calls (key revoked
//! remotely, or a bad key resubmitted).

use crate::error::StoreError;
use crate::store::Store;

pub async fn authorize(store: &Store, chat_id: i64) -> Result<bool, StoreError> {
    Ok(store
        .read(chat_id)
        .await?
        .map(|user| user.has_credential() && user.is_valid)
        .unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testutil::open_temp;

    #[tokio::test]
    async fn unknown_identity_is_denied() {
        let (store, _dir) = open_temp().await;
        assert!(!authorize(&store, 1).await.unwrap());
    }

    #[tokio::test]
    async fn unvalidated_credential_is_denied() {
        let (store, _dir) = open_temp().await;
        store.upsert_credential(1, "sk").await.unwrap();
        assert!(!authorize(&store, 1).await.unwrap());
    }

    #[tokio::test]
    async fn validated_credential_is_allowed() {
        let (store, _dir) = open_temp().await;
        store.upsert_credential(1, "sk").await.unwrap();
        store.set_validity(1, true).await.unwrap();
        assert!(authorize(&store, 1).await.unwrap());
    }

    #[tokio::test]
    async fn revocation_takes_effect_immediately() {
        let (store, _dir) = open_temp().await;
        store.upsert_credential(1, "sk").await.unwrap();
        store.set_validity(1, true).await.unwrap();
        assert!(authorize(&store, 1).await.unwrap());

        store.set_validity(1, false).await.unwrap();
        assert!(!authorize(&store, 1).await.unwrap());
    }

    #[tokio::test]
    async fn resubmission_revokes_until_revalidated() {
        let (store, _dir) = open_temp().await;
        store.upsert_credential(1, "sk-old").await.unwrap();
        store.set_validity(1, true).await.unwrap();

        store.upsert_credential(1, "sk-new").await.unwrap();
        assert!(!authorize(&store, 1).await.unwrap());
    }
}
