//! Credential and history store over SQLite via sqlx.
//!
//! Every mutating operation is a single statement or transaction keyed by
//! `chat_id`, so a read-modify-write for one identity never interleaves with
//! another write for the same identity.  Operations on distinct identities
//! are independent.

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool};
use chrono::Utc;
use tracing::info;
use zeroize::Zeroizing;

use crate::cipher::SecretCipher;
use crate::error::{CipherError, StoreError};
use crate::models::{Direction, MessageRecord, UserRecord};

/// Central store handle.  Cheap to clone (pool is Arc internally); carries
/// the injected cipher so credential columns are encoded/decoded at the
/// record boundary and plaintext never escapes a call scope.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
    cipher: SecretCipher,
}

/// Outcome of a plaintext-credential sweep: users examined / rows rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationSummary {
    pub processed: usize,
    pub updated: usize,
}

impl Store {
    /// Open (or create) the SQLite database at `db_path`.
    /// Runs all pending migrations automatically.
    ///
    /// WAL journal mode and foreign-key enforcement are configured at
    /// connection time — SQLite forbids changing `journal_mode` inside a
    /// transaction and sqlx wraps every migration in one.
    pub async fn open(db_path: &Path, cipher: SecretCipher) -> Result<Self, StoreError> {
        let opts = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);

        let pool = SqlitePool::connect_with(opts).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Migration(e.to_string()))?;

        Ok(Self { pool, cipher })
    }

    /// Encrypt and store a credential, creating the user record if absent.
    /// Overwriting always resets `is_valid` to false: an unverified new
    /// credential must not inherit the previous key's validity.
    pub async fn upsert_credential(
        &self,
        chat_id: i64,
        plaintext: &str,
    ) -> Result<UserRecord, StoreError> {
        let encrypted = self.cipher.encrypt(plaintext)?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO users (chat_id, credential_enc, is_valid, created_at, updated_at) \
             VALUES (?, ?, 0, ?, ?) \
             ON CONFLICT(chat_id) DO UPDATE SET \
                 credential_enc = excluded.credential_enc, \
                 is_valid = 0, \
                 updated_at = excluded.updated_at",
        )
        .bind(chat_id)
        .bind(&encrypted)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let record = sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE chat_id = ?")
            .bind(chat_id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(record)
    }

    pub async fn read(&self, chat_id: i64) -> Result<Option<UserRecord>, StoreError> {
        let record = sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE chat_id = ?")
            .bind(chat_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    /// Decrypt-on-read accessor for the stored credential.  Returns None
    /// when no record or no credential exists; a present value that fails
    /// to decrypt is surfaced as an error, never treated as absent.
    pub async fn credential(&self, chat_id: i64) -> Result<Option<Zeroizing<String>>, StoreError> {
        let Some(user) = self.read(chat_id).await? else {
            return Ok(None);
        };
        match user.credential_enc {
            Some(encrypted) => Ok(Some(self.cipher.decrypt(&encrypted)?)),
            None => Ok(None),
        }
    }

    /// Record the validator's verdict.  Idempotent; no-op for an unknown
    /// identity.
    pub async fn set_validity(&self, chat_id: i64, valid: bool) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET is_valid = ?, updated_at = ? WHERE chat_id = ?")
            .bind(valid)
            .bind(Utc::now())
            .bind(chat_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Persist a catalog selection; model id and token limit always move
    /// together.
    pub async fn set_model(
        &self,
        chat_id: i64,
        model_id: &str,
        max_tokens: i64,
    ) -> Result<(), StoreError> {
        let result =
            sqlx::query("UPDATE users SET model_id = ?, max_tokens = ?, updated_at = ? WHERE chat_id = ?")
                .bind(model_id)
                .bind(max_tokens)
                .bind(Utc::now())
                .bind(chat_id)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::UnknownChat(chat_id));
        }
        Ok(())
    }

    pub async fn append_message(
        &self,
        chat_id: i64,
        direction: Direction,
        body: &str,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "INSERT INTO messages (user_id, direction, body, sent_at) \
             SELECT id, ?, ?, ? FROM users WHERE chat_id = ?",
        )
        .bind(direction)
        .bind(body)
        .bind(Utc::now())
        .bind(chat_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::UnknownChat(chat_id));
        }
        Ok(())
    }

    /// All messages for an identity, in insertion order.
    pub async fn messages(&self, chat_id: i64) -> Result<Vec<MessageRecord>, StoreError> {
        let rows = sqlx::query_as::<_, MessageRecord>(
            "SELECT m.* FROM messages m \
             JOIN users u ON u.id = m.user_id \
             WHERE u.chat_id = ? \
             ORDER BY m.id",
        )
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Delete all message records for an identity.  Credential, validity,
    /// and model fields are untouched.
    pub async fn clear_history(&self, chat_id: i64) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "DELETE FROM messages WHERE user_id IN (SELECT id FROM users WHERE chat_id = ?)",
        )
        .bind(chat_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// One-shot sweep for legacy rows that still hold a plaintext
    /// credential: any stored value that fails decryption under the active
    /// key is assumed to be plaintext and re-encrypted in place.  Values
    /// that decrypt cleanly are already under the active key and are left
    /// alone.
    pub async fn migrate_plaintext_credentials(&self) -> Result<MigrationSummary, StoreError> {
        let users = sqlx::query_as::<_, UserRecord>("SELECT * FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        let mut summary = MigrationSummary {
            processed: 0,
            updated: 0,
        };
        for user in users {
            summary.processed += 1;
            let Some(stored) = user.credential_enc else {
                continue;
            };
            match self.cipher.decrypt(&stored) {
                Ok(_) => {}
                Err(CipherError::Decrypt) => {
                    let encrypted = self.cipher.encrypt(&stored)?;
                    sqlx::query(
                        "UPDATE users SET credential_enc = ?, updated_at = ? WHERE id = ?",
                    )
                    .bind(&encrypted)
                    .bind(Utc::now())
                    .bind(user.id)
                    .execute(&self.pool)
                    .await?;
                    summary.updated += 1;
                }
                Err(other) => return Err(other.into()),
            }
        }
        info!(
            processed = summary.processed,
            updated = summary.updated,
            "credential migration finished"
        );
        Ok(summary)
    }
}
