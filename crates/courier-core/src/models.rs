//! Database row models — these map to/from SQL rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRecord {
    pub id: i64,
    /// Opaque external chat identity — immutable once created.
    pub chat_id: i64,
    /// Encrypted gateway credential (cipher column format), or None.
    /// Never holds plaintext; decode through `Store::credential`.
    pub credential_enc: Option<String>,
    /// False until the remote authority accepts the stored credential.
    pub is_valid: bool,
    /// Chosen catalog model; set together with `max_tokens`.
    pub model_id: Option<String>,
    /// Token limit copied from the catalog entry at selection time.
    pub max_tokens: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn has_credential(&self) -> bool {
        self.credential_enc.is_some()
    }
}

/// Message direction relative to the relay: `in` from the user,
/// `out` back to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MessageRecord {
    pub id: i64,
    pub user_id: i64,
    pub direction: Direction,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}
