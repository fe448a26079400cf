use thiserror::Error;

#[derive(Debug, Error)]
pub enum CipherError {
    #[error("Invalid cipher key material: {0}")]
    KeyInvalid(String),

    #[error("AEAD encryption failed")]
    Encrypt,

    #[error("AEAD decryption failed (wrong key, malformed value, or tampering)")]
    Decrypt,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CipherError),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("No user record for chat {0}")]
    UnknownChat(i64),
}
