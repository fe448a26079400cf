//! courier-core — credential storage for the Courier relay
//!
//! # Encryption strategy
//! SQLite does NOT natively encrypt.  We use application-level encryption:
//! - The user's gateway API key is stored as XChaCha20-Poly1305 ciphertext,
//!   base64-encoded, in the `credential_enc` column.
//! - The 32-byte cipher key is sourced from process configuration at startup
//!   and injected into the store; there is no process-wide singleton.
//! - Non-sensitive metadata (chat ids, validity flag, model choice,
//!   timestamps, message bodies) is stored in plaintext to allow queries.
//!
//! # Migration
//! SQLx migrations in `migrations/` are run when the store is opened.

pub mod catalog;
pub mod cipher;
pub mod error;
pub mod gate;
pub mod models;
pub mod store;

pub use cipher::SecretCipher;
pub use error::{CipherError, StoreError};
pub use models::{Direction, MessageRecord, UserRecord};
pub use store::Store;
