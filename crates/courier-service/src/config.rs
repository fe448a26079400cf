//! Process configuration, resolved from the environment once at startup
//! and injected into components.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use courier_core::{CipherError, SecretCipher};

pub const ENCRYPTION_KEY_VAR: &str = "COURIER_ENCRYPTION_KEY";
pub const DB_PATH_VAR: &str = "COURIER_DB_PATH";
pub const VALIDATE_URL_VAR: &str = "COURIER_VALIDATE_URL";
pub const GATEWAY_URL_VAR: &str = "COURIER_GATEWAY_URL";
pub const HTTP_TIMEOUT_VAR: &str = "COURIER_HTTP_TIMEOUT_SECS";

const DEFAULT_DB_PATH: &str = "courier.db";
const DEFAULT_VALIDATE_URL: &str = "https://openrouter.ai/api/v1/validate_key";
const DEFAULT_GATEWAY_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    MissingVar(&'static str),

    #[error("{var} is invalid: {reason}")]
    InvalidVar { var: &'static str, reason: String },
}

pub struct ServiceConfig {
    /// Cipher constructed from the configured key; absence of the key is
    /// fatal here, before any encryption or decryption is attempted.
    pub cipher: SecretCipher,
    pub db_path: PathBuf,
    pub validate_url: String,
    pub gateway_url: String,
    pub http_timeout: Duration,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let key = std::env::var(ENCRYPTION_KEY_VAR)
            .map_err(|_| ConfigError::MissingVar(ENCRYPTION_KEY_VAR))?;
        let cipher = SecretCipher::from_base64(&key).map_err(|e| match e {
            CipherError::KeyInvalid(reason) => ConfigError::InvalidVar {
                var: ENCRYPTION_KEY_VAR,
                reason,
            },
            other => ConfigError::InvalidVar {
                var: ENCRYPTION_KEY_VAR,
                reason: other.to_string(),
            },
        })?;

        let db_path = std::env::var(DB_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DB_PATH));
        let validate_url = std::env::var(VALIDATE_URL_VAR)
            .unwrap_or_else(|_| DEFAULT_VALIDATE_URL.to_string());
        let gateway_url = std::env::var(GATEWAY_URL_VAR)
            .unwrap_or_else(|_| DEFAULT_GATEWAY_URL.to_string());

        let http_timeout = match std::env::var(HTTP_TIMEOUT_VAR) {
            Ok(raw) => {
                let secs: u64 = raw.parse().map_err(|_| ConfigError::InvalidVar {
                    var: HTTP_TIMEOUT_VAR,
                    reason: format!("expected a number of seconds, got {raw:?}"),
                })?;
                Duration::from_secs(secs)
            }
            Err(_) => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        Ok(Self {
            cipher,
            db_path,
            validate_url,
            gateway_url,
            http_timeout,
        })
    }
}
