//! Remote credential validator.
//!
//! One bounded-timeout GET against the gateway's authority endpoint with
//! the candidate credential as a bearer token.  The response status is the
//! whole protocol: success means accepted, 401/403 means actively refused,
//! everything else (including transport failures and timeouts) is
//! indeterminate.  Indeterminate is not a pass — the caller still forces
//! validity to false so access stays fail-closed.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::warn;

/// Verdict of a validation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Accepted,
    Rejected,
    Indeterminate(String),
}

/// Seam for the authority endpoint; the session controller only sees this
/// trait, so tests swap in scripted verdicts.
#[async_trait]
pub trait CredentialAuthority: Send + Sync {
    async fn validate(&self, credential: &str) -> Outcome;
}

pub struct HttpAuthority {
    client: reqwest::Client,
    validate_url: String,
}

impl HttpAuthority {
    pub fn new(validate_url: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent("courier-service/0.1")
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            validate_url,
        })
    }
}

pub fn classify_status(status: StatusCode) -> Outcome {
    if status.is_success() {
        Outcome::Accepted
    } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        Outcome::Rejected
    } else {
        Outcome::Indeterminate(format!("unexpected status {status}"))
    }
}

#[async_trait]
impl CredentialAuthority for HttpAuthority {
    async fn validate(&self, credential: &str) -> Outcome {
        let response = self
            .client
            .get(&self.validate_url)
            .bearer_auth(credential)
            .send()
            .await;
        match response {
            Ok(res) => classify_status(res.status()),
            Err(err) => {
                // The error is logged without the credential; reqwest errors
                // never echo request headers.
                warn!(error = %err, "credential validation request failed");
                let reason = if err.is_timeout() {
                    "timeout".to_string()
                } else {
                    err.to_string()
                };
                Outcome::Indeterminate(reason)
            }
        }
    }
}
