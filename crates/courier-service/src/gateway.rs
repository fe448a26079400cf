//! Completion gateway client.
//!
//! Replays the stored conversation as role-tagged messages (`in` → user,
//! `out` → assistant) followed by the current text, and returns the first
//! choice's content.  Bounded timeout, no automatic retry; every failure
//! is recovered by the session controller into an apology reply.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use thiserror::Error;

use courier_core::{Direction, MessageRecord};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("gateway returned status {0}")]
    Status(StatusCode),

    #[error("gateway response contained no completion")]
    NoContent,
}

#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(
        &self,
        credential: &str,
        model: &str,
        max_tokens: i64,
        history: &[MessageRecord],
        text: &str,
    ) -> Result<String, GatewayError>;
}

pub struct HttpGateway {
    client: reqwest::Client,
    gateway_url: String,
}

impl HttpGateway {
    pub fn new(gateway_url: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent("courier-service/0.1")
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            gateway_url,
        })
    }
}

/// Build the `messages` array for the completion request.
pub fn conversation_payload(history: &[MessageRecord], text: &str) -> Vec<Value> {
    let mut messages: Vec<Value> = history
        .iter()
        .map(|m| {
            let role = match m.direction {
                Direction::In => "user",
                Direction::Out => "assistant",
            };
            json!({"role": role, "content": m.body})
        })
        .collect();
    messages.push(json!({"role": "user", "content": text}));
    messages
}

#[async_trait]
impl CompletionGateway for HttpGateway {
    async fn complete(
        &self,
        credential: &str,
        model: &str,
        max_tokens: i64,
        history: &[MessageRecord],
        text: &str,
    ) -> Result<String, GatewayError> {
        let body = json!({
            "model": model,
            "messages": conversation_payload(history, text),
            "max_tokens": max_tokens,
        });
        let res = self
            .client
            .post(&self.gateway_url)
            .bearer_auth(credential)
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(GatewayError::Status(res.status()));
        }

        let payload: Value = res.json().await?;
        let content = payload
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .unwrap_or_default();
        if content.is_empty() {
            return Err(GatewayError::NoContent);
        }
        Ok(content.to_string())
    }
}
