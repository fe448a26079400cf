//! Per-chat session controller: command parsing, the credential state
//! machine, and the access gate applied before every privileged handler.
//!
//! Remote failures (authority, gateway) never escape this module — they
//! become user-facing replies plus a recorded validity change.  Crypto and
//! database failures are logged and answered with a generic error reply;
//! the decrypted credential itself is never logged.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{error, info, warn};

use courier_core::{catalog, gate, CipherError, Direction, Store, StoreError};

use crate::gateway::CompletionGateway;
use crate::validator::{CredentialAuthority, Outcome};

pub const REPLY_WELCOME: &str = "Hi! I relay your messages to an AI model through OpenRouter.\n\
    To get started, send your OpenRouter API key with /api <API_KEY>.\n\
    Once the key is verified you can pick a model with /model and start chatting.";

pub const REPLY_HELP: &str = "This relay forwards your messages to an AI model through OpenRouter.\n\n\
    Commands:\n\
    /start - introduction.\n\
    /api <API_KEY> - set your API key.\n\
    /model - choose the AI model for the conversation.\n\
    /new - start a new session, clearing message history.\n\
    /help - show this help.";

pub const REPLY_API_USAGE: &str = "Please send the API key after the /api command.";
pub const REPLY_KEY_ACCEPTED: &str =
    "API key verified. You can now choose a model with /model.";
pub const REPLY_KEY_REJECTED: &str =
    "The API key was refused. Please supply another key with /api.";
pub const REPLY_KEY_RETRY: &str =
    "The API key could not be verified right now. Please try again later.";
pub const REPLY_KEY_UNREADABLE: &str =
    "Your stored API key could not be read. Please supply it again with /api.";
pub const REPLY_UNAUTHORIZED: &str = "Please supply a valid API key with /api.";
pub const REPLY_NO_MODEL: &str = "No model selected. Please choose a model with /model.";
pub const REPLY_MODEL_NOT_A_NUMBER: &str =
    "Please send the number of a model from the list provided by /model.";
pub const REPLY_MODEL_OUT_OF_RANGE: &str =
    "That model number is not in the list. Please pick one with /model.";
pub const REPLY_RESET: &str = "New session started. Your previous messages were cleared.";
pub const REPLY_APOLOGY: &str = "Sorry, your message could not be processed right now.";
pub const REPLY_UNKNOWN_COMMAND: &str = "Unknown command. Send /help for the command list.";
pub const REPLY_INTERNAL: &str = "Something went wrong. Please try again.";

/// Inbound text, split into the bot's command set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Start,
    Api(&'a str),
    Model,
    New,
    Help,
    Unknown(&'a str),
    Text(&'a str),
}

impl<'a> Command<'a> {
    pub fn parse(input: &'a str) -> Self {
        let trimmed = input.trim();
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Command::Text(trimmed);
        };
        let (name, args) = match rest.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (rest, ""),
        };
        match name {
            "start" => Command::Start,
            "api" => Command::Api(args),
            "model" => Command::Model,
            "new" => Command::New,
            "help" => Command::Help,
            _ => Command::Unknown(name),
        }
    }
}

pub struct SessionController {
    store: Store,
    authority: Arc<dyn CredentialAuthority>,
    gateway: Arc<dyn CompletionGateway>,
    /// Chats that were shown the catalog and owe us a numeric choice.
    /// Ephemeral by design; cleared by /new.
    awaiting_model: Mutex<HashSet<i64>>,
}

impl SessionController {
    pub fn new(
        store: Store,
        authority: Arc<dyn CredentialAuthority>,
        gateway: Arc<dyn CompletionGateway>,
    ) -> Self {
        Self {
            store,
            authority,
            gateway,
            awaiting_model: Mutex::new(HashSet::new()),
        }
    }

    /// Process one inbound text for one chat and produce the reply.
    pub async fn handle(&self, chat_id: i64, text: &str) -> String {
        let result = match Command::parse(text) {
            Command::Start => Ok(REPLY_WELCOME.to_string()),
            Command::Api(key) => self.submit_credential(chat_id, key).await,
            Command::Model => self.choose_model(chat_id).await,
            Command::New => self.new_session(chat_id).await,
            Command::Help => self.help(chat_id).await,
            Command::Unknown(_) => Ok(REPLY_UNKNOWN_COMMAND.to_string()),
            Command::Text(body) => self.converse(chat_id, body).await,
        };
        match result {
            Ok(reply) => reply,
            Err(StoreError::Crypto(CipherError::Decrypt)) => {
                error!(chat_id, "stored credential failed to decrypt");
                REPLY_KEY_UNREADABLE.to_string()
            }
            Err(err) => {
                error!(chat_id, error = %err, "command handling failed");
                REPLY_INTERNAL.to_string()
            }
        }
    }

    /// /api — accepted in any state.  The key is stored (validity reset)
    /// before validation so a rejected or inconclusive outcome can never
    /// leave a stale "valid" flag standing.
    async fn submit_credential(&self, chat_id: i64, key: &str) -> Result<String, StoreError> {
        let key = key.trim();
        if key.is_empty() {
            return Ok(REPLY_API_USAGE.to_string());
        }

        self.store.upsert_credential(chat_id, key).await?;
        match self.authority.validate(key).await {
            Outcome::Accepted => {
                self.store.set_validity(chat_id, true).await?;
                info!(chat_id, "credential accepted");
                Ok(REPLY_KEY_ACCEPTED.to_string())
            }
            Outcome::Rejected => {
                self.store.set_validity(chat_id, false).await?;
                warn!(chat_id, "credential rejected by authority");
                Ok(REPLY_KEY_REJECTED.to_string())
            }
            Outcome::Indeterminate(reason) => {
                self.store.set_validity(chat_id, false).await?;
                warn!(chat_id, %reason, "credential validation inconclusive");
                Ok(REPLY_KEY_RETRY.to_string())
            }
        }
    }

    async fn choose_model(&self, chat_id: i64) -> Result<String, StoreError> {
        if !gate::authorize(&self.store, chat_id).await? {
            return Ok(REPLY_UNAUTHORIZED.to_string());
        }

        let mut reply = String::new();
        if let Some(user) = self.store.read(chat_id).await? {
            if let (Some(model), Some(limit)) = (user.model_id, user.max_tokens) {
                reply.push_str(&format!("Current model: {model}, token limit: {limit}.\n\n"));
            }
        }
        reply.push_str("Choose a model by sending its number:\n\n");
        for spec in catalog::MODELS {
            reply.push_str(&format!("{}: {}\n", spec.id, spec.name));
        }

        self.awaiting_model.lock().insert(chat_id);
        Ok(reply)
    }

    async fn new_session(&self, chat_id: i64) -> Result<String, StoreError> {
        if !gate::authorize(&self.store, chat_id).await? {
            return Ok(REPLY_UNAUTHORIZED.to_string());
        }
        self.awaiting_model.lock().remove(&chat_id);
        self.store.clear_history(chat_id).await?;
        info!(chat_id, "session reset");
        Ok(REPLY_RESET.to_string())
    }

    async fn help(&self, chat_id: i64) -> Result<String, StoreError> {
        if !gate::authorize(&self.store, chat_id).await? {
            return Ok(REPLY_UNAUTHORIZED.to_string());
        }
        Ok(REPLY_HELP.to_string())
    }

    /// Plain text: either a pending model choice or a conversation turn.
    async fn converse(&self, chat_id: i64, text: &str) -> Result<String, StoreError> {
        if !gate::authorize(&self.store, chat_id).await? {
            return Ok(REPLY_UNAUTHORIZED.to_string());
        }

        let awaiting = self.awaiting_model.lock().contains(&chat_id);
        if awaiting {
            return self.apply_model_choice(chat_id, text).await;
        }

        let Some(user) = self.store.read(chat_id).await? else {
            return Ok(REPLY_UNAUTHORIZED.to_string());
        };
        let (Some(model), Some(max_tokens)) = (user.model_id, user.max_tokens) else {
            return Ok(REPLY_NO_MODEL.to_string());
        };
        let Some(credential) = self.store.credential(chat_id).await? else {
            return Ok(REPLY_UNAUTHORIZED.to_string());
        };

        let history = self.store.messages(chat_id).await?;
        match self
            .gateway
            .complete(&credential, &model, max_tokens, &history, text)
            .await
        {
            Ok(completion) => {
                self.store.append_message(chat_id, Direction::In, text).await?;
                self.store
                    .append_message(chat_id, Direction::Out, &completion)
                    .await?;
                Ok(completion)
            }
            Err(err) => {
                // Nothing is recorded: the apology is boundary copy, not
                // conversation content, and must not feed later history.
                warn!(chat_id, error = %err, "completion request failed");
                Ok(REPLY_APOLOGY.to_string())
            }
        }
    }

    /// A selection outside the catalog (or not a number) reports an error
    /// and leaves both the sub-state and the record unchanged.
    async fn apply_model_choice(&self, chat_id: i64, text: &str) -> Result<String, StoreError> {
        let Ok(choice) = text.trim().parse::<u32>() else {
            return Ok(REPLY_MODEL_NOT_A_NUMBER.to_string());
        };
        let Some(spec) = catalog::get(choice) else {
            return Ok(REPLY_MODEL_OUT_OF_RANGE.to_string());
        };

        self.store
            .set_model(chat_id, spec.name, spec.max_tokens)
            .await?;
        self.awaiting_model.lock().remove(&chat_id);
        info!(chat_id, model = spec.name, "model selected");
        Ok(format!(
            "Model switched to {} (token limit {}).",
            spec.name, spec.max_tokens
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse("/start"), Command::Start);
        assert_eq!(Command::parse("/api sk-123"), Command::Api("sk-123"));
        assert_eq!(Command::parse("/api"), Command::Api(""));
        assert_eq!(Command::parse("/api   "), Command::Api(""));
        assert_eq!(Command::parse("/model"), Command::Model);
        assert_eq!(Command::parse("/new"), Command::New);
        assert_eq!(Command::parse("/help"), Command::Help);
        assert_eq!(Command::parse("/bogus"), Command::Unknown("bogus"));
    }

    #[test]
    fn parses_plain_text() {
        assert_eq!(Command::parse("hello there"), Command::Text("hello there"));
        assert_eq!(Command::parse("  padded  "), Command::Text("padded"));
        assert_eq!(Command::parse("3"), Command::Text("3"));
    }
}
