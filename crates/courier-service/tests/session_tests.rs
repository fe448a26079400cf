use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tempfile::TempDir;

use courier_core::{gate, Direction, SecretCipher, Store};
use courier_service::gateway::{CompletionGateway, GatewayError};
use courier_service::session::{
    SessionController, REPLY_API_USAGE, REPLY_APOLOGY, REPLY_KEY_ACCEPTED, REPLY_KEY_REJECTED,
    REPLY_KEY_RETRY, REPLY_MODEL_NOT_A_NUMBER, REPLY_MODEL_OUT_OF_RANGE, REPLY_NO_MODEL,
    REPLY_RESET, REPLY_UNAUTHORIZED, REPLY_UNKNOWN_COMMAND, REPLY_WELCOME,
};
use courier_service::validator::{CredentialAuthority, Outcome};

struct ScriptedAuthority {
    outcome: Mutex<Outcome>,
    calls: AtomicUsize,
}

impl ScriptedAuthority {
    fn new(outcome: Outcome) -> Arc<Self> {
        Arc::new(Self {
            outcome: Mutex::new(outcome),
            calls: AtomicUsize::new(0),
        })
    }

    fn set_outcome(&self, outcome: Outcome) {
        *self.outcome.lock() = outcome;
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialAuthority for ScriptedAuthority {
    async fn validate(&self, _credential: &str) -> Outcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.lock().clone()
    }
}

struct ScriptedGateway {
    /// Some(reply) answers every completion; None fails the call.
    reply: Mutex<Option<String>>,
    calls: AtomicUsize,
    last_history_len: AtomicUsize,
}

impl ScriptedGateway {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Mutex::new(Some(reply.to_string())),
            calls: AtomicUsize::new(0),
            last_history_len: AtomicUsize::new(0),
        })
    }

    fn fail_next_calls(&self) {
        *self.reply.lock() = None;
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionGateway for ScriptedGateway {
    async fn complete(
        &self,
        _credential: &str,
        _model: &str,
        _max_tokens: i64,
        history: &[courier_core::MessageRecord],
        _text: &str,
    ) -> Result<String, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_history_len.store(history.len(), Ordering::SeqCst);
        match self.reply.lock().clone() {
            Some(reply) => Ok(reply),
            None => Err(GatewayError::NoContent),
        }
    }
}

struct Harness {
    store: Store,
    authority: Arc<ScriptedAuthority>,
    gateway: Arc<ScriptedGateway>,
    controller: SessionController,
    _dir: TempDir,
}

async fn harness(outcome: Outcome, gateway_reply: &str) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(&dir.path().join("courier.db"), SecretCipher::new([7u8; 32]))
        .await
        .unwrap();
    let authority = ScriptedAuthority::new(outcome);
    let gateway = ScriptedGateway::new(gateway_reply);
    let controller = SessionController::new(
        store.clone(),
        authority.clone() as Arc<dyn CredentialAuthority>,
        gateway.clone() as Arc<dyn CompletionGateway>,
    );
    Harness {
        store,
        authority,
        gateway,
        controller,
        _dir: dir,
    }
}

const CHAT: i64 = 1001;

#[tokio::test]
async fn full_session_walkthrough() {
    let h = harness(Outcome::Accepted, "hello").await;

    assert_eq!(h.controller.handle(CHAT, "/start").await, REPLY_WELCOME);

    // Submit a credential the authority accepts.
    assert_eq!(h.controller.handle(CHAT, "/api abc").await, REPLY_KEY_ACCEPTED);
    assert!(gate::authorize(&h.store, CHAT).await.unwrap());

    // Pick model 3 from the catalog.
    let listing = h.controller.handle(CHAT, "/model").await;
    assert!(listing.contains("3: mistralai/mistral-7b-instruct"));
    let confirmation = h.controller.handle(CHAT, "3").await;
    assert!(confirmation.contains("mistralai/mistral-7b-instruct"));
    let record = h.store.read(CHAT).await.unwrap().unwrap();
    assert_eq!(record.model_id.as_deref(), Some("mistralai/mistral-7b-instruct"));
    assert_eq!(record.max_tokens, Some(8192));

    // Converse once; both directions are recorded.
    assert_eq!(h.controller.handle(CHAT, "hi").await, "hello");
    let messages = h.store.messages(CHAT).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].direction, Direction::In);
    assert_eq!(messages[0].body, "hi");
    assert_eq!(messages[1].direction, Direction::Out);
    assert_eq!(messages[1].body, "hello");

    // Reset clears history and nothing else.
    assert_eq!(h.controller.handle(CHAT, "/new").await, REPLY_RESET);
    assert!(h.store.messages(CHAT).await.unwrap().is_empty());
    let record = h.store.read(CHAT).await.unwrap().unwrap();
    assert!(record.has_credential());
    assert!(record.is_valid);
    assert_eq!(record.model_id.as_deref(), Some("mistralai/mistral-7b-instruct"));
}

#[tokio::test]
async fn empty_credential_never_reaches_the_authority() {
    let h = harness(Outcome::Accepted, "hello").await;
    assert_eq!(h.controller.handle(CHAT, "/api").await, REPLY_API_USAGE);
    assert_eq!(h.controller.handle(CHAT, "/api    ").await, REPLY_API_USAGE);
    assert_eq!(h.authority.calls(), 0);
    assert!(h.store.read(CHAT).await.unwrap().is_none());
}

#[tokio::test]
async fn rejected_credential_keeps_the_gate_closed() {
    let h = harness(Outcome::Rejected, "hello").await;
    assert_eq!(h.controller.handle(CHAT, "/api bad").await, REPLY_KEY_REJECTED);

    let record = h.store.read(CHAT).await.unwrap().unwrap();
    assert!(record.has_credential());
    assert!(!record.is_valid);

    assert_eq!(h.controller.handle(CHAT, "hi").await, REPLY_UNAUTHORIZED);
    assert_eq!(h.controller.handle(CHAT, "/model").await, REPLY_UNAUTHORIZED);
    assert_eq!(h.controller.handle(CHAT, "/new").await, REPLY_UNAUTHORIZED);
    assert_eq!(h.gateway.calls(), 0);
}

#[tokio::test]
async fn revocation_blocks_converse_without_a_gateway_call() {
    let h = harness(Outcome::Accepted, "hello").await;
    h.controller.handle(CHAT, "/api good").await;
    h.controller.handle(CHAT, "/model").await;
    h.controller.handle(CHAT, "3").await;
    assert_eq!(h.controller.handle(CHAT, "hi").await, "hello");
    assert_eq!(h.gateway.calls(), 1);

    // The authority now refuses the key (revoked remotely).
    h.authority.set_outcome(Outcome::Rejected);
    assert_eq!(h.controller.handle(CHAT, "/api good").await, REPLY_KEY_REJECTED);
    assert!(!h.store.read(CHAT).await.unwrap().unwrap().is_valid);

    assert_eq!(h.controller.handle(CHAT, "hi again").await, REPLY_UNAUTHORIZED);
    assert_eq!(h.gateway.calls(), 1);
}

#[tokio::test]
async fn indeterminate_outcome_fails_closed_with_distinct_reply() {
    let h = harness(Outcome::Accepted, "hello").await;
    h.controller.handle(CHAT, "/api key").await;
    assert!(h.store.read(CHAT).await.unwrap().unwrap().is_valid);

    h.authority
        .set_outcome(Outcome::Indeterminate("timeout".to_string()));
    let reply = h.controller.handle(CHAT, "/api key").await;
    assert_eq!(reply, REPLY_KEY_RETRY);
    assert_ne!(reply, REPLY_KEY_REJECTED);
    assert!(!h.store.read(CHAT).await.unwrap().unwrap().is_valid);
}

#[tokio::test]
async fn overwrite_requires_revalidation_before_use() {
    let h = harness(Outcome::Accepted, "hello").await;
    h.controller.handle(CHAT, "/api first").await;
    assert!(gate::authorize(&h.store, CHAT).await.unwrap());

    // Resubmission with an inconclusive validation leaves the new key
    // unusable even though the old one was valid.
    h.authority
        .set_outcome(Outcome::Indeterminate("gateway 500".to_string()));
    h.controller.handle(CHAT, "/api second").await;
    assert!(!gate::authorize(&h.store, CHAT).await.unwrap());
}

#[tokio::test]
async fn model_choice_validation_has_no_side_effects() {
    let h = harness(Outcome::Accepted, "hello").await;
    h.controller.handle(CHAT, "/api key").await;
    h.controller.handle(CHAT, "/model").await;

    assert_eq!(
        h.controller.handle(CHAT, "99999").await,
        REPLY_MODEL_OUT_OF_RANGE
    );
    assert_eq!(
        h.controller.handle(CHAT, "three").await,
        REPLY_MODEL_NOT_A_NUMBER
    );
    let record = h.store.read(CHAT).await.unwrap().unwrap();
    assert!(record.model_id.is_none());
    assert!(record.max_tokens.is_none());

    // The sub-state survived both bad inputs.
    let confirmation = h.controller.handle(CHAT, "3").await;
    assert!(confirmation.contains("mistralai/mistral-7b-instruct"));
}

#[tokio::test]
async fn converse_without_model_gives_guidance_and_records_nothing() {
    let h = harness(Outcome::Accepted, "hello").await;
    h.controller.handle(CHAT, "/api key").await;

    assert_eq!(h.controller.handle(CHAT, "hi").await, REPLY_NO_MODEL);
    assert_eq!(h.gateway.calls(), 0);
    assert!(h.store.messages(CHAT).await.unwrap().is_empty());
}

#[tokio::test]
async fn gateway_failure_apologizes_and_records_nothing() {
    let h = harness(Outcome::Accepted, "hello").await;
    h.controller.handle(CHAT, "/api key").await;
    h.controller.handle(CHAT, "/model").await;
    h.controller.handle(CHAT, "3").await;

    h.gateway.fail_next_calls();
    assert_eq!(h.controller.handle(CHAT, "hi").await, REPLY_APOLOGY);
    assert_eq!(h.gateway.calls(), 1);
    assert!(h.store.messages(CHAT).await.unwrap().is_empty());
}

#[tokio::test]
async fn history_is_replayed_on_later_turns() {
    let h = harness(Outcome::Accepted, "hello").await;
    h.controller.handle(CHAT, "/api key").await;
    h.controller.handle(CHAT, "/model").await;
    h.controller.handle(CHAT, "3").await;

    h.controller.handle(CHAT, "first").await;
    h.controller.handle(CHAT, "second").await;
    assert_eq!(h.gateway.last_history_len.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unknown_commands_get_a_hint() {
    let h = harness(Outcome::Accepted, "hello").await;
    assert_eq!(
        h.controller.handle(CHAT, "/frobnicate").await,
        REPLY_UNKNOWN_COMMAND
    );
}
