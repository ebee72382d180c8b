//! The action registry and the request/response contract.
//!
//! Each action is a self-contained recipe: a pure request builder
//! `(envelope) → ProviderRequest` and a pure response transform
//! `(envelope, raw response) → Patch`. The [`ActionKind`] enum is the
//! registry — statically enumerable, resolved case-insensitively from the
//! envelope's topic, with no fallback action.
//!
//! Builders and transforms never mutate the envelope. All result state flows
//! through the [`Patch`] the dispatcher applies on success, so a failed call
//! leaves the envelope byte-for-byte intact.
//!
//! - [`image`] — image generation, URL or base64 result
//! - [`edit`] — legacy instruction-based edit
//! - [`chat`] — `turbo` and `gpt4` chat completions, history accumulation,
//!   function calling
//! - [`completion`] — legacy text completion

pub mod chat;
pub mod completion;
pub mod edit;
pub mod image;

use crate::envelope::Envelope;
use crate::error::Fault;
use crate::{FunctionCall, Turn};
use serde::Serialize;
use serde_json::Value;

pub use chat::ChatRequest;
pub use completion::CompletionRequest;
pub use edit::EditRequest;
pub use image::ImageRequest;

/// The five built-in topics, in registry order.
pub const TOPICS: [&str; 5] = ["image", "edit", "turbo", "gpt4", "completion"];

// ── Registry ───────────────────────────────────────────────────────

/// A named remote capability: one request builder plus one response
/// transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Image,
    Edit,
    Turbo,
    Gpt4,
    Completion,
}

impl ActionKind {
    /// Resolve a topic to an action. Lookup is case-insensitive and
    /// exact-match only; anything else is [`Fault::UnknownTopic`].
    pub fn resolve(topic: &str) -> Result<Self, Fault> {
        match topic.to_lowercase().as_str() {
            "image" => Ok(ActionKind::Image),
            "edit" => Ok(ActionKind::Edit),
            "turbo" => Ok(ActionKind::Turbo),
            "gpt4" => Ok(ActionKind::Gpt4),
            "completion" => Ok(ActionKind::Completion),
            other => Err(Fault::UnknownTopic {
                topic: Some(other.to_string()),
            }),
        }
    }

    /// The lowercase topic this action is registered under.
    pub fn topic(self) -> &'static str {
        match self {
            ActionKind::Image => "image",
            ActionKind::Edit => "edit",
            ActionKind::Turbo => "turbo",
            ActionKind::Gpt4 => "gpt4",
            ActionKind::Completion => "completion",
        }
    }

    /// Build the provider request for this action from an immutable view of
    /// the envelope.
    pub fn build_request(self, env: &Envelope) -> ProviderRequest {
        match self {
            ActionKind::Image => ProviderRequest::Image(image::build(env)),
            ActionKind::Edit => ProviderRequest::Edit(edit::build(env)),
            ActionKind::Turbo => ProviderRequest::Chat(chat::build_turbo(env)),
            ActionKind::Gpt4 => ProviderRequest::Chat(chat::build_gpt4(env)),
            ActionKind::Completion => ProviderRequest::Completion(completion::build(env)),
        }
    }

    /// Transform a raw success response into the patch to apply.
    pub fn apply_response(self, env: &Envelope, raw: Value) -> Result<Patch, Fault> {
        match self {
            ActionKind::Image => image::apply(env, raw),
            ActionKind::Edit => edit::apply(raw),
            ActionKind::Turbo => chat::apply_turbo(env, raw),
            ActionKind::Gpt4 => chat::apply_gpt4(env, raw),
            ActionKind::Completion => completion::apply(raw),
        }
    }
}

// ── Provider request ───────────────────────────────────────────────

/// The four wire shapes an action can produce. `turbo` and `gpt4` both
/// produce [`Chat`](ProviderRequest::Chat) with different fixed models.
///
/// Serializes untagged: the request body on the wire is the inner struct.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ProviderRequest {
    Image(ImageRequest),
    Edit(EditRequest),
    Chat(ChatRequest),
    Completion(CompletionRequest),
}

impl ProviderRequest {
    /// API path this request posts to, relative to the base URL.
    pub fn endpoint(&self) -> &'static str {
        match self {
            ProviderRequest::Image(_) => "/images/generations",
            ProviderRequest::Edit(_) => "/edits",
            ProviderRequest::Chat(_) => "/chat/completions",
            ProviderRequest::Completion(_) => "/completions",
        }
    }
}

// ── Patch ──────────────────────────────────────────────────────────

/// The single mutation point: everything a successful dispatch writes back
/// to the envelope.
#[derive(Debug, Clone)]
pub struct Patch {
    /// New payload. `None` means an explicit null result (function-call
    /// branch) — the payload is always overwritten.
    pub payload: Option<String>,
    /// Complete raw response body.
    pub full: Value,
    /// Replacement history (chat actions only). `None` leaves history alone.
    pub history: Option<Vec<Turn>>,
    /// Model-requested function call (gpt4 only), `arguments` stringified.
    pub function_call: Option<FunctionCall>,
}

impl Patch {
    /// A patch that only sets the payload and raw response.
    pub fn result(payload: impl Into<String>, full: Value) -> Self {
        Self {
            payload: Some(payload.into()),
            full,
            history: None,
            function_call: None,
        }
    }

    /// Apply to an envelope. Called by the dispatcher on success only.
    pub fn apply(self, env: &mut Envelope) {
        env.payload = self.payload;
        env.full = Some(self.full);
        if let Some(history) = self.history {
            env.history = Some(history);
        }
        if let Some(call) = self.function_call {
            env.function_call = serde_json::to_value(&call).ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolve_is_case_insensitive() {
        for topic in TOPICS {
            let lower = ActionKind::resolve(topic).unwrap();
            let upper = ActionKind::resolve(&topic.to_uppercase()).unwrap();
            assert_eq!(lower, upper);
            assert_eq!(lower.topic(), topic);
        }
        assert_eq!(
            ActionKind::resolve("Turbo").unwrap(),
            ActionKind::resolve("tUrBo").unwrap()
        );
    }

    #[test]
    fn resolve_rejects_unknown_topics_without_fallback() {
        for topic in ["images", "chat", "", "davinci"] {
            assert!(matches!(
                ActionKind::resolve(topic),
                Err(Fault::UnknownTopic { .. })
            ));
        }
    }

    #[test]
    fn endpoints_match_call_shapes() {
        let env = Envelope::new("turbo", "hi");
        assert_eq!(
            ActionKind::Image.build_request(&env).endpoint(),
            "/images/generations"
        );
        assert_eq!(ActionKind::Edit.build_request(&env).endpoint(), "/edits");
        assert_eq!(
            ActionKind::Turbo.build_request(&env).endpoint(),
            "/chat/completions"
        );
        assert_eq!(
            ActionKind::Gpt4.build_request(&env).endpoint(),
            "/chat/completions"
        );
        assert_eq!(
            ActionKind::Completion.build_request(&env).endpoint(),
            "/completions"
        );
    }

    #[test]
    fn patch_overwrites_payload_and_sets_full() {
        let mut env = Envelope::new("completion", "prompt in");
        Patch::result("text out", json!({"id": "cmpl-1"})).apply(&mut env);
        assert_eq!(env.payload.as_deref(), Some("text out"));
        assert_eq!(env.full, Some(json!({"id": "cmpl-1"})));
        assert!(env.history.is_none(), "non-chat patch leaves history alone");
    }

    #[test]
    fn patch_with_none_payload_nulls_it() {
        let mut env = Envelope::new("gpt4", "call something");
        let patch = Patch {
            payload: None,
            full: json!({}),
            history: None,
            function_call: Some(FunctionCall {
                name: "f".into(),
                arguments: "{\"a\":1}".into(),
            }),
        };
        patch.apply(&mut env);
        assert!(env.payload.is_none());
        assert_eq!(env.function_call.as_ref().unwrap()["name"], "f");
        assert!(env.function_call.as_ref().unwrap()["arguments"].is_string());
    }
}
