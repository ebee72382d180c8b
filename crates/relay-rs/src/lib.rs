//! Topic-keyed dispatcher for the OpenAI API.
//!
//! `relay-rs` routes an inbound [`Envelope`](envelope::Envelope) — a message
//! carrying a `topic`, a `payload`, and loosely-typed call parameters — to one
//! of five named actions, each of which builds a provider request, performs a
//! single async call, and folds the response back into the envelope:
//!
//! | topic | capability | history |
//! |-------|------------|---------|
//! | `image` | image generation (URL or base64) | none |
//! | `edit` | legacy instruction-based text edit | none |
//! | `turbo` | fast chat completion | user + assistant turn per call |
//! | `gpt4` | advanced chat completion with function calling | user + assistant turn per call |
//! | `completion` | legacy text completion | none |
//!
//! The core abstraction is the [`Node`](dispatch::Node): construct one from a
//! [`NodeConfig`](dispatch::NodeConfig) and feed it envelopes. Every envelope
//! comes back exactly once — on failure it is returned unmodified alongside an
//! error status, never dropped.
//!
//! # Getting started
//!
//! ```ignore
//! use relay_rs::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Fault> {
//!     let api_key = std::env::var("OPENAI_API_KEY").unwrap();
//!     let node = Node::new(NodeConfig::new(api_key))?;
//!
//!     let (reply, status) = node.handle(Envelope::new("turbo", "Why is the sky blue?")).await;
//!     println!("[{}] {}", status.text, reply.payload.unwrap_or_default());
//!
//!     // Chat actions accumulate history on the envelope; re-supply it to
//!     // continue the conversation.
//!     let mut followup = Envelope::new("turbo", "Shorter, please.");
//!     followup.history = reply.history;
//!     let (reply, _) = node.handle(followup).await;
//!     println!("{}", reply.payload.unwrap_or_default());
//!     Ok(())
//! }
//! ```
//!
//! # Where to find things
//!
//! If you're looking for how to...
//!
//! - **Dispatch a message:** see [`Node`](dispatch::Node) and
//!   [`NodeConfig`](dispatch::NodeConfig). One call to
//!   [`Node::handle()`](dispatch::Node::handle) covers resolve → build →
//!   call → apply.
//!
//! - **Understand the action recipes:** see [`ActionKind`](action::ActionKind)
//!   and the per-action modules under [`action`]. Each action is a pure
//!   request builder plus a pure response transform; the [`Patch`](action::Patch)
//!   it produces is the single point that mutates the envelope.
//!
//! - **Observe lifecycle and errors:** implement [`Reporter`](status::Reporter)
//!   to receive [`StatusSignal`](status::StatusSignal) transitions and
//!   [`Fault`](error::Fault) reports. Use [`LoggingReporter`](status::LoggingReporter)
//!   for tracing-based logging or [`CompositeReporter`](status::CompositeReporter)
//!   to compose observers.
//!
//! - **Feed loosely-typed parameters:** numeric fields on the envelope accept
//!   JSON numbers *or* numeric strings; [`coerce`] documents the exact
//!   integer-truncating rules and per-field defaults.
//!
//! - **Swap the remote:** the [`Remote`](api::Remote) trait is the seam
//!   between the dispatcher and the HTTP client. [`OpenAiClient`](api::OpenAiClient)
//!   is the production implementation; tests supply stubs.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`dispatch`] | [`Node`](dispatch::Node): resolve topic, call once, apply patch, report status |
//! | [`action`] | The five action recipes and the [`ProviderRequest`](action::ProviderRequest) / [`Patch`](action::Patch) contract |
//! | [`envelope`] | The [`Envelope`](envelope::Envelope) unit of work |
//! | [`api`] | [`OpenAiClient`](api::OpenAiClient), the [`Remote`](api::Remote) seam, fault classification |
//! | [`coerce`] | Loose-parameter coercion rules and defaults |
//! | [`status`] | [`StatusSignal`](status::StatusSignal) side channel and [`Reporter`](status::Reporter) observers |
//! | [`error`] | The [`Fault`](error::Fault) taxonomy |

pub mod action;
pub mod api;
pub mod coerce;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod prelude;
pub mod status;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ── Constants ──────────────────────────────────────────────────────

/// Default base URL for all OpenAI calls. Override via
/// [`NodeConfig::with_base_url`](dispatch::NodeConfig::with_base_url).
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Fixed model for the `edit` action.
pub const EDIT_MODEL: &str = "text-davinci-edit-001";

/// Fixed model for the `turbo` action.
pub const TURBO_MODEL: &str = "gpt-3.5-turbo";

/// Fixed model for the `gpt4` action.
pub const GPT4_MODEL: &str = "gpt-4-0613";

/// Fixed model for the `completion` action.
pub const COMPLETION_MODEL: &str = "text-davinci-003";

// ── Schema generation ──────────────────────────────────────────────

/// Generate a JSON Schema `serde_json::Value` from a type that implements
/// `schemars::JsonSchema`. This is the bridge between strong Rust types and
/// the `parameters` field of a [`FunctionDef`] sent to the function-calling
/// API.
///
/// # Example
///
/// ```
/// use relay_rs::json_schema_for;
/// use schemars::JsonSchema;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, JsonSchema)]
/// struct WeatherArgs {
///     city: String,
///     #[serde(default)]
///     unit: Option<String>,
/// }
///
/// let schema = json_schema_for::<WeatherArgs>();
/// assert_eq!(schema["type"], "object");
/// assert!(schema["required"].as_array().unwrap().contains(&"city".into()));
/// ```
pub fn json_schema_for<T: JsonSchema>() -> serde_json::Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(schema)
        .unwrap_or_else(|_| serde_json::json!({"type": "object", "properties": {}}))
}

// ── Turn types ─────────────────────────────────────────────────────

/// Role of a turn in the conversation history.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnRole::System => write!(f, "system"),
            TurnRole::User => write!(f, "user"),
            TurnRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// One turn of conversation history, in the chat-completions wire format.
///
/// `content` is serialized even when `None` — an assistant turn that carries a
/// function call has an explicit `null` content on the wire.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Turn {
    pub role: TurnRole,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::System,
            content: Some(content.into()),
            function_call: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: Some(content.into()),
            function_call: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: Some(content.into()),
            function_call: None,
        }
    }

    /// Assistant turn carrying a model-requested function call. Content is
    /// explicitly `null`.
    pub fn assistant_function_call(call: FunctionCall) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: None,
            function_call: Some(call),
        }
    }
}

// ── Function-calling types ─────────────────────────────────────────

/// A function the model may request, declared by the caller (gpt4 action).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: serde_json::Value,
}

impl FunctionDef {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            parameters,
        }
    }
}

/// A function invocation requested by the model instead of a text reply.
///
/// `arguments` is always a string: when the service returns an object, the
/// transform serializes it before constructing this value.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_constructors() {
        let user = Turn::user("hello");
        assert_eq!(user.role, TurnRole::User);
        assert_eq!(user.content.as_deref(), Some("hello"));

        let call = FunctionCall {
            name: "get_weather".into(),
            arguments: "{}".into(),
        };
        let turn = Turn::assistant_function_call(call);
        assert_eq!(turn.role, TurnRole::Assistant);
        assert!(turn.content.is_none());
        assert_eq!(turn.function_call.unwrap().name, "get_weather");
    }

    #[test]
    fn function_call_turn_serializes_null_content() {
        let turn = Turn::assistant_function_call(FunctionCall {
            name: "f".into(),
            arguments: "{}".into(),
        });
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["role"], "assistant");
        assert!(json["content"].is_null());
        assert!(json.get("content").is_some(), "null must be explicit");
        assert_eq!(json["function_call"]["name"], "f");
    }

    #[test]
    fn plain_turn_omits_function_call() {
        let json = serde_json::to_value(Turn::user("hi")).unwrap();
        assert!(json.get("function_call").is_none());
    }

    #[test]
    fn turn_roundtrips_through_json() {
        let turn = Turn::assistant("  spaced  ");
        let back: Turn = serde_json::from_str(&serde_json::to_string(&turn).unwrap()).unwrap();
        assert_eq!(back, turn);
    }
}
