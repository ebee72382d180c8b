//! The [`Envelope`]: the unit of work and result carrier.
//!
//! An envelope is created by the caller per invocation, routed by topic,
//! and handed back exactly once with the result folded in. Nothing persists
//! across invocations except what the caller re-supplies (`history`).
//!
//! Call parameters (`n`, `temperature`, …) are kept as raw
//! [`serde_json::Value`]s so hosts that deliver numbers as strings keep
//! working; the [`coerce`](crate::coerce) rules apply at request-build time,
//! not here. `payload` is overwritten with the result on success; `full`
//! receives the complete raw response.

use crate::{FunctionDef, Turn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The unit of work: topic, primary input, loose parameters, and — after a
/// successful dispatch — the result fields.
///
/// Field semantics depend on the action: `payload` is an image prompt for
/// `image`, an edit instruction for `edit`, the user turn for `turbo`/`gpt4`
/// (optional there — omit it to continue from caller-managed history), and
/// the prompt for `completion`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Envelope {
    /// Selects the action. Case-insensitive; falls back to the node's
    /// configured default topic when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,

    /// Primary input on the way in, result on the way out. `None` after a
    /// gpt4 dispatch that returned a function call.
    pub payload: Option<String>,

    // ── Loose call parameters (see crate::coerce for rules/defaults) ──
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_of: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<Value>,

    /// Image size (image action), e.g. `"512x512"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Image response format: `"url"` or `"b64_json"` (image action).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Text to edit (edit action's `input`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<String>,
    /// Completion suffix (completion action).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    /// Stop sequence(s): a string or an array of strings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Value>,
    /// Stream flag, JS-truthy. Passed through on the wire; no SSE decoding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<Value>,
    /// Echo flag, JS-truthy (completion action).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub echo: Option<Value>,

    // ── Conversation state (chat actions) ──
    /// Ordered, append-only conversation history. Created lazily by the chat
    /// actions; owned by the caller between invocations. The dispatcher only
    /// appends — trimming unbounded growth is the caller's job.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<Turn>>,

    /// Function declarations forwarded to the gpt4 action.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<FunctionDef>,

    /// On the way in: the function-call directive (`"auto"`, `"none"`, or
    /// `{"name": …}`; defaults to `"auto"` when `functions` is non-empty).
    /// On the way out: the model-requested call, `arguments` stringified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<Value>,

    /// Complete raw response body from the last successful dispatch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full: Option<Value>,
}

impl Envelope {
    /// An envelope with just a topic and payload — enough for most actions.
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: Some(topic.into()),
            payload: Some(payload.into()),
            ..Self::default()
        }
    }

    /// Attach caller-managed conversation history.
    pub fn with_history(mut self, history: Vec<Turn>) -> Self {
        self.history = Some(history);
        self
    }

    /// Declare functions the model may call (gpt4 action).
    pub fn with_functions(mut self, functions: Vec<FunctionDef>) -> Self {
        self.functions = functions;
        self
    }

    /// Number of turns currently in history (0 when unset).
    pub fn history_len(&self) -> usize {
        self.history.as_ref().map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_sets_topic_and_payload() {
        let env = Envelope::new("turbo", "hello");
        assert_eq!(env.topic.as_deref(), Some("turbo"));
        assert_eq!(env.payload.as_deref(), Some("hello"));
        assert_eq!(env.history_len(), 0);
    }

    #[test]
    fn deserializes_loose_fields_from_host_json() {
        let env: Envelope = serde_json::from_value(json!({
            "topic": "completion",
            "payload": "Once upon a time",
            "temperature": "0.7",
            "max_tokens": 128,
            "echo": 1,
        }))
        .unwrap();
        assert_eq!(env.temperature, Some(json!("0.7")));
        assert_eq!(env.max_tokens, Some(json!(128)));
        assert_eq!(env.echo, Some(json!(1)));
        assert!(env.stop.is_none());
    }

    #[test]
    fn serialization_skips_unset_fields_but_keeps_payload() {
        let json = serde_json::to_value(Envelope::default()).unwrap();
        assert!(json.get("topic").is_none());
        assert!(json.get("history").is_none());
        // A null payload is a meaningful result (function-call branch).
        assert!(json["payload"].is_null());
        assert!(json.get("payload").is_some());
    }

    #[test]
    fn with_history_round_trips() {
        let env = Envelope::new("gpt4", "hi").with_history(vec![Turn::system("be terse")]);
        let back: Envelope = serde_json::from_str(&serde_json::to_string(&env).unwrap()).unwrap();
        assert_eq!(back.history_len(), 1);
        assert_eq!(back, env);
    }
}
