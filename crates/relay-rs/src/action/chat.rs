//! The chat actions: `turbo` and `gpt4`.
//!
//! Both share one recipe — send the conversation history (with the payload
//! appended as a fresh user turn) and fold the assistant's reply back into
//! the history — and differ in the fixed model plus `gpt4`'s function-calling
//! support.
//!
//! History discipline: the builder never mutates the envelope. The patch
//! carries the full replacement history (old turns ⧺ user turn ⧺ assistant
//! turn), so a failed call leaves the caller's history untouched and a
//! successful one grows it by exactly two turns — or one, when the payload
//! was omitted to continue from caller-managed history.

use super::Patch;
use crate::coerce;
use crate::envelope::Envelope;
use crate::error::Fault;
use crate::{FunctionCall, FunctionDef, Turn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Chat-completion request body, shared by `turbo` and `gpt4`.
///
/// `stop` is serialized even when null — that is the shape existing flows
/// produce. `functions`/`function_call` are omitted entirely unless the
/// envelope declared functions.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Turn>,
    pub temperature: i64,
    pub top_p: i64,
    pub n: i64,
    pub stream: bool,
    pub stop: Value,
    pub max_tokens: i64,
    pub presence_penalty: i64,
    pub frequency_penalty: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub functions: Option<Vec<FunctionDef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<Value>,
}

/// The messages for this call: existing history plus a new user turn when a
/// payload is present. Callers may omit the payload to continue from history
/// they manage themselves.
fn conversation(env: &Envelope) -> Vec<Turn> {
    let mut turns = env.history.clone().unwrap_or_default();
    if let Some(payload) = &env.payload {
        turns.push(Turn::user(payload.clone()));
    }
    turns
}

fn build(env: &Envelope, model: &str) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        messages: conversation(env),
        temperature: coerce::int_or(env.temperature.as_ref(), coerce::DEFAULT_TEMPERATURE),
        top_p: coerce::int_or(env.top_p.as_ref(), coerce::DEFAULT_TOP_P),
        n: coerce::int_or(env.n.as_ref(), coerce::DEFAULT_N),
        stream: coerce::truthy(env.stream.as_ref()),
        stop: env.stop.clone().unwrap_or(Value::Null),
        max_tokens: coerce::int_or(env.max_tokens.as_ref(), coerce::DEFAULT_MAX_TOKENS),
        presence_penalty: coerce::int_or(
            env.presence_penalty.as_ref(),
            coerce::DEFAULT_PRESENCE_PENALTY,
        ),
        frequency_penalty: coerce::int_or(
            env.frequency_penalty.as_ref(),
            coerce::DEFAULT_FREQUENCY_PENALTY,
        ),
        functions: None,
        function_call: None,
    }
}

pub(crate) fn build_turbo(env: &Envelope) -> ChatRequest {
    build(env, crate::TURBO_MODEL)
}

pub(crate) fn build_gpt4(env: &Envelope) -> ChatRequest {
    let mut request = build(env, crate::GPT4_MODEL);
    if !env.functions.is_empty() {
        request.functions = Some(env.functions.clone());
        request.function_call = Some(
            env.function_call
                .clone()
                .unwrap_or_else(|| Value::String("auto".into())),
        );
    }
    request
}

// ── Response parsing ───────────────────────────────────────────────

#[derive(Deserialize)]
struct RawChatResponse {
    choices: Vec<RawChatChoice>,
}

#[derive(Deserialize)]
struct RawChatChoice {
    message: RawChatMessage,
}

#[derive(Deserialize)]
struct RawChatMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    function_call: Option<RawFunctionCall>,
}

/// `arguments` arrives as a string from conforming servers but has been
/// observed as a bare object; keep it loose and stringify on extraction.
#[derive(Deserialize)]
struct RawFunctionCall {
    name: String,
    #[serde(default)]
    arguments: Value,
}

fn first_choice_message(raw: &Value) -> Result<RawChatMessage, Fault> {
    let parsed = RawChatResponse::deserialize(raw)
        .map_err(|e| Fault::Transport(format!("failed to parse chat response: {e}")))?;
    parsed
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| Fault::Transport("chat response contained no choices".into()))
}

/// Content branch shared by both chat actions: the trimmed content becomes
/// the assistant turn, the untrimmed content becomes the payload.
fn content_patch(env: &Envelope, content: String, raw: Value) -> Patch {
    let mut history = conversation(env);
    history.push(Turn::assistant(content.trim()));
    Patch {
        payload: Some(content),
        full: raw,
        history: Some(history),
        function_call: None,
    }
}

pub(crate) fn apply_turbo(env: &Envelope, raw: Value) -> Result<Patch, Fault> {
    let message = first_choice_message(&raw)?;
    let content = message
        .content
        .ok_or_else(|| Fault::Transport("chat response missing message content".into()))?;
    Ok(content_patch(env, content, raw))
}

pub(crate) fn apply_gpt4(env: &Envelope, raw: Value) -> Result<Patch, Fault> {
    let message = first_choice_message(&raw)?;

    // Null content — not merely empty — signals a function-call request. An
    // assistant may legitimately reply with an empty string.
    match message.content {
        Some(content) => Ok(content_patch(env, content, raw)),
        None => {
            let call = message.function_call.ok_or_else(|| {
                Fault::Transport("chat response had null content and no function_call".into())
            })?;
            let arguments = match call.arguments {
                Value::String(s) => s,
                other => serde_json::to_string(&other)
                    .map_err(|e| Fault::Transport(format!("unserializable arguments: {e}")))?,
            };
            let call = FunctionCall {
                name: call.name,
                arguments,
            };

            let mut history = conversation(env);
            history.push(Turn::assistant_function_call(call.clone()));
            Ok(Patch {
                payload: None,
                full: raw,
                history: Some(history),
                function_call: Some(call),
            })
        }
    }
}
