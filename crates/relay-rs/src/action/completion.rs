//! The `completion` action: legacy prompt-in, text-out completion.

use super::Patch;
use super::edit::first_choice_text;
use crate::coerce;
use crate::envelope::Envelope;
use crate::error::Fault;
use serde::Serialize;
use serde_json::Value;

/// Completion request body. `suffix`, `logprobs`, and `stop` serialize as
/// explicit nulls when unset, matching the shape existing flows produce.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub suffix: Option<String>,
    pub max_tokens: i64,
    pub temperature: i64,
    pub top_p: i64,
    pub n: i64,
    pub stream: bool,
    pub logprobs: Option<i64>,
    pub echo: bool,
    pub stop: Value,
    pub presence_penalty: i64,
    pub frequency_penalty: i64,
    pub best_of: i64,
}

pub(crate) fn build(env: &Envelope) -> CompletionRequest {
    CompletionRequest {
        model: crate::COMPLETION_MODEL.to_string(),
        prompt: env.payload.clone().unwrap_or_default(),
        suffix: env.suffix.clone(),
        max_tokens: coerce::int_or(env.max_tokens.as_ref(), coerce::DEFAULT_MAX_TOKENS),
        temperature: coerce::int_or(env.temperature.as_ref(), coerce::DEFAULT_TEMPERATURE),
        top_p: coerce::int_or(env.top_p.as_ref(), coerce::DEFAULT_TOP_P),
        n: coerce::int_or(env.n.as_ref(), coerce::DEFAULT_N),
        stream: coerce::truthy(env.stream.as_ref()),
        logprobs: coerce::int_opt(env.logprobs.as_ref()),
        echo: coerce::truthy(env.echo.as_ref()),
        stop: env.stop.clone().unwrap_or(Value::Null),
        presence_penalty: coerce::int_or(
            env.presence_penalty.as_ref(),
            coerce::DEFAULT_PRESENCE_PENALTY,
        ),
        frequency_penalty: coerce::int_or(
            env.frequency_penalty.as_ref(),
            coerce::DEFAULT_FREQUENCY_PENALTY,
        ),
        best_of: coerce::int_or(env.best_of.as_ref(), coerce::DEFAULT_BEST_OF),
    }
}

pub(crate) fn apply(raw: Value) -> Result<Patch, Fault> {
    let text = first_choice_text(&raw)?;
    Ok(Patch::result(text, raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn build_applies_documented_defaults() {
        let req = build(&Envelope::new("completion", "Once upon a time"));
        assert_eq!(req.model, "text-davinci-003");
        assert_eq!(req.prompt, "Once upon a time");
        assert_eq!(req.max_tokens, 4000);
        assert_eq!(req.best_of, 1);
        assert!(!req.echo);
        assert!(req.suffix.is_none());
        assert!(req.logprobs.is_none());
    }

    #[test]
    fn nullable_fields_serialize_as_explicit_nulls() {
        let json = serde_json::to_value(build(&Envelope::new("completion", "x"))).unwrap();
        assert!(json["suffix"].is_null());
        assert!(json["logprobs"].is_null());
        assert!(json["stop"].is_null());
        assert!(json.get("suffix").is_some());
    }

    #[test]
    fn loose_parameters_coerce() {
        let mut env = Envelope::new("completion", "x");
        env.temperature = Some(json!("0.7"));
        env.logprobs = Some(json!("2"));
        env.echo = Some(json!(1));
        env.stop = Some(json!(["\n"]));
        let req = build(&env);
        assert_eq!(req.temperature, 0, "integer truncation preserved");
        assert_eq!(req.logprobs, Some(2));
        assert!(req.echo);
        assert_eq!(req.stop, json!(["\n"]));
    }

    #[test]
    fn apply_takes_first_choice_text() {
        let raw = json!({"choices": [{"text": " in a land far away"}]});
        let patch = apply(raw.clone()).unwrap();
        assert_eq!(patch.payload.as_deref(), Some(" in a land far away"));
        assert_eq!(patch.full, raw);
    }
}
