//! The `edit` action: instruction + previous text in, edited text out.

use super::Patch;
use crate::coerce;
use crate::envelope::Envelope;
use crate::error::Fault;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Edit request body. The model is fixed to the legacy edit model.
#[derive(Debug, Clone, Serialize)]
pub struct EditRequest {
    pub model: String,
    pub instruction: String,
    pub input: String,
    pub n: i64,
    pub temperature: i64,
    pub top_p: i64,
}

pub(crate) fn build(env: &Envelope) -> EditRequest {
    EditRequest {
        model: crate::EDIT_MODEL.to_string(),
        instruction: env.payload.clone().unwrap_or_default(),
        input: env.last.clone().unwrap_or_default(),
        n: coerce::int_or(env.n.as_ref(), coerce::DEFAULT_N),
        temperature: coerce::int_or(env.temperature.as_ref(), coerce::DEFAULT_TEMPERATURE),
        top_p: coerce::int_or(env.top_p.as_ref(), coerce::DEFAULT_TOP_P),
    }
}

#[derive(Deserialize)]
struct RawTextResponse {
    choices: Vec<RawTextChoice>,
}

#[derive(Deserialize)]
struct RawTextChoice {
    text: String,
}

/// Extract the first choice's text. Shared with the `completion` action.
pub(crate) fn first_choice_text(raw: &Value) -> Result<String, Fault> {
    let parsed = RawTextResponse::deserialize(raw)
        .map_err(|e| Fault::Transport(format!("failed to parse text response: {e}")))?;
    parsed
        .choices
        .into_iter()
        .next()
        .map(|c| c.text)
        .ok_or_else(|| Fault::Transport("response contained no choices".into()))
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
    fn build_uses_fixed_legacy_model() {
        let mut env = Envelope::new("edit", "Fix the grammar");
        env.last = Some("teh quick brown fox".into());
        let req = build(&env);
        assert_eq!(req.model, "text-davinci-edit-001");
        assert_eq!(req.instruction, "Fix the grammar");
        assert_eq!(req.input, "teh quick brown fox");
        assert_eq!(req.temperature, 1);
        assert_eq!(req.top_p, 1);
    }

    #[test]
    fn missing_last_becomes_empty_input() {
        let req = build(&Envelope::new("edit", "Uppercase everything"));
        assert_eq!(req.input, "");
    }

    #[test]
    fn apply_takes_first_choice_text_and_attaches_raw() {
        let raw = json!({"choices": [
            {"text": "the quick brown fox"},
            {"text": "alternate"},
        ]});
        let patch = apply(raw.clone()).unwrap();
        assert_eq!(patch.payload.as_deref(), Some("the quick brown fox"));
        assert_eq!(patch.full, raw);
        assert!(patch.history.is_none());
    }

    #[test]
    fn missing_choices_is_a_transport_fault() {
        assert!(matches!(
            apply(json!({"choices": []})),
            Err(Fault::Transport(_))
        ));
        assert!(matches!(apply(json!({})), Err(Fault::Transport(_))));
    }
}
