//! The `image` action: prompt in, image URL or base64 blob out.

use super::Patch;
use crate::coerce::{self, DEFAULT_IMAGE_FORMAT, DEFAULT_IMAGE_SIZE};
use crate::envelope::Envelope;
use crate::error::Fault;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Image-generation request body.
#[derive(Debug, Clone, Serialize)]
pub struct ImageRequest {
    pub prompt: String,
    pub n: i64,
    pub size: String,
    pub response_format: String,
}

pub(crate) fn build(env: &Envelope) -> ImageRequest {
    ImageRequest {
        prompt: env.payload.clone().unwrap_or_default(),
        n: coerce::int_or(env.n.as_ref(), coerce::DEFAULT_N),
        size: env
            .size
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_IMAGE_SIZE)
            .to_string(),
        response_format: env
            .format
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_IMAGE_FORMAT)
            .to_string(),
    }
}

/// Deserialization target for the slice of the response we read.
#[derive(Deserialize)]
struct RawImageResponse {
    data: Vec<RawImageDatum>,
}

#[derive(Deserialize)]
struct RawImageDatum {
    url: Option<String>,
    b64_json: Option<String>,
}

pub(crate) fn apply(env: &Envelope, raw: Value) -> Result<Patch, Fault> {
    let parsed = RawImageResponse::deserialize(&raw)
        .map_err(|e| Fault::Transport(format!("failed to parse image response: {e}")))?;
    let first = parsed
        .data
        .into_iter()
        .next()
        .ok_or_else(|| Fault::Transport("image response contained no data".into()))?;

    // The branch follows the *requested* format, not whatever the response
    // happens to contain.
    let result = if env.format.as_deref() == Some("url") {
        first.url
    } else {
        first.b64_json
    };
    let payload = result.ok_or_else(|| {
        Fault::Transport("image response missing the requested result field".into())
    })?;

    Ok(Patch::result(payload, raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn build_applies_documented_defaults() {
        let req = build(&Envelope::new("image", "a red fox"));
        assert_eq!(req.prompt, "a red fox");
        assert_eq!(req.n, 1);
        assert_eq!(req.size, "256x256");
        assert_eq!(req.response_format, "b64_json");
    }

    #[test]
    fn build_honors_explicit_fields() {
        let mut env = Envelope::new("image", "a fox");
        env.n = Some(json!("3"));
        env.size = Some("512x512".into());
        env.format = Some("url".into());
        let req = build(&env);
        assert_eq!(req.n, 3);
        assert_eq!(req.size, "512x512");
        assert_eq!(req.response_format, "url");
    }

    #[test]
    fn url_format_extracts_first_url() {
        let mut env = Envelope::new("image", "a fox");
        env.format = Some("url".into());
        let raw = json!({"created": 1, "data": [
            {"url": "https://img.example/1.png"},
            {"url": "https://img.example/2.png"},
        ]});
        let patch = apply(&env, raw.clone()).unwrap();
        assert_eq!(patch.payload.as_deref(), Some("https://img.example/1.png"));
        assert_eq!(patch.full, raw);
    }

    #[test]
    fn default_format_extracts_base64() {
        let env = Envelope::new("image", "a fox");
        let raw = json!({"data": [{"b64_json": "aGVsbG8="}]});
        let patch = apply(&env, raw.clone()).unwrap();
        assert_eq!(patch.payload.as_deref(), Some("aGVsbG8="));
        assert_eq!(patch.full, raw);
    }

    #[test]
    fn empty_data_is_a_transport_fault() {
        let err = apply(&Envelope::new("image", "x"), json!({"data": []})).unwrap_err();
        assert!(matches!(err, Fault::Transport(_)));
    }
}
