//! The [`Fault`] taxonomy: everything that can go wrong around one dispatch.
//!
//! No fault is fatal. Every failure path in the dispatcher ends the same way:
//! status updated, fault reported through the [`Reporter`](crate::status::Reporter),
//! envelope forwarded unchanged.

use serde_json::Value;
use thiserror::Error;

/// A classified failure surfaced on the error side channel.
#[derive(Debug, Clone, Error)]
pub enum Fault {
    /// The configured alternate endpoint is not a valid URL. Reported once at
    /// setup; the node stays usable with the default endpoint.
    #[error("BaseUrl({0}) isn't a valid url")]
    InvalidBaseUrl(String),

    /// The envelope's topic (or configured default) matched no action.
    #[error("msg.topic must be set to one of the following values: {}", quoted_topics())]
    UnknownTopic { topic: Option<String> },

    /// The remote call failed before a structured response was obtained —
    /// network error, timeout, or an undecodable success body.
    #[error("{0}")]
    Transport(String),

    /// The remote service returned a structured error response.
    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: Value },
}

fn quoted_topics() -> String {
    crate::action::TOPICS
        .iter()
        .map(|t| format!("'{t}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_topic_lists_all_five_actions() {
        let fault = Fault::UnknownTopic {
            topic: Some("davinci".into()),
        };
        let text = fault.to_string();
        for topic in ["'image'", "'edit'", "'turbo'", "'gpt4'", "'completion'"] {
            assert!(text.contains(topic), "missing {topic} in: {text}");
        }
    }

    #[test]
    fn api_fault_carries_status_and_body() {
        let fault = Fault::Api {
            status: 400,
            body: json!({"error": {"message": "bad model"}}),
        };
        let text = fault.to_string();
        assert!(text.contains("400"));
        assert!(text.contains("bad model"));
    }

    #[test]
    fn invalid_base_url_names_the_value() {
        let fault = Fault::InvalidBaseUrl("not a url".into());
        assert!(fault.to_string().contains("not a url"));
    }
}
