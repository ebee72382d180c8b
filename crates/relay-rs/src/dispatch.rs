//! The [`Node`]: resolve topic → build request → call once → apply patch.
//!
//! One node is constructed per configuration and handles any number of
//! envelopes. [`Node::handle`] takes `&self` — the host may deliver the next
//! envelope while a previous call is still in flight, and nothing is
//! serialized between them: the only shared state is the immutable remote
//! handle and the static action registry. A history object must not be
//! referenced by two in-flight envelopes at once; that is the caller's
//! responsibility.
//!
//! Every envelope is returned exactly once. On an unknown topic or a failed
//! call the original envelope comes back unmodified, with the fault surfaced
//! through the [`Reporter`] and the returned [`StatusSignal`] — a node never
//! drops or retries a message.

use crate::action::ActionKind;
use crate::api::{OpenAiClient, Remote};
use crate::envelope::Envelope;
use crate::error::Fault;
use crate::status::{NoopReporter, Reporter, StatusSignal};
use tracing::{debug, warn};

// ── Configuration ──────────────────────────────────────────────────

/// Setup input for a [`Node`], consumed once at construction.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// API credential (`Bearer` token).
    pub api_key: String,
    /// Optional organization header value.
    pub organization: Option<String>,
    /// Optional alternate endpoint. An invalid value produces a
    /// misconfiguration status and the node keeps the default endpoint.
    pub base_url: Option<String>,
    /// Topic used when an envelope carries none. `None` means envelopes must
    /// bring their own topic.
    pub default_topic: Option<String>,
}

impl NodeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            organization: None,
            base_url: None,
            default_topic: None,
        }
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_default_topic(mut self, topic: impl Into<String>) -> Self {
        self.default_topic = Some(topic.into());
        self
    }
}

// ── Node ───────────────────────────────────────────────────────────

/// A configured dispatcher handle.
pub struct Node {
    remote: Box<dyn Remote>,
    default_topic: Option<String>,
    setup_status: StatusSignal,
    reporter: Box<dyn Reporter>,
}

impl Node {
    /// Build a node with a production [`OpenAiClient`].
    ///
    /// Only an unbuildable HTTP client is an error here. A bad alternate
    /// endpoint is *not*: the node comes up on the default endpoint with
    /// [`Node::setup_status`] reporting the misconfiguration — no fault
    /// takes the node down.
    pub fn new(config: NodeConfig) -> Result<Self, Fault> {
        let mut client = OpenAiClient::new(config.api_key, config.organization)?;
        let mut setup_status = StatusSignal::idle();
        if let Some(base_url) = &config.base_url
            && let Err(fault) = client.set_base_url(base_url)
        {
            warn!("{fault}");
            setup_status = StatusSignal::misconfigured(fault.to_string());
        }
        Ok(Self {
            remote: Box::new(client),
            default_topic: config.default_topic,
            setup_status,
            reporter: Box::new(NoopReporter),
        })
    }

    /// Build a node over any [`Remote`] implementation (tests, custom
    /// transports).
    pub fn from_remote(remote: impl Remote + 'static) -> Self {
        Self {
            remote: Box::new(remote),
            default_topic: None,
            setup_status: StatusSignal::idle(),
            reporter: Box::new(NoopReporter),
        }
    }

    /// Set the fallback topic for envelopes that carry none.
    pub fn with_default_topic(mut self, topic: impl Into<String>) -> Self {
        self.default_topic = Some(topic.into());
        self
    }

    /// Attach a status/error observer.
    pub fn with_reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    /// Status produced by construction: idle, or misconfigured when the
    /// configured alternate endpoint was invalid.
    pub fn setup_status(&self) -> &StatusSignal {
        &self.setup_status
    }

    /// Dispatch one envelope: exactly one remote call, no retries, envelope
    /// returned in every path.
    pub async fn handle(&self, envelope: Envelope) -> (Envelope, StatusSignal) {
        self.reporter.on_status(&StatusSignal::processing());

        let topic = envelope.topic.as_deref().or(self.default_topic.as_deref());
        let resolved = match topic {
            Some(topic) => ActionKind::resolve(topic),
            None => Err(Fault::UnknownTopic { topic: None }),
        };
        let kind = match resolved {
            Ok(kind) => kind,
            Err(fault) => {
                let status = StatusSignal::error("msg.topic is incorrect");
                self.reporter.on_status(&status);
                self.reporter.on_error(&fault);
                return (envelope, status);
            }
        };

        debug!("dispatching '{}' action", kind.topic());
        let request = kind.build_request(&envelope);
        let outcome = self
            .remote
            .call(&request)
            .await
            .and_then(|raw| kind.apply_response(&envelope, raw));

        match outcome {
            Ok(patch) => {
                let mut envelope = envelope;
                patch.apply(&mut envelope);
                let status = StatusSignal::success();
                self.reporter.on_status(&status);
                (envelope, status)
            }
            Err(fault) => {
                let status = StatusSignal::error("Error");
                self.reporter.on_status(&status);
                self.reporter.on_error(&fault);
                (envelope, status)
            }
        }
    }
}
