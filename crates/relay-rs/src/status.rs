//! Lifecycle status side channel and the [`Reporter`] observer trait.
//!
//! A [`StatusSignal`] is purely observational: it reflects where the
//! dispatcher is in its per-envelope lifecycle (idle → processing →
//! success/error) and never touches the envelope payload. Signals are
//! ephemeral — each transition overwrites the last, nothing is queued.
//!
//! Callers implement [`Reporter`] to receive status transitions and
//! [`Fault`](crate::error::Fault) reports:
//!
//! | Reporter | Use case |
//! |----------|----------|
//! | [`NoopReporter`] | Tests or fire-and-forget dispatch |
//! | [`LoggingReporter`] | Structured logging via `tracing` |
//! | [`CompositeReporter`] | Fan out to multiple reporters in order |
//! | Custom `impl Reporter` | Host status widgets, error routing |

use crate::error::Fault;
use tracing::{error, info, warn};

// ── Status signal ──────────────────────────────────────────────────

/// Indicator color of a status signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    Grey,
    Green,
    Blue,
    Red,
}

/// Indicator shape of a status signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Dot,
    Ring,
}

/// A `{fill, shape, text}` lifecycle signal for host display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSignal {
    pub fill: Fill,
    pub shape: Shape,
    pub text: String,
}

impl StatusSignal {
    /// Nothing in flight.
    pub fn idle() -> Self {
        Self {
            fill: Fill::Grey,
            shape: Shape::Ring,
            text: String::new(),
        }
    }

    /// An envelope is being handled; the remote call may be in flight.
    pub fn processing() -> Self {
        Self {
            fill: Fill::Green,
            shape: Shape::Dot,
            text: "Processing...".into(),
        }
    }

    /// The call completed and the envelope was patched.
    pub fn success() -> Self {
        Self {
            fill: Fill::Blue,
            shape: Shape::Dot,
            text: "Response complete".into(),
        }
    }

    /// The dispatch failed; the envelope was forwarded unchanged.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            fill: Fill::Red,
            shape: Shape::Dot,
            text: text.into(),
        }
    }

    /// Bad setup input (invalid alternate endpoint). The node stays usable.
    pub fn misconfigured(text: impl Into<String>) -> Self {
        Self {
            fill: Fill::Red,
            shape: Shape::Ring,
            text: text.into(),
        }
    }

    /// Whether this signal reports a failure of any kind.
    pub fn is_error(&self) -> bool {
        self.fill == Fill::Red
    }
}

// ── Reporter ───────────────────────────────────────────────────────

/// Observer for status transitions and fault reports.
///
/// Both methods default to no-ops so implementors can pick what they care
/// about. Reporters must be `Send + Sync`: one node may have several
/// envelopes in flight concurrently.
pub trait Reporter: Send + Sync {
    /// A lifecycle transition occurred.
    fn on_status(&self, _status: &StatusSignal) {}

    /// A fault was classified. The envelope is still forwarded after this.
    fn on_error(&self, _fault: &Fault) {}
}

/// Ignores everything. Default reporter for a bare [`Node`](crate::dispatch::Node).
pub struct NoopReporter;

impl Reporter for NoopReporter {}

/// Logs transitions and faults via `tracing`.
pub struct LoggingReporter;

impl Reporter for LoggingReporter {
    fn on_status(&self, status: &StatusSignal) {
        if status.is_error() {
            warn!("status: {}", status.text);
        } else {
            info!("status: {}", status.text);
        }
    }

    fn on_error(&self, fault: &Fault) {
        error!("{fault}");
    }
}

/// Fans out to multiple reporters in registration order.
pub struct CompositeReporter {
    reporters: Vec<Box<dyn Reporter>>,
}

impl CompositeReporter {
    pub fn new() -> Self {
        Self {
            reporters: Vec::new(),
        }
    }

    pub fn with(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporters.push(Box::new(reporter));
        self
    }
}

impl Default for CompositeReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for CompositeReporter {
    fn on_status(&self, status: &StatusSignal) {
        for reporter in &self.reporters {
            reporter.on_status(status);
        }
    }

    fn on_error(&self, fault: &Fault) {
        for reporter in &self.reporters {
            reporter.on_error(fault);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn constructors_have_expected_shapes() {
        assert_eq!(StatusSignal::idle().fill, Fill::Grey);
        assert!(StatusSignal::idle().text.is_empty());
        assert_eq!(StatusSignal::processing().fill, Fill::Green);
        assert_eq!(StatusSignal::success().fill, Fill::Blue);
        assert!(StatusSignal::error("boom").is_error());
        assert!(StatusSignal::misconfigured("bad url").is_error());
        assert!(!StatusSignal::success().is_error());
    }

    /// Shares its buffers so the test can inspect after handing a clone to
    /// the composite.
    #[derive(Clone, Default)]
    struct Shared {
        statuses: Arc<Mutex<Vec<String>>>,
        faults: Arc<Mutex<Vec<String>>>,
    }

    impl Reporter for Shared {
        fn on_status(&self, status: &StatusSignal) {
            self.statuses.lock().unwrap().push(status.text.clone());
        }

        fn on_error(&self, fault: &Fault) {
            self.faults.lock().unwrap().push(fault.to_string());
        }
    }

    #[test]
    fn composite_fans_out_to_every_reporter() {
        let first = Shared::default();
        let second = Shared::default();
        let composite = CompositeReporter::new()
            .with(first.clone())
            .with(second.clone());

        composite.on_status(&StatusSignal::processing());
        composite.on_error(&Fault::Transport("down".into()));

        assert_eq!(first.statuses.lock().unwrap().len(), 1);
        assert_eq!(second.statuses.lock().unwrap().len(), 1);
        assert_eq!(first.faults.lock().unwrap()[0], "down");
        assert_eq!(second.faults.lock().unwrap()[0], "down");
    }
}
