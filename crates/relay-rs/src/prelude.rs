//! Convenience re-exports for common `relay-rs` types.
//!
//! Meant to be glob-imported when dispatching messages:
//!
//! ```ignore
//! use relay_rs::prelude::*;
//! ```
//!
//! This pulls in the types needed for the vast majority of callers: the
//! [`Node`] + config, the [`Envelope`], conversation turns, function-calling
//! types, status reporting, and the fault taxonomy. Specialized types
//! (per-action request structs, the raw [`Remote`] seam internals) are
//! intentionally excluded — import those from their modules when needed.

// ── Core types ──────────────────────────────────────────────────────
pub use crate::{FunctionCall, FunctionDef, Turn, TurnRole, json_schema_for};

// ── Dispatch ────────────────────────────────────────────────────────
pub use crate::dispatch::{Node, NodeConfig};
pub use crate::envelope::Envelope;

// ── Actions ─────────────────────────────────────────────────────────
pub use crate::action::{ActionKind, Patch, ProviderRequest, TOPICS};

// ── API boundary ────────────────────────────────────────────────────
pub use crate::api::{OpenAiClient, Remote};

// ── Status & errors ─────────────────────────────────────────────────
pub use crate::error::Fault;
pub use crate::status::{
    CompositeReporter, LoggingReporter, NoopReporter, Reporter, StatusSignal,
};
