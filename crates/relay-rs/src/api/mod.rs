//! API interaction layer: the OpenAI HTTP client and the [`Remote`] seam.
//!
//! Everything between the [`Node`](crate::dispatch::Node) and the remote
//! service lives here:
//!
//! - [`OpenAiClient`] — a configured, immutable handle (credentials, optional
//!   alternate base endpoint) built once at setup and reused across
//!   envelopes. Posts the four call shapes and classifies failures into
//!   [`Fault::Transport`](crate::error::Fault::Transport) vs
//!   [`Fault::Api`](crate::error::Fault::Api).
//! - [`Remote`] — the trait the dispatcher calls through, so tests can stub
//!   the network entirely.

pub mod client;

pub use client::{CallFuture, OpenAiClient, Remote};
