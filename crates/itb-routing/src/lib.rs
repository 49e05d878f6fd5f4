//! ---
//! itb_section: "03-routing-dispatch"
//! itb_subsection: "module"
//! itb_type: "source"
//! itb_scope: "code"
//! itb_description: "Routing-key matching and message dispatch."
//! itb_version: "v0.0.0-prealpha"
//! itb_owner: "tbd"
//! ---
//! Routing-key dispatch for the ITB event bus.
//!
//! A raw message arrives as a (routing key, JSON body, transport properties)
//! triple. This crate resolves the concrete key against the registered
//! patterns (single-term `*` wildcard only), then rehydrates a typed
//! [`itb_msg::Envelope`] from the body and properties. Everything here is a
//! synchronous in-memory transformation; the registry is populated once at
//! startup and treated as read-only afterwards, so no locking is needed on
//! the lookup path.

#![warn(missing_docs)]

pub mod matcher;
pub mod metrics;
pub mod registry;
pub mod transport;

/// Shared result type for routing operations.
pub type Result<T> = std::result::Result<T, RoutingError>;

/// Errors raised while matching keys or dispatching messages.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    /// The multi-term wildcard `#` appeared in a pattern or probe key.
    #[error("multi-term wildcard '#' is not supported in routing keys")]
    MultiLevelWildcard,
    /// No registered pattern matched the probed routing key.
    #[error("no message type registered for routing key: {0}")]
    UnknownRoutingKey(String),
    /// The message body was not valid JSON (or not a JSON object).
    #[error("body decode error: {0}")]
    Json(#[from] serde_json::Error),
    /// The message body was not valid UTF-8.
    #[error("body is not valid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    /// Wrapper for envelope-layer failures.
    #[error(transparent)]
    Message(#[from] itb_msg::MessageError),
}

pub use matcher::matches;
pub use metrics::{log_dispatch, DispatchMetricsExporter, DispatchOutcome};
pub use registry::MessageRegistry;
pub use transport::{InMemoryTransport, RawDelivery, Transport};
