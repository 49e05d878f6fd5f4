//! ---
//! itb_section: "02-messaging-envelope-data-model"
//! itb_subsection: "module"
//! itb_type: "source"
//! itb_scope: "code"
//! itb_description: "Message envelope primitives and schema constants."
//! itb_version: "v0.0.0-prealpha"
//! itb_owner: "tbd"
//! ---
//! Envelope primitives for the ITB event bus.
//!
//! Every message on the bus is a (routing key, JSON body, transport
//! properties) triple. This crate models the typed envelope around that
//! triple: default-field templates merged with caller overrides, transport
//! properties stamped at construction, and the request/reply suffix
//! convention used for RPC-style exchanges.

#![warn(missing_docs)]

use std::collections::BTreeMap;

pub mod catalogue;
pub mod envelope;
pub mod properties;

/// Schema version injected as `_api_version` into every serialized envelope
/// unless the caller already supplied one.
pub const API_VERSION: &str = "1.0.15";

/// Field key carrying the schema version on the wire.
pub const API_VERSION_FIELD: &str = "_api_version";

/// Content type stamped on every envelope.
pub const CONTENT_TYPE: &str = "application/json";

/// Reserved routing-key suffix marking a request message.
pub const REQUEST_SUFFIX: &str = ".request";

/// Companion suffix for the reply to a request.
pub const REPLY_SUFFIX: &str = ".reply";

/// Flat mapping of field names to JSON values. `BTreeMap` keeps keys sorted,
/// which gives deterministic serialization without a separate ordering pass.
pub type FieldMap = BTreeMap<String, serde_json::Value>;

/// Shared result type for envelope operations.
pub type Result<T> = std::result::Result<T, MessageError>;

/// Errors raised by the envelope layer.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// An error reply was requested without the request envelope it answers.
    #[error("error reply requires the request envelope it responds to")]
    MissingRequest,
    /// Wrapper for JSON serialization problems.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Compute the reply routing key for a request key, if the key carries the
/// reserved request suffix.
///
/// `sniffing.start.request` maps to `sniffing.start.reply`; keys without the
/// suffix have no companion and yield `None`.
pub fn reply_routing_key(routing_key: &str) -> Option<String> {
    routing_key
        .strip_suffix(REQUEST_SUFFIX)
        .map(|stem| format!("{stem}{REPLY_SUFFIX}"))
}

pub use catalogue::{builtin_catalogue, MessageDescriptor, MessageKind};
pub use envelope::Envelope;
pub use properties::Properties;
