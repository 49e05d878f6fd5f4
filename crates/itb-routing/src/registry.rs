//! ---
//! itb_section: "03-routing-dispatch"
//! itb_subsection: "module"
//! itb_type: "source"
//! itb_scope: "code"
//! itb_description: "Pattern registry and message dispatcher."
//! itb_version: "v0.0.0-prealpha"
//! itb_owner: "tbd"
//! ---
use serde_json::{Map as JsonMap, Value as JsonValue};

use itb_msg::{Envelope, FieldMap, MessageDescriptor};

use crate::matcher;
use crate::transport::RawDelivery;
use crate::{Result, RoutingError};

/// Transport property keys extracted when rehydrating from a raw delivery.
/// Exactly these eight, nothing else is picked up automatically.
pub const TRANSPORT_PROPERTY_WHITELIST: &[&str] = &[
    "content_type",
    "delivery_mode",
    "correlation_id",
    "reply_to",
    "message_id",
    "timestamp",
    "user_id",
    "app_id",
];

/// Registry mapping routing-key patterns to message descriptors.
///
/// Intended lifecycle: build once during process startup (seeded from the
/// catalogue, optionally extended with host-specific shapes), then treat as
/// read-only. Resolution scans entries in registration order and the first
/// matching pattern wins, so hosts registering overlapping patterns should
/// register the more specific ones first.
#[derive(Debug, Clone, Default)]
pub struct MessageRegistry {
    entries: Vec<MessageDescriptor>,
}

impl MessageRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry seeded with the built-in message catalogue.
    pub fn with_catalogue() -> Self {
        Self {
            entries: itb_msg::builtin_catalogue(),
        }
    }

    /// Append a descriptor. Later entries lose ties against earlier ones.
    pub fn register(&mut self, descriptor: MessageDescriptor) {
        self.entries.push(descriptor);
    }

    /// Number of registered descriptors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry has no descriptors.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a concrete routing key to its registered descriptor.
    ///
    /// Fails with [`RoutingError::UnknownRoutingKey`] carrying the probed key
    /// when nothing matches; there is no fallback descriptor.
    pub fn resolve(&self, routing_key: &str) -> Result<&MessageDescriptor> {
        for entry in &self.entries {
            if matcher::matches(entry.routing_key, routing_key)? {
                return Ok(entry);
            }
        }
        Err(RoutingError::UnknownRoutingKey(routing_key.to_string()))
    }

    /// Rehydrate a typed envelope from a JSON body received off the bus.
    ///
    /// The descriptor's declared fields form a skeleton with every value set
    /// to explicit null, the body object is overlaid on it, and the envelope
    /// is constructed with the merged map under the concrete routing key.
    /// Declared fields absent from the body therefore come out null, not at
    /// their catalogue default. A supplied property map is applied afterwards
    /// via `update_properties`. Malformed JSON propagates unwrapped.
    pub fn load(
        &self,
        body: &str,
        routing_key: &str,
        properties: Option<&FieldMap>,
    ) -> Result<Envelope> {
        let descriptor = self.resolve(routing_key)?;

        let template = Envelope::new(descriptor.routing_key, descriptor.defaults(), FieldMap::new());
        let mut merged: FieldMap = template
            .to_map()
            .into_keys()
            .map(|key| (key, JsonValue::Null))
            .collect();

        let body_fields: JsonMap<String, JsonValue> = serde_json::from_str(body)?;
        for (key, value) in body_fields {
            merged.insert(key, value);
        }

        let mut envelope = descriptor.instantiate_with_key(routing_key, merged);
        if let Some(props) = properties {
            envelope.update_properties(props);
        }
        Ok(envelope)
    }

    /// Rehydrate a typed envelope from a raw transport delivery.
    ///
    /// Decodes the body as UTF-8, extracts the whitelisted property keys into
    /// a plain mapping, and delegates to [`MessageRegistry::load`].
    pub fn load_from_transport(&self, delivery: &RawDelivery) -> Result<Envelope> {
        let body = String::from_utf8(delivery.body.clone())?;
        let mut properties = FieldMap::new();
        for key in TRANSPORT_PROPERTY_WHITELIST {
            if let Some(value) = delivery.properties.get(*key) {
                properties.insert((*key).to_string(), value.clone());
            }
        }
        self.load(&body, &delivery.routing_key, Some(&properties))
    }
}
