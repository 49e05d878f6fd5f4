//! ---
//! itb_section: "02-messaging-envelope-data-model"
//! itb_subsection: "module"
//! itb_type: "source"
//! itb_scope: "code"
//! itb_description: "Typed message envelope with fields and transport properties."
//! itb_version: "v0.0.0-prealpha"
//! itb_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::warn;

use crate::properties::Properties;
use crate::{reply_routing_key, FieldMap, MessageError, Result, API_VERSION, API_VERSION_FIELD};

/// One typed message on the bus: a routing key, a flat map of data fields,
/// and the transport properties stamped at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    routing_key: String,
    fields: FieldMap,
    properties: Properties,
}

impl Envelope {
    /// Construct an envelope from a default-field template and caller
    /// overrides.
    ///
    /// Overrides replace whole values key-wise; there is no deep merge. The
    /// schema version is injected as `_api_version` unless the merged map
    /// already carries one (even an explicit null counts as supplied).
    /// Properties are computed once: the content-type constant, a fresh
    /// UUIDv4 message id, and the construction instant; request keys also
    /// get `reply_to` and `correlation_id`, see [`Properties::for_routing_key`].
    pub fn new(routing_key: impl Into<String>, defaults: FieldMap, overrides: FieldMap) -> Self {
        let routing_key = routing_key.into();
        let mut fields = defaults;
        fields.extend(overrides);
        fields
            .entry(API_VERSION_FIELD.to_string())
            .or_insert_with(|| JsonValue::from(API_VERSION));
        let properties = Properties::for_routing_key(&routing_key);
        Self {
            routing_key,
            fields,
            properties,
        }
    }

    /// Derive a reply to `request`.
    ///
    /// The reply's routing key is the request's key with the request suffix
    /// rewritten to the reply suffix (requests without the suffix keep their
    /// key unchanged). Reply defaults contribute `ok: true` under the caller
    /// overrides, and the request's correlation id is copied onto the reply
    /// after construction so the pair shares it regardless of what the
    /// transport stamped in the meantime.
    pub fn reply_to_request(request: &Envelope, overrides: FieldMap) -> Self {
        let routing_key = reply_routing_key(&request.routing_key)
            .unwrap_or_else(|| request.routing_key.clone());
        let mut defaults = FieldMap::new();
        defaults.insert("ok".to_string(), JsonValue::Bool(true));
        let mut reply = Self::new(routing_key, defaults, overrides);
        reply.correlate_to(request);
        reply
    }

    /// Derive an error reply to `request`.
    ///
    /// Unlike [`Envelope::reply_to_request`], the request is mandatory: an
    /// error reply without the request it answers is meaningless, so omission
    /// is a hard failure rather than a degraded path. Defaults layer in
    /// `ok: false` plus null `error_message` and `error_code` fields.
    pub fn error_reply(request: Option<&Envelope>, overrides: FieldMap) -> Result<Self> {
        let request = request.ok_or(MessageError::MissingRequest)?;
        let routing_key = reply_routing_key(&request.routing_key)
            .unwrap_or_else(|| request.routing_key.clone());
        let mut defaults = FieldMap::new();
        defaults.insert("ok".to_string(), JsonValue::Bool(false));
        defaults.insert("error_message".to_string(), JsonValue::Null);
        defaults.insert("error_code".to_string(), JsonValue::Null);
        let mut reply = Self::new(routing_key, defaults, overrides);
        reply.correlate_to(request);
        Ok(reply)
    }

    /// Copy the request's correlation id onto this envelope.
    ///
    /// Used by the reply constructors, and directly by callers that built a
    /// reply before the request was known (the lazy path).
    pub fn correlate_to(&mut self, request: &Envelope) {
        self.properties.correlation_id = request.properties.correlation_id.clone();
    }

    /// Routing key this envelope is published under.
    pub fn routing_key(&self) -> &str {
        &self.routing_key
    }

    /// Read one data field by name.
    pub fn field(&self, name: &str) -> Option<&JsonValue> {
        self.fields.get(name)
    }

    /// Set one data field, replacing any existing value. Serialization reads
    /// live field values, so mutations made here show up in [`Envelope::to_json`].
    pub fn set_field(&mut self, name: impl Into<String>, value: JsonValue) {
        self.fields.insert(name.into(), value);
    }

    /// All data fields as a plain mapping. The map is sorted by key, so this
    /// doubles as the ordered form used for deterministic serialization.
    pub fn to_map(&self) -> FieldMap {
        self.fields.clone()
    }

    /// Compact JSON serialization of the data fields, keys sorted.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.fields)?)
    }

    /// Transport properties of this envelope.
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Transport properties rendered as a plain mapping.
    pub fn properties_map(&self) -> FieldMap {
        self.properties.to_map()
    }

    /// Overwrite transport properties key-wise from a plain mapping; no
    /// validation, any key may be replaced.
    pub fn update_properties(&mut self, overrides: &FieldMap) {
        self.properties.update(overrides);
    }

    /// Emit the degraded-construction warning for a reply built without its
    /// request. Not an error: the caller may still stamp a correlation id
    /// later via [`Envelope::correlate_to`].
    pub(crate) fn warn_uncorrelated_reply(&self) {
        if self.properties.correlation_id.is_none() {
            warn!(
                routing_key = %self.routing_key,
                "reply envelope constructed without request context; correlation id unset"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn skip_defaults() -> FieldMap {
        let mut map = FieldMap::new();
        map.insert("description".to_string(), json!("Skip testcase"));
        map.insert("node".to_string(), json!("someNode"));
        map.insert("testcase_id".to_string(), JsonValue::Null);
        map
    }

    #[test]
    fn overrides_replace_defaults_keywise() {
        let mut overrides = FieldMap::new();
        overrides.insert("testcase_id".to_string(), json!("TD_COAP_CORE_03"));
        let envelope = Envelope::new("testsuite.testcase.skip", skip_defaults(), overrides);
        assert_eq!(envelope.field("testcase_id"), Some(&json!("TD_COAP_CORE_03")));
        assert_eq!(envelope.field("node"), Some(&json!("someNode")));
    }

    #[test]
    fn api_version_is_injected_unless_supplied() {
        let envelope = Envelope::new("testsuite.start", FieldMap::new(), FieldMap::new());
        assert_eq!(envelope.field(API_VERSION_FIELD), Some(&json!(API_VERSION)));

        let mut overrides = FieldMap::new();
        overrides.insert(API_VERSION_FIELD.to_string(), json!("0.0.1"));
        let pinned = Envelope::new("testsuite.start", FieldMap::new(), overrides);
        assert_eq!(pinned.field(API_VERSION_FIELD), Some(&json!("0.0.1")));
    }

    #[test]
    fn serialization_sorts_keys() {
        let mut overrides = FieldMap::new();
        overrides.insert("testcase_id".to_string(), json!("TD_COAP_CORE_03"));
        let envelope = Envelope::new("testsuite.testcase.skip", skip_defaults(), overrides);
        let json = envelope.to_json().expect("serialize envelope");
        let api = json.find("\"_api_version\"").expect("_api_version present");
        let description = json.find("\"description\"").expect("description present");
        let node = json.find("\"node\"").expect("node present");
        let testcase = json.find("\"testcase_id\"").expect("testcase_id present");
        assert!(api < description && description < node && node < testcase);
    }

    #[test]
    fn serialization_reads_live_field_values() {
        let mut envelope = Envelope::new("testsuite.testcase.skip", skip_defaults(), FieldMap::new());
        envelope.set_field("node", json!("coap_client"));
        assert_eq!(envelope.to_map().get("node"), Some(&json!("coap_client")));
    }

    #[test]
    fn plain_routing_key_has_no_reply_to() {
        let envelope = Envelope::new("testsuite.start", FieldMap::new(), FieldMap::new());
        assert!(envelope.properties().reply_to.is_none());
    }

    #[test]
    fn request_routing_key_wires_reply_to() {
        let envelope = Envelope::new("sniffing.start.request", FieldMap::new(), FieldMap::new());
        assert_eq!(
            envelope.properties().reply_to.as_deref(),
            Some("sniffing.start.reply")
        );
        assert_eq!(
            envelope.properties().correlation_id.as_deref(),
            Some(envelope.properties().message_id.as_str())
        );
    }

    #[test]
    fn reply_rewrites_routing_key_and_shares_correlation_id() {
        let request = Envelope::new("sniffing.start.request", FieldMap::new(), FieldMap::new());
        let reply = Envelope::reply_to_request(&request, FieldMap::new());
        assert_eq!(reply.routing_key(), "sniffing.start.reply");
        assert_eq!(reply.field("ok"), Some(&json!(true)));
        assert_eq!(
            reply.properties().correlation_id,
            request.properties().correlation_id
        );
        assert_eq!(
            reply.properties().correlation_id.as_deref(),
            Some(request.properties().message_id.as_str())
        );
    }

    #[test]
    fn reply_overrides_can_flip_the_success_flag() {
        let request = Envelope::new("sniffing.start.request", FieldMap::new(), FieldMap::new());
        let mut overrides = FieldMap::new();
        overrides.insert("ok".to_string(), json!(false));
        let reply = Envelope::reply_to_request(&request, overrides);
        assert_eq!(reply.field("ok"), Some(&json!(false)));
    }

    #[test]
    fn error_reply_requires_a_request() {
        let err = Envelope::error_reply(None, FieldMap::new()).expect_err("must fail");
        assert!(matches!(err, MessageError::MissingRequest));
    }

    #[test]
    fn error_reply_defaults_to_failure_fields() {
        let request = Envelope::new("sniffing.start.request", FieldMap::new(), FieldMap::new());
        let reply = Envelope::error_reply(Some(&request), FieldMap::new()).expect("error reply");
        assert_eq!(reply.routing_key(), "sniffing.start.reply");
        assert_eq!(reply.field("ok"), Some(&json!(false)));
        assert_eq!(reply.field("error_message"), Some(&JsonValue::Null));
        assert_eq!(reply.field("error_code"), Some(&JsonValue::Null));
    }

    #[test]
    fn correlate_to_stamps_a_lazy_reply() {
        let request = Envelope::new("sniffing.start.request", FieldMap::new(), FieldMap::new());
        let mut reply = Envelope::new("sniffing.start.reply", FieldMap::new(), FieldMap::new());
        assert!(reply.properties().correlation_id.is_none());
        reply.correlate_to(&request);
        assert_eq!(
            reply.properties().correlation_id,
            request.properties().correlation_id
        );
    }

    #[test]
    fn update_properties_overwrites_blindly() {
        let mut envelope = Envelope::new("testsuite.start", FieldMap::new(), FieldMap::new());
        let mut overrides = FieldMap::new();
        overrides.insert("message_id".to_string(), json!("forced-id"));
        overrides.insert("correlation_id".to_string(), json!("forced-corr"));
        envelope.update_properties(&overrides);
        assert_eq!(envelope.properties().message_id, "forced-id");
        assert_eq!(
            envelope.properties().correlation_id.as_deref(),
            Some("forced-corr")
        );
    }

    #[test]
    fn message_ids_are_unique_per_instance() {
        let a = Envelope::new("testsuite.start", FieldMap::new(), FieldMap::new());
        let b = Envelope::new("testsuite.start", FieldMap::new(), FieldMap::new());
        assert_ne!(a.properties().message_id, b.properties().message_id);
    }
}
