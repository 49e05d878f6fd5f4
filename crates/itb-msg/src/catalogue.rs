//! ---
//! itb_section: "02-messaging-envelope-data-model"
//! itb_subsection: "module"
//! itb_type: "source"
//! itb_scope: "code"
//! itb_description: "Built-in message kinds and their descriptor records."
//! itb_version: "v0.0.0-prealpha"
//! itb_owner: "tbd"
//! ---
//! Message catalogue.
//!
//! The bus convention enumerates many near-identical message shapes that
//! differ only in routing key and default fields, never in behavior. Rather
//! than one type per shape, each shape is a [`MessageDescriptor`] record: a
//! kind tag, a routing-key pattern, and a factory producing a fresh default
//! field map per construction. The set shipped here is the slice of the
//! test-orchestration catalogue exercised by this workspace; hosts extend it
//! through `MessageRegistry::register`.

use serde_json::{json, Value as JsonValue};

use crate::envelope::Envelope;
use crate::{FieldMap, REPLY_SUFFIX};

/// Kind tags for the built-in message catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Test suite execution started.
    TestSuiteStart,
    /// Test suite execution finished.
    TestSuiteFinish,
    /// A test case started.
    TestCaseStart,
    /// A test case was skipped by an operator or node.
    TestCaseSkip,
    /// Request to start packet capture on an agent interface.
    SniffingStart,
    /// Reply acknowledging a capture start request.
    SniffingStartReply,
    /// Raw packet captured by an agent's sniffer.
    PacketSniffedRaw,
}

impl MessageKind {
    /// Kind tag as a static string, for logging and CLI output.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::TestSuiteStart => "testsuite_start",
            MessageKind::TestSuiteFinish => "testsuite_finish",
            MessageKind::TestCaseStart => "testcase_start",
            MessageKind::TestCaseSkip => "testcase_skip",
            MessageKind::SniffingStart => "sniffing_start",
            MessageKind::SniffingStartReply => "sniffing_start_reply",
            MessageKind::PacketSniffedRaw => "packet_sniffed_raw",
        }
    }
}

/// Descriptor record binding a routing-key pattern to a message shape.
#[derive(Debug, Clone, Copy)]
pub struct MessageDescriptor {
    /// Kind tag identifying the shape.
    pub kind: MessageKind,
    /// Routing-key pattern; terms may be the single-term wildcard `*`.
    pub routing_key: &'static str,
    defaults: fn() -> FieldMap,
}

impl MessageDescriptor {
    /// Create a descriptor from a kind tag, pattern, and defaults factory.
    pub const fn new(kind: MessageKind, routing_key: &'static str, defaults: fn() -> FieldMap) -> Self {
        Self {
            kind,
            routing_key,
            defaults,
        }
    }

    /// Fresh default field map for this shape. A new map is produced per
    /// call; no template is shared between instances.
    pub fn defaults(&self) -> FieldMap {
        (self.defaults)()
    }

    /// Construct an envelope of this shape under its catalogue routing key.
    ///
    /// Building a reply-keyed shape this way is the lazy path: there is no
    /// request at hand, so the correlation id stays unset and a warning is
    /// emitted. Callers stamp it later with `Envelope::correlate_to`.
    pub fn instantiate(&self, overrides: FieldMap) -> Envelope {
        let envelope = Envelope::new(self.routing_key, self.defaults(), overrides);
        if self.routing_key.ends_with(REPLY_SUFFIX) {
            envelope.warn_uncorrelated_reply();
        }
        envelope
    }

    /// Construct an envelope of this shape under a concrete routing key.
    ///
    /// Used by the dispatcher when rehydrating a received message: the
    /// pattern may contain wildcard terms, so the key that actually arrived
    /// is stamped on the instance instead.
    pub fn instantiate_with_key(&self, routing_key: &str, overrides: FieldMap) -> Envelope {
        Envelope::new(routing_key, self.defaults(), overrides)
    }
}

fn no_fields() -> FieldMap {
    FieldMap::new()
}

fn testsuite_start_defaults() -> FieldMap {
    let mut map = FieldMap::new();
    map.insert("description".to_string(), json!("Test suite started"));
    map
}

fn testsuite_finish_defaults() -> FieldMap {
    let mut map = FieldMap::new();
    map.insert("description".to_string(), json!("Test suite finished"));
    map
}

fn testcase_start_defaults() -> FieldMap {
    let mut map = FieldMap::new();
    map.insert("description".to_string(), json!("Test case started"));
    map.insert("testcase_id".to_string(), JsonValue::Null);
    map
}

fn testcase_skip_defaults() -> FieldMap {
    let mut map = FieldMap::new();
    map.insert("description".to_string(), json!("Skip testcase"));
    map.insert("node".to_string(), json!("someNode"));
    map.insert("testcase_id".to_string(), JsonValue::Null);
    map
}

fn sniffing_start_defaults() -> FieldMap {
    let mut map = FieldMap::new();
    map.insert("capture_id".to_string(), json!("TD_COAP_CORE_01"));
    map.insert("filter_if".to_string(), json!("tun0"));
    map.insert("filter_proto".to_string(), json!("udp"));
    map
}

fn packet_sniffed_raw_defaults() -> FieldMap {
    let mut map = FieldMap::new();
    map.insert("data".to_string(), json!([]));
    map.insert("interface_name".to_string(), json!("tun0"));
    map.insert("timestamp".to_string(), JsonValue::Null);
    map
}

/// The built-in catalogue, in registration order. Exact keys come before
/// wildcard patterns so first-match resolution stays unambiguous.
pub fn builtin_catalogue() -> Vec<MessageDescriptor> {
    vec![
        MessageDescriptor::new(
            MessageKind::TestSuiteStart,
            "testsuite.start",
            testsuite_start_defaults,
        ),
        MessageDescriptor::new(
            MessageKind::TestSuiteFinish,
            "testsuite.finish",
            testsuite_finish_defaults,
        ),
        MessageDescriptor::new(
            MessageKind::TestCaseStart,
            "testsuite.testcase.start",
            testcase_start_defaults,
        ),
        MessageDescriptor::new(
            MessageKind::TestCaseSkip,
            "testsuite.testcase.skip",
            testcase_skip_defaults,
        ),
        MessageDescriptor::new(
            MessageKind::SniffingStart,
            "sniffing.start.request",
            sniffing_start_defaults,
        ),
        MessageDescriptor::new(
            MessageKind::SniffingStartReply,
            "sniffing.start.reply",
            no_fields,
        ),
        MessageDescriptor::new(
            MessageKind::PacketSniffedRaw,
            "fromAgent.*.packet.raw",
            packet_sniffed_raw_defaults,
        ),
    ]
}
