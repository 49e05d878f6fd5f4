//! ---
//! itb_section: "03-routing-dispatch"
//! itb_subsection: "module"
//! itb_type: "source"
//! itb_scope: "code"
//! itb_description: "Raw delivery triple and transport stand-ins."
//! itb_version: "v0.0.0-prealpha"
//! itb_owner: "tbd"
//! ---
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use itb_msg::{Envelope, FieldMap};

use crate::Result;

/// A message as it crosses the transport boundary: the wire-format triple of
/// routing key, property mapping, and body bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDelivery {
    /// Concrete routing key the message was published under.
    pub routing_key: String,
    /// Transport properties as supplied by the broker client.
    pub properties: FieldMap,
    /// Serialized message body.
    pub body: Vec<u8>,
}

impl RawDelivery {
    /// Serialize an envelope into its outbound wire triple.
    pub fn from_envelope(envelope: &Envelope) -> Result<Self> {
        Ok(Self {
            routing_key: envelope.routing_key().to_string(),
            properties: envelope.properties_map(),
            body: envelope.to_json()?.into_bytes(),
        })
    }
}

/// Transport abstraction consumed by tests and tooling. Real broker clients
/// (connection management, acknowledgement, retries) live outside this
/// workspace.
pub trait Transport: Send + Sync {
    /// Publish a delivery into the transport.
    fn publish(&self, delivery: RawDelivery) -> Result<()>;
    /// Pop the next pending delivery, if any.
    fn recv(&self) -> Option<RawDelivery>;
    /// Human-readable transport name for logging.
    fn name(&self) -> &'static str;
}

/// In-memory transport backed by a mutex protected queue. Primarily for
/// tests and the single-process demo tooling.
#[derive(Clone, Default)]
pub struct InMemoryTransport {
    queue: Arc<Mutex<VecDeque<RawDelivery>>>,
}

impl InMemoryTransport {
    /// Create a new in-memory transport channel.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for InMemoryTransport {
    fn publish(&self, delivery: RawDelivery) -> Result<()> {
        let mut guard = self.queue.lock().expect("queue poisoned");
        guard.push_back(delivery);
        Ok(())
    }

    fn recv(&self) -> Option<RawDelivery> {
        let mut guard = self.queue.lock().expect("queue poisoned");
        guard.pop_front()
    }

    fn name(&self) -> &'static str {
        "in_memory"
    }
}
