//! ---
//! itb_section: "03-routing-dispatch"
//! itb_subsection: "module"
//! itb_type: "source"
//! itb_scope: "code"
//! itb_description: "Dispatch logging helpers and Prometheus metrics."
//! itb_version: "v0.0.0-prealpha"
//! itb_owner: "tbd"
//! ---
use prometheus::{IntCounter, Opts, Registry};
use tracing::debug;

/// Outcome of one dispatch attempt, used for consistent logging and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A registered pattern matched and the envelope was rehydrated.
    Resolved,
    /// No registered pattern matched the probed key.
    UnknownKey,
    /// The body failed to decode.
    DecodeFailed,
}

impl DispatchOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            DispatchOutcome::Resolved => "resolved",
            DispatchOutcome::UnknownKey => "unknown_key",
            DispatchOutcome::DecodeFailed => "decode_failed",
        }
    }
}

/// Emit a structured log entry for one dispatch attempt.
pub fn log_dispatch(outcome: DispatchOutcome, routing_key: &str) {
    debug!(
        routing_key = %routing_key,
        outcome = outcome.as_str(),
        "dispatch activity"
    );
}

/// Prometheus metric handles for dispatch activity.
pub struct DispatchMetricsExporter {
    resolved: IntCounter,
    unknown_key: IntCounter,
    decode_failed: IntCounter,
}

impl DispatchMetricsExporter {
    /// Register dispatch metrics with the provided registry.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let resolved = IntCounter::with_opts(Opts::new(
            "itb_messages_resolved_total",
            "Messages resolved to a registered type and rehydrated",
        ))?;
        let unknown_key = IntCounter::with_opts(Opts::new(
            "itb_messages_unknown_key_total",
            "Messages whose routing key matched no registered pattern",
        ))?;
        let decode_failed = IntCounter::with_opts(Opts::new(
            "itb_messages_decode_failed_total",
            "Messages whose body failed UTF-8 or JSON decoding",
        ))?;

        registry.register(Box::new(resolved.clone()))?;
        registry.register(Box::new(unknown_key.clone()))?;
        registry.register(Box::new(decode_failed.clone()))?;

        Ok(Self {
            resolved,
            unknown_key,
            decode_failed,
        })
    }

    /// Record one dispatch attempt by outcome.
    pub fn observe(&self, outcome: DispatchOutcome) {
        match outcome {
            DispatchOutcome::Resolved => self.resolved.inc(),
            DispatchOutcome::UnknownKey => self.unknown_key.inc(),
            DispatchOutcome::DecodeFailed => self.decode_failed.inc(),
        }
    }
}
