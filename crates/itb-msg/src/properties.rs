//! ---
//! itb_section: "02-messaging-envelope-data-model"
//! itb_subsection: "module"
//! itb_type: "source"
//! itb_scope: "code"
//! itb_description: "Transport property records attached to envelopes."
//! itb_version: "v0.0.0-prealpha"
//! itb_owner: "tbd"
//! ---
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::{reply_routing_key, FieldMap, CONTENT_TYPE};

/// Transport properties carried alongside an envelope's data fields.
///
/// The eight named keys are the fixed whitelist consumed from the bus
/// transport; anything else handed to [`Properties::update`] is retained
/// verbatim in an extra map so blind overwrites stay lossless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    /// MIME type of the serialized body.
    pub content_type: String,
    /// Unique identifier generated per envelope instance.
    pub message_id: String,
    /// Instant the envelope was constructed.
    pub timestamp: DateTime<Utc>,
    /// Routing key replies should be published to; set only on requests.
    #[serde(default)]
    pub reply_to: Option<String>,
    /// Identifier linking a reply back to its request.
    #[serde(default)]
    pub correlation_id: Option<String>,
    /// Broker delivery mode, when the transport supplied one.
    #[serde(default)]
    pub delivery_mode: Option<u64>,
    /// Publishing user, when the transport supplied one.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Publishing application, when the transport supplied one.
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    extra: FieldMap,
}

impl Properties {
    /// Compute the properties for a freshly constructed envelope.
    ///
    /// Requests (routing keys ending in the reserved request suffix) also get
    /// a `reply_to` key rewritten to the companion reply key and a
    /// `correlation_id` equal to the new message id.
    pub fn for_routing_key(routing_key: &str) -> Self {
        let message_id = Uuid::new_v4().to_string();
        let (reply_to, correlation_id) = match reply_routing_key(routing_key) {
            Some(reply_key) => (Some(reply_key), Some(message_id.clone())),
            None => (None, None),
        };
        Self {
            content_type: CONTENT_TYPE.to_string(),
            message_id,
            timestamp: Utc::now(),
            reply_to,
            correlation_id,
            delivery_mode: None,
            user_id: None,
            app_id: None,
            extra: FieldMap::new(),
        }
    }

    /// Render the properties as a plain mapping.
    ///
    /// Timestamps are emitted as unix epoch seconds, matching what bus
    /// transports put on the wire. Optional keys appear only when set.
    pub fn to_map(&self) -> FieldMap {
        let mut map = FieldMap::new();
        map.insert(
            "content_type".to_string(),
            JsonValue::from(self.content_type.clone()),
        );
        map.insert(
            "message_id".to_string(),
            JsonValue::from(self.message_id.clone()),
        );
        map.insert(
            "timestamp".to_string(),
            JsonValue::from(self.timestamp.timestamp()),
        );
        if let Some(reply_to) = &self.reply_to {
            map.insert("reply_to".to_string(), JsonValue::from(reply_to.clone()));
        }
        if let Some(correlation_id) = &self.correlation_id {
            map.insert(
                "correlation_id".to_string(),
                JsonValue::from(correlation_id.clone()),
            );
        }
        if let Some(delivery_mode) = self.delivery_mode {
            map.insert("delivery_mode".to_string(), JsonValue::from(delivery_mode));
        }
        if let Some(user_id) = &self.user_id {
            map.insert("user_id".to_string(), JsonValue::from(user_id.clone()));
        }
        if let Some(app_id) = &self.app_id {
            map.insert("app_id".to_string(), JsonValue::from(app_id.clone()));
        }
        map.extend(self.extra.clone());
        map
    }

    /// Overwrite property keys from a plain mapping. No validation is
    /// performed; every supplied key replaces whatever was there before.
    /// Keys outside the known set, or values of an unexpected shape, are
    /// stored verbatim in the extra map.
    pub fn update(&mut self, overrides: &FieldMap) {
        for (key, value) in overrides {
            match key.as_str() {
                "content_type" => {
                    if let Some(text) = value.as_str() {
                        self.content_type = text.to_string();
                        continue;
                    }
                }
                "message_id" => {
                    if let Some(text) = value.as_str() {
                        self.message_id = text.to_string();
                        continue;
                    }
                }
                "timestamp" => {
                    if let Some(instant) = value
                        .as_i64()
                        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
                    {
                        self.timestamp = instant;
                        continue;
                    }
                }
                "reply_to" => {
                    if let Some(text) = value.as_str() {
                        self.reply_to = Some(text.to_string());
                        continue;
                    }
                }
                "correlation_id" => {
                    if let Some(text) = value.as_str() {
                        self.correlation_id = Some(text.to_string());
                        continue;
                    }
                }
                "delivery_mode" => {
                    if let Some(mode) = value.as_u64() {
                        self.delivery_mode = Some(mode);
                        continue;
                    }
                }
                "user_id" => {
                    if let Some(text) = value.as_str() {
                        self.user_id = Some(text.to_string());
                        continue;
                    }
                }
                "app_id" => {
                    if let Some(text) = value.as_str() {
                        self.app_id = Some(text.to_string());
                        continue;
                    }
                }
                _ => {}
            }
            self.extra.insert(key.clone(), value.clone());
        }
    }
}
