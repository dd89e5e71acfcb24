// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! CloudWatch Logs subscription envelopes, as found inside each Firehose record.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TransformerError;

const CONTROL_MESSAGE: &str = "CONTROL_MESSAGE";
const DATA_MESSAGE: &str = "DATA_MESSAGE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageType {
    /// Destination health check emitted by CloudWatch Logs
    Control,
    Data,
    /// Any message type we don't recognise, kept verbatim for logging
    Other(String),
}

impl From<&str> for MessageType {
    fn from(value: &str) -> Self {
        match value {
            CONTROL_MESSAGE => MessageType::Control,
            DATA_MESSAGE => MessageType::Data,
            other => MessageType::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    pub id: String,
    pub timestamp: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub message_type: MessageType,
    pub owner: Option<String>,
    pub log_group: Option<String>,
    pub log_stream: Option<String>,
    pub subscription_filters: Vec<String>,
    /// Empty unless `message_type` is `Data`
    pub log_events: Vec<LogEvent>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEnvelope {
    message_type: String,
    #[serde(default)]
    owner: Option<String>,
    #[serde(default)]
    log_group: Option<String>,
    #[serde(default)]
    log_stream: Option<String>,
    #[serde(default)]
    subscription_filters: Vec<String>,
    // Only validated for data messages; control messages carry free-form events
    #[serde(default)]
    log_events: Option<serde_json::Value>,
}

/// Parses a decompressed record payload into an [`Envelope`].
pub fn parse_envelope(payload: &[u8]) -> Result<Envelope, TransformerError> {
    let raw: RawEnvelope = serde_json::from_slice(payload)
        .map_err(|err| TransformerError::Parse(err.to_string()))?;

    let message_type = MessageType::from(raw.message_type.as_str());
    let log_events = match message_type {
        MessageType::Data => {
            let events = raw.log_events.ok_or_else(|| {
                TransformerError::Parse("DATA_MESSAGE is missing logEvents".to_string())
            })?;
            serde_json::from_value::<Vec<LogEvent>>(events)
                .map_err(|err| TransformerError::Parse(format!("invalid logEvents: {err}")))?
        }
        _ => Vec::new(),
    };

    debug!(
        "Parsed {:?} envelope from log group {:?}, stream {:?} with {} events",
        message_type,
        raw.log_group,
        raw.log_stream,
        log_events.len()
    );

    Ok(Envelope {
        message_type,
        owner: raw.owner,
        log_group: raw.log_group,
        log_stream: raw.log_stream,
        subscription_filters: raw.subscription_filters,
        log_events,
    })
}
