// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Wire shapes of the Firehose data-transformation contract.

use serde::{Deserialize, Serialize};

// Base64 serialization for raw payload bytes
pub(crate) mod serde_base64 {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let encoded = base64::engine::general_purpose::STANDARD.encode(value);
        serializer.serialize_str(&encoded)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(s.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

/// One batch handed to the transformer by the delivery stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirehoseEvent {
    pub invocation_id: String,
    /// e.g. `arn:aws:firehose:us-east-1:123456789012:deliverystream/logs`
    pub delivery_stream_arn: String,
    #[serde(default)]
    pub region: String,
    pub records: Vec<FirehoseEventRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirehoseEventRecord {
    pub record_id: String,
    /// milliseconds since the epoch
    #[serde(default)]
    pub approximate_arrival_timestamp: i64,
    /// gzip-compressed, base64-encoded envelope; decoded lazily by the processor
    pub data: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordResult {
    Ok,
    Dropped,
    ProcessingFailed,
}

/// The per-record answer returned to the delivery stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeRecord {
    pub record_id: String,
    pub result: RecordResult,
    #[serde(with = "serde_base64", default)]
    pub data: Vec<u8>,
}

impl OutcomeRecord {
    pub fn ok(record_id: &str, data: Vec<u8>) -> Self {
        OutcomeRecord {
            record_id: record_id.to_string(),
            result: RecordResult::Ok,
            data,
        }
    }

    pub fn dropped(record_id: &str) -> Self {
        OutcomeRecord {
            record_id: record_id.to_string(),
            result: RecordResult::Dropped,
            data: Vec::new(),
        }
    }

    pub fn processing_failed(record_id: &str) -> Self {
        OutcomeRecord {
            record_id: record_id.to_string(),
            result: RecordResult::ProcessingFailed,
            data: Vec::new(),
        }
    }

    /// Size this record counts for against the response ceiling.
    pub fn projected_size(&self) -> usize {
        self.data.len() + self.record_id.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirehoseResponse {
    pub records: Vec<OutcomeRecord>,
}
