// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use core::time::Duration;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, error};

use crate::config::Config;
use crate::error::TransformerError;
use crate::http_utils::build_client;
use crate::invocation::serde_base64;

const PUT_RECORD_BATCH_TARGET: &str = "Firehose_20150804.PutRecordBatch";
const AMZ_JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Destination that overflow records are resubmitted to.
#[async_trait]
pub trait RecordSink {
    /// Sends `records` to `stream_name` in a single call. Any failure is
    /// reported to the caller; implementations do not retry.
    async fn put_batch(
        &self,
        stream_name: &str,
        records: Vec<Vec<u8>>,
    ) -> Result<(), TransformerError>;
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct PutRecordBatchRequest<'a> {
    delivery_stream_name: &'a str,
    records: Vec<PutRecord>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct PutRecord {
    #[serde(with = "serde_base64")]
    data: Vec<u8>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PutRecordBatchResponse {
    #[serde(default)]
    failed_put_count: u64,
}

/// Resubmits records through the `PutRecordBatch` JSON API.
///
/// The HTTP client is built once and reused across invocations.
#[derive(Clone)]
pub struct FirehoseSink {
    endpoint: String,
    client: reqwest::Client,
}

impl FirehoseSink {
    pub fn new(config: &Config) -> Result<Self, TransformerError> {
        let client = build_client(
            config.proxy_url.as_deref(),
            Duration::from_secs(config.sink_timeout_secs),
        )
        .map_err(|e| TransformerError::InvalidConfig(format!("Unable to build sink client: {e}")))?;
        Ok(FirehoseSink {
            endpoint: config.sink_url.clone(),
            client,
        })
    }
}

#[async_trait]
impl RecordSink for FirehoseSink {
    async fn put_batch(
        &self,
        stream_name: &str,
        records: Vec<Vec<u8>>,
    ) -> Result<(), TransformerError> {
        if records.is_empty() {
            return Ok(());
        }
        let count = records.len();
        let body = PutRecordBatchRequest {
            delivery_stream_name: stream_name,
            records: records.into_iter().map(|data| PutRecord { data }).collect(),
        };

        let payload = serde_json::to_vec(&body)
            .map_err(|e| TransformerError::Resubmission(format!("Unable to encode records: {e}")))?;

        let time = Instant::now();
        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", AMZ_JSON_CONTENT_TYPE)
            .header("X-Amz-Target", PUT_RECORD_BATCH_TARGET)
            .body(payload)
            .send()
            .await
            .map_err(|e| {
                error!("Sink | Network error sending {count} records to {stream_name}: {e:?}");
                TransformerError::Resubmission(e.to_string())
            })?;
        let elapsed = time.elapsed();

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            error!("Sink | PutRecordBatch failed with status {status}: {text:?}");
            return Err(TransformerError::Resubmission(format!(
                "PutRecordBatch to {stream_name} returned status {status}"
            )));
        }

        match serde_json::from_str::<PutRecordBatchResponse>(&text) {
            Ok(parsed) if parsed.failed_put_count > 0 => {
                error!(
                    "Sink | {} of {count} records were rejected by {stream_name}",
                    parsed.failed_put_count
                );
                return Err(TransformerError::Resubmission(format!(
                    "{} of {count} records were rejected by {stream_name}",
                    parsed.failed_put_count
                )));
            }
            Ok(_) => {}
            Err(e) => debug!("Sink | Ignoring unparseable PutRecordBatch response: {e}"),
        }

        debug!(
            "Sink | Successfully sent {count} records to {stream_name} in {} ms",
            elapsed.as_millis()
        );
        Ok(())
    }
}
