// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::config::Config;
use crate::error::TransformerError;
use crate::invocation::{FirehoseEvent, FirehoseResponse};
use crate::record_processor::RecordProcessor;
use crate::reingest::{split_outcomes, stream_name_from_arn};
use crate::sink::RecordSink;

/// One transformation invocation: process every record, split off what does
/// not fit in the response, and resubmit the overflow.
pub struct Pipeline {
    pub config: Arc<Config>,
    pub record_processor: Arc<dyn RecordProcessor + Send + Sync>,
    pub sink: Arc<dyn RecordSink + Send + Sync>,
}

impl Pipeline {
    pub async fn handle(&self, event: &FirehoseEvent) -> Result<FirehoseResponse, TransformerError> {
        let now = Instant::now();
        debug!(
            "InvocationID: {}, DeliveryStreamArn: {}, Region: {}, {} records",
            event.invocation_id,
            event.delivery_stream_arn,
            event.region,
            event.records.len()
        );

        let outcomes = self.record_processor.process_records(&event.records)?;
        let split = split_outcomes(outcomes, self.config.max_response_size);

        if !split.reingestion.is_empty() {
            let stream_name = stream_name_from_arn(&event.delivery_stream_arn)?;
            let count = split.reingestion.len();
            self.sink.put_batch(stream_name, split.reingestion).await?;
            info!(
                "Reingested {count} records into {stream_name}, projected size was {}",
                split.projected_size
            );
        }

        debug!(
            "Invocation {} answered {} records in {} ms",
            event.invocation_id,
            split.response.len(),
            now.elapsed().as_millis()
        );

        Ok(FirehoseResponse {
            records: split.response,
        })
    }
}
