// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::codec;
use crate::config::{Config, FailurePolicy};
use crate::envelope::{self, MessageType};
use crate::error::TransformerError;
use crate::invocation::{FirehoseEventRecord, OutcomeRecord};
use crate::transformer::EventTransformer;

pub trait RecordProcessor {
    /// Produces exactly one outcome per input record, in input order.
    fn process_records(
        &self,
        records: &[FirehoseEventRecord],
    ) -> Result<Vec<OutcomeRecord>, TransformerError>;
}

#[derive(Clone)]
pub struct LogsRecordProcessor {
    transformer: Arc<dyn EventTransformer + Send + Sync>,
    max_decompressed_size: usize,
    failure_policy: FailurePolicy,
}

impl LogsRecordProcessor {
    pub fn new(config: &Config, transformer: Arc<dyn EventTransformer + Send + Sync>) -> Self {
        LogsRecordProcessor {
            transformer,
            max_decompressed_size: config.max_decompressed_size,
            failure_policy: config.failure_policy,
        }
    }

    fn process_record(
        &self,
        record: &FirehoseEventRecord,
    ) -> Result<OutcomeRecord, TransformerError> {
        debug!(
            "Processing record {} (approximate arrival {})",
            record.record_id, record.approximate_arrival_timestamp
        );

        let payload = codec::decode(&record.data, self.max_decompressed_size)?;
        let envelope = envelope::parse_envelope(&payload)?;

        match envelope.message_type {
            MessageType::Control => Ok(OutcomeRecord::dropped(&record.record_id)),
            MessageType::Data => {
                let mut data = Vec::new();
                for event in &envelope.log_events {
                    data.extend(self.transformer.transform(event)?);
                }
                Ok(OutcomeRecord::ok(&record.record_id, data))
            }
            MessageType::Other(message_type) => {
                debug!(
                    "Record {} has unrecognised message type {message_type}",
                    record.record_id
                );
                Ok(OutcomeRecord::processing_failed(&record.record_id))
            }
        }
    }
}

impl RecordProcessor for LogsRecordProcessor {
    fn process_records(
        &self,
        records: &[FirehoseEventRecord],
    ) -> Result<Vec<OutcomeRecord>, TransformerError> {
        let mut outcomes = Vec::with_capacity(records.len());

        for record in records {
            match self.process_record(record) {
                Ok(outcome) => outcomes.push(outcome),
                Err(err)
                    if self.failure_policy == FailurePolicy::IsolateRecord
                        && err.is_record_error() =>
                {
                    warn!("Marking record {} as failed: {err}", record.record_id);
                    outcomes.push(OutcomeRecord::processing_failed(&record.record_id));
                }
                Err(err) => {
                    error!("Error processing record {}: {err}", record.record_id);
                    return Err(err);
                }
            }
        }

        Ok(outcomes)
    }
}
