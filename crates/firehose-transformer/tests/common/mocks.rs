// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Mock implementations of transformer components for testing

use firehose_transformer::error::TransformerError;
use firehose_transformer::sink::RecordSink;
use std::sync::Mutex;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PutBatchCall {
    pub stream_name: String,
    pub records: Vec<Vec<u8>>,
}

/// Mock sink that records every batch it is handed
#[derive(Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<PutBatchCall>>,
    fail: bool,
}

impl RecordingSink {
    pub fn failing() -> Self {
        RecordingSink {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<PutBatchCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl RecordSink for RecordingSink {
    async fn put_batch(
        &self,
        stream_name: &str,
        records: Vec<Vec<u8>>,
    ) -> Result<(), TransformerError> {
        self.calls.lock().unwrap().push(PutBatchCall {
            stream_name: stream_name.to_string(),
            records,
        });
        if self.fail {
            return Err(TransformerError::Resubmission(
                "mock sink rejected the batch".to_string(),
            ));
        }
        Ok(())
    }
}
