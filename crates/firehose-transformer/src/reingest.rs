// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use tracing::debug;

use crate::error::TransformerError;
use crate::invocation::{OutcomeRecord, RecordResult};

/// Outcomes partitioned into what is answered now and what is sent back to the stream.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SplitBatch {
    pub response: Vec<OutcomeRecord>,
    /// Payloads of Ok records that did not fit under the ceiling, in order
    pub reingestion: Vec<Vec<u8>>,
    /// Running size over every Ok record, including diverted ones
    pub projected_size: usize,
}

/// Walks `outcomes` in order, keeping Ok records in the response until their
/// running size exceeds `ceiling`.
///
/// Once crossed, the ceiling stays crossed: every later Ok record is diverted
/// even if it would fit on its own. Dropped and ProcessingFailed records never
/// count against the ceiling and always stay in the response.
pub fn split_outcomes(outcomes: Vec<OutcomeRecord>, ceiling: usize) -> SplitBatch {
    let mut split = SplitBatch {
        response: Vec::with_capacity(outcomes.len()),
        ..Default::default()
    };

    for outcome in outcomes {
        if outcome.result != RecordResult::Ok {
            split.response.push(outcome);
            continue;
        }

        split.projected_size = split
            .projected_size
            .saturating_add(outcome.projected_size());
        debug!("The projected size is {}", split.projected_size);

        if split.projected_size > ceiling {
            split.reingestion.push(outcome.data);
        } else {
            split.response.push(outcome);
        }
    }

    split
}

/// Stream name used for resubmission: the last `/`-delimited segment of the
/// delivery stream ARN.
pub fn stream_name_from_arn(delivery_stream_arn: &str) -> Result<&str, TransformerError> {
    match delivery_stream_arn.rsplit('/').next() {
        Some(name) if !name.trim().is_empty() => Ok(name),
        _ => Err(TransformerError::Resubmission(format!(
            "cannot derive a stream name from '{delivery_stream_arn}'"
        ))),
    }
}
