// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::envelope::LogEvent;
use crate::error::TransformerError;

/// Appended after every message by [`PassThroughTransformer`].
pub const EVENT_DELIMITER: &str = "\n \n";

/// Maps one log event to the bytes written to the destination.
///
/// Implementations must be pure: the same event always yields the same output,
/// and nothing outside the return value is touched. Returning an empty vector
/// is allowed and contributes nothing to the record.
pub trait EventTransformer {
    fn transform(&self, event: &LogEvent) -> Result<Vec<u8>, TransformerError>;
}

#[derive(Clone, Debug, Default)]
pub struct PassThroughTransformer {}

impl EventTransformer for PassThroughTransformer {
    fn transform(&self, event: &LogEvent) -> Result<Vec<u8>, TransformerError> {
        let mut out = Vec::with_capacity(event.message.len() + EVENT_DELIMITER.len());
        out.extend_from_slice(event.message.as_bytes());
        out.extend_from_slice(EVENT_DELIMITER.as_bytes());
        Ok(out)
    }
}
