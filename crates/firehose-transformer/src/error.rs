// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Errors that can abort a transformation invocation, or the transformer's startup.
#[derive(Debug, thiserror::Error)]
pub enum TransformerError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Malformed base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Failed to decompress payload: {0}")]
    Decompress(#[source] std::io::Error),

    #[error("Failed to compress payload: {0}")]
    Compress(#[source] std::io::Error),

    #[error("Decompressed payload exceeds the limit of {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Malformed log envelope: {0}")]
    Parse(String),

    #[error("Failed to transform log event {event_id}: {reason}")]
    Transform { event_id: String, reason: String },

    #[error("Failed to resubmit records: {0}")]
    Resubmission(String),
}

impl TransformerError {
    /// Whether the error belongs to a single input record, as opposed to the
    /// invocation as a whole.
    pub fn is_record_error(&self) -> bool {
        matches!(
            self,
            TransformerError::Decode(_)
                | TransformerError::Decompress(_)
                | TransformerError::PayloadTooLarge { .. }
                | TransformerError::Parse(_)
                | TransformerError::Transform { .. }
        )
    }
}
