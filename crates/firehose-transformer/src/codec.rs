// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Transport encoding of Firehose record payloads: gzip, then standard base64.

use std::io::{self, Read, Write};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use flate2::{read::MultiGzDecoder, write::GzEncoder, Compression};

use crate::error::TransformerError;

/// Decodes one record's `data` field into the raw envelope bytes.
///
/// Reading stops one byte past `max_decompressed_size`, so an oversized (or
/// maliciously compressed) payload fails with `PayloadTooLarge` without being
/// fully inflated.
pub fn decode(data: &str, max_decompressed_size: usize) -> Result<Vec<u8>, TransformerError> {
    let compressed = STANDARD.decode(data)?;
    if compressed.is_empty() {
        return Err(TransformerError::Decompress(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "payload is empty, expected a gzip stream",
        )));
    }

    let limit = u64::try_from(max_decompressed_size)
        .unwrap_or(u64::MAX)
        .saturating_add(1);
    let mut decompressed = Vec::new();
    MultiGzDecoder::new(compressed.as_slice())
        .take(limit)
        .read_to_end(&mut decompressed)
        .map_err(TransformerError::Decompress)?;

    if decompressed.len() > max_decompressed_size {
        return Err(TransformerError::PayloadTooLarge {
            limit: max_decompressed_size,
        });
    }
    Ok(decompressed)
}

/// Inverse of [`decode`].
pub fn encode(payload: &[u8]) -> Result<String, TransformerError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(payload)
        .map_err(TransformerError::Compress)?;
    let compressed = encoder.finish().map_err(TransformerError::Compress)?;
    Ok(STANDARD.encode(compressed))
}
