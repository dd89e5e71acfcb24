// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::str::FromStr;

use crate::error::TransformerError;

/// Largest response the Firehose transformation contract accepts.
pub const DEFAULT_MAX_RESPONSE_SIZE: usize = 6_000_000;
pub const DEFAULT_MAX_DECOMPRESSED_SIZE: usize = 64 * 1024 * 1024;
pub const DEFAULT_MAX_REQUEST_CONTENT_LENGTH: usize = 32 * 1024 * 1024;
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_SINK_TIMEOUT_SECS: u64 = 30;
const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// What to do when a single record cannot be decoded, parsed or transformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abort the whole invocation; the delivery pipeline retries the batch.
    #[default]
    FailBatch,
    /// Mark the offending record `ProcessingFailed` and keep going.
    IsolateRecord,
}

impl FromStr for FailurePolicy {
    type Err = TransformerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fail_batch" => Ok(FailurePolicy::FailBatch),
            "isolate_record" => Ok(FailurePolicy::IsolateRecord),
            other => Err(TransformerError::InvalidConfig(format!(
                "Unknown failure policy '{other}'. Must be one of: fail_batch, isolate_record"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// ceiling on the summed size of Ok records placed in one response
    pub max_response_size: usize,
    /// per-record cap on decompressed envelope size, in bytes
    pub max_decompressed_size: usize,
    pub failure_policy: FailurePolicy,
    pub port: u16,
    pub max_request_content_length: usize,
    /// PutRecordBatch endpoint overflow is resubmitted to
    pub sink_url: String,
    pub sink_timeout_secs: u64,
    pub proxy_url: Option<String>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_response_size: DEFAULT_MAX_RESPONSE_SIZE,
            max_decompressed_size: DEFAULT_MAX_DECOMPRESSED_SIZE,
            failure_policy: FailurePolicy::default(),
            port: DEFAULT_PORT,
            max_request_content_length: DEFAULT_MAX_REQUEST_CONTENT_LENGTH,
            sink_url: String::new(),
            sink_timeout_secs: DEFAULT_SINK_TIMEOUT_SECS,
            proxy_url: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Builds the configuration from `TRANSFORMER_*` environment variables.
    pub fn new() -> Result<Config, TransformerError> {
        let sink_url = env::var("TRANSFORMER_SINK_URL").map_err(|_| {
            TransformerError::InvalidConfig(
                "TRANSFORMER_SINK_URL environment variable is not set".to_string(),
            )
        })?;

        let failure_policy = match env::var("TRANSFORMER_FAILURE_POLICY") {
            Ok(policy) => policy.parse()?,
            Err(_) => FailurePolicy::default(),
        };

        let config = Config {
            max_response_size: parse_env("TRANSFORMER_MAX_RESPONSE_SIZE")?
                .unwrap_or(DEFAULT_MAX_RESPONSE_SIZE),
            max_decompressed_size: parse_env("TRANSFORMER_MAX_DECOMPRESSED_SIZE")?
                .unwrap_or(DEFAULT_MAX_DECOMPRESSED_SIZE),
            failure_policy,
            port: parse_env("TRANSFORMER_PORT")?.unwrap_or(DEFAULT_PORT),
            max_request_content_length: parse_env("TRANSFORMER_MAX_REQUEST_CONTENT_LENGTH")?
                .unwrap_or(DEFAULT_MAX_REQUEST_CONTENT_LENGTH),
            sink_url,
            sink_timeout_secs: parse_env("TRANSFORMER_SINK_TIMEOUT_SECS")?
                .unwrap_or(DEFAULT_SINK_TIMEOUT_SECS),
            proxy_url: env::var("TRANSFORMER_PROXY_HTTPS")
                .or_else(|_| env::var("HTTPS_PROXY"))
                .ok(),
            log_level: env::var("TRANSFORMER_LOG_LEVEL")
                .map(|val| val.to_lowercase())
                .unwrap_or_else(|_| "info".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), TransformerError> {
        if self.max_response_size == 0 {
            return Err(TransformerError::InvalidConfig(
                "Maximum response size must be greater than 0".to_string(),
            ));
        }

        if self.max_decompressed_size == 0 {
            return Err(TransformerError::InvalidConfig(
                "Maximum decompressed size must be greater than 0".to_string(),
            ));
        }

        if self.port == 0 {
            return Err(TransformerError::InvalidConfig(
                "Port must be greater than 0".to_string(),
            ));
        }

        if self.sink_url.trim().is_empty() {
            return Err(TransformerError::InvalidConfig(
                "TRANSFORMER_SINK_URL cannot be empty".to_string(),
            ));
        }

        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(TransformerError::InvalidConfig(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        Ok(())
    }
}

fn parse_env<T: FromStr>(name: &str) -> Result<Option<T>, TransformerError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            TransformerError::InvalidConfig(format!("{name} must be a number, got '{raw}'"))
        }),
        Err(_) => Ok(None),
    }
}
