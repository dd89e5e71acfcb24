// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::{env, sync::Arc};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use firehose_transformer::{
    config, pipeline::Pipeline, record_processor::LogsRecordProcessor, server::TransformerServer,
    sink::FirehoseSink, transformer::PassThroughTransformer,
};

#[tokio::main]
pub async fn main() {
    let log_level = env::var("TRANSFORMER_LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());

    let env_filter = format!("h2=off,hyper=off,rustls=off,{}", log_level);

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    let config = match config::Config::new() {
        Ok(c) => c,
        Err(e) => {
            error!("Error creating config on firehose transformer startup: {e}");
            return;
        }
    };

    let sink = match FirehoseSink::new(&config) {
        Ok(sink) => Arc::new(sink),
        Err(e) => {
            error!("Error creating resubmission sink: {e}");
            return;
        }
    };

    let record_processor = Arc::new(LogsRecordProcessor::new(
        &config,
        Arc::new(PassThroughTransformer::default()),
    ));

    info!(
        "Starting firehose transformer on port {} with a {} byte response ceiling",
        config.port, config.max_response_size
    );

    let server = TransformerServer {
        pipeline: Arc::new(Pipeline {
            config: Arc::new(config),
            record_processor,
            sink,
        }),
    };

    if let Err(e) = server.start().await {
        error!("Error when running firehose transformer: {e}");
    }
}
