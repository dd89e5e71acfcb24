// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod codec;
pub mod config;
pub mod envelope;
pub mod error;
pub mod http_utils;
pub mod invocation;
pub mod pipeline;
pub mod record_processor;
pub mod reingest;
pub mod server;
pub mod sink;
pub mod transformer;
