// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Builders for invocation events

use firehose_transformer::codec::encode;
use firehose_transformer::invocation::{FirehoseEvent, FirehoseEventRecord};
use serde_json::json;

pub const STREAM_ARN: &str = "arn:aws:firehose:us-east-1:123456789012:deliverystream/app-logs";

pub fn control_message() -> serde_json::Value {
    json!({
        "messageType": "CONTROL_MESSAGE",
        "owner": "CloudwatchLogs",
        "logGroup": "",
        "logStream": "",
        "subscriptionFilters": [],
        "logEvents": [{
            "id": "",
            "timestamp": 1432826855000_i64,
            "message": "CWL CONTROL MESSAGE: Checking health of destination Firehose."
        }]
    })
}

pub fn data_message(messages: &[&str]) -> serde_json::Value {
    let events: Vec<serde_json::Value> = messages
        .iter()
        .enumerate()
        .map(|(i, message)| {
            json!({
                "id": format!("3195310660696698337880902507980421114328961542429EXAMPLE{i}"),
                "timestamp": 1432826855000_i64 + i as i64,
                "message": message
            })
        })
        .collect();
    json!({
        "messageType": "DATA_MESSAGE",
        "owner": "123456789012",
        "logGroup": "/aws/lambda/checkout",
        "logStream": "2024/01/01/[$LATEST]0123456789abcdef",
        "subscriptionFilters": ["firehose"],
        "logEvents": events
    })
}

pub fn record(record_id: &str, envelope: &serde_json::Value) -> FirehoseEventRecord {
    let payload = serde_json::to_vec(envelope).expect("failed to serialize envelope");
    FirehoseEventRecord {
        record_id: record_id.to_string(),
        approximate_arrival_timestamp: 1495072949453,
        data: encode(&payload).expect("failed to encode envelope"),
    }
}

pub fn event(records: Vec<FirehoseEventRecord>) -> FirehoseEvent {
    FirehoseEvent {
        invocation_id: "invocationIdExample".to_string(),
        delivery_stream_arn: STREAM_ARN.to_string(),
        region: "us-east-1".to_string(),
        records,
    }
}
