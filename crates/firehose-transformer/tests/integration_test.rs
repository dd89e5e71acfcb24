// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

mod common;

use common::fixtures::{control_message, data_message, event, record};
use common::mocks::{PutBatchCall, RecordingSink};
use firehose_transformer::{
    config::{Config, FailurePolicy},
    error::TransformerError,
    invocation::{FirehoseEventRecord, FirehoseResponse, OutcomeRecord, RecordResult},
    pipeline::Pipeline,
    record_processor::LogsRecordProcessor,
    server::{TransformerServer, TRANSFORM_ENDPOINT_PATH},
    sink::{FirehoseSink, RecordSink},
    transformer::PassThroughTransformer,
};
use mockito::{Matcher, Server};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;

fn create_pipeline(config: Config, sink: Arc<dyn RecordSink + Send + Sync>) -> Pipeline {
    let record_processor =
        LogsRecordProcessor::new(&config, Arc::new(PassThroughTransformer::default()));
    Pipeline {
        config: Arc::new(config),
        record_processor: Arc::new(record_processor),
        sink,
    }
}

fn config_with_ceiling(max_response_size: usize) -> Config {
    Config {
        max_response_size,
        sink_url: "http://127.0.0.1:1".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_control_and_data_message() {
    let sink = Arc::new(RecordingSink::default());
    let pipeline = create_pipeline(Config::default(), sink.clone());

    let response = pipeline
        .handle(&event(vec![
            record("1", &control_message()),
            record("2", &data_message(&["hello", "world"])),
        ]))
        .await
        .unwrap();

    assert_eq!(
        response.records,
        vec![
            OutcomeRecord::dropped("1"),
            OutcomeRecord::ok("2", b"hello\n \nworld\n \n".to_vec()),
        ]
    );
    assert!(sink.calls().is_empty());
}

#[tokio::test]
async fn test_overflow_after_second_record() {
    let sink = Arc::new(RecordingSink::default());
    let pipeline = create_pipeline(config_with_ceiling(100), sink.clone());

    // 37 characters plus the 3 byte delimiter plus a 1 byte id: 41 per record
    let line = "a".repeat(37);
    let response = pipeline
        .handle(&event(vec![
            record("1", &data_message(&[line.as_str()])),
            record("2", &data_message(&[line.as_str()])),
            record("3", &data_message(&[line.as_str()])),
        ]))
        .await
        .unwrap();

    let expected_data = format!("{line}\n \n").into_bytes();
    assert_eq!(
        response.records,
        vec![
            OutcomeRecord::ok("1", expected_data.clone()),
            OutcomeRecord::ok("2", expected_data.clone()),
        ]
    );
    assert_eq!(
        sink.calls(),
        vec![PutBatchCall {
            stream_name: "app-logs".to_string(),
            records: vec![expected_data],
        }]
    );
}

#[tokio::test]
async fn test_overflow_is_sticky_and_keeps_non_ok_records() {
    let sink = Arc::new(RecordingSink::default());
    let pipeline = create_pipeline(config_with_ceiling(50), sink.clone());

    let big = "b".repeat(60);
    let response = pipeline
        .handle(&event(vec![
            record("1", &data_message(&["small"])),
            record("2", &data_message(&[big.as_str()])),
            record("3", &control_message()),
            record("4", &data_message(&["x"])),
            record("5", &json!({"messageType": "SOMETHING_ELSE"})),
        ]))
        .await
        .unwrap();

    let results: Vec<(String, RecordResult)> = response
        .records
        .iter()
        .map(|r| (r.record_id.clone(), r.result))
        .collect();
    assert_eq!(
        results,
        vec![
            ("1".to_string(), RecordResult::Ok),
            ("3".to_string(), RecordResult::Dropped),
            ("5".to_string(), RecordResult::ProcessingFailed),
        ]
    );

    let calls = sink.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].records,
        vec![format!("{big}\n \n").into_bytes(), b"x\n \n".to_vec()]
    );
}

#[tokio::test]
async fn test_every_record_answered_in_order_when_nothing_overflows() {
    let sink = Arc::new(RecordingSink::default());
    let pipeline = create_pipeline(Config::default(), sink.clone());

    let records: Vec<FirehoseEventRecord> = (0..50)
        .map(|i| {
            let id = format!("record-{i:03}");
            if i % 7 == 0 {
                record(&id, &control_message())
            } else {
                record(&id, &data_message(&["GET /health 200", "GET /orders 201"]))
            }
        })
        .collect();
    let ids: Vec<String> = records.iter().map(|r| r.record_id.clone()).collect();

    let response = pipeline.handle(&event(records)).await.unwrap();

    let response_ids: Vec<String> = response.records.iter().map(|r| r.record_id.clone()).collect();
    assert_eq!(response_ids, ids);
    assert!(sink.calls().is_empty());
}

#[tokio::test]
async fn test_malformed_base64_fails_invocation() {
    let sink = Arc::new(RecordingSink::default());
    let pipeline = create_pipeline(config_with_ceiling(10), sink.clone());

    let mut records = vec![record("1", &data_message(&["this would overflow the ceiling"]))];
    records.push(FirehoseEventRecord {
        record_id: "2".to_string(),
        approximate_arrival_timestamp: 0,
        data: "definitely not base64!".to_string(),
    });

    let result = pipeline.handle(&event(records)).await;
    assert!(matches!(result, Err(TransformerError::Decode(_))));
    // nothing is resubmitted when the invocation fails
    assert!(sink.calls().is_empty());
}

#[tokio::test]
async fn test_isolate_record_policy_keeps_batch() {
    let sink = Arc::new(RecordingSink::default());
    let config = Config {
        failure_policy: FailurePolicy::IsolateRecord,
        ..Default::default()
    };
    let pipeline = create_pipeline(config, sink);

    let response = pipeline
        .handle(&event(vec![
            record("1", &data_message(&["ok"])),
            FirehoseEventRecord {
                record_id: "2".to_string(),
                approximate_arrival_timestamp: 0,
                data: "definitely not base64!".to_string(),
            },
        ]))
        .await
        .unwrap();

    assert_eq!(
        response.records,
        vec![
            OutcomeRecord::ok("1", b"ok\n \n".to_vec()),
            OutcomeRecord::processing_failed("2"),
        ]
    );
}

#[tokio::test]
async fn test_sink_failure_fails_invocation() {
    let pipeline = create_pipeline(config_with_ceiling(10), Arc::new(RecordingSink::failing()));
    let result = pipeline
        .handle(&event(vec![record("1", &data_message(&["too big for ten"]))]))
        .await;
    assert!(matches!(result, Err(TransformerError::Resubmission(_))));
}

#[tokio::test]
async fn test_overflow_reaches_firehose_sink() {
    let mut mock_server = Server::new_async().await;
    let mock = mock_server
        .mock("POST", "/")
        .match_header("X-Amz-Target", "Firehose_20150804.PutRecordBatch")
        .match_body(Matcher::Json(json!({
            "DeliveryStreamName": "app-logs",
            "Records": [{"Data": "b3ZlcmZsb3cKIAo="}]
        })))
        .with_status(200)
        .with_body(r#"{"FailedPutCount":0,"RequestResponses":[{"RecordId":"abc"}]}"#)
        .expect(1)
        .create_async()
        .await;

    let config = Config {
        max_response_size: 20,
        sink_url: mock_server.url(),
        ..Default::default()
    };
    let sink = Arc::new(FirehoseSink::new(&config).unwrap());
    let pipeline = create_pipeline(config, sink);

    // the first two records count 8 each; the third adds 12 and crosses 20
    let response = pipeline
        .handle(&event(vec![
            record("1", &data_message(&["fits"])),
            record("2", &data_message(&["tiny"])),
            record("3", &data_message(&["overflow"])),
        ]))
        .await
        .unwrap();

    assert_eq!(response.records.len(), 2);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_round_trip_over_tcp() {
    let sink = Arc::new(RecordingSink::default());
    let pipeline = Arc::new(create_pipeline(Config::default(), sink));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = TransformerServer { pipeline };
    tokio::spawn(async move {
        let _ = server.serve(listener).await;
    });

    let body = serde_json::to_vec(&event(vec![
        record("1", &control_message()),
        record("2", &data_message(&["hello", "world"])),
    ]))
    .unwrap();

    let response = reqwest::Client::new()
        .post(format!("http://{addr}{TRANSFORM_ENDPOINT_PATH}"))
        .header("Content-Type", "application/json")
        .body(body)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let parsed: FirehoseResponse = response.json().await.unwrap();
    assert_eq!(
        parsed.records,
        vec![
            OutcomeRecord::dropped("1"),
            OutcomeRecord::ok("2", b"hello\n \nworld\n \n".to_vec()),
        ]
    );
}
