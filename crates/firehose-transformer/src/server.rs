// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use http_body_util::BodyExt;
use hyper::service::service_fn;
use hyper::{http, Method, Request, Response, StatusCode};
use serde_json::json;
use std::fmt::Display;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error};

use crate::http_utils::{
    create_json_http_response, log_and_create_http_response, verify_request_content_length,
    HttpResponse,
};
use crate::invocation::FirehoseEvent;
use crate::pipeline::Pipeline;

pub const TRANSFORM_ENDPOINT_PATH: &str = "/v1/transform";
pub const HEALTH_ENDPOINT_PATH: &str = "/health";

/// Serves transformation invocations over HTTP.
pub struct TransformerServer {
    pub pipeline: Arc<Pipeline>,
}

impl TransformerServer {
    /// Binds `127.0.0.1` on the configured port and serves until the listener fails.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = SocketAddr::from(([127, 0, 0, 1], self.pipeline.config.port));
        let listener = TcpListener::bind(&addr).await?;
        debug!("Transformer started: listening on {addr}");
        self.serve(listener).await
    }

    /// Serves connections accepted on an already bound listener.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), Box<dyn std::error::Error>> {
        let pipeline = self.pipeline.clone();
        let service = service_fn(move |req| {
            let pipeline = pipeline.clone();
            TransformerServer::endpoint_handler(pipeline, req)
        });

        let server = hyper::server::conn::http1::Builder::new();
        let mut joinset = tokio::task::JoinSet::new();

        loop {
            let conn = tokio::select! {
                con_res = listener.accept() => match con_res {
                    Err(e)
                        if matches!(
                            e.kind(),
                            io::ErrorKind::ConnectionAborted
                                | io::ErrorKind::ConnectionReset
                                | io::ErrorKind::ConnectionRefused
                        ) =>
                    {
                        continue;
                    }
                    Err(e) => {
                        error!("Server error: {e}");
                        return Err(e.into());
                    }
                    Ok((conn, _)) => conn,
                },
                finished = async {
                    match joinset.join_next().await {
                        Some(finished) => finished,
                        None => std::future::pending().await,
                    }
                } => match finished {
                    Err(e) if e.is_panic() => {
                        error!("Connection handler panicked: {:?}", e);
                        continue;
                    },
                    Ok(()) | Err(_) => continue,
                },
            };
            let conn = hyper_util::rt::TokioIo::new(conn);
            let server = server.clone();
            let service = service.clone();
            joinset.spawn(async move {
                if let Err(e) = server.serve_connection(conn, service).await {
                    error!("Connection error: {e}");
                }
            });
        }
    }

    /// Routes one request. Generic over the body so tests can drive it without a socket.
    pub async fn endpoint_handler<B>(
        pipeline: Arc<Pipeline>,
        req: Request<B>,
    ) -> http::Result<HttpResponse>
    where
        B: hyper::body::Body,
        B::Error: Display,
    {
        match (req.method(), req.uri().path()) {
            (&Method::POST, TRANSFORM_ENDPOINT_PATH) => {
                Self::transform_handler(pipeline, req).await
            }
            (&Method::GET, HEALTH_ENDPOINT_PATH) => {
                create_json_http_response(&json!({"status": "ok"}), StatusCode::OK)
            }
            _ => {
                let mut not_found = Response::default();
                *not_found.status_mut() = StatusCode::NOT_FOUND;
                Ok(not_found)
            }
        }
    }

    async fn transform_handler<B>(
        pipeline: Arc<Pipeline>,
        req: Request<B>,
    ) -> http::Result<HttpResponse>
    where
        B: hyper::body::Body,
        B::Error: Display,
    {
        let (parts, body) = req.into_parts();
        if let Some(response) = verify_request_content_length(
            &parts.headers,
            pipeline.config.max_request_content_length,
            "Error processing invocation",
        ) {
            return response;
        }

        let body_bytes = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                return log_and_create_http_response(
                    &format!("Error reading invocation body: {e}"),
                    StatusCode::BAD_REQUEST,
                );
            }
        };

        // double check the size in case transfer encoding is used
        if body_bytes.len() > pipeline.config.max_request_content_length {
            return log_and_create_http_response(
                "Error processing invocation: Payload too large",
                StatusCode::PAYLOAD_TOO_LARGE,
            );
        }

        let event: FirehoseEvent = match serde_json::from_slice(&body_bytes) {
            Ok(event) => event,
            Err(e) => {
                return log_and_create_http_response(
                    &format!("Error deserializing invocation event: {e}"),
                    StatusCode::BAD_REQUEST,
                );
            }
        };

        match pipeline.handle(&event).await {
            Ok(response) => create_json_http_response(&response, StatusCode::OK),
            Err(err) => log_and_create_http_response(
                &format!("Invocation {} failed: {err}", event.invocation_id),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        }
    }
}
