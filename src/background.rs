// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Outbound delivery of call outcomes.
//!
//! The background context keeps a pending promise per `promiseId`. Each
//! outcome settles exactly one of them through a `closeBackgroundPromise`
//! remote call.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use url::Url;

use crate::relay::CallOutcome;

/// Remote method that settles a pending background promise.
pub const CLOSE_BACKGROUND_PROMISE: &str = "closeBackgroundPromise";

/// Upper bound for a single delivery, connect included.
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors raised while delivering an outcome.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Background request failed: {0}")]
    Transport(String),

    #[error("Background rejected the outcome: {0}")]
    Rejected(String),

    #[error("Outcome channel closed")]
    Closed,
}

/// Destination for call outcomes.
#[async_trait]
pub trait BackgroundSink: Send + Sync {
    async fn close_background_promise(&self, outcome: CallOutcome) -> Result<(), SinkError>;
}

/// Delivers outcomes as JSON-RPC 2.0 requests over HTTP.
pub struct HttpBackground {
    client: reqwest::Client,
    endpoint: Url,
    next_id: AtomicU64,
}

impl HttpBackground {
    pub fn new(endpoint: Url) -> Result<Self, SinkError> {
        Self::with_timeout(endpoint, DEFAULT_DELIVERY_TIMEOUT)
    }

    pub fn with_timeout(endpoint: Url, timeout: Duration) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SinkError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl BackgroundSink for HttpBackground {
    async fn close_background_promise(&self, outcome: CallOutcome) -> Result<(), SinkError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": CLOSE_BACKGROUND_PROMISE,
            "params": [outcome],
        });

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Rejected(format!("HTTP {status}")));
        }

        // Notifications may come back with an empty body.
        let text = response
            .text()
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;
        if text.trim().is_empty() {
            return Ok(());
        }

        match serde_json::from_str::<Value>(&text) {
            Ok(reply) => match reply.get("error") {
                Some(error) if !error.is_null() => Err(SinkError::Rejected(error.to_string())),
                _ => Ok(()),
            },
            Err(e) => Err(SinkError::Transport(format!("Invalid JSON-RPC reply: {e}"))),
        }
    }
}

/// Delivers outcomes into an in-process channel.
#[derive(Clone)]
pub struct ChannelBackground {
    sender: mpsc::UnboundedSender<CallOutcome>,
}

impl ChannelBackground {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<CallOutcome>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl BackgroundSink for ChannelBackground {
    async fn close_background_promise(&self, outcome: CallOutcome) -> Result<(), SinkError> {
        self.sender.send(outcome).map_err(|_| SinkError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, routing::post, Json, Router};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    type Received = Arc<Mutex<Vec<Value>>>;

    async fn spawn_background(reply: Value) -> (Url, Received) {
        let received: Received = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route(
                "/rpc",
                post(
                    |State((received, reply)): State<(Received, Value)>, Json(body): Json<Value>| async move {
                        received.lock().await.push(body);
                        Json(reply)
                    },
                ),
            )
            .with_state((received.clone(), reply));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (Url::parse(&format!("http://{addr}/rpc")).unwrap(), received)
    }

    #[tokio::test]
    async fn http_background_posts_json_rpc() {
        let (url, received) =
            spawn_background(json!({ "jsonrpc": "2.0", "id": 1, "result": null })).await;
        let sink = HttpBackground::new(url).unwrap();

        sink.close_background_promise(CallOutcome::reject("p1", "User rejected"))
            .await
            .unwrap();
        sink.close_background_promise(CallOutcome::reject("p2", "User rejected"))
            .await
            .unwrap();

        let received = received.lock().await;
        assert_eq!(received.len(), 2);
        assert_eq!(received[0]["method"], CLOSE_BACKGROUND_PROMISE);
        assert_eq!(received[0]["id"], 1);
        assert_eq!(received[1]["id"], 2);
        assert_eq!(received[0]["params"][0]["promiseId"], "p1");
        assert_eq!(received[0]["params"][0]["result"], "reject");
        assert_eq!(received[0]["params"][0]["data"], "User rejected");
    }

    #[tokio::test]
    async fn http_background_surfaces_rpc_errors() {
        let (url, _) = spawn_background(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32000, "message": "unknown promise" }
        }))
        .await;
        let sink = HttpBackground::new(url).unwrap();

        let err = sink
            .close_background_promise(CallOutcome::reject("p1", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, SinkError::Rejected(msg) if msg.contains("unknown promise")));
    }

    #[tokio::test]
    async fn http_background_reports_transport_errors() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let sink = HttpBackground::new(Url::parse(&format!("http://{addr}/rpc")).unwrap()).unwrap();
        let err = sink
            .close_background_promise(CallOutcome::reject("p1", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, SinkError::Transport(_)));
    }

    #[tokio::test]
    async fn http_background_times_out_on_silent_endpoint() {
        // Accepted by the kernel backlog but never answered.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let sink = HttpBackground::with_timeout(
            Url::parse(&format!("http://{addr}/rpc")).unwrap(),
            Duration::from_millis(200),
        )
        .unwrap();
        let err = sink
            .close_background_promise(CallOutcome::reject("p1", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, SinkError::Transport(_)));
        drop(listener);
    }

    #[tokio::test]
    async fn channel_background_forwards_outcomes() {
        let (sink, mut outcomes) = ChannelBackground::new();
        sink.close_background_promise(CallOutcome::reject("p1", "x"))
            .await
            .unwrap();
        assert_eq!(outcomes.recv().await.unwrap().promise_id, "p1");

        drop(outcomes);
        assert!(matches!(
            sink.close_background_promise(CallOutcome::reject("p2", "x")).await,
            Err(SinkError::Closed)
        ));
    }
}
