// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The HTTP surface of the worker.
//!
//! The handlers are independent of the background poll loop. `/health` does
//! not check the broker connection, it only reports that the process is
//! serving requests.

use crate::error::BrokerError;
use crate::model::{ProcessedRecord, PullSummary};
use crate::puller::Puller;
use crate::recent::RecentMessages;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;

pub const SERVICE_NAME: &str = "pubsub-pull-worker";

/// The state shared by all the handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    pub puller: Puller,
    pub recent: Arc<RecentMessages>,
    pub manual_batch_size: i32,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/pull", get(pull))
        .route("/messages", get(messages))
        .with_state(state)
}

/// Serves `router` until the process receives SIGINT or SIGTERM.
///
/// In-flight requests complete before this function returns.
pub async fn serve(listener: TcpListener, router: Router) -> std::io::Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn index(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "service": SERVICE_NAME,
        "status": "running",
        "subscription": state.puller.subscription(),
        "endpoints": {
            "/health": "liveness check",
            "/pull": "pull and process messages now",
            "/messages": "recently processed messages",
        },
    }))
}

async fn health() -> Json<Value> {
    Json(json!({"status": "healthy"}))
}

async fn pull(State(state): State<AppState>) -> Result<Json<PullSummary>, AppError> {
    let summary = state.puller.pull_once(state.manual_batch_size).await?;
    tracing::info!(
        received = summary.messages_received,
        processed = summary.messages_processed,
        "manual pull complete"
    );
    Ok(Json(summary))
}

#[derive(Debug, Serialize)]
struct MessagesResponse {
    messages: Vec<ProcessedRecord>,
    count: usize,
    capacity: usize,
}

async fn messages(State(state): State<AppState>) -> Json<MessagesResponse> {
    let messages = state.recent.snapshot();
    Json(MessagesResponse {
        count: messages.len(),
        capacity: state.recent.capacity(),
        messages,
    })
}

/// Converts handler failures into `{"error": "..."}` responses.
#[derive(Debug)]
struct AppError(BrokerError);

impl From<BrokerError> for AppError {
    fn from(value: BrokerError) -> Self {
        Self(value)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "manual pull failed");
        let body = json!({"error": self.0.to_string()});
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot install the SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot install the SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutting down the HTTP server");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::tests::{MockBroker, test_message};
    use crate::puller::tests::{TEST_PATH, test_puller};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_router(mock: MockBroker, recent: Arc<RecentMessages>) -> Router {
        router(AppState {
            puller: test_puller(mock, recent.clone()),
            recent,
            manual_batch_size: 5,
        })
    }

    async fn get_json(router: Router, uri: &str) -> anyhow::Result<(StatusCode, Value)> {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty())?)
            .await?;
        let status = response.status();
        let body = response.into_body().collect().await?.to_bytes();
        Ok((status, serde_json::from_slice(&body)?))
    }

    #[tokio::test]
    async fn health_is_idempotent() -> anyhow::Result<()> {
        let mut mock = MockBroker::new();
        mock.expect_pull().never();
        let router = test_router(mock, Arc::new(RecentMessages::new(10)));
        for _ in 0..3 {
            let (status, body) = get_json(router.clone(), "/health").await?;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({"status": "healthy"}));
        }
        Ok(())
    }

    #[tokio::test]
    async fn index() -> anyhow::Result<()> {
        let router = test_router(MockBroker::new(), Arc::new(RecentMessages::new(10)));
        let (status, body) = get_json(router, "/").await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], SERVICE_NAME);
        assert_eq!(body["status"], "running");
        assert_eq!(body["subscription"], TEST_PATH);
        let endpoints = body["endpoints"].as_object().expect("endpoints is an object");
        for path in ["/health", "/pull", "/messages"] {
            assert!(endpoints.contains_key(path), "{body:?}");
        }
        Ok(())
    }

    #[tokio::test]
    async fn pull_empty() -> anyhow::Result<()> {
        let mut mock = MockBroker::new();
        mock.expect_pull()
            .times(1)
            .withf(|_, n, _| *n == 5)
            .returning(|_, _, _| Ok(Vec::new()));
        mock.expect_acknowledge().never();
        let router = test_router(mock, Arc::new(RecentMessages::new(10)));

        let (status, body) = get_json(router, "/pull").await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"messages_processed": 0, "messages_received": 0})
        );
        Ok(())
    }

    #[tokio::test]
    async fn pull_then_messages() -> anyhow::Result<()> {
        let mut mock = MockBroker::new();
        mock.expect_pull().times(1).returning(|_, _, _| {
            Ok(vec![
                test_message(0, "a"),
                test_message(1, vec![0xff_u8, 0xfe]),
                test_message(2, r#"{"k":1}"#),
            ])
        });
        mock.expect_acknowledge()
            .times(1)
            .withf(|_, ids| ids.len() == 2)
            .returning(|_, _| Ok(()));
        mock.expect_negative_acknowledge()
            .times(1)
            .withf(|_, ids| ids.len() == 1)
            .returning(|_, _| Ok(()));
        let router = test_router(mock, Arc::new(RecentMessages::new(10)));

        let (status, body) = get_json(router.clone(), "/pull").await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"messages_processed": 2, "messages_received": 3})
        );

        let (status, body) = get_json(router, "/messages").await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);
        assert_eq!(body["capacity"], 10);
        let data = body["messages"]
            .as_array()
            .expect("messages is an array")
            .iter()
            .map(|m| m["data"].clone())
            .collect::<Vec<_>>();
        assert_eq!(data, vec![json!("a"), json!(r#"{"k":1}"#)]);
        Ok(())
    }

    #[tokio::test]
    async fn pull_error() -> anyhow::Result<()> {
        let mut mock = MockBroker::new();
        mock.expect_pull().times(1).returning(|_, _, _| {
            Err(BrokerError::Status {
                code: 503,
                message: "broker unavailable".to_string(),
            })
        });
        let router = test_router(mock, Arc::new(RecentMessages::new(10)));

        let (status, body) = get_json(router, "/pull").await?;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let message = body["error"].as_str().expect("error is a string");
        assert!(message.contains("broker unavailable"), "{body:?}");
        Ok(())
    }

    #[tokio::test]
    async fn messages_empty() -> anyhow::Result<()> {
        let router = test_router(MockBroker::new(), Arc::new(RecentMessages::new(3)));
        let (status, body) = get_json(router, "/messages").await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"messages": [], "count": 0, "capacity": 3}));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_route() -> anyhow::Result<()> {
        let router = test_router(MockBroker::new(), Arc::new(RecentMessages::new(3)));
        let response = router
            .oneshot(Request::builder().uri("/unknown").body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        Ok(())
    }
}
