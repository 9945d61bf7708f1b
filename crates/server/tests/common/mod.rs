//! Common test utilities for in-process API testing.
//!
//! This module provides a test fixture that builds the full router around a
//! temporary SQLite store, optionally with a mock store behind the agent queue.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use supportq_core::{
    config::{AgentConfig, DatabaseConfig},
    testing::MockTicketStore,
    Config, QueueController, SqliteTicketStore, TicketStore,
};
use supportq_server::api::{create_router, WsBroadcaster};
use supportq_server::state::AppState;

/// Re-export fixtures for test convenience
pub use supportq_core::testing::fixtures;

/// Test fixture for API testing.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_queue_view() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.get("/api/v1/queue").await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Store behind the `/tickets` API
    pub store: Arc<SqliteTicketStore>,
    /// Store behind the agent queue, when it is a mock
    pub mock: Option<Arc<MockTicketStore>>,
    pub queue: Arc<QueueController>,
    pub broadcaster: WsBroadcaster,
    /// Temporary directory for the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Seeded SQLite store shared by the store API and the queue.
    pub async fn new() -> Self {
        Self::build(true, None).await
    }

    /// Empty SQLite store shared by the store API and the queue.
    pub async fn empty() -> Self {
        Self::build(false, None).await
    }

    /// Queue backed by `mock`; the store API keeps a seeded SQLite store.
    pub async fn with_mock(mock: MockTicketStore) -> Self {
        Self::build(true, Some(Arc::new(mock))).await
    }

    async fn build(seed: bool, mock: Option<Arc<MockTicketStore>>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let config = Config {
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            agent: AgentConfig {
                id: "agent-1".to_string(),
            },
            ..Config::default()
        };

        let store =
            Arc::new(SqliteTicketStore::new(&db_path).expect("Failed to create ticket store"));
        if seed {
            store.seed_demo_tickets().expect("Failed to seed tickets");
        }

        let queue_store: Arc<dyn TicketStore> = match &mock {
            Some(mock) => mock.clone(),
            None => store.clone(),
        };

        let broadcaster = WsBroadcaster::default();
        let queue = Arc::new(QueueController::new(
            queue_store,
            Arc::new(broadcaster.clone()),
            "agent-1",
        ));
        queue.refresh().await.expect("Initial queue load failed");

        let state = Arc::new(AppState::new(
            config,
            store.clone(),
            queue.clone(),
            broadcaster.clone(),
        ));
        let router = create_router(state);

        Self {
            router,
            store,
            mock,
            queue,
            broadcaster,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a PUT request with JSON body.
    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a request and return the raw text body.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, String::from_utf8_lossy(&body_bytes).into_owned())
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}
