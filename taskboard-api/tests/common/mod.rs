//! Common test utilities for integration tests
//!
//! This module provides shared infrastructure for integration tests:
//! - An app wired to an in-memory task store
//! - A temporary static directory with a small single-page app
//! - A store that always fails, for outage mapping
//! - Request/response helpers

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use taskboard_api::app::{build_router, AppState};
use taskboard_api::config::ApiConfig;
use taskboard_shared::models::task::{NewTask, Task};
use taskboard_shared::store::{memory::InMemoryTaskStore, StoreError, StoreResult, TaskStore};
use tempfile::TempDir;
use tower::ServiceExt;

pub const INDEX_HTML: &str = "<!doctype html><title>Taskboard</title><div id=\"app\"></div>";
pub const APP_JS: &str = "console.log('taskboard');";

/// Test context containing the router and its collaborators
pub struct TestContext {
    pub app: Router,
    pub store: InMemoryTaskStore,
    // Held so the directory outlives the router
    pub static_dir: TempDir,
}

impl TestContext {
    /// Creates a context backed by an empty in-memory store
    pub fn new() -> Self {
        Self::with_store(InMemoryTaskStore::new())
    }

    /// Creates a context around the given in-memory store
    pub fn with_store(store: InMemoryTaskStore) -> Self {
        let static_dir = static_site();
        let app = router_for(Arc::new(store.clone()), &static_dir);

        Self {
            app,
            store,
            static_dir,
        }
    }

    /// Sends one request through a fresh clone of the router
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }
}

/// Builds a router around an arbitrary store
pub fn router_for(store: Arc<dyn TaskStore>, static_dir: &TempDir) -> Router {
    let config = ApiConfig {
        static_dir: static_dir.path().to_path_buf(),
        ..Default::default()
    };
    build_router(AppState::new(store, config))
}

/// Writes `index.html` and `app.js` into a temp directory
pub fn static_site() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), INDEX_HTML).unwrap();
    std::fs::write(dir.path().join("app.js"), APP_JS).unwrap();
    dir
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn form_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

/// Asserts status and returns the JSON body
pub async fn expect_json(response: Response<Body>, status: StatusCode) -> Value {
    assert_eq!(response.status(), status);
    body_json(response).await
}

/// Store whose every call fails with the same error
pub struct FailingStore {
    pub error: StoreError,
}

#[async_trait]
impl TaskStore for FailingStore {
    async fn init(&self) -> StoreResult<()> {
        Err(self.error.clone())
    }

    async fn list(&self) -> StoreResult<Vec<Task>> {
        Err(self.error.clone())
    }

    async fn get(&self, _id: &str) -> StoreResult<Option<Task>> {
        Err(self.error.clone())
    }

    async fn create(&self, _task: NewTask) -> StoreResult<Task> {
        Err(self.error.clone())
    }

    async fn update(&self, _task: Task) -> StoreResult<Task> {
        Err(self.error.clone())
    }

    async fn delete(&self, _id: &str) -> StoreResult<()> {
        Err(self.error.clone())
    }

    async fn ping(&self) -> StoreResult<()> {
        Err(self.error.clone())
    }
}
