#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use bayes_mermaid::core::{CompletionRequest, LanguageModel, Stage};
use bayes_mermaid::{create_router, AppState, Result, ServiceConfig, ServiceError};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// LLM stub that answers each stage from its own queue and counts calls.
#[derive(Default)]
pub struct StubModel {
    replies: Mutex<HashMap<Stage, VecDeque<std::result::Result<String, u16>>>>,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl StubModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, stage: Stage, text: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .entry(stage)
            .or_default()
            .push_back(Ok(text.to_string()));
        self
    }

    pub fn fail(self, stage: Stage, status: u16) -> Self {
        self.replies
            .lock()
            .unwrap()
            .entry(stage)
            .or_default()
            .push_back(Err(status));
        self
    }

    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn stages(&self) -> Vec<Stage> {
        self.calls().iter().map(|c| c.stage).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl LanguageModel for StubModel {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let stage = request.stage;
        self.calls.lock().unwrap().push(request);

        let next = self
            .replies
            .lock()
            .unwrap()
            .get_mut(&stage)
            .and_then(|queue| queue.pop_front());

        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(status)) => Err(ServiceError::UpstreamError {
                status,
                message: format!("stubbed failure for {}", stage),
            }),
            None => Err(ServiceError::MalformedResponseError {
                message: format!("no stubbed reply for {}", stage),
            }),
        }
    }
}

/// Create a test router around a stub model.
pub fn create_test_router(model: StubModel) -> (Router, Arc<StubModel>) {
    create_test_router_with_config(model, ServiceConfig::default())
}

pub fn create_test_router_with_config(model: StubModel, config: ServiceConfig) -> (Router, Arc<StubModel>) {
    let model = Arc::new(model);
    let state = AppState::new(&config, model.clone());
    (create_router(Arc::new(state)), model)
}

/// Helper to make a GET request.
pub async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(router, request).await
}

/// Helper to make a POST request with JSON body.
pub async fn post(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    post_raw(router, uri, serde_json::to_string(&body).unwrap()).await
}

/// Helper to make a POST request with a raw body.
pub async fn post_raw(router: &Router, uri: &str, body: String) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body))
        .unwrap();

    send(router, request).await
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap_or(json!(null));

    (status, json)
}
