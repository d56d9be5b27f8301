//! Shared fixtures for unit tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Bytes,
    http::{HeaderMap, StatusCode, Uri},
    Json, Router,
};
use parking_lot::Mutex;
use serde_json::Value;

use crate::models::IncidentPayload;
use crate::remediation::{ContainerHandle, ContainerRuntime, RuntimeError};

/// In-memory runtime that records how often it is called
#[derive(Default)]
pub struct FakeRuntime {
    containers: HashMap<String, String>,
    restart_error: Option<String>,
    hang_on_restart: bool,
    lookups: AtomicUsize,
    restarts: AtomicUsize,
}

impl FakeRuntime {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_container(id: &str, name: &str) -> Self {
        let mut runtime = Self::default();
        runtime.containers.insert(id.to_string(), name.to_string());
        runtime
    }

    pub fn failing_restart(mut self, message: &str) -> Self {
        self.restart_error = Some(message.to_string());
        self
    }

    pub fn hanging_restart(mut self) -> Self {
        self.hang_on_restart = true;
        self
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn restart_count(&self) -> usize {
        self.restarts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn lookup(&self, container_id: &str) -> Result<ContainerHandle, RuntimeError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.containers
            .get(container_id)
            .map(|name| ContainerHandle {
                id: container_id.to_string(),
                name: name.clone(),
            })
            .ok_or_else(|| RuntimeError::NotFound(container_id.to_string()))
    }

    async fn restart(&self, _container: &ContainerHandle) -> Result<(), RuntimeError> {
        self.restarts.fetch_add(1, Ordering::SeqCst);
        if self.hang_on_restart {
            std::future::pending::<()>().await;
        }
        match &self.restart_error {
            Some(message) => Err(RuntimeError::Command(message.clone())),
            None => Ok(()),
        }
    }
}

/// A request seen by [`MockBackend`]
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub api_key: Option<String>,
    pub body: Value,
}

/// Local HTTP server standing in for a diagnosis backend
pub struct MockBackend {
    pub url: String,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl MockBackend {
    /// Answer every request with `status` and `reply`
    pub async fn spawn(status: StatusCode, reply: Value) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let captured = requests.clone();

        let app = Router::new().fallback(move |uri: Uri, headers: HeaderMap, body: Bytes| {
            let captured = captured.clone();
            let reply = reply.clone();
            async move {
                let header = |name: &str| {
                    headers
                        .get(name)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string)
                };
                captured.lock().push(CapturedRequest {
                    path: uri.path().to_string(),
                    authorization: header("authorization"),
                    api_key: header("x-goog-api-key"),
                    body: serde_json::from_slice(&body).unwrap_or(Value::Null),
                });
                (status, Json(reply))
            }
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{}", addr),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().clone()
    }
}

/// An address nothing listens on
pub const UNREACHABLE_ENDPOINT: &str = "http://127.0.0.1:1/v1/completions";

pub fn sample_payload() -> IncidentPayload {
    serde_json::from_value(serde_json::json!({
        "incident_id": "inc-1",
        "timestamp": "2024-01-01T00:00:00Z",
        "breached_slo": "Memory > 90%",
        "container_info": { "id": "c1", "name": "buggy-app-v2" },
        "observability_context": {}
    }))
    .unwrap()
}

/// Completion body whose text is the given diagnosis JSON
pub fn completion_reply(diagnosis: Value) -> Value {
    serde_json::json!({ "choices": [{ "text": diagnosis.to_string() }] })
}
