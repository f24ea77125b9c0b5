//! HTTP harness
//!
//! Exposes classification to an interception host that prefers calling out
//! over HTTP instead of embedding the library.

use crate::error::{AgentError, AgentResult};
use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use rewrite_core::{
    ClassificationResult, Completion, RequestDescriptor, RoutingTable, ScriptRegistry,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared state for metrics
#[derive(Debug, Default)]
pub struct Metrics {
    pub total_requests: AtomicU64,
    pub blocked: AtomicU64,
    pub mocked: AtomicU64,
    pub passed: AtomicU64,
}

impl Metrics {
    fn record(&self, result: &ClassificationResult) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        let counter = match result {
            ClassificationResult::Block { .. } => &self.blocked,
            ClassificationResult::Pass {
                replacement_body: Some(_),
            } => &self.mocked,
            ClassificationResult::Pass {
                replacement_body: None,
            } => &self.passed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsResponse {
        MetricsResponse {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            blocked: self.blocked.load(Ordering::Relaxed),
            mocked: self.mocked.load(Ordering::Relaxed),
            passed: self.passed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct MetricsResponse {
    pub total_requests: u64,
    pub blocked: u64,
    pub mocked: u64,
    pub passed: u64,
}

pub struct AppState {
    routes: RoutingTable,
    scripts: ScriptRegistry,
    metrics: Metrics,
}

impl AppState {
    pub fn new(routes: RoutingTable, scripts: ScriptRegistry) -> Self {
        Self {
            routes,
            scripts,
            metrics: Metrics::default(),
        }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn classify(&self, request: &RequestDescriptor) -> ClassificationResult {
        let result = self.routes.dispatch(request, &self.scripts);
        self.metrics.record(&result);
        result
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/classify", post(classify_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(addr: SocketAddr, state: Arc<AppState>) -> AgentResult<()> {
    info!("Starting classification harness on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AgentError::Network(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, app(state))
        .await
        .map_err(|e| AgentError::Network(format!("Harness failed: {}", e)))?;

    Ok(())
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> Json<MetricsResponse> {
    Json(state.metrics.snapshot())
}

/// Malformed descriptors degrade to "continue unmodified" like any other non-match
async fn classify_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Json<Completion> {
    let request: RequestDescriptor = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Unreadable request descriptor, passing through: {}", e);
            let result = ClassificationResult::pass();
            state.metrics.record(&result);
            return Json(Completion::from(result));
        }
    };

    Json(Completion::from(state.classify(&request)))
}
