//! HTTP host for the gate endpoints, plus health and Prometheus metrics

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use gate_lib::{
    host::{Endpoint, EndpointTable, MODE_READ, MODE_WRITE},
    GateError, GateService, Rejection, ServiceState,
};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<GateService>,
}

impl AppState {
    pub fn new(service: Arc<GateService>) -> Self {
        Self { service }
    }
}

/// Body returned for an accepted sample
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub consumed: usize,
}

/// Body returned when a sample is refused
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    #[serde(skip)]
    pub status: StatusCode,
    pub kind: &'static str,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<Rejection>,
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

impl From<GateError> for ErrorResponse {
    fn from(err: GateError) -> Self {
        let status = if err.is_invalid_argument() {
            StatusCode::BAD_REQUEST
        } else if matches!(err, GateError::ShutDown) {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let kind = err.kind();
        let error = err.to_string();
        let rejection = match err {
            GateError::Range(rejection) => Some(rejection),
            _ => None,
        };
        Self {
            status,
            kind,
            error,
            rejection,
        }
    }
}

/// Ingestion endpoint: the request body is the sample literal
async fn data_in(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<IngestResponse>, ErrorResponse> {
    let consumed = state.service.ingest(&body)?;
    Ok(Json(IngestResponse { consumed }))
}

/// Inspection endpoint: plain-text listing of the window
async fn data_out(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        state.service.inspect(),
    )
}

/// Health check - 200 while serving, 503 once finalized
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = state.service.status();

    let status_code = match status.state {
        ServiceState::WarmingUp | ServiceState::Gating => StatusCode::OK,
        ServiceState::Finalized => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(status))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            Vec::new(),
        );
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// Create the API router
///
/// Data routes are mounted only for endpoints registered in `endpoints`,
/// and only when their permission bits allow the route's direction.
pub fn create_router(state: Arc<AppState>, endpoints: &EndpointTable) -> Router {
    let mut router = Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics));

    for (endpoint, mode) in endpoints.registered() {
        let path = format!("/{}", endpoint.name());
        router = match endpoint {
            Endpoint::Ingest if mode & MODE_WRITE != 0 => router.route(&path, post(data_in)),
            Endpoint::Inspect if mode & MODE_READ != 0 => router.route(&path, get(data_out)),
            _ => {
                warn!(endpoint = endpoint.name(), mode = mode, "Endpoint mode forbids its route");
                router
            }
        };
    }

    router.with_state(state)
}

/// Serve the API until `shutdown` resolves
pub async fn serve<F>(port: u16, router: Router, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

/// Resolve once `signal` fires
///
/// If the signal cannot be installed the server keeps running instead of
/// shutting down immediately.
pub async fn shutdown_on<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
