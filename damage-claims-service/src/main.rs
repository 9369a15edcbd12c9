mod detector;
mod telemetry;

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, Request, StatusCode},
    middleware::{Next, from_fn},
    response::Json,
    routing::{get, post},
};
use claim_core::{
    AnswerSource, AssistantBackend, AssistantGateway, BreakerConfig, ClaimAssistant,
    DamageDetector, Decision, Detection, OpenRouterBackend, decide,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{Instrument, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::detector::HttpDetector;

#[derive(Clone)]
struct AppState {
    detector: Arc<dyn DamageDetector>,
    assistant: Arc<ClaimAssistant>,
    gateway: Arc<AssistantGateway>,
    metrics: PrometheusHandle,
}

#[derive(Debug, Serialize)]
struct PredictResponse {
    detections: Vec<Detection>,
    decision: Decision,
}

#[derive(Debug, Deserialize)]
struct AskAgentRequest {
    #[serde(default)]
    detections: Vec<Detection>,
    decision: Decision,
    question: String,
}

#[derive(Debug, Serialize)]
struct AskAgentResponse {
    answer: String,
    source: AnswerSource,
    request_id: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    request_id: String,
}

/// Initialize structured JSON tracing based on environment variables
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "damage_claims_service=debug,claim_core=debug,tower_http=debug".into());

    match log_format.as_str() {
        "pretty" => {
            // Human-readable logging for development
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        _ => {
            // Structured JSON logging for production
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true),
                )
                .init();
        }
    }
}

/// Middleware to add correlation ID to all requests
async fn correlation_id_middleware(
    mut request: Request<axum::body::Body>,
    next: Next,
) -> axum::response::Response {
    let correlation_id = Uuid::new_v4().to_string();

    // Make the correlation ID available to handlers via the headers
    request.headers_mut().insert(
        "x-correlation-id",
        HeaderValue::from_str(&correlation_id).unwrap(),
    );

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);

    next.run(request).instrument(span).await
}

/// Middleware recording the HTTP request counter and latency histogram
async fn http_metrics_middleware(
    request: Request<axum::body::Body>,
    next: Next,
) -> axum::response::Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    counter!(
        telemetry::HTTP_REQUESTS_TOTAL,
        1,
        "method" => method,
        "path" => path.clone(),
        "status" => status
    );
    histogram!(telemetry::HTTP_REQUEST_LATENCY_MS, elapsed_ms, "path" => path);

    response
}

fn request_id(headers: &HeaderMap) -> String {
    headers
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let metrics_handle = telemetry::install()?;

    // Missing assistant credentials degrade the service instead of
    // stopping it: every answer comes from the fallback until restart.
    let backend: Option<Arc<dyn AssistantBackend>> = match OpenRouterBackend::from_env() {
        Ok(backend) => Some(Arc::new(backend)),
        Err(e) => {
            warn!(error = %e, "assistant backend not configured, starting in fallback-only mode");
            None
        }
    };

    let mut gateway = AssistantGateway::new(backend, BreakerConfig::default());
    if let Some(timeout) = std::env::var("ASSISTANT_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
    {
        gateway = gateway.with_call_timeout(Duration::from_secs(timeout));
    }
    let gateway = Arc::new(gateway);
    let assistant = Arc::new(ClaimAssistant::new(gateway.clone()));

    let detector_url = std::env::var("DETECTOR_URL")
        .unwrap_or_else(|_| "http://localhost:8001/detect".to_string());
    info!(detector_url = %detector_url, "using HTTP damage detector");
    let detector = Arc::new(HttpDetector::new(detector_url));

    let app_state = AppState {
        detector,
        assistant,
        gateway,
        metrics: metrics_handle,
    };

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/predict", post(predict))
        .route("/ask-agent", post(ask_agent))
        .route("/metrics", get(scrape_metrics))
        .layer(from_fn(http_metrics_middleware))
        .layer(from_fn(correlation_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Server running on http://{addr}");

    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "damage-claims-service"
    }))
}

async fn predict(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PredictResponse>, (StatusCode, Json<ErrorBody>)> {
    let request_id = request_id(&headers);
    counter!(telemetry::PREDICTION_REQUESTS_TOTAL, 1);
    let start = Instant::now();

    // Detection failures are hard errors: the caller gets a structured
    // payload with the correlation id and no decision content.
    let detections = state.detector.detect(&body).await.map_err(|e| {
        error!(request_id = %request_id, error = %e, "detection failed");
        (
            StatusCode::BAD_GATEWAY,
            Json(ErrorBody {
                error: e.to_string(),
                request_id: request_id.clone(),
            }),
        )
    })?;

    let decision = decide(&detections);
    histogram!(
        telemetry::PREDICTION_LATENCY_MS,
        start.elapsed().as_secs_f64() * 1000.0
    );

    info!(
        request_id = %request_id,
        damage_count = decision.damage_count,
        final_damage = %decision.final_damage,
        claim_approved = decision.claim_approved,
        "prediction complete"
    );

    Ok(Json(PredictResponse {
        detections,
        decision,
    }))
}

async fn ask_agent(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AskAgentRequest>,
) -> Json<AskAgentResponse> {
    let request_id = request_id(&headers);
    counter!(telemetry::ASSISTANT_REQUESTS_TOTAL, 1);
    let start = Instant::now();

    let result = state
        .assistant
        .answer(&request.question, &request.decision, &request.detections)
        .await;

    histogram!(
        telemetry::ASSISTANT_LATENCY_MS,
        start.elapsed().as_secs_f64() * 1000.0
    );

    info!(
        request_id = %request_id,
        source = ?result.source,
        "assistant request completed"
    );

    Json(AskAgentResponse {
        answer: result.answer,
        source: result.source,
        request_id,
    })
}

async fn scrape_metrics(State(state): State<AppState>) -> String {
    // Refresh the breaker gauge so scrapes observe cooldown expiry too
    gauge!(
        telemetry::CIRCUIT_STATE,
        if state.gateway.circuit_open() { 1.0 } else { 0.0 }
    );
    state.metrics.render()
}
