use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tracing::info;
use uuid::Uuid;
use vigil_core::{DecodedCall, ExplainReport, TransactionIntent};
use vigil_guard::{Decision, Guard, GuardVerdict};
use vigil_risk::RiskContext;

pub struct ApiState {
    pub guard: Guard,
}

pub fn api_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/explain", post(explain_handler))
        .route("/decode", post(decode_handler))
        .route("/risk", post(risk_handler))
        .route("/guard", post(guard_handler))
        .route("/pending/{id}", get(pending_handler))
        .route("/decision", post(decision_handler))
        .route("/trusted", get(trusted_list_handler).post(trust_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "vigil-api"
    }))
}

async fn explain_handler(
    State(state): State<Arc<ApiState>>,
    Json(intent): Json<TransactionIntent>,
) -> Json<ExplainReport> {
    Json(state.guard.pipeline().explain(&intent).await)
}

async fn decode_handler(
    State(state): State<Arc<ApiState>>,
    Json(intent): Json<TransactionIntent>,
) -> Json<serde_json::Value> {
    let (decoded, abi_source, signature) = state.guard.pipeline().decode_only(&intent).await;
    Json(serde_json::json!({
        "decoded": decoded,
        "abiSource": abi_source,
        "signature": signature,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RiskRequest {
    data: String,
    #[serde(default)]
    decoded: Option<DecodedCall>,
    #[serde(default)]
    bytecode: Option<String>,
    #[serde(default)]
    abi_available: bool,
}

async fn risk_handler(Json(req): Json<RiskRequest>) -> Json<serde_json::Value> {
    let bytecode_meta = req
        .bytecode
        .as_deref()
        .map(|code| vigil_chain::analyze_bytecode(code, false));
    let risk = vigil_risk::evaluate(&RiskContext {
        decoded: req.decoded.as_ref(),
        data: &req.data,
        bytecode: bytecode_meta.as_ref(),
        abi_available: req.abi_available,
        intel: None,
    });
    Json(serde_json::json!({ "risk": risk }))
}

async fn guard_handler(
    State(state): State<Arc<ApiState>>,
    Json(intent): Json<TransactionIntent>,
) -> Result<Json<GuardVerdict>, StatusCode> {
    let verdict = state
        .guard
        .intercept(&intent)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(verdict))
}

async fn pending_handler(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExplainReport>, StatusCode> {
    state
        .guard
        .coordinator()
        .report(&id)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

#[derive(Deserialize)]
struct DecisionEvent {
    id: Uuid,
    decision: Decision,
}

async fn decision_handler(
    State(state): State<Arc<ApiState>>,
    Json(event): Json<DecisionEvent>,
) -> Json<serde_json::Value> {
    // Stale or duplicate events are acknowledged but ignored.
    let accepted = state.guard.coordinator().resolve(event.id, event.decision);
    Json(serde_json::json!({ "accepted": accepted }))
}

#[derive(Deserialize)]
struct TrustRequest {
    address: String,
}

async fn trust_handler(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<TrustRequest>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    state
        .guard
        .trust()
        .mark_trusted(&req.address)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    info!(address = %req.address, "address marked trusted via API");
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

async fn trusted_list_handler(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let addresses = state
        .guard
        .trust()
        .all()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(serde_json::json!({ "addresses": addresses })))
}

pub async fn run_api(
    bind: &str,
    port: u16,
    state: Arc<ApiState>,
) -> Result<(), Box<dyn std::error::Error>> {
    let router = api_router(state);
    let addr = format!("{}:{}", bind, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API server listening on {}", addr);
    axum::serve(listener, router).await?;
    Ok(())
}
