use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::errors::AppError;
use crate::models::Person;
use crate::store::PersonStore;
use crate::sync::{SyncConnector, SyncOutcome};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Record store (system of record).
    pub store: Arc<dyn PersonStore>,
    /// Connector for the two sync flows.
    pub connector: Arc<SyncConnector>,
    /// Routing policy over mutation events.
    pub dispatcher: Dispatcher,
    /// Application configuration.
    pub config: Config,
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "rust-profile-sync",
            "version": "0.1.0"
        })),
    )
}

/// GET /api/v1/persons/:id
///
/// Retrieves a person record by its local id.
pub async fn get_person(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Person>, AppError> {
    tracing::info!("GET /persons/{}", id);

    let person = state.store.get_by_id(id).await?;
    Ok(Json(person))
}

/// POST /api/v1/sync/pull/:external_id
///
/// Manual trigger for the pull flow. Unlike the webhook path this runs the
/// callout inline and reports its outcome, which makes it useful for
/// operational replays and debugging.
pub async fn trigger_pull(
    State(state): State<Arc<AppState>>,
    Path(external_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!("POST /sync/pull/{}", external_id);

    let outcome = state.connector.pull_and_upsert(&external_id).await?;
    Ok(Json(outcome_body(&outcome)))
}

/// POST /api/v1/sync/push/:id
///
/// Manual trigger for the push flow, run inline like `trigger_pull`.
pub async fn trigger_push(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::info!("POST /sync/push/{}", id);

    let outcome = state.connector.push_and_stamp(id).await?;
    Ok(Json(outcome_body(&outcome)))
}

fn outcome_body(outcome: &SyncOutcome) -> serde_json::Value {
    match outcome {
        SyncOutcome::Applied => json!({ "outcome": "applied" }),
        SyncOutcome::RemoteRejected { status } => json!({
            "outcome": "remote_rejected",
            "status": status,
        }),
    }
}
