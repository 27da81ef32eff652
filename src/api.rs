//! Thin HTTP surface over the gateway and the read paths.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::ingest::BehaviorGateway;
use crate::state::SqliteStateStore;
use crate::traits::{BehaviorEvent, NewBehavior};

#[derive(Clone)]
pub struct ApiState {
    pub gateway: Arc<BehaviorGateway>,
    pub state: Arc<SqliteStateStore>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/v1/behaviors",
            post(record_behavior).get(list_behaviors),
        )
        .with_state(state)
}

pub async fn serve(state: ApiState, port: u16) -> anyhow::Result<()> {
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

async fn record_behavior(
    State(api): State<ApiState>,
    Json(input): Json<NewBehavior>,
) -> Result<(StatusCode, Json<BehaviorEvent>), (StatusCode, Json<serde_json::Value>)> {
    match api.gateway.record(input).await {
        Ok(event) => Ok((StatusCode::CREATED, Json(event))),
        Err(e) => {
            error!("Behavior write failed: {:#}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            ))
        }
    }
}

#[derive(Deserialize)]
struct ListQuery {
    user_id: Option<i64>,
    limit: Option<i64>,
}

async fn list_behaviors(
    State(api): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<BehaviorEvent>>, (StatusCode, Json<serde_json::Value>)> {
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    match api.state.list_behaviors(query.user_id, limit).await {
        Ok(events) => Ok(Json(events)),
        Err(e) => {
            error!("Behavior list failed: {:#}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            ))
        }
    }
}
