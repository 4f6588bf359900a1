use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::controller::Controller;
use crate::error::{ArbError, Result};
use crate::models::{ParserRequest, ParserResponse, TrancheRow};
use crate::sources::AccessKeys;

#[derive(Clone)]
pub struct AppState {
    pub controller: Controller,
    pub keys: Arc<dyn AccessKeys>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/online-parser-okx", get(online_parser).post(online_parser))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// GET|POST /online-parser-okx
/// Body: { key, loop_id, currency_name, profit? | amount? }
pub async fn online_parser(
    State(state): State<AppState>,
    Json(payload): Json<ParserRequest>,
) -> Result<Json<ParserResponse>> {
    let key = payload.key.as_deref().unwrap_or_default();
    if key.is_empty() || !state.keys.check_key(key).await? {
        return Err(ArbError::Unauthorized);
    }

    let loop_id = payload
        .loop_id
        .ok_or_else(|| ArbError::InvalidRequest("loop_id is required".to_string()))?;
    let base = payload
        .currency_name
        .as_deref()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ArbError::InvalidRequest("currency_name is required".to_string()))?;
    info!(loop_id, base, "online parser request");

    let result = state
        .controller
        .evaluate(loop_id, base, payload.profit, payload.amount)
        .await?;

    let method = state.controller.venue().method.clone();
    Ok(Json(ParserResponse {
        profit: result.profit_fraction,
        amount: result.matched_amount,
        data: result.emitted_tranches.iter().map(|t| TrancheRow::from_tranche(t, &method)).collect(),
    }))
}
