use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::{
    adapters::http::app_state::AppState,
    app_error::AppResult,
    application::validators::{parse_action, require, require_user_id},
    domain::entities::usage::UsageRecord,
};

#[derive(Deserialize)]
struct ActionPayload {
    action: Option<String>,
}

#[derive(Serialize)]
struct IncrementResponse {
    success: bool,
    usage: UsageRecord,
}

#[derive(Serialize)]
struct CanPerformResponse {
    allowed: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/get/{user_id}", get(get_usage))
        .route("/increment/{user_id}", post(increment))
        .route("/can-perform/{user_id}", get(can_perform))
}

async fn get_usage(
    State(app_state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let user_id = require_user_id(Some(&user_id))?;
    let summary = app_state.subscription_use_cases.get_usage(user_id).await?;
    Ok(Json(summary))
}

async fn increment(
    State(app_state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<ActionPayload>,
) -> AppResult<impl IntoResponse> {
    let user_id = require_user_id(Some(&user_id))?;
    let action = parse_action(require(payload.action.as_deref(), "action")?)?;
    let usage = app_state
        .subscription_use_cases
        .increment_usage(user_id, action)
        .await?;
    Ok(Json(IncrementResponse {
        success: true,
        usage,
    }))
}

async fn can_perform(
    State(app_state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<ActionPayload>,
) -> AppResult<impl IntoResponse> {
    let user_id = require_user_id(Some(&user_id))?;
    let action = parse_action(require(query.action.as_deref(), "action")?)?;
    let allowed = app_state
        .subscription_use_cases
        .can_perform_action(user_id, action)
        .await?;
    Ok(Json(CanPerformResponse { allowed }))
}
