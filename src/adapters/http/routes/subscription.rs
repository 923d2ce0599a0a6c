use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    application::validators::{parse_billing_period, parse_plan, require, require_user_id},
    domain::entities::subscription::Subscription,
    use_cases::subscription::UpgradePlanInput,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FreePayload {
    user_id: Option<String>,
}

/// Expiry as sent by clients: RFC 3339, or epoch seconds from older builds.
#[derive(Deserialize)]
#[serde(untagged)]
enum ExpiryInput {
    EpochSeconds(i64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpgradePayload {
    user_id: Option<String>,
    plan: Option<String>,
    expiry: Option<ExpiryInput>,
    payment_id: Option<String>,
    billing_period: Option<String>,
}

#[derive(Serialize)]
struct SuccessResponse {
    success: bool,
}

#[derive(Serialize)]
struct UpgradeResponse {
    success: bool,
    subscription: Subscription,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/free", post(create_free))
        .route("/upgrade", post(upgrade))
        .route("/get/{user_id}", get(get_subscription))
        .route("/status/{user_id}", get(status))
}

fn parse_expiry(input: ExpiryInput) -> AppResult<DateTime<Utc>> {
    let invalid = || AppError::InvalidInput("Invalid expiry".into());
    match input {
        ExpiryInput::EpochSeconds(secs) => DateTime::from_timestamp(secs, 0).ok_or_else(invalid),
        ExpiryInput::Text(raw) => {
            let raw = raw.trim();
            if let Ok(secs) = raw.parse::<i64>() {
                return DateTime::from_timestamp(secs, 0).ok_or_else(invalid);
            }
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| invalid())
        }
    }
}

async fn create_free(
    State(app_state): State<AppState>,
    Json(payload): Json<FreePayload>,
) -> AppResult<impl IntoResponse> {
    let user_id = require_user_id(payload.user_id.as_deref())?;
    app_state
        .subscription_use_cases
        .create_free_subscription(user_id)
        .await?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn upgrade(
    State(app_state): State<AppState>,
    Json(payload): Json<UpgradePayload>,
) -> AppResult<impl IntoResponse> {
    let user_id = require_user_id(payload.user_id.as_deref())?;
    let plan = parse_plan(require(payload.plan.as_deref(), "plan")?)?;
    let billing_period = payload
        .billing_period
        .as_deref()
        .map(parse_billing_period)
        .transpose()?;
    let expiry = payload.expiry.map(parse_expiry).transpose()?;

    let subscription = app_state
        .subscription_use_cases
        .upgrade_plan(UpgradePlanInput {
            user_id: user_id.to_string(),
            plan,
            expiry,
            payment_id: payload.payment_id.filter(|p| !p.trim().is_empty()),
            billing_period,
        })
        .await?;

    Ok(Json(UpgradeResponse {
        success: true,
        subscription,
    }))
}

async fn get_subscription(
    State(app_state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let user_id = require_user_id(Some(&user_id))?;
    let subscription = app_state
        .subscription_use_cases
        .find_subscription(user_id)
        .await?;
    Ok(Json(subscription))
}

async fn status(
    State(app_state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let user_id = require_user_id(Some(&user_id))?;
    let view = app_state
        .subscription_use_cases
        .subscription_status(user_id)
        .await?;
    Ok(Json(view))
}
