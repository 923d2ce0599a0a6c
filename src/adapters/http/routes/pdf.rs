use axum::{Json, Router, response::IntoResponse, routing::post};
use serde::{Deserialize, Serialize};

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    domain::page_order::SequenceType,
};

const MAX_PAGE_COUNT: i64 = 10_000;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageOrderPayload {
    page_count: i64,
    sequence_type: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageOrderResponse {
    /// The sequence actually applied; unknown tokens resolve to "9".
    sequence_type: &'static str,
    order: Vec<usize>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/page-order", post(page_order))
}

async fn page_order(Json(payload): Json<PageOrderPayload>) -> AppResult<impl IntoResponse> {
    if payload.page_count > MAX_PAGE_COUNT {
        return Err(AppError::InvalidInput(format!(
            "pageCount must not exceed {MAX_PAGE_COUNT}"
        )));
    }
    // Negative counts degrade to an empty document.
    let n = usize::try_from(payload.page_count).unwrap_or(0);
    let sequence = payload
        .sequence_type
        .as_deref()
        .map(SequenceType::from_token)
        .unwrap_or_default();

    Ok(Json(PageOrderResponse {
        sequence_type: sequence.token(),
        order: sequence.order(n),
    }))
}
