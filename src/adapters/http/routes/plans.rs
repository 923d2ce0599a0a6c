use axum::{Json, Router, response::IntoResponse, routing::get};
use serde::Serialize;

use crate::{
    adapters::http::app_state::AppState,
    domain::entities::{
        billing_period::BillingPeriod,
        plan::{Plan, PlanLimits},
    },
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanEntry {
    plan: Plan,
    limits: PlanLimits,
    /// `None` for plans that never expire.
    default_billing_period: Option<BillingPeriod>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/plans", get(list_plans))
}

async fn list_plans() -> impl IntoResponse {
    let catalog: Vec<PlanEntry> = Plan::all()
        .into_iter()
        .map(|plan| PlanEntry {
            plan,
            limits: plan.limits(),
            default_billing_period: plan.is_paid().then(|| plan.default_billing_period()),
        })
        .collect();
    Json(catalog)
}
