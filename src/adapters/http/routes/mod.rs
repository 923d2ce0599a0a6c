pub mod health;
pub mod pdf;
pub mod plans;
pub mod subscription;
pub mod usage;

use axum::Router;

use crate::adapters::http::app_state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/subscription", subscription::router())
        .nest("/usage", usage::router())
        .nest("/pdf", pdf::router())
        .merge(plans::router())
        .merge(health::router())
}
