use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    infra::{config::AppConfig, rate_limit::RateLimiterTrait},
    use_cases::subscription::SubscriptionUseCases,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub subscription_use_cases: Arc<SubscriptionUseCases>,
    pub rate_limiter: Arc<dyn RateLimiterTrait>,
}

impl FromRef<AppState> for Arc<SubscriptionUseCases> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.subscription_use_cases.clone()
    }
}
