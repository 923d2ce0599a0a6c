//! Test app state builder for HTTP-level integration testing.
//!
//! This module provides `TestAppStateBuilder` which creates a minimal `AppState`
//! backed by in-memory stores for testing HTTP endpoints.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;

use crate::{
    adapters::http::app_state::AppState,
    application::use_cases::subscription::SubscriptionUseCases,
    domain::entities::{subscription::Subscription, usage::UsageRecord},
    infra::{
        config::{AppConfig, StoreBackend},
        rate_limit::RateLimiterTrait,
    },
    test_utils::{InMemoryRateLimiter, InMemorySubscriptionRepo, InMemoryUsageRepo},
};

/// Builder for creating `AppState` with in-memory mocks for testing.
///
/// # Example
///
/// ```ignore
/// let subscription = create_test_subscription("user-1", |s| s.plan = Plan::Pro);
///
/// let (app_state, subs, usage) = TestAppStateBuilder::new()
///     .with_subscription(subscription)
///     .build_with_stores();
/// ```
pub struct TestAppStateBuilder {
    subscriptions: Vec<Subscription>,
    usage: Vec<UsageRecord>,
    rate_limiter: Option<Arc<dyn RateLimiterTrait>>,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            subscriptions: vec![],
            usage: vec![],
            rate_limiter: None,
        }
    }

    /// Seed a subscription record.
    pub fn with_subscription(mut self, subscription: Subscription) -> Self {
        self.subscriptions.push(subscription);
        self
    }

    /// Seed a usage record.
    pub fn with_usage(mut self, usage: UsageRecord) -> Self {
        self.usage.push(usage);
        self
    }

    /// Replace the permissive default limiter.
    pub fn with_rate_limiter(mut self, rate_limiter: Arc<dyn RateLimiterTrait>) -> Self {
        self.rate_limiter = Some(rate_limiter);
        self
    }

    /// Build the AppState and hand back the stores for assertions.
    pub fn build_with_stores(
        self,
    ) -> (
        AppState,
        Arc<InMemorySubscriptionRepo>,
        Arc<InMemoryUsageRepo>,
    ) {
        let subscriptions = Arc::new(InMemorySubscriptionRepo::with_subscriptions(
            self.subscriptions,
        ));
        let usage = Arc::new(InMemoryUsageRepo::new());
        for record in self.usage {
            usage.insert(record);
        }

        let subscription_use_cases = Arc::new(SubscriptionUseCases::new(
            subscriptions.clone(),
            usage.clone(),
        ));

        let config = Arc::new(AppConfig {
            bind_addr: "127.0.0.1:3001".parse::<SocketAddr>().unwrap(),
            cors_origin: HeaderValue::from_static("http://localhost:3000"),
            store_backend: StoreBackend::Dynamodb,
            database_url: None,
            subscriptions_table: "Subscriptions".to_string(),
            usage_table: "UserUsage".to_string(),
            dynamodb_endpoint: None,
            aws_region: "us-east-1".to_string(),
            redis_url: String::new(),
            rate_limit_window_secs: 60,
            rate_limit_per_ip: 120,
            trust_proxy: false,
            log_file: "test.log".to_string(),
        });

        let rate_limiter = self
            .rate_limiter
            .unwrap_or_else(|| Arc::new(InMemoryRateLimiter::permissive()));

        let app_state = AppState {
            config,
            subscription_use_cases,
            rate_limiter,
        };
        (app_state, subscriptions, usage)
    }

    /// Build the AppState with all configured mocks.
    pub fn build(self) -> AppState {
        self.build_with_stores().0
    }
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
