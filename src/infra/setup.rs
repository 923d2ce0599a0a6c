use std::fs::File;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::http::app_state::AppState,
    infra::{
        config::{AppConfig, StoreBackend},
        dynamo_persistence, postgres_persistence,
        rate_limit::init_rate_limiter,
    },
    use_cases::subscription::{SubscriptionRepo, SubscriptionUseCases, UsageRepo},
};

pub async fn init_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let (subscriptions, usage): (Arc<dyn SubscriptionRepo>, Arc<dyn UsageRepo>) =
        match config.store_backend {
            StoreBackend::Dynamodb => {
                let dynamo = dynamo_persistence(&config).await;
                (
                    dynamo.clone() as Arc<dyn SubscriptionRepo>,
                    dynamo as Arc<dyn UsageRepo>,
                )
            }
            StoreBackend::Postgres => {
                let postgres = postgres_persistence(&config).await?;
                (
                    postgres.clone() as Arc<dyn SubscriptionRepo>,
                    postgres as Arc<dyn UsageRepo>,
                )
            }
        };
    info!(backend = %config.store_backend, "Store backend selected");

    let rate_limiter = init_rate_limiter(
        &config.redis_url,
        config.rate_limit_window_secs,
        config.rate_limit_per_ip,
    )
    .await;

    let subscription_use_cases = SubscriptionUseCases::new(subscriptions, usage);

    Ok(AppState {
        config: Arc::new(config),
        subscription_use_cases: Arc::new(subscription_use_cases),
        rate_limiter,
    })
}

pub fn init_tracing(log_file: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pdf_workbench=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .pretty();

    // File (structured JSON logs), skipped when the file can't be created
    let (json_layer, file_error) = match File::create(log_file) {
        Ok(file) => {
            let layer = fmt::layer()
                .json()
                .with_writer(file)
                .with_current_span(true)
                .with_span_list(true);
            (Some(layer), None)
        }
        Err(err) => (None, Some(err)),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();

    if let Some(err) = file_error {
        warn!(log_file, error = %err, "Cannot create log file, JSON file logging disabled");
    }
}
