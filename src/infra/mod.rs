use std::sync::Arc;

use secrecy::ExposeSecret;

use crate::{
    adapters::{dynamodb::DynamoPersistence, persistence::PostgresPersistence},
    infra::{config::AppConfig, db::init_db, dynamo::init_dynamodb, error::InfraError},
};

pub mod app;
pub mod config;
pub mod db;
pub mod dynamo;
pub mod error;
pub mod rate_limit;
pub mod setup;

pub async fn postgres_persistence(
    config: &AppConfig,
) -> Result<Arc<PostgresPersistence>, InfraError> {
    let database_url = config
        .database_url
        .as_ref()
        .ok_or(InfraError::ConfigMissing { var: "DATABASE_URL" })?;
    let pool = init_db(database_url.expose_secret()).await?;
    Ok(Arc::new(PostgresPersistence::new(pool)))
}

pub async fn dynamo_persistence(config: &AppConfig) -> Arc<DynamoPersistence> {
    let client = init_dynamodb(config).await;
    Arc::new(DynamoPersistence::new(
        client,
        config.subscriptions_table.clone(),
        config.usage_table.clone(),
    ))
}
