use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::{Client, config::Region};
use tracing::info;

use crate::infra::config::AppConfig;

/// Builds a DynamoDB client from the ambient AWS credential chain.
///
/// `DYNAMODB_ENDPOINT` overrides the service endpoint for DynamoDB Local.
pub async fn init_dynamodb(config: &AppConfig) -> Client {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.aws_region.clone()));
    if let Some(endpoint) = &config.dynamodb_endpoint {
        loader = loader.endpoint_url(endpoint);
    }
    let sdk_config = loader.load().await;

    info!(
        region = %config.aws_region,
        endpoint = ?config.dynamodb_endpoint,
        subscriptions_table = %config.subscriptions_table,
        usage_table = %config.usage_table,
        "DynamoDB client configured"
    );
    Client::new(&sdk_config)
}
