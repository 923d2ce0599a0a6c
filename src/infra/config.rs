use std::net::SocketAddr;

use axum::http::HeaderValue;
use env_helpers::get_env_default;
use secrecy::SecretString;
use strum::{AsRefStr, Display, EnumString};

/// Which key-value store backs the subscription and usage tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StoreBackend {
    Dynamodb,
    Postgres,
}

pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub cors_origin: HeaderValue,
    pub store_backend: StoreBackend,
    /// Only read when `store_backend` is Postgres.
    pub database_url: Option<SecretString>,
    pub subscriptions_table: String,
    pub usage_table: String,
    /// Custom endpoint for DynamoDB Local or LocalStack.
    pub dynamodb_endpoint: Option<String>,
    pub aws_region: String,
    pub redis_url: String,
    pub rate_limit_window_secs: u64,
    pub rate_limit_per_ip: u64,
    /// Whether to trust X-Forwarded-For headers. Set to true when behind a reverse proxy.
    /// Only enable this when the API is not directly exposed to the internet.
    pub trust_proxy: bool,
    pub log_file: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let bind_addr: SocketAddr = get_env_default(
            "BIND_ADDR",
            SocketAddr::from(([127, 0, 0, 1], 3001)),
        );
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .expect("CORS_ORIGIN must be a valid header value");

        let store_backend: StoreBackend = get_env_default("STORE_BACKEND", String::from("dynamodb"))
            .parse()
            .expect("STORE_BACKEND must be `dynamodb` or `postgres`");
        let database_url: Option<SecretString> = std::env::var("DATABASE_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .map(|s| SecretString::new(s.into()));
        let subscriptions_table: String =
            get_env_default("SUBSCRIPTIONS_TABLE", "Subscriptions".to_string());
        let usage_table: String = get_env_default("USAGE_TABLE", "UserUsage".to_string());
        let dynamodb_endpoint: Option<String> = std::env::var("DYNAMODB_ENDPOINT")
            .ok()
            .filter(|s| !s.is_empty());
        let aws_region: String = get_env_default("AWS_REGION", "us-east-1".to_string());

        let redis_url: String = get_env_default("REDIS_URL", "redis://127.0.0.1:6379".to_string());
        let rate_limit_window_secs: u64 = get_env_default("RATE_LIMIT_WINDOW_SECS", 60);
        let rate_limit_per_ip: u64 = get_env_default("RATE_LIMIT_PER_IP", 120);
        // Default to false - must explicitly enable when behind a trusted proxy
        let trust_proxy: bool = get_env_default("TRUST_PROXY", false);
        let log_file: String = get_env_default("LOG_FILE", "app.log".to_string());

        Self {
            bind_addr,
            cors_origin,
            store_backend,
            database_url,
            subscriptions_table,
            usage_table,
            dynamodb_endpoint,
            aws_region,
            redis_url,
            rate_limit_window_secs,
            rate_limit_per_ip,
            trust_proxy,
            log_file,
        }
    }
}
