use std::str::FromStr;

use sqlx::PgPool;

use crate::app_error::AppError;

pub mod subscription;
pub mod usage;

const MAX_JSON_LOG_LEN: usize = 200;

/// Parse JSON value to target type, logging warning on failure.
///
/// Handles NULL gracefully (returns default without logging).
/// Only logs warnings for actual parse failures (type mismatches, corruption).
pub fn parse_json_with_fallback<T: serde::de::DeserializeOwned + Default>(
    json: &serde_json::Value,
    field_name: &str,
    entity_type: &str,
    entity_id: &str,
) -> T {
    // SQL NULL becomes Value::Null - treat as valid empty state, no warning
    if json.is_null() {
        return T::default();
    }

    serde_json::from_value(json.clone()).unwrap_or_else(|err| {
        // Truncate raw JSON to prevent log bloat
        let raw_str = json.to_string();
        let truncated = if raw_str.chars().count() > MAX_JSON_LOG_LEN {
            let head: String = raw_str.chars().take(MAX_JSON_LOG_LEN).collect();
            format!("{head}...")
        } else {
            raw_str
        };

        tracing::warn!(
            field = field_name,
            entity_type = entity_type,
            entity_id = entity_id,
            raw_json = %truncated,
            error = %err,
            "Failed to parse JSON field, using default value"
        );
        T::default()
    })
}

/// Parse a text column into an enum, logging a warning and using `fallback` on failure.
pub fn parse_text_with_fallback<T: FromStr>(
    raw: &str,
    fallback: T,
    field_name: &str,
    entity_type: &str,
    entity_id: &str,
) -> T {
    raw.parse().unwrap_or_else(|_| {
        tracing::warn!(
            field = field_name,
            entity_type = entity_type,
            entity_id = entity_id,
            raw = raw,
            "Failed to parse text field, using fallback value"
        );
        fallback
    })
}

#[derive(Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    pub fn new(pool: PgPool) -> Self {
        PostgresPersistence { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound,
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                // PostgreSQL check violation (negative counters)
                if msg.contains("violates check constraint") {
                    AppError::InvalidInput("Value out of range".into())
                } else if msg.contains("null value") && msg.contains("violates not-null") {
                    AppError::InvalidInput("Required field is missing".into())
                } else {
                    tracing::error!(error = ?err, "Database error");
                    AppError::Database(format!("Database operation failed: {err}"))
                }
            }
            _ => {
                tracing::error!(error = ?err, "Database error");
                AppError::Database(format!("Database operation failed: {err}"))
            }
        }
    }
}
