//! DynamoDB-backed implementations of the subscription and usage ports.
//!
//! Both tables are keyed by the `userId` string attribute. Timestamps are stored
//! as RFC 3339 strings, counters as numbers.

use std::collections::HashMap;
use std::fmt::Debug;
use std::str::FromStr;

use aws_sdk_dynamodb::{Client, error::DisplayErrorContext, types::AttributeValue};
use chrono::{DateTime, Utc};

use crate::app_error::AppError;

pub mod subscription;
pub mod usage;

pub(crate) type Item = HashMap<String, AttributeValue>;

pub(crate) const USER_ID: &str = "userId";

#[derive(Clone)]
pub struct DynamoPersistence {
    client: Client,
    subscriptions_table: String,
    usage_table: String,
}

impl DynamoPersistence {
    pub fn new(client: Client, subscriptions_table: String, usage_table: String) -> Self {
        Self {
            client,
            subscriptions_table,
            usage_table,
        }
    }
}

/// Maps an SDK failure to a store error carrying the SDK's error context.
pub(crate) fn store_error<E>(operation: &'static str, table: &str, err: E) -> AppError
where
    E: std::error::Error + Debug + 'static,
{
    let context = DisplayErrorContext(&err).to_string();
    tracing::error!(
        operation,
        table,
        error = %context,
        "DynamoDB request failed"
    );
    AppError::Database(format!("Failed to {operation} item in {table}: {context}"))
}

pub(crate) fn key(user_id: &str) -> (String, AttributeValue) {
    (USER_ID.to_string(), AttributeValue::S(user_id.to_string()))
}

pub(crate) fn s(value: impl Into<String>) -> AttributeValue {
    AttributeValue::S(value.into())
}

pub(crate) fn n(value: impl ToString) -> AttributeValue {
    AttributeValue::N(value.to_string())
}

pub(crate) fn ts(value: DateTime<Utc>) -> AttributeValue {
    AttributeValue::S(value.to_rfc3339())
}

pub(crate) fn get_str<'a>(item: &'a Item, name: &str) -> Option<&'a str> {
    item.get(name).and_then(|v| v.as_s().ok()).map(String::as_str)
}

pub(crate) fn get_num<T: FromStr>(item: &Item, name: &str) -> Option<T> {
    item.get(name)
        .and_then(|v| v.as_n().ok())
        .and_then(|raw| raw.parse().ok())
}

pub(crate) fn get_bool(item: &Item, name: &str) -> Option<bool> {
    item.get(name).and_then(|v| v.as_bool().ok()).copied()
}

/// RFC 3339 string, or legacy epoch seconds written as a number.
pub(crate) fn get_ts(item: &Item, name: &str) -> Option<DateTime<Utc>> {
    match item.get(name)? {
        AttributeValue::S(raw) => DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        AttributeValue::N(raw) => raw
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        _ => None,
    }
}

/// Parse an enum-valued string attribute, logging and falling back on bad data.
pub(crate) fn get_enum<T: FromStr>(item: &Item, name: &str, fallback: T, user_id: &str) -> T {
    match get_str(item, name) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(
                field = name,
                entity_id = user_id,
                raw,
                "Unrecognised attribute value, using fallback"
            );
            fallback
        }),
        None => fallback,
    }
}
