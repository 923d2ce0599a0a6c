use crate::{
    app_error::{AppError, AppResult},
    domain::entities::{billing_period::BillingPeriod, plan::Plan, usage::UsageAction},
};

const MAX_USER_ID_LEN: usize = 128;

/// Validates an identity-provider user id.
/// Rules:
/// - 1-128 characters after trimming
/// - No control characters
pub fn is_valid_user_id(user_id: &str) -> bool {
    let user_id = user_id.trim();
    !user_id.is_empty()
        && user_id.len() <= MAX_USER_ID_LEN
        && !user_id.chars().any(char::is_control)
}

/// Returns the trimmed value of a required field, or `InvalidInput` naming it.
pub fn require<'a>(value: Option<&'a str>, field: &str) -> AppResult<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::InvalidInput(format!("{field} is required"))),
    }
}

pub fn require_user_id(value: Option<&str>) -> AppResult<&str> {
    let user_id = require(value, "userId")?;
    if !is_valid_user_id(user_id) {
        return Err(AppError::InvalidInput("Invalid userId".into()));
    }
    Ok(user_id)
}

pub fn parse_plan(value: &str) -> AppResult<Plan> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::InvalidInput(format!("Invalid plan: {value}")))
}

pub fn parse_billing_period(value: &str) -> AppResult<BillingPeriod> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::InvalidInput(format!("Invalid billing period: {value}")))
}

pub fn parse_action(value: &str) -> AppResult<UsageAction> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::InvalidInput(format!("Invalid action: {value}")))
}
