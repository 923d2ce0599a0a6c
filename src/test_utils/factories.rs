//! Test data factories for creating valid test fixtures.
//!
//! Each factory function creates a complete, valid object with sensible defaults.
//! Use the closure parameter to override specific fields as needed.

use chrono::Utc;

use crate::domain::entities::{
    plan::Plan,
    subscription::Subscription,
    usage::UsageRecord,
};

/// Create a test subscription with sensible defaults (active free plan bought now).
pub fn create_test_subscription(
    user_id: &str,
    overrides: impl FnOnce(&mut Subscription),
) -> Subscription {
    let mut subscription = Subscription::free(user_id, Utc::now());
    overrides(&mut subscription);
    subscription
}

/// Create a test usage record with sensible defaults (free plan, zero counters, reset now).
pub fn create_test_usage(user_id: &str, overrides: impl FnOnce(&mut UsageRecord)) -> UsageRecord {
    let mut usage = UsageRecord::zeroed(user_id, Plan::Free, Utc::now());
    overrides(&mut usage);
    usage
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::subscription::SubscriptionStatus;

    #[test]
    fn test_create_test_subscription_defaults() {
        let sub = create_test_subscription("u1", |_| {});
        assert_eq!(sub.user_id, "u1");
        assert_eq!(sub.plan, Plan::Free);
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert!(sub.expiry.is_none());
    }

    #[test]
    fn test_create_test_usage_overrides() {
        let usage = create_test_usage("u1", |u| u.pdf_uploads = 3);
        assert_eq!(usage.pdf_uploads, 3);
        assert_eq!(usage.pdf_compress, 0);
    }
}
