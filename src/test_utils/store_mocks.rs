//! In-memory mock implementations of the store and rate-limiter traits.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::subscription::{SubscriptionRepo, UsageRepo},
    domain::entities::{
        plan::Plan,
        subscription::Subscription,
        usage::{UsageAction, UsageGuard, UsageRecord},
    },
    infra::rate_limit::RateLimiterTrait,
};

fn injected_failure() -> AppError {
    AppError::Database("injected store failure".into())
}

// ============================================================================
// InMemorySubscriptionRepo
// ============================================================================

#[derive(Default)]
pub struct InMemorySubscriptionRepo {
    pub subscriptions: Mutex<HashMap<String, Subscription>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    puts: AtomicUsize,
}

impl InMemorySubscriptionRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscriptions(subscriptions: Vec<Subscription>) -> Self {
        let repo = Self::new();
        for subscription in subscriptions {
            repo.insert(subscription);
        }
        repo
    }

    /// Seed a record without counting it as a write.
    pub fn insert(&self, subscription: Subscription) {
        self.subscriptions
            .lock()
            .unwrap()
            .insert(subscription.user_id.clone(), subscription);
    }

    pub fn get(&self, user_id: &str) -> Option<Subscription> {
        self.subscriptions.lock().unwrap().get(user_id).cloned()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of `put_subscription` calls made through the trait.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubscriptionRepo for InMemorySubscriptionRepo {
    async fn get_subscription(&self, user_id: &str) -> AppResult<Option<Subscription>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        Ok(self.get(user_id))
    }

    async fn put_subscription(&self, subscription: &Subscription) -> AppResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.insert(subscription.clone());
        Ok(())
    }
}

// ============================================================================
// InMemoryUsageRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryUsageRepo {
    pub records: Mutex<HashMap<String, UsageRecord>>,
    fail_writes: AtomicBool,
}

impl InMemoryUsageRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, usage: UsageRecord) {
        self.records
            .lock()
            .unwrap()
            .insert(usage.user_id.clone(), usage);
    }

    pub fn get(&self, user_id: &str) -> Option<UsageRecord> {
        self.records.lock().unwrap().get(user_id).cloned()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl UsageRepo for InMemoryUsageRepo {
    async fn get_usage(&self, user_id: &str) -> AppResult<Option<UsageRecord>> {
        Ok(self.get(user_id))
    }

    async fn put_usage(&self, usage: &UsageRecord) -> AppResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        self.insert(usage.clone());
        Ok(())
    }

    async fn increment_usage(
        &self,
        user_id: &str,
        action: UsageAction,
        plan: Plan,
        guard: Option<&UsageGuard>,
    ) -> AppResult<Option<UsageRecord>> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        let mut records = self.records.lock().unwrap();
        let Some(usage) = records.get_mut(user_id) else {
            return Ok(None);
        };
        if guard.is_some_and(|g| !g.admits(usage)) {
            return Ok(None);
        }
        usage.increment(action);
        usage.plan = plan;
        Ok(Some(usage.clone()))
    }
}

// ============================================================================
// InMemoryRateLimiter
// ============================================================================

/// In-memory rate limiter for testing.
/// Uses HashMap to track request counts per key.
pub struct InMemoryRateLimiter {
    counts: Mutex<HashMap<String, u64>>,
    max_per_ip: u64,
}

impl InMemoryRateLimiter {
    pub fn new(max_per_ip: u64) -> Self {
        Self {
            counts: Mutex::new(HashMap::new()),
            max_per_ip,
        }
    }

    /// Create a permissive rate limiter that never blocks (for most tests).
    pub fn permissive() -> Self {
        Self::new(u64::MAX)
    }
}

#[async_trait]
impl RateLimiterTrait for InMemoryRateLimiter {
    async fn check(&self, ip: &str) -> AppResult<()> {
        let mut counts = self.counts.lock().unwrap();
        let count = counts.entry(format!("rate:ip:{ip}")).or_insert(0);
        *count += 1;
        if *count > self.max_per_ip {
            return Err(AppError::RateLimited);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_usage;

    #[tokio::test]
    async fn test_increment_respects_guard() {
        let repo = InMemoryUsageRepo::new();
        repo.insert(create_test_usage("u1", |u| u.pdf_uploads = 1));
        let guard = UsageGuard {
            limit: 1,
            actions: vec![UsageAction::PdfUploads],
        };

        let result = repo
            .increment_usage("u1", UsageAction::PdfUploads, Plan::Free, Some(&guard))
            .await
            .unwrap();
        assert!(result.is_none());
        assert_eq!(repo.get("u1").unwrap().pdf_uploads, 1);
    }

    #[tokio::test]
    async fn test_increment_missing_record() {
        let repo = InMemoryUsageRepo::new();
        let result = repo
            .increment_usage("ghost", UsageAction::PdfUploads, Plan::Free, None)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_rate_limiter_blocks_after_limit() {
        let limiter = InMemoryRateLimiter::new(2);
        assert!(limiter.check("1.2.3.4").await.is_ok());
        assert!(limiter.check("1.2.3.4").await.is_ok());
        assert!(matches!(
            limiter.check("1.2.3.4").await,
            Err(AppError::RateLimited)
        ));
        assert!(limiter.check("5.6.7.8").await.is_ok());
    }
}
