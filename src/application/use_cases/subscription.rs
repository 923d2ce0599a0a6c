use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::{
        billing_period::BillingPeriod,
        plan::{DailyLimit, Plan, PlanLimits},
        subscription::{Subscription, SubscriptionStatus, Transition},
        usage::{UsageAction, UsageGuard, UsageRecord, usage_guard},
    },
};

/// Primary-key store for subscription records.
#[async_trait]
pub trait SubscriptionRepo: Send + Sync {
    async fn get_subscription(&self, user_id: &str) -> AppResult<Option<Subscription>>;
    async fn put_subscription(&self, subscription: &Subscription) -> AppResult<()>;
}

/// Primary-key store for usage records.
#[async_trait]
pub trait UsageRepo: Send + Sync {
    async fn get_usage(&self, user_id: &str) -> AppResult<Option<UsageRecord>>;
    async fn put_usage(&self, usage: &UsageRecord) -> AppResult<()>;

    /// Adds one to the `action` counter and stamps `plan`, in a single conditional
    /// write. When `guard` is given the write only applies if the stored record
    /// still satisfies it. Returns `None` if the record is missing or the guard
    /// rejected the write.
    async fn increment_usage(
        &self,
        user_id: &str,
        action: UsageAction,
        plan: Plan,
        guard: Option<&UsageGuard>,
    ) -> AppResult<Option<UsageRecord>>;
}

#[derive(Debug, Clone)]
pub struct UpgradePlanInput {
    pub user_id: String,
    pub plan: Plan,
    pub expiry: Option<DateTime<Utc>>,
    pub payment_id: Option<String>,
    pub billing_period: Option<BillingPeriod>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatusView {
    pub has_subscription: bool,
    pub plan: Plan,
    pub status: SubscriptionStatus,
    pub subscription: Option<Subscription>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummary {
    pub usage: UsageRecord,
    pub limits: PlanLimits,
    /// `-1` when unlimited.
    pub daily_limit: i64,
    /// Actions left today per action; `-1` when unlimited.
    pub remaining: BTreeMap<UsageAction, i64>,
    pub can_perform_action: bool,
}

#[derive(Clone)]
pub struct SubscriptionUseCases {
    subscriptions: Arc<dyn SubscriptionRepo>,
    usage: Arc<dyn UsageRepo>,
}

impl SubscriptionUseCases {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepo>, usage: Arc<dyn UsageRepo>) -> Self {
        Self {
            subscriptions,
            usage,
        }
    }

    /// Provisions a free subscription and zeroed usage. An existing record is
    /// returned untouched.
    #[instrument(skip(self))]
    pub async fn create_free_subscription(&self, user_id: &str) -> AppResult<Subscription> {
        let now = Utc::now();
        match self.subscriptions.get_subscription(user_id).await? {
            Some(existing) => self.reconcile(existing, now).await,
            None => self.provision_free(user_id, now).await,
        }
    }

    /// Subscription for `user_id`, created on first access and downgraded if lapsed.
    #[instrument(skip(self))]
    pub async fn get_user_subscription(&self, user_id: &str) -> AppResult<Subscription> {
        self.load_or_provision(user_id, Utc::now()).await
    }

    /// Like [`Self::get_user_subscription`] but never provisions.
    #[instrument(skip(self))]
    pub async fn find_subscription(&self, user_id: &str) -> AppResult<Option<Subscription>> {
        let now = Utc::now();
        match self.subscriptions.get_subscription(user_id).await? {
            Some(subscription) => Ok(Some(self.reconcile(subscription, now).await?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn subscription_status(&self, user_id: &str) -> AppResult<SubscriptionStatusView> {
        Ok(match self.find_subscription(user_id).await? {
            Some(subscription) => SubscriptionStatusView {
                has_subscription: true,
                plan: subscription.plan,
                status: subscription.status,
                subscription: Some(subscription),
            },
            None => SubscriptionStatusView {
                has_subscription: false,
                plan: Plan::Free,
                status: SubscriptionStatus::Active,
                subscription: None,
            },
        })
    }

    /// The stored plan while the subscription is active, otherwise free.
    #[instrument(skip(self))]
    pub async fn get_current_plan(&self, user_id: &str) -> AppResult<Plan> {
        let subscription = self.load_or_provision(user_id, Utc::now()).await?;
        Ok(subscription.effective_plan())
    }

    #[instrument(skip(self))]
    pub async fn can_perform_action(&self, user_id: &str, action: UsageAction) -> AppResult<bool> {
        let now = Utc::now();
        let subscription = self.load_or_provision(user_id, now).await?;
        let plan = subscription.effective_plan();
        let limits = plan.limits();
        let usage = self.current_usage(user_id, plan, &limits, now).await?;
        Ok(usage.allows(action, plan, &limits))
    }

    /// Records one `action`. The limit is checked up front and enforced again by
    /// the store's conditional write, so concurrent callers cannot overshoot it.
    #[instrument(skip(self))]
    pub async fn increment_usage(
        &self,
        user_id: &str,
        action: UsageAction,
    ) -> AppResult<UsageRecord> {
        let now = Utc::now();
        let subscription = self.load_or_provision(user_id, now).await?;
        let plan = subscription.effective_plan();
        let limits = plan.limits();
        let usage = self.current_usage(user_id, plan, &limits, now).await?;

        if !usage.allows(action, plan, &limits) {
            warn!(user_id, %action, %plan, "Usage limit reached");
            return Err(AppError::UsageLimitExceeded);
        }

        let guard = usage_guard(action, plan, &limits);
        match self
            .usage
            .increment_usage(user_id, action, plan, guard.as_ref())
            .await?
        {
            Some(updated) => {
                debug!(user_id, %action, count = updated.count(action), "Usage incremented");
                Ok(updated)
            }
            None => {
                warn!(user_id, %action, %plan, "Conditional usage increment rejected");
                Err(AppError::UsageLimitExceeded)
            }
        }
    }

    /// Usage counters for `user_id` after any pending daily reset.
    #[instrument(skip(self))]
    pub async fn get_usage(&self, user_id: &str) -> AppResult<UsageSummary> {
        let now = Utc::now();
        let subscription = self.load_or_provision(user_id, now).await?;
        let plan = subscription.effective_plan();
        let limits = plan.limits();
        let usage = self.current_usage(user_id, plan, &limits, now).await?;

        let remaining = UsageAction::all()
            .into_iter()
            .map(|action| (action, remaining_for(&usage, action, plan, &limits)))
            .collect();
        let can_perform_action = UsageAction::all()
            .into_iter()
            .any(|action| usage.allows(action, plan, &limits));

        Ok(UsageSummary {
            daily_limit: limits.daily.as_raw(),
            usage,
            limits,
            remaining,
            can_perform_action,
        })
    }

    /// Writes the purchased plan, then carries the usage record over to it.
    ///
    /// A failed usage transfer is logged and ignored: the payment already went
    /// through and the subscription write must stand.
    #[instrument(skip(self), fields(user_id = %input.user_id, plan = %input.plan))]
    pub async fn upgrade_plan(&self, input: UpgradePlanInput) -> AppResult<Subscription> {
        let now = Utc::now();
        if let Some(expiry) = input.expiry
            && expiry <= now
        {
            return Err(AppError::InvalidInput("expiry must be in the future".into()));
        }

        let billing_period = input
            .billing_period
            .unwrap_or_else(|| input.plan.default_billing_period());
        let subscription = Subscription::purchased(
            &input.user_id,
            input.plan,
            billing_period,
            input.expiry,
            input.payment_id,
            now,
        );
        self.subscriptions.put_subscription(&subscription).await?;

        let stored = self
            .subscriptions
            .get_subscription(&input.user_id)
            .await?
            .ok_or_else(|| AppError::Internal("Subscription write could not be verified".into()))?;

        if let Err(err) = self.transfer_usage(&input.user_id, input.plan, now).await {
            warn!(
                user_id = %input.user_id,
                error = ?err,
                "Usage transfer failed after upgrade; subscription kept"
            );
        }

        info!(
            user_id = %stored.user_id,
            plan = %stored.plan,
            expiry = ?stored.expiry,
            "Plan upgraded"
        );
        Ok(stored)
    }

    /// Moves a lapsed subscription to the free tier and zeroes its usage.
    #[instrument(skip(self, subscription), fields(user_id = %subscription.user_id))]
    pub async fn downgrade_expired_plan(
        &self,
        subscription: &Subscription,
    ) -> AppResult<Subscription> {
        self.downgrade_at(subscription, Utc::now()).await
    }

    async fn downgrade_at(
        &self,
        subscription: &Subscription,
        now: DateTime<Utc>,
    ) -> AppResult<Subscription> {
        let downgraded = subscription.downgraded(now);
        self.subscriptions.put_subscription(&downgraded).await?;
        self.usage
            .put_usage(&UsageRecord::zeroed(&subscription.user_id, Plan::Free, now))
            .await?;

        info!(
            user_id = %subscription.user_id,
            previous_plan = %subscription.plan,
            expired_at = ?subscription.effective_expiry(),
            "Subscription expired, downgraded to free"
        );
        Ok(downgraded)
    }

    /// Applies any transition due at `now`. Shared by every read and write path.
    async fn reconcile(
        &self,
        subscription: Subscription,
        now: DateTime<Utc>,
    ) -> AppResult<Subscription> {
        match subscription.transition(now) {
            Transition::Current => Ok(subscription),
            Transition::Expired => self.downgrade_at(&subscription, now).await,
        }
    }

    async fn load_or_provision(&self, user_id: &str, now: DateTime<Utc>) -> AppResult<Subscription> {
        match self.subscriptions.get_subscription(user_id).await? {
            Some(subscription) => self.reconcile(subscription, now).await,
            None => self.provision_free(user_id, now).await,
        }
    }

    async fn provision_free(&self, user_id: &str, now: DateTime<Utc>) -> AppResult<Subscription> {
        let subscription = Subscription::free(user_id, now);
        self.subscriptions.put_subscription(&subscription).await?;
        if self.usage.get_usage(user_id).await?.is_none() {
            self.usage
                .put_usage(&UsageRecord::zeroed(user_id, Plan::Free, now))
                .await?;
        }
        info!(user_id, "Provisioned free subscription");
        Ok(subscription)
    }

    /// Stored usage for the user, zeroed first if the daily window rolled over.
    async fn current_usage(
        &self,
        user_id: &str,
        plan: Plan,
        limits: &PlanLimits,
        now: DateTime<Utc>,
    ) -> AppResult<UsageRecord> {
        match self.usage.get_usage(user_id).await? {
            Some(mut usage) => {
                if usage.needs_daily_reset(limits, now) {
                    usage.reset(now);
                    usage.plan = plan;
                    self.usage.put_usage(&usage).await?;
                    debug!(user_id, "Daily usage reset");
                }
                Ok(usage)
            }
            None => {
                let usage = UsageRecord::zeroed(user_id, plan, now);
                self.usage.put_usage(&usage).await?;
                Ok(usage)
            }
        }
    }

    async fn transfer_usage(&self, user_id: &str, plan: Plan, now: DateTime<Utc>) -> AppResult<()> {
        let usage = match self.usage.get_usage(user_id).await? {
            Some(mut usage) => {
                usage.plan = plan;
                usage
            }
            None => UsageRecord::zeroed(user_id, plan, now),
        };
        self.usage.put_usage(&usage).await
    }
}

fn remaining_for(usage: &UsageRecord, action: UsageAction, plan: Plan, limits: &PlanLimits) -> i64 {
    match limits.daily {
        DailyLimit::Unlimited => -1,
        DailyLimit::Limited(limit) if usage.allows(action, plan, limits) => {
            i64::from(limit.saturating_sub(usage.count(action)))
        }
        DailyLimit::Limited(_) => 0,
    }
}
