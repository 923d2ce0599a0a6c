use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use super::{
    billing_period::BillingPeriod,
    plan::{Plan, PlanLimits},
};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SubscriptionStatus {
    #[default]
    Active,
    Expired,
}

/// Per-user subscription record, keyed by `user_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub user_id: String,
    pub plan: Plan,
    pub status: SubscriptionStatus,
    pub expiry: Option<DateTime<Utc>>,
    pub payment_id: Option<String>,
    pub purchased_at: DateTime<Utc>,
    pub billing_period: BillingPeriod,
    pub limits: PlanLimits,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of re-evaluating a subscription against the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Record is consistent with `now`; nothing to write.
    Current,
    /// Paid plan has lapsed and must be downgraded to free.
    Expired,
}

/// Expiry of a purchase made at `from`. Free plans never expire.
pub fn compute_expiry(
    plan: Plan,
    period: BillingPeriod,
    from: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    plan.is_paid()
        .then(|| from + plan.term_for(period).duration())
}

pub fn is_subscription_expired(subscription: &Subscription, now: DateTime<Utc>) -> bool {
    subscription.is_expired(now)
}

impl Subscription {
    pub fn free(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            plan: Plan::Free,
            status: SubscriptionStatus::Active,
            expiry: None,
            payment_id: None,
            purchased_at: now,
            billing_period: Plan::Free.default_billing_period(),
            limits: Plan::Free.limits(),
            updated_at: now,
        }
    }

    /// New active record for a purchase. A missing `expiry` is derived from the period.
    pub fn purchased(
        user_id: &str,
        plan: Plan,
        billing_period: BillingPeriod,
        expiry: Option<DateTime<Utc>>,
        payment_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let (expiry, billing_period) = if plan.is_paid() {
            (
                expiry.or_else(|| compute_expiry(plan, billing_period, now)),
                plan.term_for(billing_period),
            )
        } else {
            (None, billing_period)
        };

        Self {
            user_id: user_id.to_string(),
            plan,
            status: SubscriptionStatus::Active,
            expiry,
            payment_id,
            purchased_at: now,
            billing_period,
            limits: plan.limits(),
            updated_at: now,
        }
    }

    /// Stored expiry, else `purchased_at` plus the billing period. `None` for free plans.
    pub fn effective_expiry(&self) -> Option<DateTime<Utc>> {
        if !self.plan.is_paid() {
            return None;
        }
        self.expiry
            .or_else(|| compute_expiry(self.plan, self.billing_period, self.purchased_at))
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.effective_expiry().is_some_and(|expiry| now >= expiry)
    }

    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }

    pub fn transition(&self, now: DateTime<Utc>) -> Transition {
        if self.plan.is_paid() && (!self.is_active() || self.is_expired(now)) {
            Transition::Expired
        } else {
            Transition::Current
        }
    }

    /// Plan the user is entitled to right now: the stored plan while active, else free.
    pub fn effective_plan(&self) -> Plan {
        if self.is_active() {
            self.plan
        } else {
            Plan::Free
        }
    }

    /// Free-tier copy of this record. Keeps `payment_id` and `purchased_at` for audit.
    pub fn downgraded(&self, now: DateTime<Utc>) -> Self {
        Self {
            user_id: self.user_id.clone(),
            plan: Plan::Free,
            status: SubscriptionStatus::Expired,
            expiry: None,
            payment_id: self.payment_id.clone(),
            purchased_at: self.purchased_at,
            billing_period: self.billing_period,
            limits: Plan::Free.limits(),
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn weekly_pro() -> Subscription {
        let mut sub = Subscription::purchased(
            "user-1",
            Plan::Pro,
            BillingPeriod::Weekly,
            None,
            Some("pay_1".into()),
            t0(),
        );
        sub.expiry = None;
        sub
    }

    #[test]
    fn test_weekly_pro_without_expiry_lasts_seven_days() {
        let sub = weekly_pro();
        assert!(!is_subscription_expired(&sub, t0()));
        assert!(!is_subscription_expired(
            &sub,
            t0() + Duration::days(7) - Duration::seconds(1)
        ));
        assert!(is_subscription_expired(&sub, t0() + Duration::days(7)));
        assert!(is_subscription_expired(&sub, t0() + Duration::days(30)));
    }

    #[test]
    fn test_stored_expiry_wins_over_period() {
        let mut sub = weekly_pro();
        sub.expiry = Some(t0() + Duration::days(2));
        assert!(sub.is_expired(t0() + Duration::days(3)));
    }

    #[test]
    fn test_compute_expiry_table() {
        assert_eq!(
            compute_expiry(Plan::Pro, BillingPeriod::Weekly, t0()),
            Some(t0() + Duration::days(7))
        );
        assert_eq!(
            compute_expiry(Plan::Pro, BillingPeriod::Annual, t0()),
            Some(t0() + Duration::days(365))
        );
        assert_eq!(
            compute_expiry(Plan::ProPlus, BillingPeriod::Monthly, t0()),
            Some(t0() + Duration::days(30))
        );
        assert_eq!(
            compute_expiry(Plan::ProPlus, BillingPeriod::Annual, t0()),
            Some(t0() + Duration::days(365))
        );
        assert_eq!(compute_expiry(Plan::Free, BillingPeriod::Annual, t0()), None);
    }

    #[test]
    fn test_non_annual_period_follows_plan_cadence() {
        assert_eq!(
            compute_expiry(Plan::Pro, BillingPeriod::Monthly, t0()),
            Some(t0() + Duration::days(7))
        );
        assert_eq!(
            compute_expiry(Plan::ProPlus, BillingPeriod::Weekly, t0()),
            Some(t0() + Duration::days(30))
        );

        let sub = Subscription::purchased(
            "user-1",
            Plan::Pro,
            BillingPeriod::Monthly,
            None,
            None,
            t0(),
        );
        assert_eq!(sub.billing_period, BillingPeriod::Weekly);
        assert_eq!(sub.expiry, Some(t0() + Duration::days(7)));
    }

    #[test]
    fn test_free_never_expires() {
        let sub = Subscription::free("user-1", t0());
        assert_eq!(sub.effective_expiry(), None);
        assert!(!sub.is_expired(t0() + Duration::days(10_000)));
        assert_eq!(sub.transition(t0() + Duration::days(10_000)), Transition::Current);
    }

    #[test]
    fn test_transition_flags_lapsed_paid_plan() {
        let sub = weekly_pro();
        assert_eq!(sub.transition(t0() + Duration::days(1)), Transition::Current);
        assert_eq!(sub.transition(t0() + Duration::days(8)), Transition::Expired);
    }

    #[test]
    fn test_transition_heals_paid_record_marked_expired() {
        let mut sub = weekly_pro();
        sub.status = SubscriptionStatus::Expired;
        assert_eq!(sub.transition(t0()), Transition::Expired);
        assert_eq!(sub.effective_plan(), Plan::Free);
    }

    #[test]
    fn test_downgraded_record() {
        let sub = weekly_pro();
        let later = t0() + Duration::days(9);
        let down = sub.downgraded(later);
        assert_eq!(down.plan, Plan::Free);
        assert_eq!(down.status, SubscriptionStatus::Expired);
        assert_eq!(down.limits, Plan::Free.limits());
        assert_eq!(down.expiry, None);
        assert_eq!(down.payment_id.as_deref(), Some("pay_1"));
        assert_eq!(down.updated_at, later);
        assert_eq!(down.transition(later), Transition::Current);
        assert_eq!(down.effective_plan(), Plan::Free);
    }

    #[test]
    fn test_purchased_free_plan_has_no_expiry() {
        let sub = Subscription::purchased(
            "user-1",
            Plan::Free,
            BillingPeriod::Monthly,
            Some(t0() + Duration::days(3)),
            None,
            t0(),
        );
        assert_eq!(sub.expiry, None);
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(weekly_pro()).unwrap();
        assert_eq!(json["userId"], "user-1");
        assert_eq!(json["plan"], "pro");
        assert_eq!(json["status"], "active");
        assert_eq!(json["billingPeriod"], "weekly");
        assert_eq!(json["paymentId"], "pay_1");
        assert!(json["expiry"].is_null());
        assert_eq!(json["limits"]["daily"], 50);
    }
}
