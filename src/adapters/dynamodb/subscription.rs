use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use chrono::Utc;

use super::{
    DynamoPersistence, Item, USER_ID, get_bool, get_enum, get_num, get_str, get_ts, key, n, s,
    store_error, ts,
};
use crate::{
    app_error::AppResult,
    application::use_cases::subscription::SubscriptionRepo,
    domain::entities::{
        billing_period::BillingPeriod,
        plan::{DailyLimit, Plan, PlanLimits},
        subscription::{Subscription, SubscriptionStatus},
    },
};

fn limits_to_attr(limits: &PlanLimits) -> AttributeValue {
    AttributeValue::M(Item::from([
        ("daily".to_string(), n(limits.daily.as_raw())),
        ("maxFileSizeMb".to_string(), n(limits.max_file_size_mb)),
        ("maxCompressionMb".to_string(), n(limits.max_compression_mb)),
        ("dailyReset".to_string(), AttributeValue::Bool(limits.daily_reset)),
        ("watermark".to_string(), AttributeValue::Bool(limits.watermark)),
        (
            "batchProcessing".to_string(),
            AttributeValue::Bool(limits.batch_processing),
        ),
        (
            "prioritySupport".to_string(),
            AttributeValue::Bool(limits.priority_support),
        ),
    ]))
}

/// Reads a stored limits map. Missing fields fall back to the plan's own table.
fn limits_from_attr(value: Option<&AttributeValue>, plan: Plan) -> PlanLimits {
    let defaults = plan.limits();
    let Some(map) = value.and_then(|v| v.as_m().ok()) else {
        return defaults;
    };
    PlanLimits {
        daily: get_num::<i64>(map, "daily")
            .map(DailyLimit::from_raw)
            .unwrap_or(defaults.daily),
        max_file_size_mb: get_num(map, "maxFileSizeMb").unwrap_or(defaults.max_file_size_mb),
        max_compression_mb: get_num(map, "maxCompressionMb")
            .unwrap_or(defaults.max_compression_mb),
        daily_reset: get_bool(map, "dailyReset").unwrap_or(defaults.daily_reset),
        watermark: get_bool(map, "watermark").unwrap_or(defaults.watermark),
        batch_processing: get_bool(map, "batchProcessing").unwrap_or(defaults.batch_processing),
        priority_support: get_bool(map, "prioritySupport").unwrap_or(defaults.priority_support),
    }
}

pub(crate) fn subscription_to_item(subscription: &Subscription) -> Item {
    let mut item = Item::from([
        key(&subscription.user_id),
        ("plan".to_string(), s(subscription.plan.as_ref())),
        ("status".to_string(), s(subscription.status.as_ref())),
        ("purchasedAt".to_string(), ts(subscription.purchased_at)),
        (
            "billingPeriod".to_string(),
            s(subscription.billing_period.as_ref()),
        ),
        ("limits".to_string(), limits_to_attr(&subscription.limits)),
        ("updatedAt".to_string(), ts(subscription.updated_at)),
    ]);
    if let Some(expiry) = subscription.expiry {
        item.insert("expiry".to_string(), ts(expiry));
    }
    if let Some(payment_id) = &subscription.payment_id {
        item.insert("paymentId".to_string(), s(payment_id));
    }
    item
}

pub(crate) fn item_to_subscription(item: &Item) -> Option<Subscription> {
    let user_id = get_str(item, USER_ID)?.to_string();
    let plan = get_enum(item, "plan", Plan::Free, &user_id);
    let updated_at = get_ts(item, "updatedAt").unwrap_or_else(Utc::now);
    Some(Subscription {
        status: get_enum(item, "status", SubscriptionStatus::Active, &user_id),
        expiry: get_ts(item, "expiry"),
        payment_id: get_str(item, "paymentId").map(str::to_string),
        purchased_at: get_ts(item, "purchasedAt").unwrap_or(updated_at),
        billing_period: get_enum(
            item,
            "billingPeriod",
            plan.default_billing_period(),
            &user_id,
        ),
        limits: limits_from_attr(item.get("limits"), plan),
        updated_at,
        plan,
        user_id,
    })
}

#[async_trait]
impl SubscriptionRepo for DynamoPersistence {
    async fn get_subscription(&self, user_id: &str) -> AppResult<Option<Subscription>> {
        let (name, value) = key(user_id);
        let output = self
            .client
            .get_item()
            .table_name(&self.subscriptions_table)
            .key(name, value)
            .send()
            .await
            .map_err(|e| store_error("get", &self.subscriptions_table, e))?;
        Ok(output.item().and_then(item_to_subscription))
    }

    async fn put_subscription(&self, subscription: &Subscription) -> AppResult<()> {
        self.client
            .put_item()
            .table_name(&self.subscriptions_table)
            .set_item(Some(subscription_to_item(subscription)))
            .send()
            .await
            .map_err(|e| store_error("put", &self.subscriptions_table, e))?;
        Ok(())
    }
}
