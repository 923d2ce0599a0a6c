use async_trait::async_trait;
use sqlx::Row;

use super::{PostgresPersistence, parse_json_with_fallback, parse_text_with_fallback};
use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::subscription::SubscriptionRepo,
    domain::entities::{
        billing_period::BillingPeriod,
        plan::{Plan, PlanLimits},
        subscription::{Subscription, SubscriptionStatus},
    },
};

const ENTITY: &str = "subscription";

fn row_to_subscription(row: &sqlx::postgres::PgRow) -> Subscription {
    let user_id: String = row.get("user_id");
    let plan: String = row.get("plan");
    let status: String = row.get("status");
    let billing_period: String = row.get("billing_period");
    let limits: serde_json::Value = row.get("limits");

    Subscription {
        plan: parse_text_with_fallback(&plan, Plan::Free, "plan", ENTITY, &user_id),
        status: parse_text_with_fallback(
            &status,
            SubscriptionStatus::Expired,
            "status",
            ENTITY,
            &user_id,
        ),
        expiry: row.get("expiry"),
        payment_id: row.get("payment_id"),
        purchased_at: row.get("purchased_at"),
        billing_period: parse_text_with_fallback(
            &billing_period,
            BillingPeriod::Monthly,
            "billing_period",
            ENTITY,
            &user_id,
        ),
        limits: parse_json_with_fallback::<PlanLimits>(&limits, "limits", ENTITY, &user_id),
        updated_at: row.get("updated_at"),
        user_id,
    }
}

#[async_trait]
impl SubscriptionRepo for PostgresPersistence {
    async fn get_subscription(&self, user_id: &str) -> AppResult<Option<Subscription>> {
        let row = sqlx::query(
            r#"
            SELECT user_id, plan, status, expiry, payment_id, purchased_at,
                   billing_period, limits, updated_at
            FROM subscriptions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_subscription))
    }

    async fn put_subscription(&self, subscription: &Subscription) -> AppResult<()> {
        let limits = serde_json::to_value(&subscription.limits)
            .map_err(|e| AppError::Internal(format!("Failed to encode limits: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO subscriptions
                (user_id, plan, status, expiry, payment_id, purchased_at,
                 billing_period, limits, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (user_id) DO UPDATE SET
                plan = EXCLUDED.plan,
                status = EXCLUDED.status,
                expiry = EXCLUDED.expiry,
                payment_id = EXCLUDED.payment_id,
                purchased_at = EXCLUDED.purchased_at,
                billing_period = EXCLUDED.billing_period,
                limits = EXCLUDED.limits,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&subscription.user_id)
        .bind(subscription.plan.as_ref())
        .bind(subscription.status.as_ref())
        .bind(subscription.expiry)
        .bind(&subscription.payment_id)
        .bind(subscription.purchased_at)
        .bind(subscription.billing_period.as_ref())
        .bind(limits)
        .bind(subscription.updated_at)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(())
    }
}
