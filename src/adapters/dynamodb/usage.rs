use async_trait::async_trait;
use aws_sdk_dynamodb::types::ReturnValue;
use chrono::Utc;

use super::{
    DynamoPersistence, Item, USER_ID, get_enum, get_num, get_str, get_ts, key, n, s, store_error,
    ts,
};
use crate::{
    app_error::AppResult,
    application::use_cases::subscription::UsageRepo,
    domain::entities::{
        plan::Plan,
        usage::{UsageAction, UsageGuard, UsageRecord},
    },
};

pub(crate) fn usage_to_item(usage: &UsageRecord) -> Item {
    let mut item = Item::from([
        key(&usage.user_id),
        ("lastReset".to_string(), ts(usage.last_reset)),
        ("plan".to_string(), s(usage.plan.as_ref())),
    ]);
    for action in UsageAction::all() {
        item.insert(action.as_ref().to_string(), n(usage.count(action)));
    }
    item
}

pub(crate) fn item_to_usage(item: &Item) -> Option<UsageRecord> {
    let user_id = get_str(item, USER_ID)?.to_string();
    let count = |action: UsageAction| get_num::<u32>(item, action.as_ref()).unwrap_or(0);
    Some(UsageRecord {
        pdf_uploads: count(UsageAction::PdfUploads),
        pdf_compress: count(UsageAction::PdfCompress),
        pdf_reorder: count(UsageAction::PdfReorder),
        photo_to_pdf: count(UsageAction::PhotoToPdf),
        last_reset: get_ts(item, "lastReset").unwrap_or_else(Utc::now),
        plan: get_enum(item, "plan", Plan::Free, &user_id),
        user_id,
    })
}

/// Condition expression for a guarded increment. The item must exist, and under a
/// guard every listed counter must still be below `:limit`.
fn increment_condition(guard: Option<&UsageGuard>) -> String {
    let mut condition = format!("attribute_exists({USER_ID})");
    if let Some(guard) = guard {
        for (i, _) in guard.actions.iter().enumerate() {
            condition.push_str(&format!(" AND #g{i} < :limit"));
        }
    }
    condition
}

#[async_trait]
impl UsageRepo for DynamoPersistence {
    async fn get_usage(&self, user_id: &str) -> AppResult<Option<UsageRecord>> {
        let (name, value) = key(user_id);
        let output = self
            .client
            .get_item()
            .table_name(&self.usage_table)
            .key(name, value)
            .send()
            .await
            .map_err(|e| store_error("get", &self.usage_table, e))?;
        Ok(output.item().and_then(item_to_usage))
    }

    async fn put_usage(&self, usage: &UsageRecord) -> AppResult<()> {
        self.client
            .put_item()
            .table_name(&self.usage_table)
            .set_item(Some(usage_to_item(usage)))
            .send()
            .await
            .map_err(|e| store_error("put", &self.usage_table, e))?;
        Ok(())
    }

    async fn increment_usage(
        &self,
        user_id: &str,
        action: UsageAction,
        plan: Plan,
        guard: Option<&UsageGuard>,
    ) -> AppResult<Option<UsageRecord>> {
        let (name, value) = key(user_id);
        let mut request = self
            .client
            .update_item()
            .table_name(&self.usage_table)
            .key(name, value)
            .update_expression("ADD #counter :one SET #plan = :plan")
            .condition_expression(increment_condition(guard))
            .expression_attribute_names("#counter", action.as_ref())
            .expression_attribute_names("#plan", "plan")
            .expression_attribute_values(":one", n(1))
            .expression_attribute_values(":plan", s(plan.as_ref()))
            .return_values(ReturnValue::AllNew);

        if let Some(guard) = guard {
            for (i, guarded) in guard.actions.iter().enumerate() {
                request = request.expression_attribute_names(format!("#g{i}"), guarded.as_ref());
            }
            request = request.expression_attribute_values(":limit", n(guard.limit));
        }

        match request.send().await {
            Ok(output) => Ok(output.attributes().and_then(item_to_usage)),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_conditional_check_failed_exception()) =>
            {
                tracing::debug!(user_id, %action, "Usage increment condition not met");
                Ok(None)
            }
            Err(err) => Err(store_error("update", &self.usage_table, err)),
        }
    }
}
