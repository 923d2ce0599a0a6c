use async_trait::async_trait;
use sqlx::Row;

use super::{PostgresPersistence, parse_text_with_fallback};
use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::subscription::UsageRepo,
    domain::entities::{
        plan::Plan,
        usage::{UsageAction, UsageGuard, UsageRecord},
    },
};

const SELECT_COLS: &str =
    "user_id, pdf_uploads, pdf_compress, pdf_reorder, photo_to_pdf, last_reset, plan";

fn usage_column(action: UsageAction) -> &'static str {
    match action {
        UsageAction::PdfUploads => "pdf_uploads",
        UsageAction::PdfCompress => "pdf_compress",
        UsageAction::PdfReorder => "pdf_reorder",
        UsageAction::PhotoToPdf => "photo_to_pdf",
    }
}

fn counter(row: &sqlx::postgres::PgRow, column: &str) -> u32 {
    u32::try_from(row.get::<i32, _>(column)).unwrap_or(0)
}

fn to_db_count(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn row_to_usage(row: &sqlx::postgres::PgRow) -> UsageRecord {
    let user_id: String = row.get("user_id");
    let plan: String = row.get("plan");
    UsageRecord {
        pdf_uploads: counter(row, "pdf_uploads"),
        pdf_compress: counter(row, "pdf_compress"),
        pdf_reorder: counter(row, "pdf_reorder"),
        photo_to_pdf: counter(row, "photo_to_pdf"),
        last_reset: row.get("last_reset"),
        plan: parse_text_with_fallback(&plan, Plan::Free, "plan", "usage", &user_id),
        user_id,
    }
}

/// `UPDATE` that bumps one counter, guarded by `counter < $3` on every guarded column.
fn increment_sql(action: UsageAction, guard: Option<&UsageGuard>) -> String {
    let column = usage_column(action);
    let mut sql = format!(
        "UPDATE user_usage SET {column} = {column} + 1, plan = $2 WHERE user_id = $1"
    );
    if let Some(guard) = guard {
        for guarded in &guard.actions {
            sql.push_str(&format!(" AND {} < $3", usage_column(*guarded)));
        }
    }
    sql.push_str(&format!(" RETURNING {SELECT_COLS}"));
    sql
}

#[async_trait]
impl UsageRepo for PostgresPersistence {
    async fn get_usage(&self, user_id: &str) -> AppResult<Option<UsageRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLS} FROM user_usage WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_usage))
    }

    async fn put_usage(&self, usage: &UsageRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_usage
                (user_id, pdf_uploads, pdf_compress, pdf_reorder, photo_to_pdf, last_reset, plan)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id) DO UPDATE SET
                pdf_uploads = EXCLUDED.pdf_uploads,
                pdf_compress = EXCLUDED.pdf_compress,
                pdf_reorder = EXCLUDED.pdf_reorder,
                photo_to_pdf = EXCLUDED.photo_to_pdf,
                last_reset = EXCLUDED.last_reset,
                plan = EXCLUDED.plan
            "#,
        )
        .bind(&usage.user_id)
        .bind(to_db_count(usage.pdf_uploads))
        .bind(to_db_count(usage.pdf_compress))
        .bind(to_db_count(usage.pdf_reorder))
        .bind(to_db_count(usage.photo_to_pdf))
        .bind(usage.last_reset)
        .bind(usage.plan.as_ref())
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(())
    }

    async fn increment_usage(
        &self,
        user_id: &str,
        action: UsageAction,
        plan: Plan,
        guard: Option<&UsageGuard>,
    ) -> AppResult<Option<UsageRecord>> {
        let sql = increment_sql(action, guard);
        let mut query = sqlx::query(&sql).bind(user_id).bind(plan.as_ref());
        if let Some(guard) = guard {
            query = query.bind(to_db_count(guard.limit));
        }
        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_usage))
    }
}
