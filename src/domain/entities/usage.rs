use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use super::plan::{DailyLimit, Plan, PlanLimits};

/// Metered user action. Wire names are camelCase (`pdfUploads`, ...).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum UsageAction {
    PdfUploads,
    PdfCompress,
    PdfReorder,
    PhotoToPdf,
}

impl UsageAction {
    pub fn all() -> [UsageAction; 4] {
        [
            UsageAction::PdfUploads,
            UsageAction::PdfCompress,
            UsageAction::PdfReorder,
            UsageAction::PhotoToPdf,
        ]
    }
}

/// Condition under which a store may apply an increment: every listed counter
/// must still be strictly below `limit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageGuard {
    pub limit: u32,
    pub actions: Vec<UsageAction>,
}

impl UsageGuard {
    pub fn admits(&self, usage: &UsageRecord) -> bool {
        self.actions.iter().all(|a| usage.count(*a) < self.limit)
    }
}

/// Per-user daily action counters, keyed by `user_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    pub user_id: String,
    pub pdf_uploads: u32,
    pub pdf_compress: u32,
    pub pdf_reorder: u32,
    pub photo_to_pdf: u32,
    pub last_reset: DateTime<Utc>,
    /// Denormalized copy of the subscription plan at the time of the last write.
    pub plan: Plan,
}

impl UsageRecord {
    pub fn zeroed(user_id: &str, plan: Plan, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            pdf_uploads: 0,
            pdf_compress: 0,
            pdf_reorder: 0,
            photo_to_pdf: 0,
            last_reset: now,
            plan,
        }
    }

    pub fn count(&self, action: UsageAction) -> u32 {
        match action {
            UsageAction::PdfUploads => self.pdf_uploads,
            UsageAction::PdfCompress => self.pdf_compress,
            UsageAction::PdfReorder => self.pdf_reorder,
            UsageAction::PhotoToPdf => self.photo_to_pdf,
        }
    }

    pub fn increment(&mut self, action: UsageAction) {
        let counter = match action {
            UsageAction::PdfUploads => &mut self.pdf_uploads,
            UsageAction::PdfCompress => &mut self.pdf_compress,
            UsageAction::PdfReorder => &mut self.pdf_reorder,
            UsageAction::PhotoToPdf => &mut self.photo_to_pdf,
        };
        *counter = counter.saturating_add(1);
    }

    /// Counters are stale once `last_reset` falls on an earlier UTC calendar day,
    /// but only plans with `daily_reset` ever reset.
    pub fn needs_daily_reset(&self, limits: &PlanLimits, now: DateTime<Utc>) -> bool {
        limits.daily_reset && self.last_reset.date_naive() != now.date_naive()
    }

    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.pdf_uploads = 0;
        self.pdf_compress = 0;
        self.pdf_reorder = 0;
        self.photo_to_pdf = 0;
        self.last_reset = now;
    }

    /// Whether `action` is still within the plan's daily allowance.
    ///
    /// Plans with cross-action lockout block every action as soon as any single
    /// counter has reached the limit.
    pub fn allows(&self, action: UsageAction, plan: Plan, limits: &PlanLimits) -> bool {
        match usage_guard(action, plan, limits) {
            Some(guard) => guard.admits(self),
            None => true,
        }
    }
}

/// Guard an increment of `action` must satisfy, or `None` when the plan is unlimited.
pub fn usage_guard(action: UsageAction, plan: Plan, limits: &PlanLimits) -> Option<UsageGuard> {
    match limits.daily {
        DailyLimit::Unlimited => None,
        DailyLimit::Limited(limit) => {
            let actions = if plan.has_cross_action_lockout() {
                UsageAction::all().to_vec()
            } else {
                vec![action]
            };
            Some(UsageGuard { limit, actions })
        }
    }
}
