use chrono::Duration;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Billing cadence of a paid plan. Determines how long a purchase stays active.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BillingPeriod {
    Weekly,
    Monthly,
    #[serde(alias = "yearly")]
    #[strum(to_string = "annual", serialize = "yearly")]
    Annual,
}

impl BillingPeriod {
    pub fn days(&self) -> i64 {
        match self {
            BillingPeriod::Weekly => 7,
            BillingPeriod::Monthly => 30,
            BillingPeriod::Annual => 365,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::days(self.days())
    }
}
