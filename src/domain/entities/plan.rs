use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use strum::{AsRefStr, Display, EnumString};

use super::billing_period::BillingPeriod;

/// Subscription tier. Wire form is `free`, `pro` or `pro+`.
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
#[strum(ascii_case_insensitive)]
pub enum Plan {
    #[default]
    #[serde(rename = "free")]
    #[strum(serialize = "free")]
    Free,
    #[serde(rename = "pro")]
    #[strum(serialize = "pro")]
    Pro,
    #[serde(rename = "pro+")]
    #[strum(serialize = "pro+")]
    ProPlus,
}

impl Plan {
    pub fn all() -> [Plan; 3] {
        [Plan::Free, Plan::Pro, Plan::ProPlus]
    }

    pub fn is_paid(&self) -> bool {
        !matches!(self, Plan::Free)
    }

    /// Billing period used when an upgrade does not name one.
    pub fn default_billing_period(&self) -> BillingPeriod {
        match self {
            Plan::Free | Plan::ProPlus => BillingPeriod::Monthly,
            Plan::Pro => BillingPeriod::Weekly,
        }
    }

    /// Period actually granted for a purchase. Annual terms apply to any paid
    /// plan; every other request gets the plan's own cadence.
    pub fn term_for(&self, requested: BillingPeriod) -> BillingPeriod {
        match requested {
            BillingPeriod::Annual => BillingPeriod::Annual,
            _ => self.default_billing_period(),
        }
    }

    /// When one action hits its daily limit, every other action is blocked too.
    pub fn has_cross_action_lockout(&self) -> bool {
        matches!(self, Plan::Free)
    }

    /// Limits snapshot written into a subscription at purchase time.
    ///
    /// | Plan | Daily/action | File MB | Compression MB | Reset | Watermark | Batch | Priority |
    /// |------|--------------|---------|----------------|-------|-----------|-------|----------|
    /// | free | 1            | 10      | 10             | yes   | yes       | no    | no       |
    /// | pro  | 50           | 100     | 100            | yes   | no        | yes   | no       |
    /// | pro+ | unlimited    | 500     | 500            | no    | no        | yes   | yes      |
    pub fn limits(&self) -> PlanLimits {
        match self {
            Plan::Free => PlanLimits {
                daily: DailyLimit::Limited(1),
                max_file_size_mb: 10,
                max_compression_mb: 10,
                daily_reset: true,
                watermark: true,
                batch_processing: false,
                priority_support: false,
            },
            Plan::Pro => PlanLimits {
                daily: DailyLimit::Limited(50),
                max_file_size_mb: 100,
                max_compression_mb: 100,
                daily_reset: true,
                watermark: false,
                batch_processing: true,
                priority_support: false,
            },
            Plan::ProPlus => PlanLimits {
                daily: DailyLimit::Unlimited,
                max_file_size_mb: 500,
                max_compression_mb: 500,
                daily_reset: false,
                watermark: false,
                batch_processing: true,
                priority_support: true,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanLimits {
    pub daily: DailyLimit,
    pub max_file_size_mb: u32,
    pub max_compression_mb: u32,
    pub daily_reset: bool,
    pub watermark: bool,
    pub batch_processing: bool,
    pub priority_support: bool,
}

impl Default for PlanLimits {
    fn default() -> Self {
        Plan::Free.limits()
    }
}

/// Per-action daily allowance. Serialized as a number or the string `"unlimited"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyLimit {
    Limited(u32),
    Unlimited,
}

impl DailyLimit {
    /// Numeric form used on the wire and in comparisons; `-1` means unlimited.
    pub fn as_raw(&self) -> i64 {
        match self {
            DailyLimit::Limited(n) => i64::from(*n),
            DailyLimit::Unlimited => -1,
        }
    }

    pub fn from_raw(raw: i64) -> Self {
        if raw < 0 {
            DailyLimit::Unlimited
        } else {
            DailyLimit::Limited(u32::try_from(raw).unwrap_or(u32::MAX))
        }
    }

    pub fn allows(&self, current: u32) -> bool {
        match self {
            DailyLimit::Limited(max) => current < *max,
            DailyLimit::Unlimited => true,
        }
    }
}

impl Serialize for DailyLimit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DailyLimit::Limited(n) => serializer.serialize_u32(*n),
            DailyLimit::Unlimited => serializer.serialize_str("unlimited"),
        }
    }
}

impl<'de> Deserialize<'de> for DailyLimit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DailyLimitVisitor;

        impl de::Visitor<'_> for DailyLimitVisitor {
            type Value = DailyLimit;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a non-negative count, -1, or \"unlimited\"")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<DailyLimit, E> {
                Ok(DailyLimit::from_raw(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<DailyLimit, E> {
                Ok(DailyLimit::Limited(u32::try_from(v).unwrap_or(u32::MAX)))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<DailyLimit, E> {
                if v.eq_ignore_ascii_case("unlimited") {
                    return Ok(DailyLimit::Unlimited);
                }
                v.trim()
                    .parse::<i64>()
                    .map(DailyLimit::from_raw)
                    .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_any(DailyLimitVisitor)
    }
}
