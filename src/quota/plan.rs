use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Sentinel ceiling for categories without a real cap. Clamped to `i64::MAX`
/// at the storage boundary since SQLite integers are signed.
pub const UNLIMITED: u64 = u64::MAX;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPlan {
    #[default]
    Free,
    Pro,
    Premium,
}

impl SubscriptionPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionPlan::Free => "free",
            SubscriptionPlan::Pro => "pro",
            SubscriptionPlan::Premium => "premium",
        }
    }

    /// Ceiling for a usage category under this plan. Read-only lookup data,
    /// fixed for the lifetime of the process.
    pub fn ceiling(&self, category: UsageCategory) -> u64 {
        match (self, category) {
            (SubscriptionPlan::Free, UsageCategory::Messages) => 15,
            (SubscriptionPlan::Free, UsageCategory::Images) => 3,
            (SubscriptionPlan::Free, UsageCategory::Reminders) => 5,
            (SubscriptionPlan::Pro, UsageCategory::Messages) => 150,
            (SubscriptionPlan::Pro, UsageCategory::Images) => 20,
            (SubscriptionPlan::Pro, UsageCategory::Reminders) => 40,
            (SubscriptionPlan::Premium, UsageCategory::Messages) => 1000,
            (SubscriptionPlan::Premium, UsageCategory::Images) => 100,
            (SubscriptionPlan::Premium, UsageCategory::Reminders) => UNLIMITED,
        }
    }
}

impl FromStr for SubscriptionPlan {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "free" => Ok(SubscriptionPlan::Free),
            "pro" => Ok(SubscriptionPlan::Pro),
            "premium" => Ok(SubscriptionPlan::Premium),
            other => Err(format!("unknown subscription plan: {other}")),
        }
    }
}

impl fmt::Display for SubscriptionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageCategory {
    Messages,
    Images,
    Reminders,
}

impl UsageCategory {
    pub const ALL: [UsageCategory; 3] = [
        UsageCategory::Messages,
        UsageCategory::Images,
        UsageCategory::Reminders,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UsageCategory::Messages => "messages",
            UsageCategory::Images => "images",
            UsageCategory::Reminders => "reminders",
        }
    }
}

impl FromStr for UsageCategory {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "messages" => Ok(UsageCategory::Messages),
            "images" => Ok(UsageCategory::Images),
            "reminders" => Ok(UsageCategory::Reminders),
            other => Err(format!("unknown usage category: {other}")),
        }
    }
}

impl fmt::Display for UsageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
