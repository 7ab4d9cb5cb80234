use serde::{Deserialize, Serialize};

use super::plan::{SubscriptionPlan, UsageCategory};

/// Per-account consumption tallies, one entry per usage category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounters {
    pub messages: u64,
    pub images: u64,
    pub reminders: u64,
}

impl UsageCounters {
    /// Counters for a freshly materialized account.
    pub fn zeroed() -> Self {
        Self::default()
    }

    pub fn get(&self, category: UsageCategory) -> u64 {
        match category {
            UsageCategory::Messages => self.messages,
            UsageCategory::Images => self.images,
            UsageCategory::Reminders => self.reminders,
        }
    }

    pub fn set(&mut self, category: UsageCategory, value: u64) {
        match category {
            UsageCategory::Messages => self.messages = value,
            UsageCategory::Images => self.images = value,
            UsageCategory::Reminders => self.reminders = value,
        }
    }

    pub fn remaining(&self, plan: SubscriptionPlan, category: UsageCategory) -> u64 {
        plan.ceiling(category).saturating_sub(self.get(category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quota::plan::UNLIMITED;

    #[test]
    fn test_zeroed_counters() {
        let usage = UsageCounters::zeroed();
        for category in UsageCategory::ALL {
            assert_eq!(usage.get(category), 0);
        }
    }

    #[test]
    fn test_set_touches_single_category() {
        let mut usage = UsageCounters::zeroed();
        usage.set(UsageCategory::Images, 7);
        assert_eq!(usage.images, 7);
        assert_eq!(usage.messages, 0);
        assert_eq!(usage.reminders, 0);
    }

    #[test]
    fn test_remaining_saturates() {
        let usage = UsageCounters {
            messages: 20,
            images: 0,
            reminders: 500_000,
        };
        assert_eq!(usage.remaining(SubscriptionPlan::Free, UsageCategory::Messages), 0);
        assert_eq!(
            usage.remaining(SubscriptionPlan::Premium, UsageCategory::Reminders),
            UNLIMITED - 500_000
        );
    }
}
