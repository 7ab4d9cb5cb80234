use std::sync::Arc;

use tracing::debug;

use crate::storage::{AccountStore, UserAccount};

use super::error::QuotaError;
use super::plan::UsageCategory;
use super::usage::UsageCounters;

/// Decides whether an action is permitted under the account's plan and records
/// consumption once the action has succeeded.
///
/// The check is a pure read; the increment is a single conditional update in
/// the store, so two concurrent requests cannot both spend the last unit of
/// budget.
#[derive(Clone)]
pub struct QuotaEnforcer {
    store: Arc<AccountStore>,
}

impl QuotaEnforcer {
    pub fn new(store: Arc<AccountStore>) -> Self {
        Self { store }
    }

    /// True iff one more action in `category` fits under the plan ceiling.
    pub fn check(&self, account: &UserAccount, category: UsageCategory) -> bool {
        account.usage.get(category) < account.plan.ceiling(category)
    }

    pub fn ensure_within_limit(
        &self,
        account: &UserAccount,
        category: UsageCategory,
    ) -> Result<(), QuotaError> {
        if self.check(account, category) {
            Ok(())
        } else {
            Err(QuotaError::LimitExceeded {
                account_id: account.account_id.clone(),
                category,
                limit: account.plan.ceiling(category),
                current: account.usage.get(category),
            })
        }
    }

    /// Increment `category` by exactly one and persist it. Call only after the
    /// corresponding external action succeeded, so a failed action never
    /// consumes quota.
    pub fn record_usage(
        &self,
        account: &UserAccount,
        category: UsageCategory,
    ) -> Result<UsageCounters, QuotaError> {
        let limit = account.plan.ceiling(category);
        let incremented =
            self.store
                .increment_usage_if_below(&account.account_id, category, limit)?;

        if !incremented {
            // Budget ran out between the check and the increment.
            let usage = self.store.load_usage(&account.account_id)?;
            return Err(QuotaError::LimitExceeded {
                account_id: account.account_id.clone(),
                category,
                limit,
                current: usage.get(category),
            });
        }

        let usage = self.store.load_usage(&account.account_id)?;
        debug!(
            account_id = %account.account_id,
            category = %category,
            used = usage.get(category),
            "recorded usage"
        );
        Ok(usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quota::plan::SubscriptionPlan;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, Arc<AccountStore>) {
        let dir = TempDir::new().expect("tempdir");
        let store = AccountStore::new(dir.path().to_path_buf()).expect("store");
        (dir, Arc::new(store))
    }

    fn account_with_usage(
        store: &AccountStore,
        plan: SubscriptionPlan,
        category: UsageCategory,
        used: u64,
    ) -> UserAccount {
        let account = store
            .create_account("acct-1", "user@example.com", plan)
            .expect("create account");
        store
            .save_usage(&account.account_id, category, used)
            .expect("seed usage");
        store
            .get_account(&account.account_id)
            .expect("get account")
            .expect("account exists")
    }

    #[test]
    fn test_check_passes_below_ceiling() {
        let (_dir, store) = test_store();
        let enforcer = QuotaEnforcer::new(Arc::clone(&store));
        let account =
            account_with_usage(&store, SubscriptionPlan::Free, UsageCategory::Messages, 14);
        assert!(enforcer.check(&account, UsageCategory::Messages));
    }

    #[test]
    fn test_free_plan_message_ceiling_reached() {
        let (_dir, store) = test_store();
        let enforcer = QuotaEnforcer::new(Arc::clone(&store));
        let account =
            account_with_usage(&store, SubscriptionPlan::Free, UsageCategory::Messages, 15);
        assert!(!enforcer.check(&account, UsageCategory::Messages));
        assert!(matches!(
            enforcer.ensure_within_limit(&account, UsageCategory::Messages),
            Err(QuotaError::LimitExceeded {
                limit: 15,
                current: 15,
                ..
            })
        ));
    }

    #[test]
    fn test_pro_plan_image_boundary() {
        let (_dir, store) = test_store();
        let enforcer = QuotaEnforcer::new(Arc::clone(&store));
        let account = account_with_usage(&store, SubscriptionPlan::Pro, UsageCategory::Images, 19);
        assert!(enforcer.check(&account, UsageCategory::Images));

        let usage = enforcer
            .record_usage(&account, UsageCategory::Images)
            .expect("record usage");
        assert_eq!(usage.images, 20);

        let account = store.get_account("acct-1").unwrap().unwrap();
        assert!(!enforcer.check(&account, UsageCategory::Images));
    }

    #[test]
    fn test_premium_reminders_effectively_unbounded() {
        let (_dir, store) = test_store();
        let enforcer = QuotaEnforcer::new(Arc::clone(&store));
        let account = account_with_usage(
            &store,
            SubscriptionPlan::Premium,
            UsageCategory::Reminders,
            500_000,
        );
        assert!(enforcer.check(&account, UsageCategory::Reminders));
    }

    #[test]
    fn test_record_usage_touches_single_category() {
        let (_dir, store) = test_store();
        let enforcer = QuotaEnforcer::new(Arc::clone(&store));
        let account = store
            .create_account("acct-1", "user@example.com", SubscriptionPlan::Free)
            .unwrap();

        let usage = enforcer
            .record_usage(&account, UsageCategory::Messages)
            .expect("record usage");
        assert_eq!(usage.messages, 1);
        assert_eq!(usage.images, 0);
        assert_eq!(usage.reminders, 0);
    }

    #[test]
    fn test_record_usage_refuses_past_ceiling() {
        let (_dir, store) = test_store();
        let enforcer = QuotaEnforcer::new(Arc::clone(&store));
        let account =
            account_with_usage(&store, SubscriptionPlan::Free, UsageCategory::Images, 3);

        let result = enforcer.record_usage(&account, UsageCategory::Images);
        assert!(matches!(
            result,
            Err(QuotaError::LimitExceeded { limit: 3, current: 3, .. })
        ));

        let usage = store.load_usage("acct-1").unwrap();
        assert_eq!(usage.images, 3);
    }
}
