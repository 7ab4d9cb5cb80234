use thiserror::Error;

use crate::storage::StorageError;

use super::plan::UsageCategory;

#[derive(Debug, Error)]
pub enum QuotaError {
    #[error("quota exceeded for account {account_id} ({category}): limit={limit}, current={current}")]
    LimitExceeded {
        account_id: String,
        category: UsageCategory,
        limit: u64,
        current: u64,
    },
    #[error("account {0} not found")]
    AccountNotFound(String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
