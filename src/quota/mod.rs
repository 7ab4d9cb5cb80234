pub mod enforcer;
pub mod error;
pub mod plan;
pub mod usage;

pub use enforcer::QuotaEnforcer;
pub use error::QuotaError;
pub use plan::{SubscriptionPlan, UsageCategory, UNLIMITED};
pub use usage::UsageCounters;
