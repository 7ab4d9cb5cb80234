pub mod api;
pub mod auth;
pub mod config;
pub mod quota;
pub mod storage;
pub mod upstream;

pub use api::{create_router, ApiState};
pub use auth::TokenService;
pub use config::GatewayConfig;
pub use quota::{QuotaEnforcer, QuotaError, SubscriptionPlan, UsageCategory, UsageCounters};
pub use storage::{AccountStore, UserAccount};
pub use upstream::CompletionClient;
