use std::sync::Arc;

pub mod handlers;
pub mod router;
pub mod types;

pub use router::create_router;
pub use types::*;

use crate::auth::TokenService;
use crate::config::GatewayConfig;
use crate::quota::QuotaEnforcer;
use crate::storage::AccountStore;
use crate::upstream::CompletionClient;

pub struct ApiState {
    pub store: Arc<AccountStore>,
    pub enforcer: QuotaEnforcer,
    pub completion: CompletionClient,
    pub tokens: TokenService,
    pub config: Arc<GatewayConfig>,
}

impl ApiState {
    pub fn new(
        store: Arc<AccountStore>,
        completion: CompletionClient,
        tokens: TokenService,
        config: GatewayConfig,
    ) -> Self {
        Self {
            enforcer: QuotaEnforcer::new(Arc::clone(&store)),
            store,
            completion,
            tokens,
            config: Arc::new(config),
        }
    }
}
