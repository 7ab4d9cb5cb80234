use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::ApiState;

pub fn create_router(state: Arc<ApiState>) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(Duration::from_secs(30)));

    Router::new()
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/user/create", post(handlers::create_user))
        .route("/api/user/usage", get(handlers::get_usage))
        .route("/api/user/plan", post(handlers::update_plan))
        .route("/api/chat", post(handlers::chat))
        .route("/api/image", post(handlers::generate_image))
        .route("/api/reminder/create", post(handlers::create_reminder))
        .route("/api/reminder", get(handlers::list_reminders))
        .route("/health", get(handlers::health_check))
        .with_state(state)
        .layer(middleware)
}
