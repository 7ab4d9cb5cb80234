use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::{self, AuthError};
use crate::quota::{QuotaError, SubscriptionPlan, UsageCategory, UsageCounters};
use crate::storage::{StorageError, UserAccount};

use super::types::{
    AuthResponse, ChatRequest, ChatResponse, CreateReminderRequest, CreateReminderResponse,
    CreateUserRequest, CreateUserResponse, ErrorResponse, ImageRequest, ImageResponse,
    LoginRequest, RegisterRequest, ReminderSummary, SuccessResponse, UpdatePlanRequest,
    UsageResponse,
};
use super::ApiState;

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

pub async fn register(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<AuthResponse> {
    let email = request.email.trim().to_ascii_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(bad_request("invalid_email", "a valid email is required"));
    }
    if request.password.len() < 8 {
        return Err(bad_request(
            "weak_password",
            "password must be at least 8 characters",
        ));
    }

    match state.store.get_credentials(&email) {
        Ok(Some(_)) => return Err(conflict("account_exists", "email already registered")),
        Ok(None) => {}
        Err(err) => return Err(internal_error(err)),
    }

    let password_hash = auth::password::hash_password(&request.password)
        .map_err(|err| internal_error(err))?;
    let account_id = Uuid::new_v4().to_string();

    state
        .store
        .create_account(&account_id, &email, SubscriptionPlan::Free)
        .map_err(|err| internal_error(err))?;
    state
        .store
        .create_credentials(&email, &account_id, &password_hash)
        .map_err(|err| match err {
            StorageError::AlreadyExists(_) => conflict("account_exists", "email already registered"),
            other => internal_error(other),
        })?;

    let token = state
        .tokens
        .issue(&account_id)
        .map_err(|err| internal_error(err))?;

    info!(account_id = %account_id, "registered account");
    Ok(Json(AuthResponse { token, account_id }))
}

pub async fn login(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<AuthResponse> {
    let email = request.email.trim().to_ascii_lowercase();

    let credentials = match state.store.get_credentials(&email) {
        Ok(Some(credentials)) => credentials,
        Ok(None) => return Err(unauthorized("invalid_credentials", "invalid email or password")),
        Err(err) => return Err(internal_error(err)),
    };

    let verified = auth::password::verify_password(&request.password, &credentials.password_hash)
        .map_err(|err| internal_error(err))?;
    if !verified {
        return Err(unauthorized("invalid_credentials", "invalid email or password"));
    }

    if let Err(err) = state.store.touch_last_login(&email) {
        warn!(error = %err, "failed to record last login");
    }

    let token = state
        .tokens
        .issue(&credentials.account_id)
        .map_err(|err| internal_error(err))?;

    info!(account_id = %credentials.account_id, "account logged in");
    Ok(Json(AuthResponse {
        token,
        account_id: credentials.account_id,
    }))
}

pub async fn create_user(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<CreateUserRequest>,
) -> ApiResult<CreateUserResponse> {
    let email = request.email.trim().to_ascii_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(bad_request("invalid_email", "a valid email is required"));
    }

    let account_id = request
        .account_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    state
        .store
        .create_account(&account_id, &email, SubscriptionPlan::Free)
        .map_err(|err| match err {
            StorageError::AlreadyExists(_) => conflict("account_exists", "account already exists"),
            other => internal_error(other),
        })?;

    info!(account_id = %account_id, "created account");
    Ok(Json(CreateUserResponse {
        success: true,
        account_id,
    }))
}

pub async fn chat(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> ApiResult<ChatResponse> {
    if request.message.trim().is_empty() {
        return Err(bad_request("invalid_message", "message cannot be empty"));
    }

    let account = authenticate(&state, &headers)?;
    state
        .enforcer
        .ensure_within_limit(&account, UsageCategory::Messages)
        .map_err(quota_error)?;

    let reply = state
        .completion
        .chat(&request.message)
        .await
        .map_err(upstream_error)?;

    state
        .enforcer
        .record_usage(&account, UsageCategory::Messages)
        .map_err(quota_error)?;

    Ok(Json(ChatResponse { reply }))
}

pub async fn generate_image(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(request): Json<ImageRequest>,
) -> ApiResult<ImageResponse> {
    if request.prompt.trim().is_empty() {
        return Err(bad_request("invalid_prompt", "prompt cannot be empty"));
    }

    let account = authenticate(&state, &headers)?;
    state
        .enforcer
        .ensure_within_limit(&account, UsageCategory::Images)
        .map_err(quota_error)?;

    let image = state
        .completion
        .generate_image(&request.prompt)
        .await
        .map_err(upstream_error)?;

    state
        .enforcer
        .record_usage(&account, UsageCategory::Images)
        .map_err(quota_error)?;

    Ok(Json(ImageResponse { image }))
}

pub async fn create_reminder(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(request): Json<CreateReminderRequest>,
) -> ApiResult<CreateReminderResponse> {
    if request.text.trim().is_empty() {
        return Err(bad_request("invalid_reminder", "reminder text cannot be empty"));
    }
    if request.time.trim().is_empty() {
        return Err(bad_request("invalid_reminder", "reminder time cannot be empty"));
    }

    let account = authenticate(&state, &headers)?;
    state
        .enforcer
        .ensure_within_limit(&account, UsageCategory::Reminders)
        .map_err(quota_error)?;

    let reminder = state
        .store
        .create_reminder(&account.account_id, request.text.trim(), request.time.trim())
        .map_err(|err| internal_error(err))?;

    state
        .enforcer
        .record_usage(&account, UsageCategory::Reminders)
        .map_err(quota_error)?;

    Ok(Json(CreateReminderResponse {
        success: true,
        reminder_id: reminder.reminder_id,
    }))
}

pub async fn list_reminders(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> ApiResult<Vec<ReminderSummary>> {
    let account = authenticate(&state, &headers)?;
    let reminders = state
        .store
        .list_reminders(&account.account_id)
        .map_err(|err| internal_error(err))?;

    Ok(Json(reminders.into_iter().map(ReminderSummary::from).collect()))
}

pub async fn get_usage(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> ApiResult<UsageResponse> {
    let account = authenticate(&state, &headers)?;

    let remaining = UsageCounters {
        messages: account.usage.remaining(account.plan, UsageCategory::Messages),
        images: account.usage.remaining(account.plan, UsageCategory::Images),
        reminders: account.usage.remaining(account.plan, UsageCategory::Reminders),
    };

    Ok(Json(UsageResponse {
        account_id: account.account_id,
        plan: account.plan,
        usage: account.usage,
        remaining,
    }))
}

pub async fn update_plan(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(request): Json<UpdatePlanRequest>,
) -> ApiResult<SuccessResponse> {
    let account = authenticate(&state, &headers)?;

    state
        .store
        .update_plan(&account.account_id, request.plan)
        .map_err(|err| internal_error(err))?;

    info!(
        account_id = %account.account_id,
        plan = %request.plan,
        "subscription plan updated"
    );
    Ok(Json(SuccessResponse { success: true }))
}

pub async fn health_check() -> ApiResult<serde_json::Value> {
    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": "assistant-gateway"
    })))
}

fn authenticate(state: &ApiState, headers: &HeaderMap) -> Result<UserAccount, ApiError> {
    let account_id = auth::extract_account_id(headers, &state.tokens).map_err(|err| match err {
        AuthError::MissingIdentity => {
            unauthorized("missing_identity", "no account identity provided")
        }
        _ => unauthorized("invalid_token", "token rejected"),
    })?;

    match state.store.get_account(&account_id) {
        Ok(Some(account)) => Ok(account),
        Ok(None) => Err(not_found("account_not_found", "account not found")),
        Err(err) => Err(internal_error(err)),
    }
}

fn quota_error(err: QuotaError) -> ApiError {
    match err {
        QuotaError::LimitExceeded {
            category,
            limit,
            current,
            ..
        } => (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                error: limit_message(category).to_string(),
                code: "limit_exceeded".to_string(),
                details: Some(serde_json::json!({
                    "category": category.as_str(),
                    "limit": limit,
                    "current": current,
                })),
            }),
        ),
        QuotaError::AccountNotFound(_) => not_found("account_not_found", "account not found"),
        QuotaError::Storage(err) => internal_error(err),
    }
}

fn limit_message(category: UsageCategory) -> &'static str {
    match category {
        UsageCategory::Messages => "message limit reached",
        UsageCategory::Images => "image limit reached",
        UsageCategory::Reminders => "reminder limit reached",
    }
}

fn upstream_error<E: std::fmt::Display>(err: E) -> ApiError {
    error!(error = %err, "completion service call failed");
    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorResponse {
            error: "completion service unavailable".to_string(),
            code: "upstream_error".to_string(),
            details: None,
        }),
    )
}

fn bad_request(code: &str, message: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
            code: code.to_string(),
            details: None,
        }),
    )
}

fn unauthorized(code: &str, message: &str) -> ApiError {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: message.to_string(),
            code: code.to_string(),
            details: None,
        }),
    )
}

fn not_found(code: &str, message: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: message.to_string(),
            code: code.to_string(),
            details: None,
        }),
    )
}

fn conflict(code: &str, message: &str) -> ApiError {
    (
        StatusCode::CONFLICT,
        Json(ErrorResponse {
            error: message.to_string(),
            code: code.to_string(),
            details: None,
        }),
    )
}

fn internal_error<E: std::fmt::Display>(err: E) -> ApiError {
    error!(error = %err, "gateway internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "internal server error".to_string(),
            code: "internal_error".to_string(),
            details: None,
        }),
    )
}
