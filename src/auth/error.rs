use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no account identity provided")]
    MissingIdentity,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid signing key: {0}")]
    InvalidKey(String),
    #[error("token rejected: {0}")]
    TokenRejected(#[from] jsonwebtoken::errors::Error),
    #[error("password hashing failed: {0}")]
    HashingFailed(String),
}
