use axum::http::HeaderMap;
use tracing::debug;

use super::error::AuthError;
use super::token::TokenService;
use super::{ACCOUNT_ID_HEADER, AUTHORIZATION_HEADER};

/// Resolve the calling account from request headers.
///
/// A bearer token is authoritative when present; the plain identifying header
/// is accepted as a fallback. Neither present is `MissingIdentity`.
pub fn extract_account_id(
    headers: &HeaderMap,
    tokens: &TokenService,
) -> Result<String, AuthError> {
    if let Some(auth_header) = headers.get(AUTHORIZATION_HEADER) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                let account_id = tokens.verify(token)?;
                debug!(account_id = %account_id, "resolved identity from bearer token");
                return Ok(account_id);
            }
        }
    }

    if let Some(header) = headers.get(ACCOUNT_ID_HEADER) {
        if let Ok(value) = header.to_str() {
            let value = value.trim();
            if !value.is_empty() {
                debug!(account_id = %value, "resolved identity from header");
                return Ok(value.to_string());
            }
        }
    }

    Err(AuthError::MissingIdentity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn service() -> TokenService {
        TokenService::new(SECRET, 3600).unwrap()
    }

    #[test]
    fn test_bearer_token_preferred_over_header() {
        let tokens = service();
        let token = tokens.issue("token-acct").unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION_HEADER,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers.insert(ACCOUNT_ID_HEADER, HeaderValue::from_static("header-acct"));

        assert_eq!(extract_account_id(&headers, &tokens).unwrap(), "token-acct");
    }

    #[test]
    fn test_identifying_header_fallback() {
        let tokens = service();
        let mut headers = HeaderMap::new();
        headers.insert(ACCOUNT_ID_HEADER, HeaderValue::from_static("acct-7"));
        assert_eq!(extract_account_id(&headers, &tokens).unwrap(), "acct-7");
    }

    #[test]
    fn test_missing_identity() {
        let tokens = service();
        let headers = HeaderMap::new();
        assert!(matches!(
            extract_account_id(&headers, &tokens),
            Err(AuthError::MissingIdentity)
        ));
    }

    #[test]
    fn test_invalid_token_is_rejected_not_ignored() {
        let tokens = service();
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION_HEADER,
            HeaderValue::from_static("Bearer garbage"),
        );
        headers.insert(ACCOUNT_ID_HEADER, HeaderValue::from_static("acct-7"));
        assert!(extract_account_id(&headers, &tokens).is_err());
    }
}
