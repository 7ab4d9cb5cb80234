use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::error::AuthError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies signed, time-limited account tokens (HS256).
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: u64,
}

impl TokenService {
    pub fn new(secret: &str, ttl_secs: u64) -> Result<Self, AuthError> {
        if secret.len() < 32 {
            return Err(AuthError::InvalidKey(
                "signing secret must be at least 32 bytes".into(),
            ));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256];

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs,
        })
    }

    pub fn issue(&self, account_id: &str) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: account_id.to_string(),
            iat: now,
            exp: now + self.ttl_secs as i64,
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    /// Returns the account identifier carried by a valid token.
    pub fn verify(&self, token: &str) -> Result<String, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims.sub)
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_issue_and_verify_round_trip() {
        let tokens = TokenService::new(SECRET, 3600).unwrap();
        let token = tokens.issue("acct-42").unwrap();
        assert_eq!(tokens.verify(&token).unwrap(), "acct-42");
    }

    #[test]
    fn test_short_secret_rejected() {
        assert!(matches!(
            TokenService::new("too-short", 3600),
            Err(AuthError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let issuer = TokenService::new(SECRET, 3600).unwrap();
        let verifier =
            TokenService::new("fedcba9876543210fedcba9876543210", 3600).unwrap();
        let token = issuer.issue("acct-42").unwrap();
        assert!(matches!(
            verifier.verify(&token),
            Err(AuthError::TokenRejected(_))
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let tokens = TokenService::new(SECRET, 3600).unwrap();
        assert!(tokens.verify("not.a.token").is_err());
    }
}
