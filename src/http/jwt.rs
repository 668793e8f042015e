use chrono::Utc;
use error_stack::{Result, ResultExt};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::id::{marker::UserMarker, Id};

/// Claims of an HS512 signed access token.
#[derive(Debug, Deserialize, Serialize)]
pub struct Jwt {
    pub user_id: Id<UserMarker>,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
#[error("Invalid or expired access token")]
pub struct InvalidToken;

#[derive(Debug, Error)]
#[error("Failed to generate access token")]
pub struct EncodeError;

impl Jwt {
    /// One week, in seconds.
    pub const DEFAULT_LIFETIME_SECS: i64 = 60 * 60 * 24 * 7;

    #[must_use]
    pub fn new(user_id: Id<UserMarker>, lifetime_secs: i64) -> Self {
        let iat = Utc::now().timestamp();
        Self {
            user_id,
            iat,
            exp: iat.saturating_add(lifetime_secs),
        }
    }

    #[tracing::instrument(skip_all, name = "http.jwt.decode")]
    pub fn decode(token: &str, secret: &str) -> Result<Self, InvalidToken> {
        let key = DecodingKey::from_secret(secret.as_bytes());
        let validation = Validation::new(Algorithm::HS512);

        jsonwebtoken::decode::<Self>(token, &key, &validation)
            .map(|v| v.claims)
            .change_context(InvalidToken)
    }

    #[tracing::instrument(skip_all, name = "http.jwt.encode")]
    pub fn encode(&self, secret: &str) -> Result<String, EncodeError> {
        let header = Header::new(Algorithm::HS512);
        let key = EncodingKey::from_secret(secret.as_bytes());
        jsonwebtoken::encode(&header, self, &key).change_context(EncodeError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "a-very-long-secret";

    #[test]
    fn should_decode_what_it_encodes() {
        let token = Jwt::new(Id::new(42), 60).encode(SECRET).unwrap();
        let claims = Jwt::decode(&token, SECRET).unwrap();
        assert_eq!(claims.user_id, Id::new(42));
    }

    #[test]
    fn should_reject_expired_tokens() {
        let token = Jwt::new(Id::new(42), -3600).encode(SECRET).unwrap();
        assert!(Jwt::decode(&token, SECRET).is_err());
    }

    #[test]
    fn should_reject_tokens_signed_with_another_secret() {
        let token = Jwt::new(Id::new(42), 60).encode("another-long-secret").unwrap();
        assert!(Jwt::decode(&token, SECRET).is_err());
    }
}
