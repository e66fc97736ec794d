//! Bearer token verification.
//!
//! Tokens are HS256 JWTs carrying `{ id, email, exp }`. Issuing tokens is
//! the job of the identity service; [`TokenVerifier::issue`] exists for tests
//! and local tooling.

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::model::{Claims, CurrentUser};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,
    #[error("Token has expired")]
    Expired,
    #[error("Invalid token: {0}")]
    Invalid(String),
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Verifies bearer tokens against the shared signing secret. Cheap to clone.
#[derive(Clone)]
pub struct TokenVerifier {
    keys: Arc<Keys>,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            keys: Arc::new(Keys {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
            }),
        }
    }

    /// Check signature and expiry and return the caller the token names.
    pub fn verify(&self, token: &str) -> Result<CurrentUser, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);

        decode::<Claims>(token, &self.keys.decoding, &validation)
            .map(|data| data.claims.into())
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid(e.to_string()),
            })
    }

    /// Sign a token for `user` valid for `ttl`.
    pub fn issue(&self, user: &CurrentUser, ttl: Duration) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            id: user.id.clone(),
            email: user.email.clone(),
            exp: (now + ttl).timestamp(),
            iat: Some(now.timestamp()),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.keys.encoding)
            .map_err(|e| AuthError::Invalid(e.to_string()))
    }
}

/// The token part of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
