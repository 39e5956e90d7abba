//! JWT token issuance and verification
//!
//! Tokens are HS256-signed and fully stateless: a token is valid iff its
//! signature verifies under the process secret and its `exp` lies in the
//! future. Nothing is stored server-side, so there is nothing to revoke.
//!
//! Keys are derived once at startup and shared through `AppState`.

use super::AuthError;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Opaque numeric user identifier
pub type UserId = i64;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// Failures while building or issuing tokens
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token secret is empty")]
    MissingSecret,

    #[error("token lifetime overflows the calendar")]
    Expiry,

    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

#[derive(Clone)]
struct TokenKeys {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
}

/// Token service for issuing and verifying bearer tokens
///
/// Cheap to clone: keys are behind `Arc`.
#[derive(Clone)]
pub struct TokenService {
    keys: TokenKeys,
    validation: Arc<Validation>,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Create a token service from the process secret
    ///
    /// Call this once at application startup and store in AppState.
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }

        // Only HS256 is accepted, whatever the token header claims.
        // Expiry is checked by `verify` itself with zero leeway.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            keys: TokenKeys {
                encoding: Arc::new(EncodingKey::from_secret(secret)),
                decoding: Arc::new(DecodingKey::from_secret(secret)),
            },
            validation: Arc::new(validation),
            ttl,
        })
    }

    /// Issue a token for a user, expiring `ttl` from now
    pub fn issue(&self, user_id: UserId) -> Result<String, TokenError> {
        self.issue_at(user_id, Utc::now())
    }

    fn issue_at(&self, user_id: UserId, now: DateTime<Utc>) -> Result<String, TokenError> {
        let exp = now
            .checked_add_signed(self.ttl)
            .ok_or(TokenError::Expiry)?;

        let claims = Claims {
            sub: user_id.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.keys.encoding,
        )?)
    }

    /// Verify a token and return the identity it binds
    ///
    /// The signature is checked before expiry, so a forged token is
    /// reported as `BadSignature` even when its `exp` has passed, and a
    /// genuine token past its `exp` is always `Expired`.
    pub fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        let claims = decode::<Claims>(token, &self.keys.decoding, &self.validation)
            .map_err(|e| classify(e.kind()))?
            .claims;

        if claims.exp <= Utc::now().timestamp() {
            return Err(AuthError::Expired);
        }

        claims.sub.parse::<UserId>().map_err(|_| AuthError::Malformed)
    }

    /// Token lifetime in seconds
    #[inline]
    pub fn ttl_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }
}

fn classify(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AuthError::BadSignature,
        ErrorKind::ExpiredSignature => AuthError::Expired,
        _ => AuthError::Malformed,
    }
}
