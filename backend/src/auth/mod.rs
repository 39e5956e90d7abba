//! Authentication module
//!
//! Provides stateless JWT authentication with argon2 password hashing.

mod jwt;
mod middleware;
mod password;

pub use jwt::{Claims, TokenError, TokenService, UserId};
pub use middleware::{
    run_interceptors, AuthUser, BearerInterceptor, Interceptor, InterceptorChain,
};
pub use password::{PasswordError, PasswordService};

use thiserror::Error;

/// Why a bearer credential was rejected
///
/// Kept apart for diagnostics only; every kind produces the same 401
/// response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("credential missing or not decodable")]
    Malformed,

    #[error("token signature mismatch")]
    BadSignature,

    #[error("token expired")]
    Expired,
}
