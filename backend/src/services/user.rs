//! User service for accounts, login and the follow graph
//!
//! Hashing and verification run on the blocking thread pool through
//! `PasswordService::*_async`; the token service holds pre-computed keys.

use crate::auth::{PasswordService, TokenService, UserId};
use crate::error::ApiError;
use crate::repositories::{CreateUser, FollowEdge, FollowRepository, UpdateUser, UserRepository};
use devbook_shared::validation::{validate_password, validate_required};
use devbook_shared::{
    AuthData, LoginRequest, RegisterRequest, UpdatePasswordRequest, UpdateUserRequest, UserProfile,
};
use sqlx::PgPool;
use tracing::info;

/// Reject actions on someone else's account
fn ensure_self(caller: UserId, target: UserId, action: &str) -> Result<(), ApiError> {
    if caller != target {
        return Err(ApiError::Forbidden(format!(
            "You cannot {} another user",
            action
        )));
    }
    Ok(())
}

/// Reject follow graph actions aimed at the caller
fn ensure_other(caller: UserId, target: UserId, action: &str) -> Result<(), ApiError> {
    if caller == target {
        return Err(ApiError::Forbidden(format!("You cannot {} yourself", action)));
    }
    Ok(())
}

/// User service for account operations
pub struct UserService;

impl UserService {
    /// Register a new user
    pub async fn register(
        pool: &PgPool,
        passwords: &PasswordService,
        request: RegisterRequest,
    ) -> Result<UserProfile, ApiError> {
        let request = request.prepare()?;

        if UserRepository::email_taken(pool, &request.email, None)
            .await
            .map_err(ApiError::from_store)?
        {
            return Err(ApiError::Conflict("Email already registered".to_string()));
        }
        if UserRepository::nick_taken(pool, &request.nick, None)
            .await
            .map_err(ApiError::from_store)?
        {
            return Err(ApiError::Conflict("Nick already taken".to_string()));
        }

        let password_hash = passwords.hash_async(request.password).await?;

        let user = UserRepository::create(
            pool,
            CreateUser {
                name: request.name,
                nick: request.nick,
                email: request.email,
                password_hash,
            },
        )
        .await
        .map_err(ApiError::from_store)?;

        info!(user_id = user.id, "User registered");
        Ok(user.into())
    }

    /// Login with email and password
    ///
    /// Unknown email and wrong password produce the same error.
    pub async fn login(
        pool: &PgPool,
        passwords: &PasswordService,
        tokens: &TokenService,
        request: LoginRequest,
    ) -> Result<AuthData, ApiError> {
        let email = request.email.trim();
        validate_required("email", email)?;
        validate_password("password", &request.password)?;

        let credentials = UserRepository::find_credentials_by_email(pool, email)
            .await
            .map_err(ApiError::from_store)?
            .ok_or(ApiError::InvalidCredentials)?;

        passwords
            .verify_async(request.password, credentials.password_hash)
            .await?;

        let token = tokens.issue(credentials.id)?;
        info!(
            user_id = credentials.id,
            expires_in = tokens.ttl_secs(),
            "User logged in"
        );

        Ok(AuthData {
            id: credentials.id.to_string(),
            token,
        })
    }

    /// Search users by name or nick; no term lists everyone
    pub async fn search(pool: &PgPool, term: Option<&str>) -> Result<Vec<UserProfile>, ApiError> {
        let term = term.map(str::trim).unwrap_or_default().to_lowercase();

        let users = UserRepository::search(pool, &term)
            .await
            .map_err(ApiError::from_store)?;

        Ok(users.into_iter().map(Into::into).collect())
    }

    /// Get a user profile
    pub async fn get(pool: &PgPool, user_id: UserId) -> Result<UserProfile, ApiError> {
        let user = UserRepository::find_by_id(pool, user_id)
            .await
            .map_err(ApiError::from_store)?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        Ok(user.into())
    }

    /// Edit the caller's own profile
    pub async fn update(
        pool: &PgPool,
        caller: UserId,
        user_id: UserId,
        request: UpdateUserRequest,
    ) -> Result<(), ApiError> {
        ensure_self(caller, user_id, "update")?;
        let request = request.prepare()?;

        if UserRepository::email_taken(pool, &request.email, Some(user_id))
            .await
            .map_err(ApiError::from_store)?
        {
            return Err(ApiError::Conflict("Email already registered".to_string()));
        }
        if UserRepository::nick_taken(pool, &request.nick, Some(user_id))
            .await
            .map_err(ApiError::from_store)?
        {
            return Err(ApiError::Conflict("Nick already taken".to_string()));
        }

        let updated = UserRepository::update(
            pool,
            user_id,
            UpdateUser {
                name: request.name,
                nick: request.nick,
                email: request.email,
            },
        )
        .await
        .map_err(ApiError::from_store)?;

        if !updated {
            return Err(ApiError::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    /// Delete the caller's own account
    pub async fn delete(pool: &PgPool, caller: UserId, user_id: UserId) -> Result<(), ApiError> {
        ensure_self(caller, user_id, "delete")?;

        let deleted = UserRepository::delete(pool, user_id)
            .await
            .map_err(ApiError::from_store)?;

        if !deleted {
            return Err(ApiError::NotFound("User not found".to_string()));
        }

        info!(user_id, "User deleted");
        Ok(())
    }

    /// Follow `target`; following twice is a no-op
    pub async fn follow(pool: &PgPool, caller: UserId, target: UserId) -> Result<(), ApiError> {
        ensure_other(caller, target, "follow")?;
        Self::require_user(pool, target).await?;

        FollowRepository::follow(pool, FollowEdge::new(caller, target))
            .await
            .map_err(ApiError::from_store)?;
        Ok(())
    }

    /// Stop following `target`; a missing edge is a no-op
    pub async fn unfollow(pool: &PgPool, caller: UserId, target: UserId) -> Result<(), ApiError> {
        ensure_other(caller, target, "unfollow")?;

        FollowRepository::unfollow(pool, FollowEdge::new(caller, target))
            .await
            .map_err(ApiError::from_store)?;
        Ok(())
    }

    /// Users following `user_id`
    pub async fn followers(pool: &PgPool, user_id: UserId) -> Result<Vec<UserProfile>, ApiError> {
        let users = FollowRepository::followers(pool, user_id)
            .await
            .map_err(ApiError::from_store)?;

        Ok(users.into_iter().map(Into::into).collect())
    }

    /// Users `user_id` follows
    pub async fn following(pool: &PgPool, user_id: UserId) -> Result<Vec<UserProfile>, ApiError> {
        let users = FollowRepository::following(pool, user_id)
            .await
            .map_err(ApiError::from_store)?;

        Ok(users.into_iter().map(Into::into).collect())
    }

    /// Change the caller's password after checking the current one
    pub async fn update_password(
        pool: &PgPool,
        passwords: &PasswordService,
        caller: UserId,
        user_id: UserId,
        request: UpdatePasswordRequest,
    ) -> Result<(), ApiError> {
        ensure_self(caller, user_id, "change the password of")?;
        validate_password("current", &request.current)?;
        validate_password("new", &request.new)?;

        let credentials = UserRepository::find_credentials_by_id(pool, user_id)
            .await
            .map_err(ApiError::from_store)?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        passwords
            .verify_async(request.current, credentials.password_hash)
            .await?;

        let password_hash = passwords.hash_async(request.new).await?;

        UserRepository::update_password(pool, user_id, &password_hash)
            .await
            .map_err(ApiError::from_store)?;

        info!(user_id, "Password changed");
        Ok(())
    }

    async fn require_user(pool: &PgPool, user_id: UserId) -> Result<(), ApiError> {
        let exists = UserRepository::exists(pool, user_id)
            .await
            .map_err(ApiError::from_store)?;

        if !exists {
            return Err(ApiError::NotFound("User not found".to_string()));
        }
        Ok(())
    }
}
