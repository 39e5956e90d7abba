//! User repository for database operations

use crate::auth::UserId;
use anyhow::Result;
use chrono::{DateTime, Utc};
use devbook_shared::UserProfile;
use sqlx::PgPool;

/// User record from database, without credentials
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub nick: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserRecord> for UserProfile {
    fn from(user: UserRecord) -> Self {
        UserProfile {
            id: user.id,
            name: user.name,
            nick: user.nick,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// Stored credentials, loaded only for login and password change
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CredentialRecord {
    pub id: UserId,
    pub password_hash: String,
}

/// Input for creating a user; `password_hash` is already hashed
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub nick: String,
    pub email: String,
    pub password_hash: String,
}

/// Input for editing a profile
#[derive(Debug, Clone)]
pub struct UpdateUser {
    pub name: String,
    pub nick: String,
    pub email: String,
}

/// Escape `%`, `_` and `\` so a search term matches literally
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// User repository for database operations
pub struct UserRepository;

impl UserRepository {
    /// Create a new user
    pub async fn create(pool: &PgPool, input: CreateUser) -> Result<UserRecord> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (name, nick, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, nick, email, created_at
            "#,
        )
        .bind(&input.name)
        .bind(&input.nick)
        .bind(&input.email)
        .bind(&input.password_hash)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Find user by ID
    pub async fn find_by_id(pool: &PgPool, id: UserId) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, name, nick, email, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Case-insensitive substring search over name and nick
    pub async fn search(pool: &PgPool, term: &str) -> Result<Vec<UserRecord>> {
        let pattern = format!("%{}%", escape_like(term));

        let users = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, name, nick, email, created_at
            FROM users
            WHERE name ILIKE $1 OR nick ILIKE $1
            ORDER BY id
            "#,
        )
        .bind(pattern)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Update profile fields. Returns false if the user does not exist.
    pub async fn update(pool: &PgPool, id: UserId, input: UpdateUser) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users SET name = $2, nick = $3, email = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.nick)
        .bind(&input.email)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a user; follow edges and publications cascade.
    /// Returns false if the user does not exist.
    pub async fn delete(pool: &PgPool, id: UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Check if user exists
    pub async fn exists(pool: &PgPool, id: UserId) -> Result<bool> {
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)
            "#,
        )
        .bind(id)
        .fetch_one(pool)
        .await?;

        Ok(result)
    }

    /// Check if email is taken by someone other than `except`
    pub async fn email_taken(pool: &PgPool, email: &str, except: Option<UserId>) -> Result<bool> {
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND ($2::BIGINT IS NULL OR id <> $2))
            "#,
        )
        .bind(email)
        .bind(except)
        .fetch_one(pool)
        .await?;

        Ok(result)
    }

    /// Check if nick is taken by someone other than `except`
    pub async fn nick_taken(pool: &PgPool, nick: &str, except: Option<UserId>) -> Result<bool> {
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM users WHERE nick = $1 AND ($2::BIGINT IS NULL OR id <> $2))
            "#,
        )
        .bind(nick)
        .bind(except)
        .fetch_one(pool)
        .await?;

        Ok(result)
    }

    /// Load credentials by email (login)
    pub async fn find_credentials_by_email(
        pool: &PgPool,
        email: &str,
    ) -> Result<Option<CredentialRecord>> {
        let credentials = sqlx::query_as::<_, CredentialRecord>(
            r#"
            SELECT id, password_hash
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(credentials)
    }

    /// Load credentials by id (password change)
    pub async fn find_credentials_by_id(
        pool: &PgPool,
        id: UserId,
    ) -> Result<Option<CredentialRecord>> {
        let credentials = sqlx::query_as::<_, CredentialRecord>(
            r#"
            SELECT id, password_hash
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(credentials)
    }

    /// Replace the stored password hash
    pub async fn update_password(pool: &PgPool, id: UserId, password_hash: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("ana"), "ana");
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }

    // Query tests require database - see tests/users_integration_test.rs
}
