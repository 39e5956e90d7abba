//! Follow graph repository
//!
//! Edges live in `followers(user_id, follower_id)`: `follower_id` follows
//! `user_id`. Inserting an existing edge and deleting a missing one are
//! both no-ops.

use super::user::UserRecord;
use crate::auth::UserId;
use anyhow::Result;
use sqlx::PgPool;

/// A directed follow relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FollowEdge {
    pub follower_id: UserId,
    pub followed_id: UserId,
}

impl FollowEdge {
    pub fn new(follower_id: UserId, followed_id: UserId) -> Self {
        Self {
            follower_id,
            followed_id,
        }
    }

    /// True when this edge links `a` and `b`, in either direction
    pub fn connects(&self, a: UserId, b: UserId) -> bool {
        (self.follower_id == a && self.followed_id == b)
            || (self.follower_id == b && self.followed_id == a)
    }
}

/// Follow repository for database operations
pub struct FollowRepository;

impl FollowRepository {
    /// Insert an edge. Returns true if it was newly created.
    pub async fn follow(pool: &PgPool, edge: FollowEdge) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO followers (user_id, follower_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, follower_id) DO NOTHING
            "#,
        )
        .bind(edge.followed_id)
        .bind(edge.follower_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove an edge. Returns true if one was removed.
    pub async fn unfollow(pool: &PgPool, edge: FollowEdge) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM followers
            WHERE user_id = $1 AND follower_id = $2
            "#,
        )
        .bind(edge.followed_id)
        .bind(edge.follower_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Users following `user_id`
    pub async fn followers(pool: &PgPool, user_id: UserId) -> Result<Vec<UserRecord>> {
        let users = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT u.id, u.name, u.nick, u.email, u.created_at
            FROM followers f
            INNER JOIN users u ON u.id = f.follower_id
            WHERE f.user_id = $1
            ORDER BY u.id
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Users that `user_id` follows
    pub async fn following(pool: &PgPool, user_id: UserId) -> Result<Vec<UserRecord>> {
        let users = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT u.id, u.name, u.nick, u.email, u.created_at
            FROM followers f
            INNER JOIN users u ON u.id = f.user_id
            WHERE f.follower_id = $1
            ORDER BY u.id
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Whether this exact directed edge is stored
    pub async fn exists(pool: &PgPool, edge: FollowEdge) -> Result<bool> {
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM followers WHERE user_id = $1 AND follower_id = $2)
            "#,
        )
        .bind(edge.followed_id)
        .bind(edge.follower_id)
        .fetch_one(pool)
        .await?;

        Ok(result)
    }
}
