//! Publication repository for database operations

use super::follow::FollowEdge;
use crate::auth::UserId;
use anyhow::Result;
use chrono::{DateTime, Utc};
use devbook_shared::Publication;
use sqlx::PgPool;

/// Publication joined with its author's nick
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct PublicationRecord {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: UserId,
    pub author_nick: String,
    pub likes: i64,
    pub created_at: DateTime<Utc>,
}

impl From<PublicationRecord> for Publication {
    fn from(record: PublicationRecord) -> Self {
        Publication {
            id: record.id,
            title: record.title,
            content: record.content,
            author_id: record.author_id,
            author_nick: record.author_nick,
            likes: record.likes,
            created_at: record.created_at,
        }
    }
}

/// Raw feed row: a candidate publication plus the follow edge that
/// linked it to the viewer, if any.
///
/// A publication reachable through two edges (mutual follow) appears
/// twice; an own publication appears once with no edge.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedRow {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: UserId,
    pub author_nick: String,
    pub likes: i64,
    pub created_at: DateTime<Utc>,
    pub edge_follower_id: Option<UserId>,
    pub edge_followed_id: Option<UserId>,
}

impl FeedRow {
    pub fn edge(&self) -> Option<FollowEdge> {
        match (self.edge_follower_id, self.edge_followed_id) {
            (Some(follower), Some(followed)) => Some(FollowEdge::new(follower, followed)),
            _ => None,
        }
    }

    pub fn into_record(self) -> PublicationRecord {
        PublicationRecord {
            id: self.id,
            title: self.title,
            content: self.content,
            author_id: self.author_id,
            author_nick: self.author_nick,
            likes: self.likes,
            created_at: self.created_at,
        }
    }
}

/// Publication repository for database operations
pub struct PublicationRepository;

impl PublicationRepository {
    /// Create a publication authored by `author_id`
    pub async fn create(
        pool: &PgPool,
        author_id: UserId,
        title: &str,
        content: &str,
    ) -> Result<PublicationRecord> {
        let record = sqlx::query_as::<_, PublicationRecord>(
            r#"
            WITH inserted AS (
                INSERT INTO publications (title, content, author_id)
                VALUES ($1, $2, $3)
                RETURNING id, title, content, author_id, likes, created_at
            )
            SELECT i.id, i.title, i.content, i.author_id, u.nick AS author_nick, i.likes, i.created_at
            FROM inserted i
            INNER JOIN users u ON u.id = i.author_id
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(author_id)
        .fetch_one(pool)
        .await?;

        Ok(record)
    }

    /// Find publication by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<PublicationRecord>> {
        let record = sqlx::query_as::<_, PublicationRecord>(
            r#"
            SELECT p.id, p.title, p.content, p.author_id, u.nick AS author_nick, p.likes, p.created_at
            FROM publications p
            INNER JOIN users u ON u.id = p.author_id
            WHERE p.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// All publications of one author, newest first
    pub async fn find_by_author(pool: &PgPool, author_id: UserId) -> Result<Vec<PublicationRecord>> {
        let records = sqlx::query_as::<_, PublicationRecord>(
            r#"
            SELECT p.id, p.title, p.content, p.author_id, u.nick AS author_nick, p.likes, p.created_at
            FROM publications p
            INNER JOIN users u ON u.id = p.author_id
            WHERE p.author_id = $1
            ORDER BY p.id DESC
            "#,
        )
        .bind(author_id)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    /// Candidate rows for a viewer's feed
    ///
    /// Joins each publication with every follow edge between its author
    /// and the viewer, in either direction, and keeps the viewer's own
    /// publications even without an edge. Deduplication and ordering are
    /// left to the feed query.
    pub async fn feed_rows(pool: &PgPool, viewer_id: UserId) -> Result<Vec<FeedRow>> {
        let rows = sqlx::query_as::<_, FeedRow>(
            r#"
            SELECT p.id, p.title, p.content, p.author_id, u.nick AS author_nick, p.likes, p.created_at,
                   f.follower_id AS edge_follower_id, f.user_id AS edge_followed_id
            FROM publications p
            INNER JOIN users u ON u.id = p.author_id
            LEFT JOIN followers f
                   ON (f.follower_id = $1 AND f.user_id = p.author_id)
                   OR (f.user_id = $1 AND f.follower_id = p.author_id)
            WHERE p.author_id = $1 OR f.user_id IS NOT NULL
            "#,
        )
        .bind(viewer_id)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    /// Replace title and content. Returns false if the publication does not exist.
    pub async fn update(pool: &PgPool, id: i64, title: &str, content: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE publications SET title = $2, content = $3 WHERE id = $1")
            .bind(id)
            .bind(title)
            .bind(content)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a publication. Returns false if it did not exist.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM publications WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Increment the like counter. Returns false if the publication does not exist.
    pub async fn like(pool: &PgPool, id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE publications SET likes = likes + 1 WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Decrement the like counter, never below zero.
    /// Returns false if the publication does not exist.
    pub async fn dislike(pool: &PgPool, id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE publications
            SET likes = CASE WHEN likes > 0 THEN likes - 1 ELSE 0 END
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
