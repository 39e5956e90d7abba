//! Feed assembly
//!
//! A viewer sees a publication when they wrote it, follow its author, or
//! are followed by its author. The store hands back one row per linking
//! edge; this module applies the visibility rule, drops duplicates and
//! orders the result newest first.

use crate::auth::UserId;
use crate::repositories::{FeedRow, PublicationRepository};
use devbook_shared::Publication;
use sqlx::PgPool;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum FeedError {
    /// Backing store unreachable or query rejected; no partial feed is returned
    #[error("Feed query failed: {0}")]
    QueryFailure(#[source] anyhow::Error),
}

/// Feed query over the follow graph
pub struct FeedQuery;

impl FeedQuery {
    /// Publications visible to `viewer`, deduplicated, highest id first
    pub async fn get_feed(pool: &PgPool, viewer: UserId) -> Result<Vec<Publication>, FeedError> {
        let rows = PublicationRepository::feed_rows(pool, viewer)
            .await
            .map_err(FeedError::QueryFailure)?;

        let row_count = rows.len();
        let feed = assemble(viewer, rows);
        debug!(viewer, rows = row_count, publications = feed.len(), "Feed assembled");

        Ok(feed)
    }
}

/// Apply the visibility rule to raw rows
pub fn assemble(viewer: UserId, rows: Vec<FeedRow>) -> Vec<Publication> {
    let mut visible: BTreeMap<i64, Publication> = BTreeMap::new();

    for row in rows {
        let linked = row.author_id == viewer
            || row
                .edge()
                .is_some_and(|edge| edge.connects(viewer, row.author_id));
        if !linked {
            continue;
        }
        visible
            .entry(row.id)
            .or_insert_with(|| row.into_record().into());
    }

    visible.into_values().rev().collect()
}
