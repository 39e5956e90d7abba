//! Publication service

use crate::auth::UserId;
use crate::error::ApiError;
use crate::repositories::{PublicationRecord, PublicationRepository};
use devbook_shared::{Publication, PublicationRequest};
use sqlx::PgPool;
use tracing::info;

/// Publication service for authoring and reactions
pub struct PublicationService;

impl PublicationService {
    /// Publish as the caller
    pub async fn create(
        pool: &PgPool,
        caller: UserId,
        request: PublicationRequest,
    ) -> Result<Publication, ApiError> {
        let request = request.prepare()?;

        let record = PublicationRepository::create(pool, caller, &request.title, &request.content)
            .await
            .map_err(ApiError::from_store)?;

        info!(publication_id = record.id, author_id = caller, "Publication created");
        Ok(record.into())
    }

    /// Get a single publication
    pub async fn get(pool: &PgPool, id: i64) -> Result<Publication, ApiError> {
        Ok(Self::load(pool, id).await?.into())
    }

    /// Publications written by `author_id`, newest first
    pub async fn by_author(pool: &PgPool, author_id: UserId) -> Result<Vec<Publication>, ApiError> {
        let records = PublicationRepository::find_by_author(pool, author_id)
            .await
            .map_err(ApiError::from_store)?;

        Ok(records.into_iter().map(Into::into).collect())
    }

    /// Edit a publication the caller wrote
    pub async fn update(
        pool: &PgPool,
        caller: UserId,
        id: i64,
        request: PublicationRequest,
    ) -> Result<(), ApiError> {
        let existing = Self::load(pool, id).await?;
        ensure_author(caller, &existing, "edit")?;
        let request = request.prepare()?;

        let updated = PublicationRepository::update(pool, id, &request.title, &request.content)
            .await
            .map_err(ApiError::from_store)?;

        if !updated {
            return Err(not_found());
        }
        Ok(())
    }

    /// Delete a publication the caller wrote
    pub async fn delete(pool: &PgPool, caller: UserId, id: i64) -> Result<(), ApiError> {
        let existing = Self::load(pool, id).await?;
        ensure_author(caller, &existing, "delete")?;

        let deleted = PublicationRepository::delete(pool, id)
            .await
            .map_err(ApiError::from_store)?;

        if !deleted {
            return Err(not_found());
        }
        Ok(())
    }

    pub async fn like(pool: &PgPool, id: i64) -> Result<(), ApiError> {
        let found = PublicationRepository::like(pool, id)
            .await
            .map_err(ApiError::from_store)?;

        if !found {
            return Err(not_found());
        }
        Ok(())
    }

    /// Remove a like; the counter stops at zero
    pub async fn dislike(pool: &PgPool, id: i64) -> Result<(), ApiError> {
        let found = PublicationRepository::dislike(pool, id)
            .await
            .map_err(ApiError::from_store)?;

        if !found {
            return Err(not_found());
        }
        Ok(())
    }

    async fn load(pool: &PgPool, id: i64) -> Result<PublicationRecord, ApiError> {
        PublicationRepository::find_by_id(pool, id)
            .await
            .map_err(ApiError::from_store)?
            .ok_or_else(not_found)
    }
}

fn not_found() -> ApiError {
    ApiError::NotFound("Publication not found".to_string())
}

fn ensure_author(caller: UserId, publication: &PublicationRecord, action: &str) -> Result<(), ApiError> {
    if publication.author_id != caller {
        return Err(ApiError::Forbidden(format!(
            "You cannot {} a publication that is not yours",
            action
        )));
    }
    Ok(())
}
