//! Database repositories
//!
//! Provides data access layer for database operations.

pub mod follow;
pub mod publication;
pub mod user;

pub use follow::{FollowEdge, FollowRepository};
pub use publication::{FeedRow, PublicationRecord, PublicationRepository};
pub use user::{CreateUser, CredentialRecord, UpdateUser, UserRecord, UserRepository};
