//! Business logic services
//!
//! Services encapsulate business logic and coordinate between
//! repositories and the auth primitives.

pub mod feed;
pub mod publication;
pub mod user;

pub use feed::{FeedError, FeedQuery};
pub use publication::PublicationService;
pub use user::UserService;
