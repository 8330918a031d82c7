//! Persistence of users and reviews.
//!
//! Every method is a single operation that is atomic for the one user or
//! review it touches. Nothing spans more than one of them, callers that
//! need two writes (e.g. a new review and its owner's back-reference)
//! have to deal with the second one failing.
use std::sync::Arc;

use async_trait::async_trait;
use log::info;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Comment, NewUser, Point, Review, ReviewContent, User, Vote};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// URI that selects the [`MemoryStore`]
pub const MEMORY_URI: &str = "memory://";

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint failed, holds the name of the field
    #[error("duplicate {0}")]
    Duplicate(&'static str),
    #[error("corrupt record: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// What became of a vote that is limited to one per user
#[derive(Debug, Clone)]
pub enum VoteOutcome {
    Counted(Review),
    AlreadyVoted,
    NoSuchReview,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;

    async fn user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Users with one of ``ids``, in no particular order
    async fn users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>>;

    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn users(&self) -> StoreResult<Vec<User>>;

    /// Appends ``review`` to the user's back-references unless it is already there
    async fn push_user_review(&self, user: Uuid, review: Uuid) -> StoreResult<()>;

    /// Removes ``review`` from the user's back-references
    async fn pull_user_review(&self, user: Uuid, review: Uuid) -> StoreResult<()>;

    async fn insert_review(&self, review: Review) -> StoreResult<Review>;

    async fn review_by_id(&self, id: Uuid) -> StoreResult<Option<Review>>;

    /// Reviews with one of ``ids``, in the order of ``ids``
    async fn reviews_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Review>>;

    /// All reviews, newest first
    async fn reviews(&self) -> StoreResult<Vec<Review>>;

    /// Reviews written by ``author``, newest first
    async fn reviews_by_author(&self, author: Uuid) -> StoreResult<Vec<Review>>;

    /// Reviews at most ``max_distance`` meters away from ``center``, newest first
    async fn reviews_near(&self, center: Point, max_distance: f64) -> StoreResult<Vec<Review>>;

    /// Replaces the content of a review. ``None`` if there is no such review.
    async fn update_review(&self, id: Uuid, content: ReviewContent)
        -> StoreResult<Option<Review>>;

    /// Deletes a review with its comments and votes and returns what was deleted
    async fn delete_review(&self, id: Uuid) -> StoreResult<Option<Review>>;

    async fn mark_verified(&self, id: Uuid) -> StoreResult<Option<Review>>;

    /// Atomically increments the up- or downvote counter
    async fn add_vote(&self, id: Uuid, vote: Vote) -> StoreResult<Option<Review>>;

    /// Records that ``voter`` voted on ``review`` and increments the counter,
    /// both or neither. A second vote of the same voter counts nothing.
    async fn add_vote_once(&self, id: Uuid, voter: Uuid, vote: Vote) -> StoreResult<VoteOutcome>;

    async fn push_comment(&self, review: Uuid, comment: Comment) -> StoreResult<Option<Review>>;

    async fn pull_comment(&self, review: Uuid, comment: Uuid) -> StoreResult<Option<Review>>;

    /// Rebuilds every user's back-references from the reviews' owners.
    /// Returns the number of users whose list had to be fixed.
    async fn reconcile_review_links(&self) -> StoreResult<u64>;
}

/// Opens the store ``uri`` points to
pub async fn connect(uri: &str) -> anyhow::Result<Arc<dyn Store>> {
    if uri == MEMORY_URI {
        info!("Using the in-memory store, nothing will be persisted");
        return Ok(Arc::new(MemoryStore::default()));
    }

    info!("Connecting to the database");
    let store = PgStore::connect(uri).await?;
    info!("Running database migrations...");
    store.migrate().await?;
    Ok(Arc::new(store))
}
