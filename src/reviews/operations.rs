//! What the review mutations actually do.
//!
//! Every function gets the already authenticated caller, the resolvers
//! only translate between GraphQL and these.
use chrono::Utc;
use log::info;
use uuid::Uuid;

use super::{
    links::{link_review, unlink_review},
    ReviewPolicy,
};
use crate::{
    authn::Identity,
    config::VotePolicy,
    fallible::{Error, Result},
    models::{Comment, Review, ReviewContent, Vote},
    store::{Store, VoteOutcome},
};

/// Ids that are not uuids cannot exist
pub fn parse_id(id: &str, not_found: Error) -> Result<Uuid> {
    Uuid::parse_str(id).map_err(|_| not_found)
}

/// Loads a review or fails with ``REVIEW_NOT_FOUND``
pub async fn find_review(store: &dyn Store, id: &str) -> Result<Review> {
    let id = parse_id(id, Error::ReviewNotFound)?;
    store.review_by_id(id).await?.ok_or(Error::ReviewNotFound)
}

/// A token stays valid for a while after its user is gone, nothing may be
/// written on behalf of such a user
async fn ensure_caller_exists(store: &dyn Store, caller: &Identity) -> Result<()> {
    match store.user_by_id(caller.id).await? {
        Some(_) => Ok(()),
        None => Err(Error::UserNotFound),
    }
}

fn ensure_owner(review: &Review, caller: &Identity, action: &'static str) -> Result<()> {
    if review.reviewed_by == caller.id {
        Ok(())
    } else {
        Err(Error::Unauthorized(action))
    }
}

pub async fn add_review(
    store: &dyn Store,
    policy: &ReviewPolicy,
    caller: &Identity,
    content: ReviewContent,
) -> Result<Review> {
    ensure_caller_exists(store, caller).await?;
    let review = store.insert_review(Review::new(content, caller.id)).await?;
    link_review(store, caller.id, review.id, policy.link_attempts).await;
    info!("{} added review {}", caller.username, review.id);
    Ok(review)
}

pub async fn update_review(
    store: &dyn Store,
    caller: &Identity,
    id: &str,
    content: ReviewContent,
) -> Result<Review> {
    let review = find_review(store, id).await?;
    ensure_owner(&review, caller, "update this review")?;
    store
        .update_review(review.id, content)
        .await?
        .ok_or(Error::ReviewNotFound)
}

pub async fn remove_review(
    store: &dyn Store,
    policy: &ReviewPolicy,
    caller: &Identity,
    id: &str,
) -> Result<Review> {
    let review = find_review(store, id).await?;
    ensure_owner(&review, caller, "delete this review")?;
    let deleted = store
        .delete_review(review.id)
        .await?
        .ok_or(Error::ReviewNotFound)?;
    unlink_review(store, deleted.reviewed_by, deleted.id, policy.link_attempts).await;
    info!("{} removed review {}", caller.username, deleted.id);
    Ok(deleted)
}

/// Any authenticated user may verify any review
pub async fn verify_review(store: &dyn Store, caller: &Identity, id: &str) -> Result<Review> {
    let id = parse_id(id, Error::ReviewNotFound)?;
    let review = store
        .mark_verified(id)
        .await?
        .ok_or(Error::ReviewNotFound)?;
    info!("{} verified review {}", caller.username, review.id);
    Ok(review)
}

pub async fn vote(
    store: &dyn Store,
    policy: &ReviewPolicy,
    caller: &Identity,
    id: &str,
    vote: Vote,
) -> Result<Review> {
    let id = parse_id(id, Error::ReviewNotFound)?;
    ensure_caller_exists(store, caller).await?;
    match policy.vote_policy {
        VotePolicy::Unlimited => store.add_vote(id, vote).await?.ok_or(Error::ReviewNotFound),
        VotePolicy::OncePerUser => match store.add_vote_once(id, caller.id, vote).await? {
            VoteOutcome::Counted(review) => Ok(review),
            VoteOutcome::AlreadyVoted => Err(Error::AlreadyVoted),
            VoteOutcome::NoSuchReview => Err(Error::ReviewNotFound),
        },
    }
}

pub async fn add_comment(
    store: &dyn Store,
    caller: &Identity,
    id: &str,
    text: String,
) -> Result<Review> {
    if text.trim().is_empty() {
        return Err(Error::bad_input("comment must not be empty"));
    }
    let id = parse_id(id, Error::ReviewNotFound)?;
    ensure_caller_exists(store, caller).await?;
    let comment = Comment {
        id: Uuid::new_v4(),
        text,
        author: caller.id,
        created_at: Utc::now(),
    };
    store
        .push_comment(id, comment)
        .await?
        .ok_or(Error::ReviewNotFound)
}

pub async fn remove_comment(
    store: &dyn Store,
    caller: &Identity,
    review_id: &str,
    comment_id: &str,
) -> Result<Review> {
    let review = find_review(store, review_id).await?;
    let comment_id = parse_id(comment_id, Error::CommentNotFound)?;
    let comment = review.comment(comment_id).ok_or(Error::CommentNotFound)?;
    if comment.author != caller.id {
        return Err(Error::Unauthorized("delete this comment"));
    }
    store
        .pull_comment(review.id, comment_id)
        .await?
        .ok_or(Error::ReviewNotFound)
}
