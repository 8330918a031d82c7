use std::sync::Arc;

use async_graphql::{Context, Object, Result, ID};

use super::{operations, Review, ReviewInput, ReviewPolicy};
use crate::{
    fallible::Extended,
    guards::{require_auth, AuthenticationGuard},
    models::Vote,
    store::Store,
};

#[derive(Default)]
pub struct ReviewMutation;

#[Object]
impl ReviewMutation {
    /// Reports a new incident, written by the caller
    #[graphql(guard = "AuthenticationGuard")]
    async fn add_review(&self, ctx: &Context<'_>, review_data: ReviewInput) -> Result<Review> {
        let caller = require_auth(ctx).extended()?;
        let content = review_data.validate().extended()?;
        let store = ctx.data::<Arc<dyn Store>>()?;
        let policy = ctx.data::<ReviewPolicy>()?;
        operations::add_review(store.as_ref(), policy, caller, content)
            .await
            .map(Review::from)
            .extended()
    }

    /// Replaces a review. Only its author may do this.
    #[graphql(guard = "AuthenticationGuard")]
    async fn update_review(
        &self,
        ctx: &Context<'_>,
        review_id: ID,
        review_data: ReviewInput,
    ) -> Result<Review> {
        let caller = require_auth(ctx).extended()?;
        let content = review_data.validate().extended()?;
        let store = ctx.data::<Arc<dyn Store>>()?;
        operations::update_review(store.as_ref(), caller, &review_id, content)
            .await
            .map(Review::from)
            .extended()
    }

    /// Deletes a review and returns it. Only its author may do this.
    #[graphql(guard = "AuthenticationGuard")]
    async fn remove_review(&self, ctx: &Context<'_>, review_id: ID) -> Result<Review> {
        let caller = require_auth(ctx).extended()?;
        let store = ctx.data::<Arc<dyn Store>>()?;
        let policy = ctx.data::<ReviewPolicy>()?;
        operations::remove_review(store.as_ref(), policy, caller, &review_id)
            .await
            .map(Review::from)
            .extended()
    }

    #[graphql(guard = "AuthenticationGuard")]
    async fn verify_review(&self, ctx: &Context<'_>, review_id: ID) -> Result<Review> {
        let caller = require_auth(ctx).extended()?;
        let store = ctx.data::<Arc<dyn Store>>()?;
        operations::verify_review(store.as_ref(), caller, &review_id)
            .await
            .map(Review::from)
            .extended()
    }

    #[graphql(guard = "AuthenticationGuard")]
    async fn upvote_review(&self, ctx: &Context<'_>, review_id: ID) -> Result<Review> {
        vote(ctx, &review_id, Vote::Up).await
    }

    #[graphql(guard = "AuthenticationGuard")]
    async fn downvote_review(&self, ctx: &Context<'_>, review_id: ID) -> Result<Review> {
        vote(ctx, &review_id, Vote::Down).await
    }

    #[graphql(guard = "AuthenticationGuard")]
    async fn add_comment(
        &self,
        ctx: &Context<'_>,
        review_id: ID,
        comment_text: String,
    ) -> Result<Review> {
        let caller = require_auth(ctx).extended()?;
        let store = ctx.data::<Arc<dyn Store>>()?;
        operations::add_comment(store.as_ref(), caller, &review_id, comment_text)
            .await
            .map(Review::from)
            .extended()
    }

    /// Deletes a comment. Only its author may do this.
    #[graphql(guard = "AuthenticationGuard")]
    async fn remove_comment(
        &self,
        ctx: &Context<'_>,
        review_id: ID,
        comment_id: ID,
    ) -> Result<Review> {
        let caller = require_auth(ctx).extended()?;
        let store = ctx.data::<Arc<dyn Store>>()?;
        operations::remove_comment(store.as_ref(), caller, &review_id, &comment_id)
            .await
            .map(Review::from)
            .extended()
    }
}

async fn vote(ctx: &Context<'_>, review_id: &str, vote: Vote) -> Result<Review> {
    let caller = require_auth(ctx).extended()?;
    let store = ctx.data::<Arc<dyn Store>>()?;
    let policy = ctx.data::<ReviewPolicy>()?;
    operations::vote(store.as_ref(), policy, caller, review_id, vote)
        .await
        .map(Review::from)
        .extended()
}
