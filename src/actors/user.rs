//! User
//!
//! A registered user as seen by other users. The password hash never
//! makes it into this object.

use std::sync::Arc;

use async_graphql::{Context, Object, Result, ID};
use chrono::{DateTime, Utc};

use crate::{fallible::Extended, models, reviews::Review, store::Store};

#[derive(Debug, Clone)]
pub struct User(pub(crate) models::User);

impl From<models::User> for User {
    fn from(user: models::User) -> Self {
        Self(user)
    }
}

#[Object]
impl User {
    #[graphql(name = "_id")]
    pub async fn id(&self) -> ID {
        self.0.id.into()
    }

    pub async fn username(&self) -> &str {
        &self.0.username
    }

    pub async fn email(&self) -> &str {
        &self.0.email
    }

    /// The reviews this user wrote, oldest first
    pub async fn reviews(&self, ctx: &Context<'_>) -> Result<Vec<Review>> {
        let store = ctx.data::<Arc<dyn Store>>()?;
        let reviews = store.reviews_by_ids(&self.0.review_ids).await.extended()?;
        Ok(reviews.into_iter().map(Review::from).collect())
    }

    pub async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at
    }

    pub async fn updated_at(&self) -> DateTime<Utc> {
        self.0.updated_at
    }
}
