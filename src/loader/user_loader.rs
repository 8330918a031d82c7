use std::{collections::HashMap, sync::Arc};

use async_graphql::{dataloader::Loader, Context};
use log::error;
use uuid::Uuid;

use crate::{
    actors::User,
    fallible::{Error, Extended},
    models,
    store::{Store, StoreError},
};

/// Batches the look-ups of review authors and comment authors
pub struct UserLoader {
    store: Arc<dyn Store>,
}

impl UserLoader {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

impl Loader<Uuid> for UserLoader {
    type Value = models::User;
    type Error = Arc<StoreError>;

    async fn load(&self, keys: &[Uuid]) -> Result<HashMap<Uuid, Self::Value>, Self::Error> {
        Ok(self
            .store
            .users_by_ids(keys)
            .await?
            .into_iter()
            .map(|user| (user.id, user))
            .collect())
    }
}

/// Loads the user ``id`` refers to. A dangling reference is ``USER_NOT_FOUND``.
pub async fn load_user(ctx: &Context<'_>, id: Uuid) -> async_graphql::Result<User> {
    let loader = ctx.data::<super::UserDataLoader>()?;
    let user = loader.load_one(id).await.map_err(|e| {
        error!("failed to load user {}: {}", id, e);
        Error::Internal
    });
    user.and_then(|user| user.ok_or(Error::UserNotFound))
        .map(User::from)
        .extended()
}
