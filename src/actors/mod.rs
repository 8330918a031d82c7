use std::sync::Arc;

use async_graphql::{Context, MergedObject, Object, Result};

mod user;
pub use user::User;

use crate::{
    fallible::{Error, Extended},
    guards::{require_auth, AuthenticationGuard},
    store::Store,
};

#[derive(Default)]
pub struct UserQuery;

#[Object]
impl UserQuery {
    /// The user the bearer token belongs to
    #[graphql(guard = "AuthenticationGuard")]
    async fn me(&self, ctx: &Context<'_>) -> Result<User> {
        let caller = require_auth(ctx).extended()?;
        let store = ctx.data::<Arc<dyn Store>>()?;
        let user = store.user_by_id(caller.id).await.extended()?;
        user.map(User::from).ok_or(Error::UserNotFound).extended()
    }

    /// Every registered user
    async fn users(&self, ctx: &Context<'_>) -> Result<Vec<User>> {
        let store = ctx.data::<Arc<dyn Store>>()?;
        let users = store.users().await.extended()?;
        Ok(users.into_iter().map(User::from).collect())
    }

    /// The user with exactly this username
    async fn user(&self, ctx: &Context<'_>, username: String) -> Result<User> {
        let store = ctx.data::<Arc<dyn Store>>()?;
        let user = store.user_by_username(username.trim()).await.extended()?;
        user.map(User::from).ok_or(Error::UserNotFound).extended()
    }
}

#[derive(MergedObject, Default)]
pub struct ActorQueries(UserQuery);
