//! Auth*entication*
//!
//! Signing up and logging in. Both hand out a bearer token the client
//! sends as ``Authorization: Bearer <token>`` with every further request.
use std::sync::Arc;

use async_graphql::{Context, Object, Result, SimpleObject, ID};
use log::{error, info};

use super::{password::verify_password, signup::new_user, token::TokenService};
use crate::{
    actors::User,
    authn::Identity,
    fallible::{Error, Extended},
    models,
    store::Store,
};

/// Auth
///
/// A fresh token and the user it belongs to. The token expires after two hours.
#[derive(SimpleObject)]
pub struct Auth {
    pub token: ID,
    pub user: User,
}

impl Auth {
    fn issue(tokens: &TokenService, user: models::User) -> Result<Self, Error> {
        let identity = Identity {
            username: user.username.clone(),
            email: user.email.clone(),
            id: user.id,
        };
        let token = tokens.issue(&identity).map_err(|e| {
            error!("Could not sign a token for {}: {}", identity.username, e);
            Error::Internal
        })?;
        Ok(Self {
            token: token.into(),
            user: user.into(),
        })
    }
}

#[derive(Default)]
pub struct AuthenticationMutation;

#[Object]
impl AuthenticationMutation {
    /// Creates an account and logs it in
    async fn add_user(
        &self,
        ctx: &Context<'_>,
        username: String,
        email: String,
        password: String,
    ) -> Result<Auth> {
        let store = ctx.data::<Arc<dyn Store>>()?;
        let tokens = ctx.data::<TokenService>()?;

        let user = new_user(&username, &email, &password).extended()?;
        let user = store.insert_user(user).await.extended()?;
        info!("New user {} signed up", user.username);
        Auth::issue(tokens, user).extended()
    }

    async fn login(&self, ctx: &Context<'_>, email: String, password: String) -> Result<Auth> {
        let store = ctx.data::<Arc<dyn Store>>()?;
        let tokens = ctx.data::<TokenService>()?;

        let user = store
            .user_by_email(email.trim())
            .await
            .extended()?
            .ok_or(Error::UserNotFound)
            .extended()?;
        if !verify_password(&password, &user.password_hash).extended()? {
            return Err(Error::IncorrectCredentials).extended();
        }
        Auth::issue(tokens, user).extended()
    }
}
