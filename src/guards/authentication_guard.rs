use async_graphql::{Context, Guard};

use crate::{
    authn::{Identity, RequestContext},
    fallible::{Error, Extended},
};

/// AuthenticationGuard
///
/// makes sure that the request carries a valid bearer token.
/// [`require_auth`] returns the [`Identity`] afterwards.
pub struct AuthenticationGuard;

impl Guard for AuthenticationGuard {
    async fn check(&self, ctx: &Context<'_>) -> async_graphql::Result<()> {
        require_auth(ctx).map(|_| ()).extended()
    }
}

/// The identity of the caller or an ``UNAUTHENTICATED`` error.
///
/// Has to be called before anything is changed on behalf of the caller.
pub fn require_auth<'a>(ctx: &Context<'a>) -> Result<&'a Identity, Error> {
    match ctx.data_opt::<RequestContext>() {
        Some(request) => request.require_auth(),
        None => Err(Error::Unauthenticated),
    }
}
