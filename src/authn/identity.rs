use actix_web::{
    http::header::{Header, AUTHORIZATION},
    HttpRequest,
};
use actix_web_httpauth::headers::authorization::{Authorization, Bearer};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{auth::token::TokenService, fallible::Error};

/// Who sent a request, as far as the bearer token tells
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    pub email: String,
    #[serde(rename = "_id")]
    pub id: Uuid,
}

/// The per request context every resolver gets.
///
/// A request without a valid token is not rejected here, it just ends up
/// without an identity. Resolvers that need one ask for it with
/// [`RequestContext::require_auth`].
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    identity: Option<Identity>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
        }
    }

    /// Builds the context from the ``Authorization`` header.
    ///
    /// Missing, malformed, expired or wrongly signed tokens all result in
    /// an anonymous context.
    pub fn from_request(request: &HttpRequest, tokens: &TokenService) -> Self {
        Self {
            identity: bearer_token(request).and_then(|token| tokens.verify(&token)),
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// The identity of the caller or ``UNAUTHENTICATED``
    pub fn require_auth(&self) -> Result<&Identity, Error> {
        self.identity.as_ref().ok_or(Error::Unauthenticated)
    }
}

/// Extracts the token from ``Authorization: Bearer <token>``. A bare
/// ``Authorization: <token>`` is accepted too.
fn bearer_token(request: &HttpRequest) -> Option<String> {
    if let Ok(auth) = Authorization::<Bearer>::parse(request) {
        return Some(auth.as_ref().token().to_string());
    }

    request
        .headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .split_whitespace()
        .last()
        .map(str::to_string)
}
