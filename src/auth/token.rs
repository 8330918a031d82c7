use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, Header, Validation};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{authn::Identity, config::JwtKeys};

/// How long a token stays valid after it was issued
const TOKEN_LIFETIME_HOURS: i64 = 2;

pub fn token_lifetime() -> Duration {
    Duration::hours(TOKEN_LIFETIME_HOURS)
}

#[derive(Debug, Serialize, Deserialize)]
#[non_exhaustive]
/// Claims
///
/// Represents the different fields in the JWT
pub struct Claims {
    /// the user this token was issued to
    pub data: Identity,
    /// issued at unix timestamp
    pub iat: i64,
    /// expires at unix timestamp
    pub exp: i64,
}

/// Issues and verifies the bearer tokens.
///
/// Built once at start-up from the configured secret and shared by
/// every request.
#[derive(Clone)]
pub struct TokenService {
    keys: JwtKeys,
    validation: Validation,
}

impl TokenService {
    pub fn new(keys: JwtKeys) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // expired is expired
        validation.leeway = 0;
        Self { keys, validation }
    }

    /// Issues a token for ``identity`` that expires in two hours
    pub fn issue(&self, identity: &Identity) -> jsonwebtoken::errors::Result<String> {
        self.issue_at(identity, Utc::now())
    }

    pub(crate) fn issue_at(
        &self,
        identity: &Identity,
        issued_at: DateTime<Utc>,
    ) -> jsonwebtoken::errors::Result<String> {
        let claims = Claims {
            data: identity.clone(),
            iat: issued_at.timestamp(),
            exp: (issued_at + token_lifetime()).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.keys.encoding)
    }

    /// Checks signature and expiry of ``token``.
    ///
    /// Any failure means "no identity", the reason is only logged.
    pub fn verify(&self, token: &str) -> Option<Identity> {
        match decode::<Claims>(token, &self.keys.decoding, &self.validation) {
            Ok(token) => Some(token.claims.data),
            Err(e) => {
                debug!("rejected bearer token: {}", e);
                None
            }
        }
    }
}
