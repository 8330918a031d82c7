//! Auth*entication*: accounts, passwords and tokens
use async_graphql::MergedObject;

pub mod authentication;
pub mod password;
pub mod signup;
pub mod token;

pub use authentication::Auth;
pub use token::TokenService;

#[derive(MergedObject, Default)]
pub struct AuthMutations(pub authentication::AuthenticationMutation);
