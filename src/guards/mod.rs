//! Checks that run before a resolver changes anything
mod authentication_guard;

pub use authentication_guard::{require_auth, AuthenticationGuard};
