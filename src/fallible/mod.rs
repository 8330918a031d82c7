//! Errors a client can run into.
//!
//! Every error leaves the server as a regular GraphQL error with a
//! machine readable ``code`` in its ``extensions``:
//!
//! ```json
//! {
//!   "message": "not authorized to delete this comment",
//!   "extensions": { "code": "UNAUTHORIZED" }
//! }
//! ```
//!
//! A client should match on the ``code``, the ``message`` is meant for the
//! developer and might change.
mod errors;

pub use errors::*;

/// Result of every operation that can fail in a way the client has to know about
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Turns any of our errors into the error type of the resolvers, keeping the ``code``
pub trait Extended<T> {
    fn extended(self) -> async_graphql::Result<T>;
}

impl<T, E: Into<Error>> Extended<T> for std::result::Result<T, E> {
    fn extended(self) -> async_graphql::Result<T> {
        use async_graphql::ErrorExtensions;
        self.map_err(|e| e.into().extend())
    }
}
