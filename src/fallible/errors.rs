use async_graphql::ErrorExtensions;
use log::error;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// UserNotFound
    ///
    /// There is no user with the supplied name, email or id.
    /// Also returned by ``me`` if the token belongs to a user that
    /// does not exist (anymore).
    #[error("user not found")]
    UserNotFound,

    /// ReviewNotFound
    ///
    /// There is no review with the supplied id. Ids that are not
    /// valid uuids cannot belong to a review and end up here too.
    #[error("review not found")]
    ReviewNotFound,

    /// CommentNotFound
    ///
    /// The review exists but has no comment with the supplied id.
    #[error("comment not found")]
    CommentNotFound,

    /// Unauthorized
    ///
    /// The caller is authenticated but does not own the review
    /// or comment they tried to change.
    #[error("not authorized to {0}")]
    Unauthorized(&'static str),

    /// Unauthenticated
    ///
    /// The operation requires a valid bearer token and the request
    /// did not carry one. Expired and malformed tokens are treated
    /// like no token at all.
    #[error("you need to be logged in")]
    Unauthenticated,

    /// IncorrectCredentials
    ///
    /// The password does not match the one of the user.
    #[error("incorrect credentials")]
    IncorrectCredentials,

    /// BadUserInput
    ///
    /// An input value violates a constraint, e.g. a severity outside
    /// of ``1..=5``. Nothing was written.
    #[error("{0}")]
    BadUserInput(String),

    /// UserAlreadyExists
    ///
    /// Another user already has the same username or email.
    #[error("another user has the same {0}")]
    UserAlreadyExists(&'static str),

    /// AlreadyVoted
    ///
    /// Only with the ``once_per_user`` vote policy: the caller has
    /// already voted on this review.
    #[error("you already voted on this review")]
    AlreadyVoted,

    /// Internal
    ///
    /// Something failed on our side, probably the database. The
    /// details are only logged.
    #[error("internal server error")]
    Internal,
}

impl Error {
    /// The machine readable code of this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::ReviewNotFound => "REVIEW_NOT_FOUND",
            Self::CommentNotFound => "COMMENT_NOT_FOUND",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::IncorrectCredentials => "INCORRECT_CREDENTIALS",
            Self::BadUserInput(_) => "BAD_USER_INPUT",
            Self::UserAlreadyExists(_) => "USER_ALREADY_EXISTS",
            Self::AlreadyVoted => "ALREADY_VOTED",
            Self::Internal => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn bad_input(description: impl Into<String>) -> Self {
        Self::BadUserInput(description.into())
    }
}

impl ErrorExtensions for Error {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| e.set("code", self.code()))
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(field) => Self::UserAlreadyExists(field),
            e => {
                error!("store operation failed: {}", e);
                Self::Internal
            }
        }
    }
}
