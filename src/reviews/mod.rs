//! Reviews, their votes and comments
use async_graphql::MergedObject;

use crate::config::{Config, VotePolicy};

mod input;
pub mod links;
mod mutations;
pub mod operations;
mod queries;
mod review;

pub use input::ReviewInput;
pub use review::Review;

/// The configurable part of how reviews behave
#[derive(Debug, Clone, Copy)]
pub struct ReviewPolicy {
    pub vote_policy: VotePolicy,
    /// How often the owner's review list is written before giving up
    pub link_attempts: u32,
}

impl From<&Config> for ReviewPolicy {
    fn from(config: &Config) -> Self {
        Self {
            vote_policy: config.vote_policy,
            link_attempts: config.link_attempts,
        }
    }
}

#[derive(MergedObject, Default)]
pub struct ReviewQueries(queries::ReviewQuery);

#[derive(MergedObject, Default)]
pub struct ReviewMutations(mutations::ReviewMutation);
