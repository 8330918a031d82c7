use async_graphql::dataloader::DataLoader;

mod user_loader;

pub use user_loader::*;

/// The [`UserLoader`] as it is registered in the schema
pub type UserDataLoader = DataLoader<UserLoader>;
