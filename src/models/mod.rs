//! Plain data as it is persisted, without any GraphQL on top
pub mod geo;
pub mod review;
pub mod user;

pub use geo::Point;
pub use review::{Comment, Location, Review, ReviewContent, ReviewType, Vote};
pub use user::{NewUser, User};
