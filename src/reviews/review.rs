use async_graphql::{Context, Object, Result, SimpleObject, ID};
use chrono::{DateTime, Utc};

use crate::{actors::User, loader::load_user, models};

#[derive(Debug, Clone)]
pub struct Review(pub(crate) models::Review);

impl From<models::Review> for Review {
    fn from(review: models::Review) -> Self {
        Self(review)
    }
}

/// Location
///
/// A GeoJSON point. ``coordinates`` are ``[longitude, latitude]``.
#[derive(SimpleObject, Debug, Clone)]
pub struct Location {
    /// Always ``Point``
    #[graphql(name = "type")]
    pub kind: String,
    pub coordinates: Vec<f64>,
    pub address: Option<String>,
}

impl From<&models::Location> for Location {
    fn from(location: &models::Location) -> Self {
        Self {
            kind: "Point".to_string(),
            coordinates: vec![location.point.longitude, location.point.latitude],
            address: location.address.clone(),
        }
    }
}

#[Object]
/// Review
///
/// A geotagged report of an incident
impl Review {
    #[graphql(name = "_id")]
    pub async fn id(&self) -> ID {
        self.0.id.into()
    }

    pub async fn title(&self) -> &str {
        &self.0.content.title
    }

    pub async fn description(&self) -> &str {
        &self.0.content.description
    }

    /// One of ``harassment``, ``theft``, ``assault``, ``unsafe_environment``, ``other``
    pub async fn review_type(&self) -> &str {
        self.0.content.review_type.as_str()
    }

    pub async fn location(&self) -> Location {
        Location::from(&self.0.content.location)
    }

    /// From 1 (minor) to 5 (severe)
    pub async fn severity(&self) -> i32 {
        self.0.content.severity
    }

    pub async fn verified(&self) -> bool {
        self.0.verified
    }

    pub async fn upvotes(&self) -> i32 {
        self.0.upvotes
    }

    pub async fn downvotes(&self) -> i32 {
        self.0.downvotes
    }

    /// ``upvotes / (upvotes + downvotes)``, 0 without votes
    pub async fn vote_ratio(&self) -> f64 {
        self.0.vote_ratio()
    }

    /// The author of this review
    pub async fn reviewed_by(&self, ctx: &Context<'_>) -> Result<User> {
        load_user(ctx, self.0.reviewed_by).await
    }

    /// Oldest first
    pub async fn comments(&self) -> Vec<Comment> {
        self.0.comments.iter().cloned().map(Comment).collect()
    }

    pub async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at
    }

    pub async fn updated_at(&self) -> DateTime<Utc> {
        self.0.updated_at
    }
}

#[derive(Debug, Clone)]
pub struct Comment(pub(crate) models::Comment);

#[Object]
impl Comment {
    #[graphql(name = "_id")]
    pub async fn id(&self) -> ID {
        self.0.id.into()
    }

    pub async fn comment_text(&self) -> &str {
        &self.0.text
    }

    pub async fn comment_author(&self, ctx: &Context<'_>) -> Result<User> {
        load_user(ctx, self.0.author).await
    }

    pub async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at
    }
}
