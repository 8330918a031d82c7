use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct User {
    /// Unique identifier to identify the user
    pub id: Uuid,
    /// The users chosen username, unique and trimmed
    pub username: String,
    /// Unique email, used to log in
    pub email: String,
    /// PHC string of the users password hash. Never leaves the server.
    pub password_hash: String,
    /// Back-references to the reviews this user wrote, oldest first
    pub review_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated user that is not persisted yet
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}
