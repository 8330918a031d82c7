use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::geo::Point;
use crate::fallible::Error;

/// What kind of incident a review reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewType {
    Harassment,
    Theft,
    Assault,
    UnsafeEnvironment,
    Other,
}

impl ReviewType {
    pub const ALL: [ReviewType; 5] = [
        Self::Harassment,
        Self::Theft,
        Self::Assault,
        Self::UnsafeEnvironment,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Harassment => "harassment",
            Self::Theft => "theft",
            Self::Assault => "assault",
            Self::UnsafeEnvironment => "unsafe_environment",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ReviewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| {
                Error::bad_input(format!(
                    "unknown review type {:?}, expected one of harassment, theft, assault, unsafe_environment, other",
                    s
                ))
            })
    }
}

/// Where an incident happened. Always a GeoJSON ``Point``.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub point: Point,
    pub address: Option<String>,
}

/// The part of a review its author controls
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewContent {
    pub title: String,
    pub description: String,
    pub review_type: ReviewType,
    pub location: Location,
    /// ``1..=5``
    pub severity: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Up,
    Down,
}

#[derive(Debug, Clone)]
pub struct Comment {
    pub id: Uuid,
    pub text: String,
    pub author: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Review {
    pub id: Uuid,
    pub content: ReviewContent,
    pub verified: bool,
    pub upvotes: i32,
    pub downvotes: i32,
    /// The author and owner of this review
    pub reviewed_by: Uuid,
    /// Oldest first
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Review {
    /// A fresh, unvoted review written by ``author``
    pub fn new(content: ReviewContent, author: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            content,
            verified: false,
            upvotes: 0,
            downvotes: 0,
            reviewed_by: author,
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Share of upvotes among all votes, 0 without any votes
    pub fn vote_ratio(&self) -> f64 {
        let total = self.upvotes as f64 + self.downvotes as f64;
        if total == 0.0 {
            0.0
        } else {
            self.upvotes as f64 / total
        }
    }

    pub fn comment(&self, id: Uuid) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == id)
    }
}
