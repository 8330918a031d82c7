use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{Store, StoreError, StoreResult, VoteOutcome};
use crate::models::{
    geo::EARTH_RADIUS_METERS, Comment, Location, NewUser, Point, Review, ReviewContent,
    ReviewType, User, Vote,
};

/// Prepends the column list of a review to the rest of the query
macro_rules! review_query {
    ($($tail:literal)*) => {
        concat!(
            r#"SELECT id, title, description, review_type, longitude, latitude, address,
                severity, verified, upvotes, downvotes, reviewed_by, created_at, updated_at
            FROM reviews "#,
            $($tail),*
        )
    };
}

macro_rules! user_query {
    ($($tail:literal)*) => {
        concat!(
            r#"SELECT id, username, email, password_hash, review_ids, created_at, updated_at
            FROM users "#,
            $($tail),*
        )
    };
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(uri: &str) -> Result<Self, sqlx::Error> {
        Ok(Self {
            pool: PgPool::connect(uri).await?,
        })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations/").run(&self.pool).await
    }

    /// Loads the comments of ``rows`` and turns them into [`Review`]s, keeping the order
    async fn with_comments(&self, rows: Vec<ReviewRow>) -> StoreResult<Vec<Review>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let comments = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT id, review_id, comment_text, comment_author, created_at
            FROM comments WHERE review_id = ANY($1)
            ORDER BY created_at, id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_review: HashMap<Uuid, Vec<Comment>> = HashMap::new();
        for row in comments {
            by_review.entry(row.review_id).or_default().push(row.into());
        }

        rows.into_iter()
            .map(|row| {
                let comments = by_review.remove(&row.id).unwrap_or_default();
                row.into_review(comments)
            })
            .collect()
    }

    async fn one_with_comments(&self, row: Option<ReviewRow>) -> StoreResult<Option<Review>> {
        match row {
            Some(row) => Ok(self.with_comments(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    review_ids: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            review_ids: row.review_ids,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct ReviewRow {
    id: Uuid,
    title: String,
    description: String,
    review_type: String,
    longitude: f64,
    latitude: f64,
    address: Option<String>,
    severity: i32,
    verified: bool,
    upvotes: i32,
    downvotes: i32,
    reviewed_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ReviewRow {
    fn into_review(self, comments: Vec<Comment>) -> StoreResult<Review> {
        let review_type: ReviewType = self.review_type.parse().map_err(|_| {
            StoreError::Corrupt(format!(
                "review {} has unknown type {:?}",
                self.id, self.review_type
            ))
        })?;
        Ok(Review {
            id: self.id,
            content: ReviewContent {
                title: self.title,
                description: self.description,
                review_type,
                location: Location {
                    point: Point::new(self.longitude, self.latitude),
                    address: self.address,
                },
                severity: self.severity,
            },
            verified: self.verified,
            upvotes: self.upvotes,
            downvotes: self.downvotes,
            reviewed_by: self.reviewed_by,
            comments,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct CommentRow {
    id: Uuid,
    review_id: Uuid,
    comment_text: String,
    comment_author: Uuid,
    created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            text: row.comment_text,
            author: row.comment_author,
            created_at: row.created_at,
        }
    }
}

/// Turns unique violations on the users table into [`StoreError::Duplicate`]
fn user_constraint(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        // postgresql error codes: https://www.postgresql.org/docs/current/errcodes-appendix.html
        // 23505 = unique violation -> already exists
        if db.code().as_deref() == Some("23505") {
            match db.constraint() {
                Some("users_username_key") => return StoreError::Duplicate("username"),
                Some("users_email_key") => return StoreError::Duplicate("email"),
                _ => {}
            }
        }
    }
    e.into()
}

#[async_trait]
impl Store for PgStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, username, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, password_hash, review_ids, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(user_constraint)?;
        Ok(row.into())
    }

    async fn user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(sqlx::query_as::<_, UserRow>(user_query!("WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::from))
    }

    async fn users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        Ok(sqlx::query_as::<_, UserRow>(user_query!("WHERE id = ANY($1)"))
            .bind(ids)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(User::from)
            .collect())
    }

    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(sqlx::query_as::<_, UserRow>(user_query!("WHERE username = $1"))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .map(User::from))
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(sqlx::query_as::<_, UserRow>(user_query!("WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(User::from))
    }

    async fn users(&self) -> StoreResult<Vec<User>> {
        Ok(sqlx::query_as::<_, UserRow>(user_query!("ORDER BY created_at"))
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(User::from)
            .collect())
    }

    async fn push_user_review(&self, user: Uuid, review: Uuid) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE users SET review_ids = array_append(review_ids, $2), updated_at = now()
            WHERE id = $1 AND NOT ($2 = ANY(review_ids))
            "#,
        )
        .bind(user)
        .bind(review)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn pull_user_review(&self, user: Uuid, review: Uuid) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE users SET review_ids = array_remove(review_ids, $2), updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(user)
        .bind(review)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_review(&self, review: Review) -> StoreResult<Review> {
        let content = &review.content;
        sqlx::query(
            r#"
            INSERT INTO reviews (
                id, title, description, review_type, longitude, latitude, address,
                severity, verified, upvotes, downvotes, reviewed_by, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(review.id)
        .bind(&content.title)
        .bind(&content.description)
        .bind(content.review_type.as_str())
        .bind(content.location.point.longitude)
        .bind(content.location.point.latitude)
        .bind(&content.location.address)
        .bind(content.severity)
        .bind(review.verified)
        .bind(review.upvotes)
        .bind(review.downvotes)
        .bind(review.reviewed_by)
        .bind(review.created_at)
        .bind(review.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(review)
    }

    async fn review_by_id(&self, id: Uuid) -> StoreResult<Option<Review>> {
        let row = sqlx::query_as::<_, ReviewRow>(review_query!("WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        self.one_with_comments(row).await
    }

    async fn reviews_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Review>> {
        let rows = sqlx::query_as::<_, ReviewRow>(review_query!("WHERE id = ANY($1)"))
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        let mut by_id: HashMap<Uuid, Review> = self
            .with_comments(rows)
            .await?
            .into_iter()
            .map(|r| (r.id, r))
            .collect();
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn reviews(&self) -> StoreResult<Vec<Review>> {
        let rows = sqlx::query_as::<_, ReviewRow>(review_query!("ORDER BY created_at DESC"))
            .fetch_all(&self.pool)
            .await?;
        self.with_comments(rows).await
    }

    async fn reviews_by_author(&self, author: Uuid) -> StoreResult<Vec<Review>> {
        let rows = sqlx::query_as::<_, ReviewRow>(review_query!(
            "WHERE reviewed_by = $1 ORDER BY created_at DESC"
        ))
        .bind(author)
        .fetch_all(&self.pool)
        .await?;
        self.with_comments(rows).await
    }

    async fn reviews_near(&self, center: Point, max_distance: f64) -> StoreResult<Vec<Review>> {
        let (min_lat, max_lat) = center.latitude_band(max_distance);
        // haversine, the same formula as ``Point::distance_to``
        let rows = sqlx::query_as::<_, ReviewRow>(review_query!(
            "WHERE latitude BETWEEN $3 AND $4 "
            "AND 2 * $5 * asin(least(1.0::float8, sqrt("
            "    power(sin(radians(latitude - $2) / 2), 2)"
            "    + cos(radians($2)) * cos(radians(latitude))"
            "    * power(sin(radians(longitude - $1) / 2), 2)"
            "))) <= $6 "
            "ORDER BY created_at DESC"
        ))
        .bind(center.longitude)
        .bind(center.latitude)
        .bind(min_lat)
        .bind(max_lat)
        .bind(EARTH_RADIUS_METERS)
        .bind(max_distance)
        .fetch_all(&self.pool)
        .await?;
        self.with_comments(rows).await
    }

    async fn update_review(
        &self,
        id: Uuid,
        content: ReviewContent,
    ) -> StoreResult<Option<Review>> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r#"
            UPDATE reviews SET
                title = $2, description = $3, review_type = $4, longitude = $5,
                latitude = $6, address = $7, severity = $8, updated_at = now()
            WHERE id = $1
            RETURNING id, title, description, review_type, longitude, latitude, address,
                severity, verified, upvotes, downvotes, reviewed_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&content.title)
        .bind(&content.description)
        .bind(content.review_type.as_str())
        .bind(content.location.point.longitude)
        .bind(content.location.point.latitude)
        .bind(&content.location.address)
        .bind(content.severity)
        .fetch_optional(&self.pool)
        .await?;
        self.one_with_comments(row).await
    }

    async fn delete_review(&self, id: Uuid) -> StoreResult<Option<Review>> {
        let mut tx = self.pool.begin().await?;
        // read before the delete, the foreign key takes them along
        let comments = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT id, review_id, comment_text, comment_author, created_at
            FROM comments WHERE review_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;
        let row = sqlx::query_as::<_, ReviewRow>(
            r#"
            DELETE FROM reviews WHERE id = $1
            RETURNING id, title, description, review_type, longitude, latitude, address,
                severity, verified, upvotes, downvotes, reviewed_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;

        row.map(|row| row.into_review(comments.into_iter().map(Comment::from).collect()))
            .transpose()
    }

    async fn mark_verified(&self, id: Uuid) -> StoreResult<Option<Review>> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r#"
            UPDATE reviews SET verified = TRUE, updated_at = now() WHERE id = $1
            RETURNING id, title, description, review_type, longitude, latitude, address,
                severity, verified, upvotes, downvotes, reviewed_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        self.one_with_comments(row).await
    }

    async fn add_vote(&self, id: Uuid, vote: Vote) -> StoreResult<Option<Review>> {
        let query = match vote {
            Vote::Up => {
                r#"
                UPDATE reviews SET upvotes = upvotes + 1, updated_at = now() WHERE id = $1
                RETURNING id, title, description, review_type, longitude, latitude, address,
                    severity, verified, upvotes, downvotes, reviewed_by, created_at, updated_at
                "#
            }
            Vote::Down => {
                r#"
                UPDATE reviews SET downvotes = downvotes + 1, updated_at = now() WHERE id = $1
                RETURNING id, title, description, review_type, longitude, latitude, address,
                    severity, verified, upvotes, downvotes, reviewed_by, created_at, updated_at
                "#
            }
        };
        let row = sqlx::query_as::<_, ReviewRow>(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        self.one_with_comments(row).await
    }

    async fn add_vote_once(&self, id: Uuid, voter: Uuid, vote: Vote) -> StoreResult<VoteOutcome> {
        // the voter is only recorded together with the increment
        let query = match vote {
            Vote::Up => concat!(
                "WITH target AS (SELECT id FROM reviews WHERE id = $1), ",
                "voted AS (INSERT INTO review_votes (review_id, voter) SELECT id, $2 FROM target ",
                "ON CONFLICT DO NOTHING RETURNING review_id) ",
                "UPDATE reviews SET upvotes = upvotes + 1, updated_at = now() ",
                "WHERE id IN (SELECT review_id FROM voted) ",
                "RETURNING id, title, description, review_type, longitude, latitude, address, ",
                "severity, verified, upvotes, downvotes, reviewed_by, created_at, updated_at"
            ),
            Vote::Down => concat!(
                "WITH target AS (SELECT id FROM reviews WHERE id = $1), ",
                "voted AS (INSERT INTO review_votes (review_id, voter) SELECT id, $2 FROM target ",
                "ON CONFLICT DO NOTHING RETURNING review_id) ",
                "UPDATE reviews SET downvotes = downvotes + 1, updated_at = now() ",
                "WHERE id IN (SELECT review_id FROM voted) ",
                "RETURNING id, title, description, review_type, longitude, latitude, address, ",
                "severity, verified, upvotes, downvotes, reviewed_by, created_at, updated_at"
            ),
        };
        let row = sqlx::query_as::<_, ReviewRow>(query)
            .bind(id)
            .bind(voter)
            .fetch_optional(&self.pool)
            .await?;
        if let Some(review) = self.one_with_comments(row).await? {
            return Ok(VoteOutcome::Counted(review));
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM reviews WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(if exists {
            VoteOutcome::AlreadyVoted
        } else {
            VoteOutcome::NoSuchReview
        })
    }

    async fn push_comment(&self, review: Uuid, comment: Comment) -> StoreResult<Option<Review>> {
        let inserted = sqlx::query(
            r#"
            WITH touched AS (
                UPDATE reviews SET updated_at = now() WHERE id = $2 RETURNING id
            )
            INSERT INTO comments (id, review_id, comment_text, comment_author, created_at)
            SELECT $1, id, $3, $4, $5 FROM touched
            "#,
        )
        .bind(comment.id)
        .bind(review)
        .bind(&comment.text)
        .bind(comment.author)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if inserted == 0 {
            return Ok(None);
        }
        self.review_by_id(review).await
    }

    async fn pull_comment(&self, review: Uuid, comment: Uuid) -> StoreResult<Option<Review>> {
        sqlx::query(
            r#"
            WITH touched AS (
                UPDATE reviews SET updated_at = now() WHERE id = $1 RETURNING id
            )
            DELETE FROM comments WHERE id = $2 AND review_id IN (SELECT id FROM touched)
            "#,
        )
        .bind(review)
        .bind(comment)
        .execute(&self.pool)
        .await?;
        self.review_by_id(review).await
    }

    async fn reconcile_review_links(&self) -> StoreResult<u64> {
        // keep the existing order, append missing reviews by age
        let fixed = sqlx::query(
            r#"
            WITH expected AS (
                SELECT u.id, COALESCE((
                    SELECT array_agg(
                        r.id ORDER BY array_position(u.review_ids, r.id) NULLS LAST, r.created_at
                    )
                    FROM reviews r WHERE r.reviewed_by = u.id
                ), '{}') AS review_ids
                FROM users u
            )
            UPDATE users SET review_ids = expected.review_ids, updated_at = now()
            FROM expected
            WHERE users.id = expected.id AND users.review_ids <> expected.review_ids
            "#,
        )
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(fixed)
    }
}
