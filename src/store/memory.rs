use std::{
    collections::{HashMap, HashSet},
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult, VoteOutcome};
use crate::models::{Comment, NewUser, Point, Review, ReviewContent, User, Vote};

/// Keeps everything in process memory. Used for local development
/// (``db_uri = "memory://"``) and the tests.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    reviews: HashMap<Uuid, Review>,
    /// ``(review, voter)``
    votes: HashSet<(Uuid, Uuid)>,
}

impl MemoryStore {
    // a panic while holding the lock can't leave a half written record
    // behind, every write below replaces or mutates one value in place
    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies ``f`` to the review and returns the result, ``None`` if
    /// there is no review with that id
    fn modify_review<F>(&self, id: Uuid, f: F) -> Option<Review>
    where
        F: FnOnce(&mut Review),
    {
        let mut inner = self.write();
        let review = inner.reviews.get_mut(&id)?;
        f(review);
        review.updated_at = Utc::now();
        Some(review.clone())
    }
}

fn count(review: &mut Review, vote: Vote) {
    match vote {
        Vote::Up => review.upvotes += 1,
        Vote::Down => review.downvotes += 1,
    }
}

fn newest_first(mut reviews: Vec<Review>) -> Vec<Review> {
    reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    reviews
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut inner = self.write();
        if inner.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate("username"));
        }
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("email"));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            review_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.read().users.get(&id).cloned())
    }

    async fn users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        let inner = self.read();
        Ok(ids
            .iter()
            .filter_map(|id| inner.users.get(id))
            .cloned()
            .collect())
    }

    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .read()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .read()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn users(&self) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = self.read().users.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }

    async fn push_user_review(&self, user: Uuid, review: Uuid) -> StoreResult<()> {
        if let Some(user) = self.write().users.get_mut(&user) {
            if !user.review_ids.contains(&review) {
                user.review_ids.push(review);
                user.updated_at = Utc::now();
            }
        }
        Ok(())
    }

    async fn pull_user_review(&self, user: Uuid, review: Uuid) -> StoreResult<()> {
        if let Some(user) = self.write().users.get_mut(&user) {
            user.review_ids.retain(|id| *id != review);
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn insert_review(&self, review: Review) -> StoreResult<Review> {
        self.write().reviews.insert(review.id, review.clone());
        Ok(review)
    }

    async fn review_by_id(&self, id: Uuid) -> StoreResult<Option<Review>> {
        Ok(self.read().reviews.get(&id).cloned())
    }

    async fn reviews_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Review>> {
        let inner = self.read();
        Ok(ids
            .iter()
            .filter_map(|id| inner.reviews.get(id))
            .cloned()
            .collect())
    }

    async fn reviews(&self) -> StoreResult<Vec<Review>> {
        Ok(newest_first(self.read().reviews.values().cloned().collect()))
    }

    async fn reviews_by_author(&self, author: Uuid) -> StoreResult<Vec<Review>> {
        Ok(newest_first(
            self.read()
                .reviews
                .values()
                .filter(|r| r.reviewed_by == author)
                .cloned()
                .collect(),
        ))
    }

    async fn reviews_near(&self, center: Point, max_distance: f64) -> StoreResult<Vec<Review>> {
        Ok(newest_first(
            self.read()
                .reviews
                .values()
                .filter(|r| center.distance_to(&r.content.location.point) <= max_distance)
                .cloned()
                .collect(),
        ))
    }

    async fn update_review(
        &self,
        id: Uuid,
        content: ReviewContent,
    ) -> StoreResult<Option<Review>> {
        Ok(self.modify_review(id, |review| review.content = content))
    }

    async fn delete_review(&self, id: Uuid) -> StoreResult<Option<Review>> {
        let mut inner = self.write();
        let review = inner.reviews.remove(&id);
        if review.is_some() {
            inner.votes.retain(|(review, _)| *review != id);
        }
        Ok(review)
    }

    async fn mark_verified(&self, id: Uuid) -> StoreResult<Option<Review>> {
        Ok(self.modify_review(id, |review| review.verified = true))
    }

    async fn add_vote(&self, id: Uuid, vote: Vote) -> StoreResult<Option<Review>> {
        Ok(self.modify_review(id, |review| count(review, vote)))
    }

    async fn add_vote_once(&self, id: Uuid, voter: Uuid, vote: Vote) -> StoreResult<VoteOutcome> {
        let mut inner = self.write();
        let Inner { reviews, votes, .. } = &mut *inner;
        let review = match reviews.get_mut(&id) {
            Some(review) => review,
            None => return Ok(VoteOutcome::NoSuchReview),
        };
        if !votes.insert((id, voter)) {
            return Ok(VoteOutcome::AlreadyVoted);
        }
        count(review, vote);
        review.updated_at = Utc::now();
        Ok(VoteOutcome::Counted(review.clone()))
    }

    async fn push_comment(&self, review: Uuid, comment: Comment) -> StoreResult<Option<Review>> {
        Ok(self.modify_review(review, |review| review.comments.push(comment)))
    }

    async fn pull_comment(&self, review: Uuid, comment: Uuid) -> StoreResult<Option<Review>> {
        Ok(self.modify_review(review, |review| {
            review.comments.retain(|c| c.id != comment)
        }))
    }

    async fn reconcile_review_links(&self) -> StoreResult<u64> {
        let mut inner = self.write();
        let Inner { users, reviews, .. } = &mut *inner;

        let mut owned: HashMap<Uuid, Vec<&Review>> = HashMap::new();
        for review in reviews.values() {
            owned.entry(review.reviewed_by).or_default().push(review);
        }

        let mut fixed = 0;
        for user in users.values_mut() {
            let mut mine = owned.remove(&user.id).unwrap_or_default();
            mine.sort_by(|a, b| a.created_at.cmp(&b.created_at));

            // keep the existing order and append whatever is missing
            let mut expected: Vec<Uuid> = user
                .review_ids
                .iter()
                .copied()
                .filter(|id| mine.iter().any(|r| r.id == *id))
                .collect();
            for review in mine {
                if !expected.contains(&review.id) {
                    expected.push(review.id);
                }
            }

            if expected != user.review_ids {
                user.review_ids = expected;
                user.updated_at = Utc::now();
                fixed += 1;
            }
        }
        Ok(fixed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Location, ReviewType};

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            email: format!("{}@example.com", name),
            password_hash: "not a real hash".to_string(),
        }
    }

    fn content_at(longitude: f64, latitude: f64) -> ReviewContent {
        ReviewContent {
            title: "Pickpockets".to_string(),
            description: "Crowded tram stop".to_string(),
            review_type: ReviewType::Theft,
            location: Location {
                point: Point::new(longitude, latitude),
                address: None,
            },
            severity: 3,
        }
    }

    #[actix_web::test]
    async fn test_unique_username_and_email() {
        let store = MemoryStore::default();
        store.insert_user(new_user("alice")).await.unwrap();

        let mut same_name = new_user("alice");
        same_name.email = "other@example.com".to_string();
        assert!(matches!(
            store.insert_user(same_name).await,
            Err(StoreError::Duplicate("username"))
        ));

        let mut same_email = new_user("alice2");
        same_email.email = "alice@example.com".to_string();
        assert!(matches!(
            store.insert_user(same_email).await,
            Err(StoreError::Duplicate("email"))
        ));
    }

    #[actix_web::test]
    async fn test_reviews_near_filters_and_sorts() {
        let store = MemoryStore::default();
        let author = Uuid::new_v4();
        let older = store
            .insert_review(Review::new(content_at(-98.5795, 39.8283), author))
            .await
            .unwrap();
        let mut newer = Review::new(content_at(-98.5800, 39.8290), author);
        newer.created_at = older.created_at + chrono::Duration::seconds(1);
        let newer = store.insert_review(newer).await.unwrap();
        // roughly 110 km further north
        store
            .insert_review(Review::new(content_at(-98.5795, 40.8283), author))
            .await
            .unwrap();

        let near = store
            .reviews_near(Point::new(-98.58, 39.83), 10_000.0)
            .await
            .unwrap();
        let ids: Vec<Uuid> = near.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
    }

    #[actix_web::test]
    async fn test_one_vote_per_voter() {
        let store = MemoryStore::default();
        let review = store
            .insert_review(Review::new(content_at(0.0, 0.0), Uuid::new_v4()))
            .await
            .unwrap();
        let voter = Uuid::new_v4();

        let outcome = store.add_vote_once(review.id, voter, Vote::Up).await.unwrap();
        assert!(matches!(outcome, VoteOutcome::Counted(r) if r.upvotes == 1));
        let outcome = store.add_vote_once(review.id, voter, Vote::Down).await.unwrap();
        assert!(matches!(outcome, VoteOutcome::AlreadyVoted));
        let outcome = store
            .add_vote_once(review.id, Uuid::new_v4(), Vote::Down)
            .await
            .unwrap();
        assert!(matches!(outcome, VoteOutcome::Counted(r) if (r.upvotes, r.downvotes) == (1, 1)));
    }

    #[actix_web::test]
    async fn test_vote_on_missing_review_records_nothing() {
        let store = MemoryStore::default();
        let review = Review::new(content_at(0.0, 0.0), Uuid::new_v4());
        let voter = Uuid::new_v4();

        let outcome = store.add_vote_once(review.id, voter, Vote::Up).await.unwrap();
        assert!(matches!(outcome, VoteOutcome::NoSuchReview));

        // the failed vote did not use up the voter's one vote
        let review = store.insert_review(review).await.unwrap();
        let outcome = store.add_vote_once(review.id, voter, Vote::Up).await.unwrap();
        assert!(matches!(outcome, VoteOutcome::Counted(r) if r.upvotes == 1));
    }

    #[actix_web::test]
    async fn test_reconcile_repairs_both_directions() {
        let store = MemoryStore::default();
        let alice = store.insert_user(new_user("alice")).await.unwrap();
        let bob = store.insert_user(new_user("bob")).await.unwrap();

        // a review whose back-reference never got written
        let orphan = store
            .insert_review(Review::new(content_at(0.0, 0.0), alice.id))
            .await
            .unwrap();
        // and a back-reference to a review that is gone
        store.push_user_review(bob.id, Uuid::new_v4()).await.unwrap();

        assert_eq!(store.reconcile_review_links().await.unwrap(), 2);
        let alice = store.user_by_id(alice.id).await.unwrap().unwrap();
        assert_eq!(alice.review_ids, vec![orphan.id]);
        let bob = store.user_by_id(bob.id).await.unwrap().unwrap();
        assert!(bob.review_ids.is_empty());

        // nothing left to do
        assert_eq!(store.reconcile_review_links().await.unwrap(), 0);
    }
}
