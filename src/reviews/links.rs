//! The owner's list of review ids.
//!
//! A review and the list of its owner live in different records, so
//! adding or removing a review takes two writes. The review is always
//! written first. If the second write keeps failing the request still
//! succeeds and [`sweep`] fixes the list later on.
use std::{sync::Arc, time::Duration};

use actix_web::rt::{self, time::sleep};
use log::{debug, info, warn};
use uuid::Uuid;

use crate::store::{Store, StoreResult};

/// Pause before the first retry, doubled after every further failure
const RETRY_DELAY: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy)]
enum Link {
    Push,
    Pull,
}

/// Appends ``review`` to the review list of ``owner``
pub async fn link_review(store: &dyn Store, owner: Uuid, review: Uuid, attempts: u32) -> bool {
    with_retries(store, Link::Push, owner, review, attempts).await
}

/// Removes ``review`` from the review list of ``owner``
pub async fn unlink_review(store: &dyn Store, owner: Uuid, review: Uuid, attempts: u32) -> bool {
    with_retries(store, Link::Pull, owner, review, attempts).await
}

async fn with_retries(
    store: &dyn Store,
    link: Link,
    owner: Uuid,
    review: Uuid,
    attempts: u32,
) -> bool {
    let mut delay = RETRY_DELAY;
    for attempt in 1..=attempts.max(1) {
        let result = match link {
            Link::Push => store.push_user_review(owner, review).await,
            Link::Pull => store.pull_user_review(owner, review).await,
        };
        match result {
            Ok(()) => return true,
            Err(e) if attempt < attempts => {
                debug!(
                    "{:?} of review {} for user {} failed (attempt {}): {}",
                    link, review, owner, attempt, e
                );
                sleep(delay).await;
                delay *= 2;
            }
            Err(e) => {
                warn!(
                    "Giving up to {:?} review {} for user {}, leaving it to the next sweep: {}",
                    link, review, owner, e
                );
            }
        }
    }
    false
}

/// Rebuilds the review lists of all users from the reviews themselves
pub async fn sweep(store: &dyn Store) -> StoreResult<u64> {
    let fixed = store.reconcile_review_links().await?;
    if fixed > 0 {
        info!("Repaired the review list of {} user(s)", fixed);
    } else {
        debug!("All review lists are consistent");
    }
    Ok(fixed)
}

/// Runs [`sweep`] every ``period`` on the actix runtime
pub fn spawn_sweeper(store: Arc<dyn Store>, period: Duration) {
    rt::spawn(async move {
        loop {
            sleep(period).await;
            if let Err(e) = sweep(store.as_ref()).await {
                warn!("Consistency sweep failed: {}", e);
            }
        }
    });
}
