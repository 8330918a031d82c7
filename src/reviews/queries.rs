use std::sync::Arc;

use async_graphql::{Context, Object, Result, ID};

use super::{operations::find_review, Review};
use crate::{
    fallible::{Error, Extended},
    models::Point,
    store::Store,
};

#[derive(Default)]
pub struct ReviewQuery;

#[Object]
impl ReviewQuery {
    /// All reviews, newest first
    async fn reviews(&self, ctx: &Context<'_>) -> Result<Vec<Review>> {
        let store = ctx.data::<Arc<dyn Store>>()?;
        let reviews = store.reviews().await.extended()?;
        Ok(reviews.into_iter().map(Review::from).collect())
    }

    async fn review(&self, ctx: &Context<'_>, review_id: ID) -> Result<Review> {
        let store = ctx.data::<Arc<dyn Store>>()?;
        find_review(store.as_ref(), &review_id)
            .await
            .map(Review::from)
            .extended()
    }

    /// The reviews a user wrote, newest first
    async fn reviews_by_user(&self, ctx: &Context<'_>, username: String) -> Result<Vec<Review>> {
        let store = ctx.data::<Arc<dyn Store>>()?;
        let user = store
            .user_by_username(username.trim())
            .await
            .extended()?
            .ok_or(Error::UserNotFound)
            .extended()?;
        let reviews = store.reviews_by_author(user.id).await.extended()?;
        Ok(reviews.into_iter().map(Review::from).collect())
    }

    /// Reviews at most ``distance`` meters away from the point, newest first
    async fn reviews_by_location(
        &self,
        ctx: &Context<'_>,
        longitude: f64,
        latitude: f64,
        #[graphql(default = 5000)] distance: i32,
    ) -> Result<Vec<Review>> {
        let center = Point::new(longitude, latitude);
        if !center.is_valid() {
            return Err(Error::bad_input(
                "longitude has to be within -180..180 and latitude within -90..90",
            ))
            .extended();
        }
        if distance < 0 {
            return Err(Error::bad_input("distance must not be negative")).extended();
        }

        let store = ctx.data::<Arc<dyn Store>>()?;
        let reviews = store
            .reviews_near(center, f64::from(distance))
            .await
            .extended()?;
        Ok(reviews.into_iter().map(Review::from).collect())
    }
}
