use async_graphql::InputObject;

use crate::{
    fallible::Error,
    models::{Location, Point, ReviewContent},
};

#[derive(InputObject, Debug, Clone)]
pub struct LocationInput {
    /// Has to be ``Point``
    #[graphql(name = "type")]
    pub kind: String,
    /// ``[longitude, latitude]``
    pub coordinates: Vec<f64>,
    pub address: Option<String>,
}

#[derive(InputObject, Debug, Clone)]
pub struct ReviewInput {
    pub title: String,
    pub description: String,
    /// One of ``harassment``, ``theft``, ``assault``, ``unsafe_environment``, ``other``
    pub review_type: String,
    pub location: LocationInput,
    /// From 1 to 5
    pub severity: i32,
}

impl LocationInput {
    pub fn validate(self) -> Result<Location, Error> {
        if self.kind != "Point" {
            return Err(Error::bad_input(format!(
                "location type has to be \"Point\", not {:?}",
                self.kind
            )));
        }

        let point = match self.coordinates[..] {
            [longitude, latitude] => Point::new(longitude, latitude),
            _ => {
                return Err(Error::bad_input(
                    "coordinates have to be exactly [longitude, latitude]",
                ))
            }
        };
        if !point.is_valid() {
            return Err(Error::bad_input(
                "longitude has to be within -180..180 and latitude within -90..90",
            ));
        }

        let address = self
            .address
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());
        Ok(Location { point, address })
    }
}

impl ReviewInput {
    /// Checks every constraint of a review, nothing is written before this passed
    pub fn validate(self) -> Result<ReviewContent, Error> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(Error::bad_input("title must not be empty"));
        }
        if self.description.trim().is_empty() {
            return Err(Error::bad_input("description must not be empty"));
        }
        if !(1..=5).contains(&self.severity) {
            return Err(Error::bad_input(format!(
                "severity has to be between 1 and 5, got {}",
                self.severity
            )));
        }

        Ok(ReviewContent {
            title: title.to_string(),
            review_type: self.review_type.parse()?,
            location: self.location.validate()?,
            description: self.description,
            severity: self.severity,
        })
    }
}
