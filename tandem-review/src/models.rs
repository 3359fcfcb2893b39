use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::ReviewError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewType {
    PassengerToDriver,
    DriverToPassenger,
}

impl ReviewType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewType::PassengerToDriver => "PASSENGER_TO_DRIVER",
            ReviewType::DriverToPassenger => "DRIVER_TO_PASSENGER",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PASSENGER_TO_DRIVER" => Some(ReviewType::PassengerToDriver),
            "DRIVER_TO_PASSENGER" => Some(ReviewType::DriverToPassenger),
            _ => None,
        }
    }
}

/// Optional per-aspect sub-ratings alongside the overall star rating.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AspectRatings {
    pub punctuality: Option<i32>,
    pub cleanliness: Option<i32>,
    pub communication: Option<i32>,
}

impl AspectRatings {
    pub fn validate(&self) -> Result<(), ReviewError> {
        for aspect in [self.punctuality, self.cleanliness, self.communication]
            .into_iter()
            .flatten()
        {
            if !(1..=5).contains(&aspect) {
                return Err(ReviewError::InvalidRating { given: aspect });
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.punctuality.is_none() && self.cleanliness.is_none() && self.communication.is_none()
    }
}

/// A post-ride review by one participant about the other. At most one review
/// exists per (booking, reviewer) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub ride_id: Uuid,
    pub reviewer_id: String,
    pub reviewee_id: String,
    pub review_type: ReviewType,
    pub rating: i32,
    pub comment: Option<String>,
    pub aspects: Option<AspectRatings>,
    pub is_visible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Review {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        booking_id: Uuid,
        ride_id: Uuid,
        reviewer_id: String,
        reviewee_id: String,
        review_type: ReviewType,
        rating: i32,
        comment: Option<String>,
        aspects: Option<AspectRatings>,
        now: DateTime<Utc>,
    ) -> Result<Self, ReviewError> {
        if !(1..=5).contains(&rating) {
            return Err(ReviewError::InvalidRating { given: rating });
        }
        if let Some(aspects) = &aspects {
            aspects.validate()?;
        }

        Ok(Self {
            id: Uuid::new_v4(),
            booking_id,
            ride_id,
            reviewer_id,
            reviewee_id,
            review_type,
            rating,
            comment,
            aspects,
            is_visible: true,
            created_at: now,
            updated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_must_be_one_to_five() {
        for bad in [0, 6, -1] {
            let result = Review::new(
                Uuid::new_v4(),
                Uuid::new_v4(),
                "p".to_string(),
                "d".to_string(),
                ReviewType::PassengerToDriver,
                bad,
                None,
                None,
                Utc::now(),
            );
            assert!(matches!(result, Err(ReviewError::InvalidRating { .. })));
        }
    }

    #[test]
    fn aspect_ratings_are_bounded_too() {
        let aspects = AspectRatings {
            punctuality: Some(5),
            cleanliness: Some(0),
            communication: None,
        };
        assert!(matches!(
            aspects.validate(),
            Err(ReviewError::InvalidRating { given: 0 })
        ));
    }

    #[test]
    fn new_reviews_are_visible() {
        let review = Review::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "p".to_string(),
            "d".to_string(),
            ReviewType::PassengerToDriver,
            4,
            Some("smooth ride".to_string()),
            None,
            Utc::now(),
        )
        .unwrap();
        assert!(review.is_visible);
    }
}
