use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{BookingError, BookingResult};

/// A rating/review record keyed to a completed appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentReview {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub reviewer_id: Uuid,
    pub reviewee_id: Uuid,
    pub rating: i16,
    pub review_text: Option<String>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReviewRequest {
    pub rating: i16,
    pub review_text: Option<String>,
    #[serde(default = "default_public")]
    pub is_public: bool,
}

fn default_public() -> bool {
    true
}

impl CreateReviewRequest {
    pub fn validate(&self) -> BookingResult<()> {
        if !(1..=5).contains(&self.rating) {
            return Err(BookingError::Validation(format!(
                "rating must be between 1 and 5, got {}",
                self.rating
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReviewResponse {
    pub review: AppointmentReview,
}
