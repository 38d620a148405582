use crate::models::{DbAggregateRating, DbAppointmentReview};
use bookwise_core::errors::{BookingError, BookingResult};
use chrono::Utc;
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

pub async fn create_review(
    pool: &Pool<Postgres>,
    appointment_id: Uuid,
    reviewer_id: Uuid,
    reviewee_id: Uuid,
    rating: i16,
    review_text: Option<&str>,
    is_public: bool,
) -> BookingResult<DbAppointmentReview> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    tracing::debug!(
        "Creating review: appointment_id={}, reviewer_id={}, rating={}",
        appointment_id,
        reviewer_id,
        rating
    );

    let result = sqlx::query_as::<_, DbAppointmentReview>(
        r#"
        INSERT INTO appointment_reviews
            (id, appointment_id, reviewer_id, reviewee_id, rating,
             review_text, is_public, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, appointment_id, reviewer_id, reviewee_id, rating,
                  review_text, is_public, created_at
        "#,
    )
    .bind(id)
    .bind(appointment_id)
    .bind(reviewer_id)
    .bind(reviewee_id)
    .bind(rating)
    .bind(review_text)
    .bind(is_public)
    .bind(now)
    .fetch_one(pool)
    .await;

    match result {
        Ok(row) => Ok(row),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Err(BookingError::Validation(format!(
                "Reviewer {} already reviewed appointment {}",
                reviewer_id, appointment_id
            )))
        }
        Err(err) => Err(BookingError::Database(err.into())),
    }
}

/// Average and count over public reviews received by an expert.
pub async fn get_aggregate_rating(
    pool: &Pool<Postgres>,
    expert_id: Uuid,
) -> Result<DbAggregateRating> {
    let aggregate = sqlx::query_as::<_, DbAggregateRating>(
        r#"
        SELECT AVG(rating)::FLOAT8 AS average_rating, COUNT(*) AS review_count
        FROM appointment_reviews
        WHERE reviewee_id = $1 AND is_public = TRUE
        "#,
    )
    .bind(expert_id)
    .fetch_one(pool)
    .await?;

    Ok(aggregate)
}
