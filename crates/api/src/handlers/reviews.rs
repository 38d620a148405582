//! # Review Handlers
//!
//! Post-completion ratings. A review is only creatable once its appointment
//! is `completed`, and only by one of the two participants, about the other.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use bookwise_core::errors::BookingError;
use bookwise_core::models::appointment::AppointmentStatus;
use bookwise_core::models::expert::AggregateRatingResponse;
use bookwise_core::models::review::{CreateReviewRequest, CreateReviewResponse};

use crate::middleware::principal::Principal;
use crate::{middleware::error_handling::AppError, ApiState};

#[axum::debug_handler]
pub async fn create_review(
    State(state): State<Arc<ApiState>>,
    Path(appointment_id): Path<Uuid>,
    principal: Principal,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<Json<CreateReviewResponse>, AppError> {
    payload.validate()?;

    let appointment = bookwise_db::repositories::appointment::get_appointment_by_id(
        &state.db_pool,
        appointment_id,
    )
    .await
    .map_err(BookingError::Database)?
    .ok_or_else(|| {
        BookingError::NotFound(format!("Appointment with ID {} not found", appointment_id))
    })?
    .into_domain()?;

    if appointment.status != AppointmentStatus::Completed {
        return Err(AppError(BookingError::Validation(format!(
            "Appointment {} is not completed; reviews require a completed session",
            appointment_id
        ))));
    }

    if !appointment.is_participant(principal.id) {
        return Err(AppError(BookingError::Authorization(format!(
            "Principal {} is not a participant of appointment {}",
            principal.id, appointment_id
        ))));
    }

    // The reviewee is the other party of the appointment
    let reviewee_id = if principal.id == appointment.expert_id {
        appointment.client_id.ok_or_else(|| {
            BookingError::Validation(
                "Guest bookings have no reviewable client account".to_string(),
            )
        })?
    } else {
        appointment.expert_id
    };

    let review = bookwise_db::repositories::review::create_review(
        &state.db_pool,
        appointment_id,
        principal.id,
        reviewee_id,
        payload.rating,
        payload.review_text.as_deref(),
        payload.is_public,
    )
    .await?;

    tracing::info!(
        "Review created: id={}, appointment_id={}, rating={}",
        review.id,
        appointment_id,
        review.rating
    );

    Ok(Json(CreateReviewResponse {
        review: review.into(),
    }))
}

#[axum::debug_handler]
pub async fn get_aggregate_rating(
    State(state): State<Arc<ApiState>>,
    Path(expert_id): Path<Uuid>,
) -> Result<Json<AggregateRatingResponse>, AppError> {
    let aggregate =
        bookwise_db::repositories::review::get_aggregate_rating(&state.db_pool, expert_id)
            .await
            .map_err(BookingError::Database)?;

    Ok(Json(AggregateRatingResponse {
        expert_id,
        average_rating: aggregate.average_rating,
        review_count: aggregate.review_count,
    }))
}
