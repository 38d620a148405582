use pretty_assertions::assert_eq;
use uuid::Uuid;

use bookwise_api::middleware::error_handling::AppError;
use bookwise_core::errors::BookingError;
use bookwise_core::models::appointment::{Appointment, AppointmentStatus};
use bookwise_core::models::review::{AppointmentReview, CreateReviewRequest};

use crate::test_utils::{db_appointment, TestContext};

// Test wrapper replicating the review-creation handler's flow against mocks
async fn test_create_review_wrapper(
    ctx: &mut TestContext,
    appointment_id: Uuid,
    reviewer_id: Uuid,
    request: CreateReviewRequest,
) -> Result<AppointmentReview, AppError> {
    request.validate()?;

    let appointment: Appointment = ctx
        .appointment_repo
        .get_appointment_by_id(appointment_id)
        .await?
        .ok_or_else(|| AppError(BookingError::NotFound("Appointment not found".to_string())))?
        .into_domain()?;

    if appointment.status != AppointmentStatus::Completed {
        return Err(AppError(BookingError::Validation(
            "Reviews require a completed session".to_string(),
        )));
    }

    if !appointment.is_participant(reviewer_id) {
        return Err(AppError(BookingError::Authorization(
            "Not a participant".to_string(),
        )));
    }

    let reviewee_id = if reviewer_id == appointment.expert_id {
        appointment.client_id.ok_or_else(|| {
            AppError(BookingError::Validation(
                "Guest bookings have no reviewable client account".to_string(),
            ))
        })?
    } else {
        appointment.expert_id
    };

    let text: Option<&'static str> = request
        .review_text
        .clone()
        .map(|t| Box::leak(t.into_boxed_str()) as &'static str);

    let review = ctx
        .review_repo
        .create_review(
            appointment_id,
            reviewer_id,
            reviewee_id,
            request.rating,
            text,
            request.is_public,
        )
        .await?;

    Ok(review.into())
}

fn five_stars() -> CreateReviewRequest {
    CreateReviewRequest {
        rating: 5,
        review_text: Some("Incredibly helpful session".to_string()),
        is_public: true,
    }
}

#[tokio::test]
async fn test_review_on_completed_appointment_succeeds() {
    let mut ctx = TestContext::new();
    let row = db_appointment("completed", true);
    let appointment_id = row.id;
    let client_id = row.client_id.unwrap();
    let expert_id = row.expert_id;
    let row_clone = row.clone();

    ctx.appointment_repo
        .expect_get_appointment_by_id()
        .returning(move |_| Ok(Some(row_clone.clone())));
    ctx.review_repo
        .expect_create_review()
        .times(1)
        .withf(move |appt, reviewer, reviewee, rating, _, is_public| {
            *appt == appointment_id
                && *reviewer == client_id
                && *reviewee == expert_id
                && *rating == 5
                && *is_public
        })
        .returning(|appt, reviewer, reviewee, rating, text, is_public| {
            Ok(bookwise_db::models::DbAppointmentReview {
                id: Uuid::new_v4(),
                appointment_id: appt,
                reviewer_id: reviewer,
                reviewee_id: reviewee,
                rating,
                review_text: text.map(str::to_string),
                is_public,
                created_at: chrono::Utc::now(),
            })
        });

    let review = test_create_review_wrapper(&mut ctx, appointment_id, client_id, five_stars())
        .await
        .unwrap();

    assert_eq!(review.rating, 5);
    assert_eq!(review.reviewee_id, expert_id);
}

#[tokio::test]
async fn test_review_before_completion_is_rejected() {
    let mut ctx = TestContext::new();
    let row = db_appointment("confirmed", true);
    let appointment_id = row.id;
    let client_id = row.client_id.unwrap();

    ctx.appointment_repo
        .expect_get_appointment_by_id()
        .returning(move |_| Ok(Some(row.clone())));
    ctx.review_repo.expect_create_review().times(0);

    let err = test_create_review_wrapper(&mut ctx, appointment_id, client_id, five_stars())
        .await
        .unwrap_err();
    assert!(matches!(err.0, BookingError::Validation(_)));
}

#[tokio::test]
async fn test_review_by_non_participant_is_forbidden() {
    let mut ctx = TestContext::new();
    let row = db_appointment("completed", true);
    let appointment_id = row.id;

    ctx.appointment_repo
        .expect_get_appointment_by_id()
        .returning(move |_| Ok(Some(row.clone())));
    ctx.review_repo.expect_create_review().times(0);

    let err = test_create_review_wrapper(&mut ctx, appointment_id, Uuid::new_v4(), five_stars())
        .await
        .unwrap_err();
    assert!(matches!(err.0, BookingError::Authorization(_)));
}

#[tokio::test]
async fn test_expert_reviews_the_client() {
    let mut ctx = TestContext::new();
    let row = db_appointment("completed", true);
    let appointment_id = row.id;
    let expert_id = row.expert_id;
    let client_id = row.client_id.unwrap();
    let row_clone = row.clone();

    ctx.appointment_repo
        .expect_get_appointment_by_id()
        .returning(move |_| Ok(Some(row_clone.clone())));
    ctx.review_repo
        .expect_create_review()
        .times(1)
        .withf(move |_, reviewer, reviewee, _, _, _| {
            *reviewer == expert_id && *reviewee == client_id
        })
        .returning(|appt, reviewer, reviewee, rating, _, is_public| {
            Ok(bookwise_db::models::DbAppointmentReview {
                id: Uuid::new_v4(),
                appointment_id: appt,
                reviewer_id: reviewer,
                reviewee_id: reviewee,
                rating,
                review_text: None,
                is_public,
                created_at: chrono::Utc::now(),
            })
        });

    let review = test_create_review_wrapper(
        &mut ctx,
        appointment_id,
        expert_id,
        CreateReviewRequest {
            rating: 4,
            review_text: None,
            is_public: false,
        },
    )
    .await
    .unwrap();

    assert_eq!(review.reviewee_id, client_id);
}

#[tokio::test]
async fn test_expert_cannot_review_guest_booking() {
    let mut ctx = TestContext::new();
    let mut row = db_appointment("completed", true);
    row.client_id = None;
    let appointment_id = row.id;
    let expert_id = row.expert_id;

    ctx.appointment_repo
        .expect_get_appointment_by_id()
        .returning(move |_| Ok(Some(row.clone())));
    ctx.review_repo.expect_create_review().times(0);

    let err = test_create_review_wrapper(&mut ctx, appointment_id, expert_id, five_stars())
        .await
        .unwrap_err();
    assert!(matches!(err.0, BookingError::Validation(_)));
}
