use axum::http::StatusCode;
use axum::response::IntoResponse;
use pretty_assertions::assert_eq;
use rstest::rstest;

use bookwise_api::middleware::error_handling::AppError;
use bookwise_core::errors::BookingError;

fn status_of(err: BookingError) -> StatusCode {
    AppError(err).into_response().status()
}

#[rstest]
#[case(BookingError::NotFound("x".to_string()), StatusCode::NOT_FOUND)]
#[case(BookingError::Validation("x".to_string()), StatusCode::BAD_REQUEST)]
#[case(BookingError::Authorization("x".to_string()), StatusCode::FORBIDDEN)]
#[case(BookingError::PayoutNotConfigured("x".to_string()), StatusCode::BAD_REQUEST)]
#[case(BookingError::SlotConflict("x".to_string()), StatusCode::CONFLICT)]
#[case(BookingError::Processor("x".to_string()), StatusCode::BAD_GATEWAY)]
#[case(BookingError::CalendarSync("x".to_string()), StatusCode::BAD_GATEWAY)]
fn test_error_status_mapping(#[case] err: BookingError, #[case] expected: StatusCode) {
    assert_eq!(status_of(err), expected);
}

#[test]
fn test_database_errors_are_internal() {
    let err = BookingError::Database(eyre::eyre!("connection refused"));
    assert_eq!(status_of(err), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_eyre_reports_convert_to_database_errors() {
    let app_err: AppError = eyre::eyre!("boom").into();
    assert!(matches!(app_err.0, BookingError::Database(_)));
}

#[test]
fn test_slot_conflict_body_names_the_error() {
    let response = AppError(BookingError::SlotConflict("slot taken".to_string())).into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}
