use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use uuid::Uuid;

use bookwise_api::middleware::error_handling::AppError;
use bookwise_core::errors::BookingError;
use bookwise_core::models::availability::{
    SetWeeklyAvailabilityRequest, ValidatedWindow, WeeklyWindowRequest,
};
use bookwise_core::scheduling::{generate_slots, BusyInterval, SlotQuery};

use crate::test_utils::{db_window, TestContext};

// Test wrapper replicating the weekly-replace handler's validation gating
async fn test_set_weekly_wrapper(
    ctx: &mut TestContext,
    expert_id: Uuid,
    payload: SetWeeklyAvailabilityRequest,
) -> Result<usize, AppError> {
    let windows: Vec<ValidatedWindow> = payload
        .windows
        .iter()
        .map(|w| w.validate())
        .collect::<Result<_, _>>()?;

    let inserted = ctx
        .availability_repo
        .set_weekly_availability(expert_id, "America/New_York", windows)
        .await?;

    Ok(inserted.len())
}

fn window_request(day: i16, start: &str, end: &str) -> WeeklyWindowRequest {
    WeeklyWindowRequest {
        day_of_week: day,
        start_time: start.to_string(),
        end_time: end.to_string(),
        is_active: true,
        is_recurring: true,
    }
}

#[tokio::test]
async fn test_set_weekly_availability_replaces_all_windows() {
    let mut ctx = TestContext::new();
    let expert_id = Uuid::new_v4();

    ctx.availability_repo
        .expect_set_weekly_availability()
        .times(1)
        .returning(move |expert_id, _, windows| {
            Ok(windows
                .iter()
                .map(|_| db_window(expert_id, 1, "09:00", "12:00"))
                .collect())
        });

    let count = test_set_weekly_wrapper(
        &mut ctx,
        expert_id,
        SetWeeklyAvailabilityRequest {
            windows: vec![
                window_request(1, "09:00", "12:00"),
                window_request(3, "13:00", "17:00"),
            ],
        },
    )
    .await
    .unwrap();

    assert_eq!(count, 2);
}

#[tokio::test]
async fn test_invalid_window_rejects_whole_replace() {
    let mut ctx = TestContext::new();
    let expert_id = Uuid::new_v4();

    // One bad window fails validation before any persistence happens
    ctx.availability_repo.expect_set_weekly_availability().times(0);

    let err = test_set_weekly_wrapper(
        &mut ctx,
        expert_id,
        SetWeeklyAvailabilityRequest {
            windows: vec![
                window_request(1, "09:00", "12:00"),
                window_request(1, "14:00", "13:00"),
            ],
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err.0, BookingError::Validation(_)));
}

// The slot endpoint merges repository busy sources before calling the pure
// generator; this exercises that merge the way the handler performs it.
#[tokio::test]
async fn test_busy_sources_merge_into_generation() {
    let expert_id = Uuid::new_v4();
    let windows = vec![db_window(expert_id, 1, "09:00", "11:00").into()];

    // Monday 2025-06-02, existing appointment 09:00-09:30 EDT and a blocked
    // slot 10:00-10:30 EDT
    let appointment_start: chrono::DateTime<Utc> = "2025-06-02T13:00:00Z".parse().unwrap();
    let blocked_start: chrono::DateTime<Utc> = "2025-06-02T14:00:00Z".parse().unwrap();

    let mut busy = Vec::new();
    busy.push(BusyInterval::new(
        appointment_start,
        appointment_start + Duration::minutes(30),
    ));
    busy.push(BusyInterval::new(
        blocked_start,
        blocked_start + Duration::minutes(30),
    ));

    let query = SlotQuery {
        date: "2025-06-02".parse().unwrap(),
        expert_timezone: "America/New_York".to_string(),
        viewer_timezone: "America/New_York".to_string(),
        stride_minutes: 30,
        duration_minutes: 30,
        now: "2025-01-01T00:00:00Z".parse().unwrap(),
    };

    let slots = generate_slots(&query, &windows, &busy).unwrap();

    let starts: Vec<_> = slots
        .iter()
        .map(|s| {
            s.utc_instant
                .with_timezone(&chrono_tz::America::New_York)
                .format("%H:%M")
                .to_string()
        })
        .collect();
    assert_eq!(starts, vec!["09:30", "10:30"]);
}
