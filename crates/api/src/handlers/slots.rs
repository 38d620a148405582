//! # Slot Discovery Handler
//!
//! Orchestrates one slot-generation call: fetches the expert's availability
//! windows, blocked slots, and live appointments, merges in best-effort busy
//! times from the calendar collaborator, and hands everything to the pure
//! generator in `bookwise_core::scheduling`.
//!
//! The calendar lookup is the only fallible external call on this path and
//! it degrades to an empty busy list; a calendar outage never breaks slot
//! discovery.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use bookwise_core::errors::BookingError;
use bookwise_core::models::slot::{GetSlotsResponse, SlotResponse};
use bookwise_core::scheduling::{self, BusyInterval, SlotQuery};

use crate::{middleware::error_handling::AppError, ApiState};

/// Query parameters for the slot discovery endpoint
#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    /// Requested calendar date, YYYY-MM-DD
    pub date: String,

    /// IANA timezone results are displayed in (default: the expert's)
    pub timezone: Option<String>,

    /// Session length in minutes (default: 30)
    pub duration: Option<i64>,

    /// Enumeration stride in minutes (default: configured stride)
    pub stride: Option<i64>,
}

#[axum::debug_handler]
pub async fn get_slots(
    State(state): State<Arc<ApiState>>,
    Path(expert_id): Path<Uuid>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<GetSlotsResponse>, AppError> {
    let date: NaiveDate = query.date.parse().map_err(|_| {
        AppError(BookingError::Validation(format!(
            "Invalid date '{}', expected YYYY-MM-DD",
            query.date
        )))
    })?;

    // Get expert from database
    let expert = bookwise_db::repositories::expert::get_expert_by_id(&state.db_pool, expert_id)
        .await
        .map_err(BookingError::Database)?
        .ok_or_else(|| BookingError::NotFound(format!("Expert with ID {} not found", expert_id)))?;

    let viewer_timezone = query
        .timezone
        .clone()
        .unwrap_or_else(|| expert.timezone.clone());

    // Reject bad timezones before touching anything else
    scheduling::parse_timezone(&viewer_timezone)?;

    let windows: Vec<_> =
        bookwise_db::repositories::availability::list_availability(&state.db_pool, expert_id)
            .await
            .map_err(BookingError::Database)?
            .into_iter()
            .map(Into::into)
            .collect();

    // A UTC superset of the requested local date, wide enough for any
    // viewer/expert offset combination.
    let range_start = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| BookingError::Validation(format!("Invalid date {}", date)))?
        .and_utc()
        - Duration::days(1);
    let range_end = range_start + Duration::days(3);

    let mut busy: Vec<BusyInterval> = Vec::new();

    for appointment in bookwise_db::repositories::appointment::list_overlapping(
        &state.db_pool,
        expert_id,
        range_start,
        range_end,
    )
    .await
    .map_err(BookingError::Database)?
    {
        let end = appointment.scheduled_at + Duration::minutes(appointment.duration_minutes as i64);
        busy.push(BusyInterval::new(appointment.scheduled_at, end));
    }

    for blocked in bookwise_db::repositories::blocked_slot::list_blocked_slots(
        &state.db_pool,
        expert_id,
        range_start,
        range_end,
    )
    .await
    .map_err(BookingError::Database)?
    {
        busy.push(BusyInterval::new(
            blocked.start_date_time,
            blocked.end_date_time,
        ));
    }

    // Secondary busy source; a calendar failure degrades to no extra busy time
    if expert.calendar_connected {
        match state
            .calendar
            .get_busy_times(expert_id, range_start, range_end)
            .await
        {
            Ok(calendar_busy) => busy.extend(calendar_busy),
            Err(err) => {
                tracing::warn!(
                    "Calendar busy-time lookup failed for expert {}: {}",
                    expert_id,
                    err
                );
            }
        }
    }

    let slot_query = SlotQuery {
        date,
        expert_timezone: expert.timezone,
        viewer_timezone: viewer_timezone.clone(),
        stride_minutes: query.stride.unwrap_or(state.default_stride_minutes),
        duration_minutes: query.duration.unwrap_or(30),
        now: Utc::now(),
    };

    let slots = scheduling::generate_slots(&slot_query, &windows, &busy)?;

    let response = GetSlotsResponse {
        slots: slots
            .into_iter()
            .map(|slot| SlotResponse {
                time: slot.utc_instant,
                utc_time: slot.utc_instant,
                display_time: slot.display_local,
            })
            .collect(),
        timezone: viewer_timezone,
    };

    Ok(Json(response))
}
