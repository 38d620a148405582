//! # Availability Handlers
//!
//! Management of an expert's recurring weekly windows and one-off blocked
//! slots. Weekly replacement is atomic at the repository level; a concurrent
//! slot query never sees the store half-replaced.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use bookwise_core::errors::BookingError;
use bookwise_core::models::availability::{
    AddBlockedSlotRequest, BlockedTimeSlot, ListAvailabilityResponse, ListBlockedSlotsResponse,
    SetWeeklyAvailabilityRequest, SetWeeklyAvailabilityResponse, ValidatedWindow,
};

use crate::middleware::principal::{Principal, PrincipalRole};
use crate::{middleware::error_handling::AppError, ApiState};

/// Only the expert themselves may mutate their availability.
fn ensure_owns_availability(principal: &Principal, expert_id: Uuid) -> Result<(), AppError> {
    if principal.role != PrincipalRole::Expert || principal.id != expert_id {
        return Err(AppError(BookingError::Authorization(
            "Only the expert can modify their availability".to_string(),
        )));
    }
    Ok(())
}

#[axum::debug_handler]
pub async fn set_weekly_availability(
    State(state): State<Arc<ApiState>>,
    Path(expert_id): Path<Uuid>,
    principal: Principal,
    Json(payload): Json<SetWeeklyAvailabilityRequest>,
) -> Result<Json<SetWeeklyAvailabilityResponse>, AppError> {
    ensure_owns_availability(&principal, expert_id)?;

    let expert = bookwise_db::repositories::expert::get_expert_by_id(&state.db_pool, expert_id)
        .await
        .map_err(BookingError::Database)?
        .ok_or_else(|| BookingError::NotFound(format!("Expert with ID {} not found", expert_id)))?;

    // Validate every window before touching the store; the replace is
    // all-or-nothing.
    let windows: Vec<ValidatedWindow> = payload
        .windows
        .iter()
        .map(|w| w.validate())
        .collect::<Result<_, _>>()?;

    let inserted = bookwise_db::repositories::availability::set_weekly_availability(
        &state.db_pool,
        expert_id,
        &expert.timezone,
        &windows,
    )
    .await
    .map_err(BookingError::Database)?;

    tracing::info!(
        "Weekly availability replaced: expert_id={}, windows={}",
        expert_id,
        inserted.len()
    );

    Ok(Json(SetWeeklyAvailabilityResponse {
        expert_id,
        window_count: inserted.len(),
    }))
}

#[axum::debug_handler]
pub async fn list_availability(
    State(state): State<Arc<ApiState>>,
    Path(expert_id): Path<Uuid>,
) -> Result<Json<ListAvailabilityResponse>, AppError> {
    let windows =
        bookwise_db::repositories::availability::list_availability(&state.db_pool, expert_id)
            .await
            .map_err(BookingError::Database)?;

    Ok(Json(ListAvailabilityResponse {
        expert_id,
        windows: windows.into_iter().map(Into::into).collect(),
    }))
}

#[axum::debug_handler]
pub async fn add_blocked_slot(
    State(state): State<Arc<ApiState>>,
    Path(expert_id): Path<Uuid>,
    principal: Principal,
    Json(payload): Json<AddBlockedSlotRequest>,
) -> Result<Json<BlockedTimeSlot>, AppError> {
    ensure_owns_availability(&principal, expert_id)?;
    payload.validate()?;

    let slot = bookwise_db::repositories::blocked_slot::add_blocked_slot(
        &state.db_pool,
        expert_id,
        payload.start_date_time,
        payload.end_date_time,
        payload.reason.as_deref(),
        payload.is_all_day,
        payload.is_recurring,
    )
    .await
    .map_err(BookingError::Database)?;

    Ok(Json(slot.into()))
}

#[axum::debug_handler]
pub async fn remove_blocked_slot(
    State(state): State<Arc<ApiState>>,
    Path((expert_id, slot_id)): Path<(Uuid, Uuid)>,
    principal: Principal,
) -> Result<Json<serde_json::Value>, AppError> {
    ensure_owns_availability(&principal, expert_id)?;

    let removed = bookwise_db::repositories::blocked_slot::remove_blocked_slot(
        &state.db_pool,
        expert_id,
        slot_id,
    )
    .await
    .map_err(BookingError::Database)?;

    if !removed {
        return Err(AppError(BookingError::NotFound(format!(
            "Blocked slot {} not found for expert {}",
            slot_id, expert_id
        ))));
    }

    Ok(Json(serde_json::json!({ "removed": true })))
}

/// Query parameters for listing blocked slots in a range
#[derive(Debug, Deserialize)]
pub struct BlockedSlotsQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[axum::debug_handler]
pub async fn list_blocked_slots(
    State(state): State<Arc<ApiState>>,
    Path(expert_id): Path<Uuid>,
    Query(query): Query<BlockedSlotsQuery>,
) -> Result<Json<ListBlockedSlotsResponse>, AppError> {
    if query.end <= query.start {
        return Err(AppError(BookingError::Validation(
            "Range end must be after start".to_string(),
        )));
    }

    let slots = bookwise_db::repositories::blocked_slot::list_blocked_slots(
        &state.db_pool,
        expert_id,
        query.start,
        query.end,
    )
    .await
    .map_err(BookingError::Database)?;

    Ok(Json(ListBlockedSlotsResponse {
        expert_id,
        blocked_slots: slots.into_iter().map(Into::into).collect(),
    }))
}
