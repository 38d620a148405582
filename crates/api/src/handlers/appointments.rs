//! # Appointment Lifecycle Handlers
//!
//! The booking state machine: `pending -> confirmed -> completed`, with
//! cancellation from either live state. Every transition goes through the
//! core transition table plus a compare-and-set update in the repository, so
//! a raced or repeated call can never corrupt status.
//!
//! External calls are ordered around the local commit:
//! - the payment hold is created **before** the `pending` row, so no
//!   appointment ever exists without a hold reference;
//! - the slot itself is taken by the exclusive insert, which turns the
//!   read/commit race between concurrent bookings into a 409 for the loser;
//! - calendar and notification calls happen **after** the local transition
//!   and their failures are logged, never propagated.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use bookwise_core::collaborators::NotificationKind;
use bookwise_core::errors::BookingError;
use bookwise_core::models::appointment::{
    Appointment, AppointmentResponse, AppointmentStatus, CancelAppointmentRequest,
    ConfirmAppointmentResponse, CreateAppointmentRequest, CreateAppointmentResponse,
    PaymentWebhookEvent, PaymentWebhookKind,
};
use bookwise_db::models::DbAppointment;
use bookwise_db::repositories::appointment::{self as appointment_repo, NewAppointment};

use crate::middleware::principal::Principal;
use crate::{middleware::error_handling::AppError, ApiState};

async fn load_appointment(state: &ApiState, id: Uuid) -> Result<Appointment, AppError> {
    let row = appointment_repo::get_appointment_by_id(&state.db_pool, id)
        .await
        .map_err(BookingError::Database)?
        .ok_or_else(|| BookingError::NotFound(format!("Appointment with ID {} not found", id)))?;
    Ok(row.into_domain()?)
}

fn into_domain(row: DbAppointment) -> Result<Appointment, AppError> {
    Ok(row.into_domain()?)
}

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<CreateAppointmentRequest>,
) -> Result<Json<CreateAppointmentResponse>, AppError> {
    payload.validate()?;

    // Get expert and check bookability
    let expert =
        bookwise_db::repositories::expert::get_expert_by_id(&state.db_pool, payload.expert_id)
            .await
            .map_err(BookingError::Database)?
            .ok_or_else(|| {
                BookingError::NotFound(format!("Expert with ID {} not found", payload.expert_id))
            })?;

    if !expert.is_verified || !expert.booking_enabled {
        return Err(AppError(BookingError::Validation(format!(
            "Expert {} is not accepting bookings",
            expert.id
        ))));
    }

    let destination = expert.payout_destination.clone().ok_or_else(|| {
        BookingError::PayoutNotConfigured(format!(
            "Expert {} has no payout destination",
            expert.id
        ))
    })?;

    let destination_status = state.payments.get_destination_status(&destination).await?;
    if !destination_status.is_usable() {
        return Err(AppError(BookingError::PayoutNotConfigured(format!(
            "Payout destination for expert {} cannot receive transfers",
            expert.id
        ))));
    }

    // Fee split; the instant-booking path uses its own configured rate
    let policy = if payload.instant {
        state.fee_instant
    } else {
        state.fee_standard
    };
    policy.validate_amount(payload.total_amount)?;
    let split = policy.compute_split(payload.total_amount);

    // Re-check the slot at commit time. The read-side check in slot
    // generation is advisory; this plus the exclusive insert below closes
    // the read/commit race.
    let start = payload.scheduled_at;
    let end = start + Duration::minutes(payload.duration as i64);

    // Slot generation only offers future starts; hold the same line here
    if start <= Utc::now() {
        return Err(AppError(BookingError::Validation(format!(
            "scheduled_at {} is in the past",
            start
        ))));
    }

    let conflicting = appointment_repo::list_overlapping(&state.db_pool, expert.id, start, end)
        .await
        .map_err(BookingError::Database)?;
    if !conflicting.is_empty() {
        return Err(AppError(BookingError::SlotConflict(format!(
            "Slot {} for expert {} overlaps an existing appointment",
            start, expert.id
        ))));
    }

    let blocked = bookwise_db::repositories::blocked_slot::list_blocked_slots(
        &state.db_pool,
        expert.id,
        start,
        end,
    )
    .await
    .map_err(BookingError::Database)?;
    if !blocked.is_empty() {
        return Err(AppError(BookingError::SlotConflict(format!(
            "Slot {} for expert {} falls in blocked time",
            start, expert.id
        ))));
    }

    // Hold first: a failed hold aborts the booking with nothing committed
    let hold = state
        .payments
        .create_hold(split.total_amount, &destination, split.platform_fee)
        .await?;

    let new = NewAppointment {
        expert_id: expert.id,
        client_id: None,
        client_name: payload.client_name.clone(),
        client_email: payload.client_email.clone(),
        scheduled_at: payload.scheduled_at,
        scheduled_at_timezone: payload
            .scheduled_at_timezone
            .clone()
            .unwrap_or_else(|| "UTC".to_string()),
        duration_minutes: payload.duration,
        total_amount: split.total_amount,
        platform_fee: split.platform_fee,
        expert_earnings: split.expert_earnings,
        payment_hold_ref: hold.reference.clone(),
        payout_destination_ref: destination,
        notes: payload.notes.clone(),
    };

    let appointment = match appointment_repo::insert_pending(&state.db_pool, &new).await {
        Ok(row) => row,
        Err(err) => {
            // The hold exists but the row does not; log the reference so the
            // uncaptured hold can be reconciled.
            tracing::error!(
                "Appointment insert failed after hold creation: hold_ref={}, error={}",
                hold.reference,
                err
            );
            return Err(AppError(err));
        }
    };

    tracing::info!(
        "Appointment created: id={}, expert_id={}, scheduled_at={}, hold_ref={}",
        appointment.id,
        appointment.expert_id,
        appointment.scheduled_at,
        appointment.payment_hold_ref
    );

    Ok(Json(CreateAppointmentResponse {
        appointment_id: appointment.id,
        client_secret: hold.client_token,
        platform_fee: split.platform_fee,
    }))
}

#[axum::debug_handler]
pub async fn confirm_appointment(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ConfirmAppointmentResponse>, AppError> {
    let appointment = load_appointment(&state, id).await?;

    // Re-confirming is a no-op, not an error
    if appointment.status == AppointmentStatus::Confirmed {
        let meeting_link = appointment.meeting_link.clone();
        let calendar_event_id = appointment.calendar_event_id.clone();
        return Ok(Json(ConfirmAppointmentResponse {
            appointment,
            meeting_link,
            calendar_event_id,
        }));
    }

    appointment
        .status
        .ensure_transition(AppointmentStatus::Confirmed)?;

    // Best-effort calendar event; failure degrades to "no meeting link"
    let event = match state
        .calendar
        .create_event(
            appointment.expert_id,
            &format!("Session with {}", appointment.client_name),
            appointment.scheduled_at,
            appointment.end_at(),
            &appointment.client_email,
        )
        .await
    {
        Ok(event) => Some(event),
        Err(err) => {
            tracing::warn!(
                "Calendar event creation failed for appointment {}: {}",
                appointment.id,
                err
            );
            None
        }
    };

    let meeting_link = event.as_ref().and_then(|e| e.meeting_link.clone());
    let calendar_event_id = event.as_ref().map(|e| e.event_id.clone());

    let confirmed = match appointment_repo::mark_confirmed(
        &state.db_pool,
        id,
        meeting_link.as_deref(),
        calendar_event_id.as_deref(),
    )
    .await
    .map_err(BookingError::Database)?
    {
        Some(row) => into_domain(row)?,
        None => {
            // Lost a confirm race; the other call already did the work.
            // Drop the event this call created so it is not orphaned.
            if let Some(event) = &event {
                if let Err(err) = state
                    .calendar
                    .delete_event(appointment.expert_id, &event.event_id)
                    .await
                {
                    tracing::warn!(
                        "Cleanup of calendar event {} for appointment {} failed: {}",
                        event.event_id,
                        id,
                        err
                    );
                }
            }
            load_appointment(&state, id).await?
        }
    };

    tracing::info!(
        "Appointment confirmed: id={}, hold_ref={}",
        confirmed.id,
        confirmed.payment_hold_ref
    );

    // Fire-and-forget notification
    let notifier = state.notifier.clone();
    let recipient = confirmed.client_email.clone();
    let appointment_id = confirmed.id;
    tokio::spawn(async move {
        notifier
            .send(NotificationKind::AppointmentConfirmed, appointment_id, &recipient)
            .await;
    });

    let meeting_link = confirmed.meeting_link.clone();
    let calendar_event_id = confirmed.calendar_event_id.clone();
    Ok(Json(ConfirmAppointmentResponse {
        appointment: confirmed,
        meeting_link,
        calendar_event_id,
    }))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    principal: Principal,
    Json(payload): Json<CancelAppointmentRequest>,
) -> Result<Json<AppointmentResponse>, AppError> {
    let appointment = load_appointment(&state, id).await?;

    if !appointment.is_participant(principal.id) {
        return Err(AppError(BookingError::Authorization(format!(
            "Principal {} is not a participant of appointment {}",
            principal.id, id
        ))));
    }

    appointment
        .status
        .ensure_transition(AppointmentStatus::Cancelled)?;

    // Compare-and-set wins the race between concurrent cancellations, so at
    // most one caller proceeds to the refund attempt below.
    let cancelled = match appointment_repo::mark_cancelled(
        &state.db_pool,
        id,
        appointment.status,
        payload.reason.as_deref(),
    )
    .await
    .map_err(BookingError::Database)?
    {
        Some(row) => into_domain(row)?,
        None => {
            let current = load_appointment(&state, id).await?;
            if current.status == AppointmentStatus::Cancelled {
                return Ok(Json(AppointmentResponse { appointment: current }));
            }
            return Err(AppError(BookingError::SlotConflict(format!(
                "Appointment {} changed state during cancellation",
                id
            ))));
        }
    };

    tracing::info!(
        "Appointment cancelled: id={}, hold_ref={}, captured={}",
        cancelled.id,
        cancelled.payment_hold_ref,
        cancelled.hold_captured
    );

    // Full refund when the hold was captured; a pending, uncaptured hold
    // simply expires. Refund failure is logged for reconciliation and never
    // reverses the local cancellation.
    if cancelled.hold_captured {
        if let Err(err) = state
            .payments
            .refund(
                &cancelled.payment_hold_ref,
                Some(cancelled.total_amount),
                payload.reason.as_deref(),
            )
            .await
        {
            tracing::error!(
                "Refund failed for appointment {} (hold_ref={}): {}",
                cancelled.id,
                cancelled.payment_hold_ref,
                err
            );
        }
    }

    // Fire-and-forget notification
    let notifier = state.notifier.clone();
    let recipient = cancelled.client_email.clone();
    let appointment_id = cancelled.id;
    tokio::spawn(async move {
        notifier
            .send(NotificationKind::AppointmentCancelled, appointment_id, &recipient)
            .await;
    });

    Ok(Json(AppointmentResponse {
        appointment: cancelled,
    }))
}

#[axum::debug_handler]
pub async fn complete_appointment(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    principal: Principal,
) -> Result<Json<AppointmentResponse>, AppError> {
    let appointment = load_appointment(&state, id).await?;

    if !appointment.is_participant(principal.id) {
        return Err(AppError(BookingError::Authorization(format!(
            "Principal {} is not a participant of appointment {}",
            principal.id, id
        ))));
    }

    appointment
        .status
        .ensure_transition(AppointmentStatus::Completed)?;

    let completed = match appointment_repo::transition_status(
        &state.db_pool,
        id,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
    )
    .await
    .map_err(BookingError::Database)?
    {
        Some(row) => into_domain(row)?,
        None => {
            return Err(AppError(BookingError::SlotConflict(format!(
                "Appointment {} changed state during completion",
                id
            ))))
        }
    };

    tracing::info!("Appointment completed: id={}", completed.id);

    Ok(Json(AppointmentResponse {
        appointment: completed,
    }))
}

/// Processor webhook: asynchronous hold outcomes keyed by hold reference.
///
/// Success captures the hold and confirms a still-pending appointment;
/// failure cancels it. A capture that lands on an already-cancelled
/// appointment is refunded on the spot, since the cancellation saw an
/// uncaptured hold and skipped its own refund. Both paths are idempotent:
/// replayed events find the appointment already transitioned and change
/// nothing.
#[axum::debug_handler]
pub async fn payment_webhook(
    State(state): State<Arc<ApiState>>,
    Json(event): Json<PaymentWebhookEvent>,
) -> Result<Json<serde_json::Value>, AppError> {
    let row = appointment_repo::get_appointment_by_hold_ref(&state.db_pool, &event.hold_ref)
        .await
        .map_err(BookingError::Database)?
        .ok_or_else(|| {
            BookingError::NotFound(format!(
                "No appointment for hold reference {}",
                event.hold_ref
            ))
        })?;
    let appointment = into_domain(row)?;

    match event.event {
        PaymentWebhookKind::HoldSucceeded => {
            appointment_repo::mark_hold_captured(&state.db_pool, &event.hold_ref)
                .await
                .map_err(BookingError::Database)?;

            match appointment.status {
                AppointmentStatus::Pending => {
                    appointment_repo::mark_confirmed(&state.db_pool, appointment.id, None, None)
                        .await
                        .map_err(BookingError::Database)?;
                    tracing::info!(
                        "Appointment {} confirmed via webhook (hold_ref={})",
                        appointment.id,
                        event.hold_ref
                    );
                }
                AppointmentStatus::Cancelled => {
                    // The capture raced a cancellation that saw an
                    // uncaptured hold; return the funds here
                    if let Err(err) = state
                        .payments
                        .refund(
                            &event.hold_ref,
                            Some(appointment.total_amount),
                            Some("cancelled before capture"),
                        )
                        .await
                    {
                        tracing::error!(
                            "Refund failed for cancelled appointment {} (hold_ref={}): {}",
                            appointment.id,
                            event.hold_ref,
                            err
                        );
                    } else {
                        tracing::info!(
                            "Late capture refunded for cancelled appointment {} (hold_ref={})",
                            appointment.id,
                            event.hold_ref
                        );
                    }
                }
                _ => {}
            }
        }
        PaymentWebhookKind::HoldFailed => {
            if appointment.status == AppointmentStatus::Pending {
                appointment_repo::mark_cancelled(
                    &state.db_pool,
                    appointment.id,
                    AppointmentStatus::Pending,
                    Some("payment hold failed"),
                )
                .await
                .map_err(BookingError::Database)?;
                tracing::warn!(
                    "Appointment {} cancelled: hold failed (hold_ref={})",
                    appointment.id,
                    event.hold_ref
                );
            }
        }
    }

    Ok(Json(serde_json::json!({ "received": true })))
}
