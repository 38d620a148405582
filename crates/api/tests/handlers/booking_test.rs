use chrono::{Duration, Utc};
use mockall::Sequence;
use pretty_assertions::assert_eq;
use uuid::Uuid;

use bookwise_api::middleware::error_handling::AppError;
use bookwise_core::collaborators::CalendarProvider;
use bookwise_core::errors::BookingError;
use bookwise_core::models::appointment::{
    Appointment, AppointmentStatus, ConfirmAppointmentResponse, CreateAppointmentRequest,
    CreateAppointmentResponse, PaymentWebhookEvent, PaymentWebhookKind,
};
use bookwise_core::payments::{
    DestinationStatus, FeePolicy, PaymentHold, PaymentProcessor, RefundRecord,
};
use bookwise_db::repositories::appointment::NewAppointment;

use crate::test_utils::{bookable_expert, db_appointment, TestContext};

fn standard_policy() -> FeePolicy {
    FeePolicy {
        rate: 0.10,
        min_amount_cents: 500,
        max_amount_cents: 100_000,
    }
}

fn create_request(expert_id: Uuid) -> CreateAppointmentRequest {
    CreateAppointmentRequest {
        expert_id,
        client_name: "Ada Lovelace".to_string(),
        client_email: "ada@example.com".to_string(),
        scheduled_at: Utc::now() + Duration::days(1),
        scheduled_at_timezone: Some("America/New_York".to_string()),
        duration: 30,
        notes: None,
        total_amount: 10_000,
        instant: false,
    }
}

// Test wrapper replicating the create handler's flow against mocks
async fn test_create_wrapper(
    ctx: &mut TestContext,
    payload: CreateAppointmentRequest,
) -> Result<CreateAppointmentResponse, AppError> {
    payload.validate()?;

    let expert = ctx
        .expert_repo
        .get_expert_by_id(payload.expert_id)
        .await?
        .ok_or_else(|| AppError(BookingError::NotFound("Expert not found".to_string())))?;

    if !expert.is_verified || !expert.booking_enabled {
        return Err(AppError(BookingError::Validation(
            "Expert is not accepting bookings".to_string(),
        )));
    }

    let destination = expert.payout_destination.clone().ok_or_else(|| {
        AppError(BookingError::PayoutNotConfigured(
            "Expert has no payout destination".to_string(),
        ))
    })?;

    let destination_status = ctx.processor.get_destination_status(&destination).await?;
    if !destination_status.is_usable() {
        return Err(AppError(BookingError::PayoutNotConfigured(
            "Destination cannot receive transfers".to_string(),
        )));
    }

    let policy = standard_policy();
    policy.validate_amount(payload.total_amount)?;
    let split = policy.compute_split(payload.total_amount);

    let start = payload.scheduled_at;
    let end = start + Duration::minutes(payload.duration as i64);

    if start <= Utc::now() {
        return Err(AppError(BookingError::Validation(
            "scheduled_at is in the past".to_string(),
        )));
    }

    let conflicting = ctx
        .appointment_repo
        .list_overlapping(payload.expert_id, start, end)
        .await?;
    if !conflicting.is_empty() {
        return Err(AppError(BookingError::SlotConflict(
            "Slot overlaps an existing appointment".to_string(),
        )));
    }

    let blocked = ctx
        .blocked_repo
        .list_blocked_slots(payload.expert_id, start, end)
        .await?;
    if !blocked.is_empty() {
        return Err(AppError(BookingError::SlotConflict(
            "Slot falls in blocked time".to_string(),
        )));
    }

    let hold = ctx
        .processor
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

    let appointment = ctx.appointment_repo.insert_pending(new).await?;

    Ok(CreateAppointmentResponse {
        appointment_id: appointment.id,
        client_secret: hold.client_token,
        platform_fee: split.platform_fee,
    })
}

// Test wrapper replicating the confirm handler's flow against mocks
async fn test_confirm_wrapper(
    ctx: &mut TestContext,
    id: Uuid,
) -> Result<ConfirmAppointmentResponse, AppError> {
    let appointment: Appointment = ctx
        .appointment_repo
        .get_appointment_by_id(id)
        .await?
        .ok_or_else(|| AppError(BookingError::NotFound("Appointment not found".to_string())))?
        .into_domain()?;

    if appointment.status == AppointmentStatus::Confirmed {
        let meeting_link = appointment.meeting_link.clone();
        let calendar_event_id = appointment.calendar_event_id.clone();
        return Ok(ConfirmAppointmentResponse {
            appointment,
            meeting_link,
            calendar_event_id,
        });
    }

    appointment
        .status
        .ensure_transition(AppointmentStatus::Confirmed)?;

    let event = ctx
        .calendar
        .create_event(
            appointment.expert_id,
            &format!("Session with {}", appointment.client_name),
            appointment.scheduled_at,
            appointment.end_at(),
            &appointment.client_email,
        )
        .await
        .ok();

    let meeting_link: Option<&'static str> = event
        .as_ref()
        .and_then(|e| e.meeting_link.clone())
        .map(|link| Box::leak(link.into_boxed_str()) as &'static str);
    let calendar_event_id: Option<&'static str> = event
        .as_ref()
        .map(|e| Box::leak(e.event_id.clone().into_boxed_str()) as &'static str);

    let confirmed: Appointment = match ctx
        .appointment_repo
        .mark_confirmed(id, meeting_link, calendar_event_id)
        .await?
    {
        Some(row) => row.into_domain()?,
        None => {
            // Lost the race; drop this call's event and take the winner's row
            if let Some(event) = &event {
                let _ = ctx
                    .calendar
                    .delete_event(appointment.expert_id, &event.event_id)
                    .await;
            }
            ctx.appointment_repo
                .get_appointment_by_id(id)
                .await?
                .ok_or_else(|| {
                    AppError(BookingError::NotFound("Appointment not found".to_string()))
                })?
                .into_domain()?
        }
    };

    let meeting_link = confirmed.meeting_link.clone();
    let calendar_event_id = confirmed.calendar_event_id.clone();
    Ok(ConfirmAppointmentResponse {
        appointment: confirmed,
        meeting_link,
        calendar_event_id,
    })
}

// Test wrapper replicating the cancel handler's flow against mocks
async fn test_cancel_wrapper(
    ctx: &mut TestContext,
    id: Uuid,
    principal_id: Uuid,
) -> Result<Appointment, AppError> {
    let appointment: Appointment = ctx
        .appointment_repo
        .get_appointment_by_id(id)
        .await?
        .ok_or_else(|| AppError(BookingError::NotFound("Appointment not found".to_string())))?
        .into_domain()?;

    if !appointment.is_participant(principal_id) {
        return Err(AppError(BookingError::Authorization(
            "Not a participant".to_string(),
        )));
    }

    appointment
        .status
        .ensure_transition(AppointmentStatus::Cancelled)?;

    let cancelled: Appointment = ctx
        .appointment_repo
        .mark_cancelled(id, appointment.status, None)
        .await?
        .ok_or_else(|| AppError(BookingError::SlotConflict("Lost cancel race".to_string())))?
        .into_domain()?;

    if cancelled.hold_captured {
        // Refund failure is logged by the real handler; here it only must
        // not propagate
        let _ = ctx
            .processor
            .refund(&cancelled.payment_hold_ref, Some(cancelled.total_amount), None)
            .await;
    }

    Ok(cancelled)
}

// Test wrapper replicating the payment webhook's flow against mocks
async fn test_webhook_wrapper(
    ctx: &mut TestContext,
    event: PaymentWebhookEvent,
) -> Result<(), AppError> {
    let hold_ref: &'static str = Box::leak(event.hold_ref.clone().into_boxed_str());

    let appointment: Appointment = ctx
        .appointment_repo
        .get_appointment_by_hold_ref(hold_ref)
        .await?
        .ok_or_else(|| {
            AppError(BookingError::NotFound(
                "No appointment for hold reference".to_string(),
            ))
        })?
        .into_domain()?;

    match event.event {
        PaymentWebhookKind::HoldSucceeded => {
            ctx.appointment_repo.mark_hold_captured(hold_ref).await?;

            match appointment.status {
                AppointmentStatus::Pending => {
                    ctx.appointment_repo
                        .mark_confirmed(appointment.id, None, None)
                        .await?;
                }
                AppointmentStatus::Cancelled => {
                    let _ = ctx
                        .processor
                        .refund(
                            &appointment.payment_hold_ref,
                            Some(appointment.total_amount),
                            Some("cancelled before capture".to_string()),
                        )
                        .await;
                }
                _ => {}
            }
        }
        PaymentWebhookKind::HoldFailed => {
            if appointment.status == AppointmentStatus::Pending {
                ctx.appointment_repo
                    .mark_cancelled(
                        appointment.id,
                        AppointmentStatus::Pending,
                        Some("payment hold failed"),
                    )
                    .await?;
            }
        }
    }

    Ok(())
}

fn hold_event(kind: PaymentWebhookKind) -> PaymentWebhookEvent {
    PaymentWebhookEvent {
        hold_ref: "hold_abc".to_string(),
        event: kind,
    }
}

#[tokio::test]
async fn test_create_happy_path_returns_hold_token() {
    let mut ctx = TestContext::new();
    let expert = bookable_expert();
    let expert_id = expert.id;

    ctx.expert_repo
        .expect_get_expert_by_id()
        .returning(move |_| Ok(Some(expert.clone())));
    ctx.processor
        .expect_get_destination_status()
        .returning(|_| {
            Ok(DestinationStatus {
                charges_enabled: true,
                payouts_enabled: true,
            })
        });
    ctx.appointment_repo
        .expect_list_overlapping()
        .returning(|_, _, _| Ok(vec![]));
    ctx.blocked_repo
        .expect_list_blocked_slots()
        .returning(|_, _, _| Ok(vec![]));
    ctx.processor.expect_create_hold().times(1).returning(|_, _, _| {
        Ok(PaymentHold {
            reference: "hold_abc".to_string(),
            client_token: "hold_abc_secret".to_string(),
        })
    });
    ctx.appointment_repo
        .expect_insert_pending()
        .times(1)
        .returning(|new| {
            let mut row = db_appointment("pending", false);
            row.expert_id = new.expert_id;
            row.payment_hold_ref = new.payment_hold_ref;
            Ok(row)
        });

    let response = test_create_wrapper(&mut ctx, create_request(expert_id))
        .await
        .expect("create should succeed");

    assert_eq!(response.client_secret, "hold_abc_secret");
    assert_eq!(response.platform_fee, 1_000);
}

#[tokio::test]
async fn test_create_hold_failure_commits_nothing() {
    let mut ctx = TestContext::new();
    let expert = bookable_expert();
    let expert_id = expert.id;

    ctx.expert_repo
        .expect_get_expert_by_id()
        .returning(move |_| Ok(Some(expert.clone())));
    ctx.processor
        .expect_get_destination_status()
        .returning(|_| {
            Ok(DestinationStatus {
                charges_enabled: true,
                payouts_enabled: true,
            })
        });
    ctx.appointment_repo
        .expect_list_overlapping()
        .returning(|_, _, _| Ok(vec![]));
    ctx.blocked_repo
        .expect_list_blocked_slots()
        .returning(|_, _, _| Ok(vec![]));
    ctx.processor
        .expect_create_hold()
        .times(1)
        .returning(|_, _, _| Err(BookingError::Processor("card declined".to_string())));
    // No appointment row may be committed when the hold fails
    ctx.appointment_repo.expect_insert_pending().times(0);

    let err = test_create_wrapper(&mut ctx, create_request(expert_id))
        .await
        .unwrap_err();
    assert!(matches!(err.0, BookingError::Processor(_)));
}

#[tokio::test]
async fn test_create_without_payout_destination_is_rejected_before_hold() {
    let mut ctx = TestContext::new();
    let mut expert = bookable_expert();
    expert.payout_destination = None;
    let expert_id = expert.id;

    ctx.expert_repo
        .expect_get_expert_by_id()
        .returning(move |_| Ok(Some(expert.clone())));
    ctx.processor.expect_get_destination_status().times(0);
    ctx.processor.expect_create_hold().times(0);
    ctx.appointment_repo.expect_insert_pending().times(0);

    let err = test_create_wrapper(&mut ctx, create_request(expert_id))
        .await
        .unwrap_err();
    assert!(matches!(err.0, BookingError::PayoutNotConfigured(_)));
}

#[tokio::test]
async fn test_create_unverified_expert_is_rejected() {
    let mut ctx = TestContext::new();
    let mut expert = bookable_expert();
    expert.is_verified = false;
    let expert_id = expert.id;

    ctx.expert_repo
        .expect_get_expert_by_id()
        .returning(move |_| Ok(Some(expert.clone())));
    ctx.appointment_repo.expect_insert_pending().times(0);

    let err = test_create_wrapper(&mut ctx, create_request(expert_id))
        .await
        .unwrap_err();
    assert!(matches!(err.0, BookingError::Validation(_)));
}

#[tokio::test]
async fn test_concurrent_creates_one_winner_one_conflict() {
    let mut ctx = TestContext::new();
    let expert = bookable_expert();
    let expert_id = expert.id;

    ctx.expert_repo
        .expect_get_expert_by_id()
        .returning(move |_| Ok(Some(expert.clone())));
    ctx.processor
        .expect_get_destination_status()
        .returning(|_| {
            Ok(DestinationStatus {
                charges_enabled: true,
                payouts_enabled: true,
            })
        });
    ctx.appointment_repo
        .expect_list_overlapping()
        .returning(|_, _, _| Ok(vec![]));
    ctx.blocked_repo
        .expect_list_blocked_slots()
        .returning(|_, _, _| Ok(vec![]));
    ctx.processor.expect_create_hold().returning(|_, _, _| {
        Ok(PaymentHold {
            reference: "hold_abc".to_string(),
            client_token: "hold_abc_secret".to_string(),
        })
    });

    // Both requests pass the read-side check; the exclusive insert lets
    // exactly one through
    let mut seq = Sequence::new();
    ctx.appointment_repo
        .expect_insert_pending()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(db_appointment("pending", false)));
    ctx.appointment_repo
        .expect_insert_pending()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Err(BookingError::SlotConflict("slot taken".to_string())));

    let request = create_request(expert_id);
    let first = test_create_wrapper(&mut ctx, request.clone()).await;
    let second = test_create_wrapper(&mut ctx, request).await;

    assert!(first.is_ok());
    assert!(matches!(second.unwrap_err().0, BookingError::SlotConflict(_)));
}

#[tokio::test]
async fn test_confirm_is_idempotent() {
    let mut ctx = TestContext::new();
    let mut row = db_appointment("confirmed", true);
    row.meeting_link = Some("https://meet.example/abc".to_string());
    let id = row.id;
    let expected = serde_json::to_string(&row).unwrap();
    let row_clone = row.clone();

    ctx.appointment_repo
        .expect_get_appointment_by_id()
        .returning(move |_| Ok(Some(row_clone.clone())));
    // A re-confirm must not touch the calendar or the row
    ctx.calendar.expect_create_event().times(0);
    ctx.appointment_repo.expect_mark_confirmed().times(0);

    let first = test_confirm_wrapper(&mut ctx, id).await.unwrap();
    let second = test_confirm_wrapper(&mut ctx, id).await.unwrap();

    assert_eq!(first.appointment.status, AppointmentStatus::Confirmed);
    assert_eq!(
        serde_json::to_string(&second.appointment).unwrap(),
        expected
    );
    assert_eq!(second.meeting_link.as_deref(), Some("https://meet.example/abc"));
}

#[tokio::test]
async fn test_confirm_calendar_failure_degrades_to_no_link() {
    let mut ctx = TestContext::new();
    let row = db_appointment("pending", false);
    let id = row.id;
    let row_clone = row.clone();

    ctx.appointment_repo
        .expect_get_appointment_by_id()
        .returning(move |_| Ok(Some(row_clone.clone())));
    ctx.calendar
        .expect_create_event()
        .times(1)
        .returning(|_, _, _, _, _| {
            Err(BookingError::CalendarSync("provider timeout".to_string()))
        });
    ctx.appointment_repo
        .expect_mark_confirmed()
        .times(1)
        .withf(|_, link, event_id| link.is_none() && event_id.is_none())
        .returning(move |_, _, _| {
            let mut confirmed = db_appointment("confirmed", false);
            confirmed.id = id;
            Ok(Some(confirmed))
        });

    let response = test_confirm_wrapper(&mut ctx, id).await.unwrap();

    assert_eq!(response.appointment.status, AppointmentStatus::Confirmed);
    assert!(response.meeting_link.is_none());
    assert!(response.calendar_event_id.is_none());
}

#[tokio::test]
async fn test_confirm_completed_appointment_is_rejected() {
    let mut ctx = TestContext::new();
    let row = db_appointment("completed", true);
    let id = row.id;

    ctx.appointment_repo
        .expect_get_appointment_by_id()
        .returning(move |_| Ok(Some(row.clone())));
    ctx.appointment_repo.expect_mark_confirmed().times(0);

    let err = test_confirm_wrapper(&mut ctx, id).await.unwrap_err();
    assert!(matches!(err.0, BookingError::Validation(_)));
}

#[tokio::test]
async fn test_cancel_pending_uncaptured_never_refunds() {
    let mut ctx = TestContext::new();
    let row = db_appointment("pending", false);
    let id = row.id;
    let client_id = row.client_id.unwrap();
    let row_clone = row.clone();

    ctx.appointment_repo
        .expect_get_appointment_by_id()
        .returning(move |_| Ok(Some(row_clone.clone())));
    ctx.appointment_repo
        .expect_mark_cancelled()
        .times(1)
        .returning(|_, _, _| Ok(Some(db_appointment("cancelled", false))));
    // An uncaptured hold simply expires; refund must not be called
    ctx.processor.expect_refund().times(0);

    let cancelled = test_cancel_wrapper(&mut ctx, id, client_id).await.unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
}

#[tokio::test]
async fn test_cancel_captured_hold_refunds_exactly_once() {
    let mut ctx = TestContext::new();
    let row = db_appointment("confirmed", true);
    let id = row.id;
    let expert_id = row.expert_id;
    let row_clone = row.clone();

    ctx.appointment_repo
        .expect_get_appointment_by_id()
        .returning(move |_| Ok(Some(row_clone.clone())));
    ctx.appointment_repo
        .expect_mark_cancelled()
        .times(1)
        .returning(|_, _, _| Ok(Some(db_appointment("cancelled", true))));
    ctx.processor
        .expect_refund()
        .times(1)
        .returning(|_, amount, _| {
            Ok(RefundRecord {
                reference: "refund_1".to_string(),
                amount: amount.unwrap_or(0),
            })
        });

    let cancelled = test_cancel_wrapper(&mut ctx, id, expert_id).await.unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
}

#[tokio::test]
async fn test_cancel_refund_failure_does_not_block_cancellation() {
    let mut ctx = TestContext::new();
    let row = db_appointment("confirmed", true);
    let id = row.id;
    let expert_id = row.expert_id;
    let row_clone = row.clone();

    ctx.appointment_repo
        .expect_get_appointment_by_id()
        .returning(move |_| Ok(Some(row_clone.clone())));
    ctx.appointment_repo
        .expect_mark_cancelled()
        .times(1)
        .returning(|_, _, _| Ok(Some(db_appointment("cancelled", true))));
    ctx.processor
        .expect_refund()
        .times(1)
        .returning(|_, _, _| Err(BookingError::Processor("refund failed".to_string())));

    let cancelled = test_cancel_wrapper(&mut ctx, id, expert_id).await.unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
}

#[tokio::test]
async fn test_cancel_by_non_participant_is_forbidden() {
    let mut ctx = TestContext::new();
    let row = db_appointment("confirmed", true);
    let id = row.id;

    ctx.appointment_repo
        .expect_get_appointment_by_id()
        .returning(move |_| Ok(Some(row.clone())));
    ctx.appointment_repo.expect_mark_cancelled().times(0);
    ctx.processor.expect_refund().times(0);

    let err = test_cancel_wrapper(&mut ctx, id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err.0, BookingError::Authorization(_)));
}

#[tokio::test]
async fn test_cancel_completed_appointment_is_rejected() {
    let mut ctx = TestContext::new();
    let row = db_appointment("completed", true);
    let id = row.id;
    let expert_id = row.expert_id;

    ctx.appointment_repo
        .expect_get_appointment_by_id()
        .returning(move |_| Ok(Some(row.clone())));
    ctx.appointment_repo.expect_mark_cancelled().times(0);
    ctx.processor.expect_refund().times(0);

    let err = test_cancel_wrapper(&mut ctx, id, expert_id).await.unwrap_err();
    assert!(matches!(err.0, BookingError::Validation(_)));
}

#[tokio::test]
async fn test_create_past_slot_is_rejected_before_hold() {
    let mut ctx = TestContext::new();
    let expert = bookable_expert();
    let expert_id = expert.id;

    ctx.expert_repo
        .expect_get_expert_by_id()
        .returning(move |_| Ok(Some(expert.clone())));
    ctx.processor
        .expect_get_destination_status()
        .returning(|_| {
            Ok(DestinationStatus {
                charges_enabled: true,
                payouts_enabled: true,
            })
        });
    // A past instant fails before any overlap check, hold, or insert
    ctx.appointment_repo.expect_list_overlapping().times(0);
    ctx.processor.expect_create_hold().times(0);
    ctx.appointment_repo.expect_insert_pending().times(0);

    let mut request = create_request(expert_id);
    request.scheduled_at = Utc::now() - Duration::hours(1);

    let err = test_create_wrapper(&mut ctx, request).await.unwrap_err();
    assert!(matches!(err.0, BookingError::Validation(_)));
}

#[tokio::test]
async fn test_confirm_race_loser_deletes_its_calendar_event() {
    let mut ctx = TestContext::new();
    let row = db_appointment("pending", false);
    let id = row.id;
    let expert_id = row.expert_id;
    let row_clone = row.clone();

    let mut seq = Sequence::new();
    ctx.appointment_repo
        .expect_get_appointment_by_id()
        .times(1)
        .in_sequence(&mut seq)
        .returning(move |_| Ok(Some(row_clone.clone())));
    ctx.calendar
        .expect_create_event()
        .times(1)
        .returning(|_, _, _, _, _| {
            Ok(bookwise_core::collaborators::CalendarEvent {
                event_id: "evt_1".to_string(),
                meeting_link: Some("https://meet.example/abc".to_string()),
            })
        });
    // The CAS loses; the event just created must be cleaned up
    ctx.appointment_repo
        .expect_mark_confirmed()
        .times(1)
        .returning(|_, _, _| Ok(None));
    ctx.calendar
        .expect_delete_event()
        .times(1)
        .withf(move |expert, event_id| *expert == expert_id && event_id == "evt_1")
        .returning(|_, _| Ok(()));
    ctx.appointment_repo
        .expect_get_appointment_by_id()
        .times(1)
        .in_sequence(&mut seq)
        .returning(move |_| {
            let mut winner = db_appointment("confirmed", true);
            winner.id = id;
            Ok(Some(winner))
        });

    let response = test_confirm_wrapper(&mut ctx, id).await.unwrap();
    assert_eq!(response.appointment.status, AppointmentStatus::Confirmed);
}

#[tokio::test]
async fn test_webhook_success_confirms_pending_appointment() {
    let mut ctx = TestContext::new();
    let row = db_appointment("pending", false);
    let id = row.id;

    ctx.appointment_repo
        .expect_get_appointment_by_hold_ref()
        .returning(move |_| Ok(Some(row.clone())));
    ctx.appointment_repo
        .expect_mark_hold_captured()
        .times(1)
        .withf(|hold_ref| hold_ref == "hold_abc")
        .returning(|_| Ok(()));
    ctx.appointment_repo
        .expect_mark_confirmed()
        .times(1)
        .withf(move |appt, link, event_id| *appt == id && link.is_none() && event_id.is_none())
        .returning(|_, _, _| Ok(Some(db_appointment("confirmed", true))));
    ctx.processor.expect_refund().times(0);

    test_webhook_wrapper(&mut ctx, hold_event(PaymentWebhookKind::HoldSucceeded))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_webhook_failure_cancels_pending_appointment() {
    let mut ctx = TestContext::new();
    let row = db_appointment("pending", false);
    let id = row.id;

    ctx.appointment_repo
        .expect_get_appointment_by_hold_ref()
        .returning(move |_| Ok(Some(row.clone())));
    ctx.appointment_repo.expect_mark_hold_captured().times(0);
    ctx.appointment_repo
        .expect_mark_cancelled()
        .times(1)
        .withf(move |appt, from, reason| {
            *appt == id
                && *from == AppointmentStatus::Pending
                && *reason == Some("payment hold failed")
        })
        .returning(|_, _, _| Ok(Some(db_appointment("cancelled", false))));

    test_webhook_wrapper(&mut ctx, hold_event(PaymentWebhookKind::HoldFailed))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_webhook_replay_changes_nothing() {
    let mut ctx = TestContext::new();
    let row = db_appointment("confirmed", true);

    ctx.appointment_repo
        .expect_get_appointment_by_hold_ref()
        .returning(move |_| Ok(Some(row.clone())));
    // Re-marking the capture is harmless; the row must not transition again
    ctx.appointment_repo
        .expect_mark_hold_captured()
        .returning(|_| Ok(()));
    ctx.appointment_repo.expect_mark_confirmed().times(0);
    ctx.appointment_repo.expect_mark_cancelled().times(0);
    ctx.processor.expect_refund().times(0);

    test_webhook_wrapper(&mut ctx, hold_event(PaymentWebhookKind::HoldSucceeded))
        .await
        .unwrap();

    let mut ctx = TestContext::new();
    let cancelled = db_appointment("cancelled", false);
    ctx.appointment_repo
        .expect_get_appointment_by_hold_ref()
        .returning(move |_| Ok(Some(cancelled.clone())));
    ctx.appointment_repo.expect_mark_cancelled().times(0);

    test_webhook_wrapper(&mut ctx, hold_event(PaymentWebhookKind::HoldFailed))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_webhook_capture_after_cancellation_refunds() {
    let mut ctx = TestContext::new();
    // Cancelled while the hold was still uncaptured, so the cancel path
    // skipped its refund; the late capture must return the funds
    let row = db_appointment("cancelled", false);

    ctx.appointment_repo
        .expect_get_appointment_by_hold_ref()
        .returning(move |_| Ok(Some(row.clone())));
    ctx.appointment_repo
        .expect_mark_hold_captured()
        .times(1)
        .returning(|_| Ok(()));
    ctx.appointment_repo.expect_mark_confirmed().times(0);
    ctx.processor
        .expect_refund()
        .times(1)
        .withf(|hold_ref, amount, reason| {
            hold_ref == "hold_abc" && *amount == Some(10_000) && reason.is_some()
        })
        .returning(|_, amount, _| {
            Ok(RefundRecord {
                reference: "refund_1".to_string(),
                amount: amount.unwrap_or(0),
            })
        });

    test_webhook_wrapper(&mut ctx, hold_event(PaymentWebhookKind::HoldSucceeded))
        .await
        .unwrap();
}
