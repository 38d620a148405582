//! Stock collaborator implementations wired in by the server binary.
//!
//! Deployments integrate real processor/calendar/notification clients by
//! implementing the core traits; the implementations here keep the engine
//! runnable without them. `SandboxProcessor` approves every hold locally and
//! is only suitable for development environments.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use bookwise_core::collaborators::{
    CalendarEvent, CalendarProvider, NotificationKind, NotificationSender,
};
use bookwise_core::errors::{BookingError, BookingResult};
use bookwise_core::payments::{DestinationStatus, PaymentHold, PaymentProcessor, RefundRecord};
use bookwise_core::scheduling::BusyInterval;

/// Development stand-in for the payment processor. Issues local references
/// and approves everything; never use outside a sandbox environment.
#[derive(Debug, Default)]
pub struct SandboxProcessor;

#[async_trait]
impl PaymentProcessor for SandboxProcessor {
    async fn create_hold(
        &self,
        amount: i64,
        destination_account: &str,
        fee_amount: i64,
    ) -> BookingResult<PaymentHold> {
        let reference = format!("hold_{}", Uuid::new_v4().simple());
        info!(
            "Sandbox hold created: ref={}, amount={}, fee={}, destination={}",
            reference, amount, fee_amount, destination_account
        );
        Ok(PaymentHold {
            client_token: format!("{}_secret", reference),
            reference,
        })
    }

    async fn refund(
        &self,
        reference: &str,
        amount: Option<i64>,
        reason: Option<&str>,
    ) -> BookingResult<RefundRecord> {
        info!(
            "Sandbox refund issued: hold_ref={}, amount={:?}, reason={:?}",
            reference, amount, reason
        );
        Ok(RefundRecord {
            reference: format!("refund_{}", Uuid::new_v4().simple()),
            amount: amount.unwrap_or(0),
        })
    }

    async fn get_destination_status(
        &self,
        _destination_account: &str,
    ) -> BookingResult<DestinationStatus> {
        Ok(DestinationStatus {
            charges_enabled: true,
            payouts_enabled: true,
        })
    }
}

/// Calendar provider used when no integration is configured. Reports no busy
/// time and fails event creation, which handlers degrade to "no meeting
/// link".
#[derive(Debug, Default)]
pub struct UnconfiguredCalendar;

#[async_trait]
impl CalendarProvider for UnconfiguredCalendar {
    async fn create_event(
        &self,
        expert_id: Uuid,
        _title: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
        _attendee_email: &str,
    ) -> BookingResult<CalendarEvent> {
        warn!("No calendar provider configured for expert {}", expert_id);
        Err(BookingError::CalendarSync(
            "No calendar provider configured".to_string(),
        ))
    }

    async fn delete_event(&self, _expert_id: Uuid, _event_id: &str) -> BookingResult<()> {
        Ok(())
    }

    async fn get_busy_times(
        &self,
        _expert_id: Uuid,
        _range_start: DateTime<Utc>,
        _range_end: DateTime<Utc>,
    ) -> BookingResult<Vec<BusyInterval>> {
        Ok(Vec::new())
    }
}

/// Notification sender that records sends in the log. Delivery is
/// fire-and-forget by contract, so this is a complete implementation for
/// environments without an email provider.
#[derive(Debug, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl NotificationSender for LoggingNotifier {
    async fn send(&self, kind: NotificationKind, appointment_id: Uuid, recipient_email: &str) {
        info!(
            "Notification {:?} for appointment {} to {}",
            kind, appointment_id, recipient_email
        );
    }
}
