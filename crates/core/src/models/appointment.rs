use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{BookingError, BookingResult};

/// Appointment lifecycle status.
///
/// The only legal moves are `Pending -> Confirmed -> Completed` and
/// `Pending | Confirmed -> Cancelled`. `Completed` and `Cancelled` are
/// terminal. Every state change goes through [`AppointmentStatus::ensure_transition`];
/// nothing mutates status directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn can_transition_to(self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Confirmed, Completed) | (Pending, Cancelled) | (Confirmed, Cancelled)
        )
    }

    /// Validates a transition, returning a validation error naming both states.
    pub fn ensure_transition(self, next: AppointmentStatus) -> BookingResult<()> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(BookingError::Validation(format!(
                "Illegal appointment transition: {} -> {}",
                self.as_str(),
                next.as_str()
            )))
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> BookingResult<Self> {
        match value {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            other => Err(BookingError::Validation(format!(
                "Unknown appointment status '{}'",
                other
            ))),
        }
    }
}

/// A booked session between a client and an expert.
///
/// Money fields are minor currency units and must always satisfy
/// `platform_fee + expert_earnings == total_amount`. Appointments are never
/// hard-deleted; cancellation is a terminal status, not a removal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub expert_id: Uuid,
    /// None for guest bookings, which are identified by name/email.
    pub client_id: Option<Uuid>,
    pub client_name: String,
    pub client_email: String,
    pub scheduled_at: DateTime<Utc>,
    pub scheduled_at_timezone: String,
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
    pub total_amount: i64,
    pub platform_fee: i64,
    pub expert_earnings: i64,
    pub payment_hold_ref: String,
    pub hold_captured: bool,
    pub payout_destination_ref: String,
    pub meeting_link: Option<String>,
    pub calendar_event_id: Option<String>,
    pub notes: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn end_at(&self) -> DateTime<Utc> {
        self.scheduled_at + chrono::Duration::minutes(self.duration_minutes as i64)
    }

    /// Whether the given principal is one of the two appointment parties.
    pub fn is_participant(&self, principal_id: Uuid) -> bool {
        self.expert_id == principal_id || self.client_id == Some(principal_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub expert_id: Uuid,
    pub client_name: String,
    pub client_email: String,
    pub scheduled_at: DateTime<Utc>,
    pub scheduled_at_timezone: Option<String>,
    pub duration: i32,
    pub notes: Option<String>,
    pub total_amount: i64,
    /// Selects the instant-booking fee rate instead of the standard one.
    #[serde(default)]
    pub instant: bool,
}

impl CreateAppointmentRequest {
    pub fn validate(&self) -> BookingResult<()> {
        if self.client_name.trim().is_empty() {
            return Err(BookingError::Validation("client_name is required".to_string()));
        }
        if !self.client_email.contains('@') {
            return Err(BookingError::Validation("client_email is not a valid email".to_string()));
        }
        if self.duration <= 0 {
            return Err(BookingError::Validation("duration must be positive".to_string()));
        }
        if self.total_amount <= 0 {
            return Err(BookingError::Validation("total_amount must be positive".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentResponse {
    pub appointment_id: Uuid,
    /// Processor client token the frontend uses to complete the payment.
    pub client_secret: String,
    pub platform_fee: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmAppointmentResponse {
    pub appointment: Appointment,
    pub meeting_link: Option<String>,
    pub calendar_event_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelAppointmentRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentResponse {
    pub appointment: Appointment,
}

/// Asynchronous processor notification, keyed by hold reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentWebhookEvent {
    pub hold_ref: String,
    pub event: PaymentWebhookKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentWebhookKind {
    HoldSucceeded,
    HoldFailed,
}
