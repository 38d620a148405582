//! Interfaces to the optional external collaborators: calendar provider and
//! notification sender. Both are best-effort: a failure from either must
//! never block or roll back a booking transition.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::BookingResult;
use crate::scheduling::BusyInterval;

/// A created calendar event with its join link, when the provider issues one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub event_id: String,
    pub meeting_link: Option<String>,
}

#[async_trait]
pub trait CalendarProvider: Send + Sync {
    async fn create_event(
        &self,
        expert_id: Uuid,
        title: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        attendee_email: &str,
    ) -> BookingResult<CalendarEvent>;

    async fn delete_event(&self, expert_id: Uuid, event_id: &str) -> BookingResult<()>;

    /// Busy periods from the expert's connected calendar, used as a
    /// secondary exclusion source during slot generation.
    async fn get_busy_times(
        &self,
        expert_id: Uuid,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> BookingResult<Vec<BusyInterval>>;
}

/// What a notification is about; delivery details stay with the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    AppointmentConfirmed,
    AppointmentCancelled,
}

/// Fire-and-forget email/notification dispatch on confirm and cancel.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, kind: NotificationKind, appointment_id: Uuid, recipient_email: &str);
}
