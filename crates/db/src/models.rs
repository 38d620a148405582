use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbExpert {
    pub id: Uuid,
    pub display_name: String,
    pub timezone: String,
    pub hourly_rate_cents: i64,
    pub is_verified: bool,
    pub booking_enabled: bool,
    pub payout_destination: Option<String>,
    pub calendar_connected: bool,
    pub calendar_last_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAvailabilityWindow {
    pub id: Uuid,
    pub expert_id: Uuid,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub timezone: String,
    pub is_active: bool,
    pub is_recurring: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbBlockedTimeSlot {
    pub id: Uuid,
    pub expert_id: Uuid,
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
    pub reason: Option<String>,
    pub is_all_day: bool,
    pub is_recurring: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAppointment {
    pub id: Uuid,
    pub expert_id: Uuid,
    pub client_id: Option<Uuid>,
    pub client_name: String,
    pub client_email: String,
    pub scheduled_at: DateTime<Utc>,
    pub scheduled_at_timezone: String,
    pub duration_minutes: i32,
    pub status: String,
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

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAppointmentReview {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub reviewer_id: Uuid,
    pub reviewee_id: Uuid,
    pub rating: i16,
    pub review_text: Option<String>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAggregateRating {
    pub average_rating: Option<f64>,
    pub review_count: i64,
}

impl From<DbExpert> for bookwise_core::models::expert::ExpertProfile {
    fn from(row: DbExpert) -> Self {
        Self {
            id: row.id,
            display_name: row.display_name,
            timezone: row.timezone,
            hourly_rate_cents: row.hourly_rate_cents,
            is_verified: row.is_verified,
            booking_enabled: row.booking_enabled,
            payout_destination: row.payout_destination,
            calendar_connected: row.calendar_connected,
            calendar_last_synced_at: row.calendar_last_synced_at,
            created_at: row.created_at,
        }
    }
}

impl From<DbAvailabilityWindow> for bookwise_core::models::availability::ExpertAvailability {
    fn from(row: DbAvailabilityWindow) -> Self {
        Self {
            id: row.id,
            expert_id: row.expert_id,
            day_of_week: row.day_of_week,
            start_time: row.start_time,
            end_time: row.end_time,
            timezone: row.timezone,
            is_active: row.is_active,
            is_recurring: row.is_recurring,
            created_at: row.created_at,
        }
    }
}

impl From<DbBlockedTimeSlot> for bookwise_core::models::availability::BlockedTimeSlot {
    fn from(row: DbBlockedTimeSlot) -> Self {
        Self {
            id: row.id,
            expert_id: row.expert_id,
            start_date_time: row.start_date_time,
            end_date_time: row.end_date_time,
            reason: row.reason,
            is_all_day: row.is_all_day,
            is_recurring: row.is_recurring,
            created_at: row.created_at,
        }
    }
}

impl DbAppointment {
    /// Converts a row into the domain appointment, parsing the stored status.
    pub fn into_domain(
        self,
    ) -> bookwise_core::errors::BookingResult<bookwise_core::models::appointment::Appointment> {
        let status = bookwise_core::models::appointment::AppointmentStatus::parse(&self.status)?;
        Ok(bookwise_core::models::appointment::Appointment {
            id: self.id,
            expert_id: self.expert_id,
            client_id: self.client_id,
            client_name: self.client_name,
            client_email: self.client_email,
            scheduled_at: self.scheduled_at,
            scheduled_at_timezone: self.scheduled_at_timezone,
            duration_minutes: self.duration_minutes,
            status,
            total_amount: self.total_amount,
            platform_fee: self.platform_fee,
            expert_earnings: self.expert_earnings,
            payment_hold_ref: self.payment_hold_ref,
            hold_captured: self.hold_captured,
            payout_destination_ref: self.payout_destination_ref,
            meeting_link: self.meeting_link,
            calendar_event_id: self.calendar_event_id,
            notes: self.notes,
            cancelled_at: self.cancelled_at,
            cancel_reason: self.cancel_reason,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl From<DbAppointmentReview> for bookwise_core::models::review::AppointmentReview {
    fn from(row: DbAppointmentReview) -> Self {
        Self {
            id: row.id,
            appointment_id: row.appointment_id,
            reviewer_id: row.reviewer_id,
            reviewee_id: row.reviewee_id,
            rating: row.rating,
            review_text: row.review_text,
            is_public: row.is_public,
            created_at: row.created_at,
        }
    }
}
