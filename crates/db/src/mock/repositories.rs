use chrono::{DateTime, Utc};
use mockall::mock;
use uuid::Uuid;

use crate::models::{
    DbAggregateRating, DbAppointment, DbAppointmentReview, DbAvailabilityWindow,
    DbBlockedTimeSlot, DbExpert,
};
use crate::repositories::appointment::NewAppointment;
use bookwise_core::errors::BookingResult;
use bookwise_core::models::appointment::AppointmentStatus;
use bookwise_core::models::availability::ValidatedWindow;

// Mock repositories for testing
mock! {
    pub ExpertRepo {
        pub async fn get_expert_by_id(
            &self,
            id: Uuid,
        ) -> eyre::Result<Option<DbExpert>>;
    }
}

mock! {
    pub AvailabilityRepo {
        pub async fn set_weekly_availability(
            &self,
            expert_id: Uuid,
            timezone: &'static str,
            windows: Vec<ValidatedWindow>,
        ) -> eyre::Result<Vec<DbAvailabilityWindow>>;

        pub async fn list_availability(
            &self,
            expert_id: Uuid,
        ) -> eyre::Result<Vec<DbAvailabilityWindow>>;
    }
}

mock! {
    pub BlockedSlotRepo {
        pub async fn add_blocked_slot(
            &self,
            expert_id: Uuid,
            start_date_time: DateTime<Utc>,
            end_date_time: DateTime<Utc>,
            reason: Option<&'static str>,
            is_all_day: bool,
            is_recurring: bool,
        ) -> eyre::Result<DbBlockedTimeSlot>;

        pub async fn remove_blocked_slot(
            &self,
            expert_id: Uuid,
            slot_id: Uuid,
        ) -> eyre::Result<bool>;

        pub async fn list_blocked_slots(
            &self,
            expert_id: Uuid,
            range_start: DateTime<Utc>,
            range_end: DateTime<Utc>,
        ) -> eyre::Result<Vec<DbBlockedTimeSlot>>;
    }
}

mock! {
    pub AppointmentRepo {
        pub async fn insert_pending(
            &self,
            new: NewAppointment,
        ) -> BookingResult<DbAppointment>;

        pub async fn get_appointment_by_id(
            &self,
            id: Uuid,
        ) -> eyre::Result<Option<DbAppointment>>;

        pub async fn get_appointment_by_hold_ref(
            &self,
            hold_ref: &'static str,
        ) -> eyre::Result<Option<DbAppointment>>;

        pub async fn list_overlapping(
            &self,
            expert_id: Uuid,
            range_start: DateTime<Utc>,
            range_end: DateTime<Utc>,
        ) -> eyre::Result<Vec<DbAppointment>>;

        pub async fn transition_status(
            &self,
            id: Uuid,
            from: AppointmentStatus,
            to: AppointmentStatus,
        ) -> eyre::Result<Option<DbAppointment>>;

        pub async fn mark_confirmed(
            &self,
            id: Uuid,
            meeting_link: Option<&'static str>,
            calendar_event_id: Option<&'static str>,
        ) -> eyre::Result<Option<DbAppointment>>;

        pub async fn mark_hold_captured(&self, hold_ref: &'static str) -> eyre::Result<()>;

        pub async fn mark_cancelled(
            &self,
            id: Uuid,
            from: AppointmentStatus,
            reason: Option<&'static str>,
        ) -> eyre::Result<Option<DbAppointment>>;
    }
}

mock! {
    pub ReviewRepo {
        pub async fn create_review(
            &self,
            appointment_id: Uuid,
            reviewer_id: Uuid,
            reviewee_id: Uuid,
            rating: i16,
            review_text: Option<&'static str>,
            is_public: bool,
        ) -> BookingResult<DbAppointmentReview>;

        pub async fn get_aggregate_rating(
            &self,
            expert_id: Uuid,
        ) -> eyre::Result<DbAggregateRating>;
    }
}
