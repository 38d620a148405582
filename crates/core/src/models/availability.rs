use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{BookingError, BookingResult};

/// A recurring weekly window during which an expert is nominally bookable.
///
/// Times are local wall-clock values in the expert's timezone; `day_of_week`
/// is 0 (Sunday) through 6 (Saturday) in the expert-local week. Multiple
/// active windows on the same day are permitted and may overlap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpertAvailability {
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

/// A hard exclusion carved out of otherwise-available time, stored as
/// absolute UTC instants. Owned and mutated only by the expert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockedTimeSlot {
    pub id: Uuid,
    pub expert_id: Uuid,
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
    pub reason: Option<String>,
    pub is_all_day: bool,
    pub is_recurring: bool,
    pub created_at: DateTime<Utc>,
}

/// One window in a replace-all weekly availability request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyWindowRequest {
    pub day_of_week: i16,
    /// Local wall-clock HH:MM in the expert's timezone.
    pub start_time: String,
    pub end_time: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "default_true")]
    pub is_recurring: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetWeeklyAvailabilityRequest {
    pub windows: Vec<WeeklyWindowRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetWeeklyAvailabilityResponse {
    pub expert_id: Uuid,
    pub window_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListAvailabilityResponse {
    pub expert_id: Uuid,
    pub windows: Vec<ExpertAvailability>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddBlockedSlotRequest {
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
    pub reason: Option<String>,
    #[serde(default)]
    pub is_all_day: bool,
    #[serde(default)]
    pub is_recurring: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListBlockedSlotsResponse {
    pub expert_id: Uuid,
    pub blocked_slots: Vec<BlockedTimeSlot>,
}

/// A validated weekly window, parsed out of a [`WeeklyWindowRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedWindow {
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_active: bool,
    pub is_recurring: bool,
}

/// Parses an `HH:MM` wall-clock string.
pub fn parse_local_time(value: &str) -> BookingResult<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| BookingError::Validation(format!("Invalid time '{}', expected HH:MM", value)))
}

impl WeeklyWindowRequest {
    /// Validates day range, HH:MM parsing, and start < end.
    pub fn validate(&self) -> BookingResult<ValidatedWindow> {
        if !(0..=6).contains(&self.day_of_week) {
            return Err(BookingError::Validation(format!(
                "day_of_week must be between 0 and 6, got {}",
                self.day_of_week
            )));
        }

        let start_time = parse_local_time(&self.start_time)?;
        let end_time = parse_local_time(&self.end_time)?;

        if start_time >= end_time {
            return Err(BookingError::Validation(format!(
                "start_time {} must be before end_time {}",
                self.start_time, self.end_time
            )));
        }

        Ok(ValidatedWindow {
            day_of_week: self.day_of_week,
            start_time,
            end_time,
            is_active: self.is_active,
            is_recurring: self.is_recurring,
        })
    }
}

impl AddBlockedSlotRequest {
    pub fn validate(&self) -> BookingResult<()> {
        if self.end_date_time <= self.start_date_time {
            return Err(BookingError::Validation(
                "Blocked slot end must be after start".to_string(),
            ));
        }
        Ok(())
    }
}
