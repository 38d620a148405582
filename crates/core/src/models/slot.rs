use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A concrete, duration-sized, conflict-free start time offered for booking.
///
/// `utc_instant` is the value persisted and sorted on; `display_local` is the
/// same instant rendered in the viewer's timezone, for presentation only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub utc_instant: DateTime<Utc>,
    pub display_local: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotResponse {
    pub time: DateTime<Utc>,
    pub utc_time: DateTime<Utc>,
    pub display_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetSlotsResponse {
    pub slots: Vec<SlotResponse>,
    pub timezone: String,
}
