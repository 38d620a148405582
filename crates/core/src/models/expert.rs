use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An expert's booking profile, as seen by the scheduling engine.
///
/// Identity, bios, and verification workflows live in the upstream identity
/// service; this is the slice the booking engine needs to decide whether an
/// expert is bookable and where earnings go.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpertProfile {
    pub id: Uuid,
    pub display_name: String,
    /// IANA timezone the expert's weekly windows are expressed in.
    pub timezone: String,
    pub hourly_rate_cents: i64,
    pub is_verified: bool,
    pub booking_enabled: bool,
    /// Account of record with the payment processor, if connected.
    pub payout_destination: Option<String>,
    pub calendar_connected: bool,
    pub calendar_last_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateRatingResponse {
    pub expert_id: Uuid,
    pub average_rating: Option<f64>,
    pub review_count: i64,
}
