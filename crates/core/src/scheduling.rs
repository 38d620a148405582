//! # Slot Generation
//!
//! Pure computation of bookable start times for one expert on one calendar
//! date. The generator has no clock and no database access: callers fetch
//! availability windows, busy intervals, and "now", and every call re-derives
//! the slot list from those inputs.
//!
//! ## Algorithm
//!
//! 1. Resolve the requested calendar date into the **expert's** timezone to
//!    find the correct day-of-week; a date boundary in the viewer's zone may
//!    fall on a different calendar day in the expert's zone.
//! 2. Enumerate candidate starts at a fixed stride inside every active window
//!    on that day, localizing each wall-clock candidate into a UTC instant.
//!    Wall-clock times that do not exist (DST spring-forward) are omitted,
//!    never wrapped. Candidates from overlapping windows deduplicate by
//!    absolute instant.
//! 3. Drop candidates whose half-open interval `[start, start+duration)`
//!    overlaps any busy interval, and candidates not strictly in the future.
//! 4. Render each surviving instant in the viewer's timezone for display,
//!    keeping the absolute instant for persistence and ordering.
//!
//! Results are sorted by absolute UTC instant, never by the localized
//! string, so ordering stays correct across DST transitions.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use crate::errors::{BookingError, BookingResult};
use crate::models::availability::ExpertAvailability;
use crate::models::slot::Slot;

/// A half-open `[start, end)` interval during which the expert is not
/// bookable: an existing non-cancelled appointment, a blocked slot, or a
/// busy period reported by the calendar collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BusyInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Half-open overlap test against `[start, start + duration)`.
    fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end && end > self.start
    }
}

/// Inputs for one slot-generation call.
#[derive(Debug, Clone)]
pub struct SlotQuery {
    /// Requested calendar date, as sent by the client.
    pub date: NaiveDate,
    /// IANA timezone the expert's windows are expressed in.
    pub expert_timezone: String,
    /// IANA timezone the results are displayed in.
    pub viewer_timezone: String,
    pub stride_minutes: i64,
    pub duration_minutes: i64,
    /// Wall-clock reference; only instants strictly after this survive.
    pub now: DateTime<Utc>,
}

/// Parses an IANA timezone name.
pub fn parse_timezone(name: &str) -> BookingResult<Tz> {
    name.parse::<Tz>()
        .map_err(|_| BookingError::Validation(format!("Invalid timezone '{}'", name)))
}

/// Resolves the expert-local day-of-week (0 = Sunday .. 6 = Saturday) for a
/// requested calendar date. The date is anchored at the viewer's midnight and
/// that instant is re-read in the expert's zone, so the lookup day matches
/// what the expert's weekly windows mean.
pub fn resolve_expert_day(
    date: NaiveDate,
    viewer_tz: Tz,
    expert_tz: Tz,
) -> BookingResult<(NaiveDate, i16)> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| BookingError::Validation(format!("Invalid date {}", date)))?;

    // `earliest` tolerates zones where midnight itself is skipped by DST.
    let anchor = viewer_tz
        .from_local_datetime(&midnight)
        .earliest()
        .ok_or_else(|| {
            BookingError::Validation(format!("Date {} has no valid midnight in viewer timezone", date))
        })?;

    let expert_local = anchor.with_timezone(&expert_tz);
    let expert_date = expert_local.date_naive();
    let day_of_week = expert_date.weekday().num_days_from_sunday() as i16;

    Ok((expert_date, day_of_week))
}

/// Generates the ordered, conflict-free slot list for one expert and date.
///
/// `windows` may contain entries for any day; only active windows matching
/// the resolved expert-local day-of-week contribute. Overlapping windows are
/// treated as a union: duplicate instants collapse to one.
pub fn generate_slots(
    query: &SlotQuery,
    windows: &[ExpertAvailability],
    busy: &[BusyInterval],
) -> BookingResult<Vec<Slot>> {
    if query.stride_minutes <= 0 {
        return Err(BookingError::Validation("stride must be positive".to_string()));
    }
    if query.duration_minutes <= 0 {
        return Err(BookingError::Validation("duration must be positive".to_string()));
    }

    let expert_tz = parse_timezone(&query.expert_timezone)?;
    let viewer_tz = parse_timezone(&query.viewer_timezone)?;

    let (expert_date, day_of_week) = resolve_expert_day(query.date, viewer_tz, expert_tz)?;

    let duration = Duration::minutes(query.duration_minutes);
    let stride = Duration::minutes(query.stride_minutes);

    // Candidate instants, deduplicated across overlapping windows and kept
    // in ascending order by the set itself.
    let mut candidates: BTreeSet<DateTime<Utc>> = BTreeSet::new();

    for window in windows {
        if !window.is_active || window.day_of_week != day_of_week {
            continue;
        }

        let mut cursor = expert_date.and_time(window.start_time);
        let window_end = expert_date.and_time(window.end_time);

        // Last admissible start leaves room for the full duration.
        while cursor + duration <= window_end {
            // A skipped wall-clock hour yields no instant; omit, never wrap.
            if let Some(instant) = expert_tz.from_local_datetime(&cursor).single() {
                candidates.insert(instant.with_timezone(&Utc));
            }
            cursor += stride;
        }
    }

    let slots = candidates
        .into_iter()
        .filter(|start| *start > query.now)
        .filter(|start| {
            let end = *start + duration;
            !busy.iter().any(|b| b.overlaps(*start, end))
        })
        .map(|start| Slot {
            utc_instant: start,
            display_local: start
                .with_timezone(&viewer_tz)
                .format("%Y-%m-%dT%H:%M:%S%:z")
                .to_string(),
        })
        .collect();

    Ok(slots)
}
