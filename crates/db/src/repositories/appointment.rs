use crate::models::DbAppointment;
use bookwise_core::errors::{BookingError, BookingResult};
use bookwise_core::models::appointment::AppointmentStatus;
use chrono::{DateTime, Utc};
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

const APPOINTMENT_COLUMNS: &str = r#"id, expert_id, client_id, client_name, client_email,
    scheduled_at, scheduled_at_timezone, duration_minutes, status,
    total_amount, platform_fee, expert_earnings, payment_hold_ref,
    hold_captured, payout_destination_ref, meeting_link, calendar_event_id,
    notes, cancelled_at, cancel_reason, created_at, updated_at"#;

/// Everything needed to commit a `pending` appointment. A hold reference is
/// required by construction; no row exists without one.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub expert_id: Uuid,
    pub client_id: Option<Uuid>,
    pub client_name: String,
    pub client_email: String,
    pub scheduled_at: DateTime<Utc>,
    pub scheduled_at_timezone: String,
    pub duration_minutes: i32,
    pub total_amount: i64,
    pub platform_fee: i64,
    pub expert_earnings: i64,
    pub payment_hold_ref: String,
    pub payout_destination_ref: String,
    pub notes: Option<String>,
}

/// Inserts a `pending` appointment through the exclusive
/// `(expert_id, scheduled_at)` reservation. When two concurrent bookings
/// race for the same slot, the partial unique index lets exactly one row in;
/// the loser gets [`BookingError::SlotConflict`].
pub async fn insert_pending(
    pool: &Pool<Postgres>,
    new: &NewAppointment,
) -> BookingResult<DbAppointment> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    tracing::debug!(
        "Inserting pending appointment: id={}, expert_id={}, scheduled_at={}, hold_ref={}",
        id,
        new.expert_id,
        new.scheduled_at,
        new.payment_hold_ref
    );

    let query = format!(
        r#"
        INSERT INTO appointments
            (id, expert_id, client_id, client_name, client_email,
             scheduled_at, scheduled_at_timezone, duration_minutes, status,
             total_amount, platform_fee, expert_earnings, payment_hold_ref,
             payout_destination_ref, notes, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending',
                $9, $10, $11, $12, $13, $14, $15, $15)
        RETURNING {APPOINTMENT_COLUMNS}
        "#
    );

    let result = sqlx::query_as::<_, DbAppointment>(&query)
        .bind(id)
        .bind(new.expert_id)
        .bind(new.client_id)
        .bind(&new.client_name)
        .bind(&new.client_email)
        .bind(new.scheduled_at)
        .bind(&new.scheduled_at_timezone)
        .bind(new.duration_minutes)
        .bind(new.total_amount)
        .bind(new.platform_fee)
        .bind(new.expert_earnings)
        .bind(&new.payment_hold_ref)
        .bind(&new.payout_destination_ref)
        .bind(&new.notes)
        .bind(now)
        .fetch_one(pool)
        .await;

    match result {
        Ok(row) => Ok(row),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Err(BookingError::SlotConflict(format!(
                "Slot {} for expert {} was booked by another request",
                new.scheduled_at, new.expert_id
            )))
        }
        Err(err) => Err(BookingError::Database(err.into())),
    }
}

pub async fn get_appointment_by_id(
    pool: &Pool<Postgres>,
    id: Uuid,
) -> Result<Option<DbAppointment>> {
    let query = format!(
        r#"
        SELECT {APPOINTMENT_COLUMNS}
        FROM appointments
        WHERE id = $1
        "#
    );

    let appointment = sqlx::query_as::<_, DbAppointment>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(appointment)
}

pub async fn get_appointment_by_hold_ref(
    pool: &Pool<Postgres>,
    hold_ref: &str,
) -> Result<Option<DbAppointment>> {
    let query = format!(
        r#"
        SELECT {APPOINTMENT_COLUMNS}
        FROM appointments
        WHERE payment_hold_ref = $1
        "#
    );

    let appointment = sqlx::query_as::<_, DbAppointment>(&query)
        .bind(hold_ref)
        .fetch_optional(pool)
        .await?;

    Ok(appointment)
}

/// Non-cancelled appointments whose `[scheduled_at, scheduled_at + duration)`
/// interval intersects `[range_start, range_end)`.
pub async fn list_overlapping(
    pool: &Pool<Postgres>,
    expert_id: Uuid,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
) -> Result<Vec<DbAppointment>> {
    let query = format!(
        r#"
        SELECT {APPOINTMENT_COLUMNS}
        FROM appointments
        WHERE expert_id = $1
          AND status <> 'cancelled'
          AND scheduled_at < $3
          AND scheduled_at + make_interval(mins => duration_minutes) > $2
        ORDER BY scheduled_at ASC
        "#
    );

    let appointments = sqlx::query_as::<_, DbAppointment>(&query)
        .bind(expert_id)
        .bind(range_start)
        .bind(range_end)
        .fetch_all(pool)
        .await?;

    Ok(appointments)
}

/// Compare-and-set status transition. Returns the updated row, or `None`
/// when the row no longer has `from` status (lost race or repeated call).
pub async fn transition_status(
    pool: &Pool<Postgres>,
    id: Uuid,
    from: AppointmentStatus,
    to: AppointmentStatus,
) -> Result<Option<DbAppointment>> {
    tracing::debug!(
        "Transitioning appointment {}: {} -> {}",
        id,
        from.as_str(),
        to.as_str()
    );

    let query = format!(
        r#"
        UPDATE appointments
        SET status = $3, updated_at = NOW()
        WHERE id = $1 AND status = $2
        RETURNING {APPOINTMENT_COLUMNS}
        "#
    );

    let appointment = sqlx::query_as::<_, DbAppointment>(&query)
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .fetch_optional(pool)
        .await?;

    Ok(appointment)
}

/// Marks a pending appointment confirmed, recording the calendar artifacts
/// when event creation succeeded. CAS on `pending`, same as
/// [`transition_status`].
pub async fn mark_confirmed(
    pool: &Pool<Postgres>,
    id: Uuid,
    meeting_link: Option<&str>,
    calendar_event_id: Option<&str>,
) -> Result<Option<DbAppointment>> {
    let query = format!(
        r#"
        UPDATE appointments
        SET status = 'confirmed', meeting_link = $2, calendar_event_id = $3,
            updated_at = NOW()
        WHERE id = $1 AND status = 'pending'
        RETURNING {APPOINTMENT_COLUMNS}
        "#
    );

    let appointment = sqlx::query_as::<_, DbAppointment>(&query)
        .bind(id)
        .bind(meeting_link)
        .bind(calendar_event_id)
        .fetch_optional(pool)
        .await?;

    Ok(appointment)
}

pub async fn mark_hold_captured(pool: &Pool<Postgres>, hold_ref: &str) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE appointments
        SET hold_captured = TRUE, updated_at = NOW()
        WHERE payment_hold_ref = $1
        "#,
    )
    .bind(hold_ref)
    .execute(pool)
    .await?;

    Ok(())
}

/// Cancels from the given live status, recording when and why.
pub async fn mark_cancelled(
    pool: &Pool<Postgres>,
    id: Uuid,
    from: AppointmentStatus,
    reason: Option<&str>,
) -> Result<Option<DbAppointment>> {
    let query = format!(
        r#"
        UPDATE appointments
        SET status = 'cancelled', cancelled_at = NOW(), cancel_reason = $3,
            updated_at = NOW()
        WHERE id = $1 AND status = $2
        RETURNING {APPOINTMENT_COLUMNS}
        "#
    );

    let appointment = sqlx::query_as::<_, DbAppointment>(&query)
        .bind(id)
        .bind(from.as_str())
        .bind(reason)
        .fetch_optional(pool)
        .await?;

    Ok(appointment)
}
