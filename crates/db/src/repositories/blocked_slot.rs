use crate::models::DbBlockedTimeSlot;
use chrono::{DateTime, Utc};
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

pub async fn add_blocked_slot(
    pool: &Pool<Postgres>,
    expert_id: Uuid,
    start_date_time: DateTime<Utc>,
    end_date_time: DateTime<Utc>,
    reason: Option<&str>,
    is_all_day: bool,
    is_recurring: bool,
) -> Result<DbBlockedTimeSlot> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    tracing::debug!(
        "Adding blocked slot: expert_id={}, start={}, end={}",
        expert_id,
        start_date_time,
        end_date_time
    );

    let slot = sqlx::query_as::<_, DbBlockedTimeSlot>(
        r#"
        INSERT INTO blocked_time_slots
            (id, expert_id, start_date_time, end_date_time, reason,
             is_all_day, is_recurring, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, expert_id, start_date_time, end_date_time, reason,
                  is_all_day, is_recurring, created_at
        "#,
    )
    .bind(id)
    .bind(expert_id)
    .bind(start_date_time)
    .bind(end_date_time)
    .bind(reason)
    .bind(is_all_day)
    .bind(is_recurring)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(slot)
}

/// Removes a blocked slot; returns whether a row belonging to the expert
/// was actually deleted.
pub async fn remove_blocked_slot(
    pool: &Pool<Postgres>,
    expert_id: Uuid,
    slot_id: Uuid,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM blocked_time_slots
        WHERE id = $1 AND expert_id = $2
        "#,
    )
    .bind(slot_id)
    .bind(expert_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn list_blocked_slots(
    pool: &Pool<Postgres>,
    expert_id: Uuid,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
) -> Result<Vec<DbBlockedTimeSlot>> {
    let slots = sqlx::query_as::<_, DbBlockedTimeSlot>(
        r#"
        SELECT id, expert_id, start_date_time, end_date_time, reason,
               is_all_day, is_recurring, created_at
        FROM blocked_time_slots
        WHERE expert_id = $1
          AND start_date_time < $3
          AND end_date_time > $2
        ORDER BY start_date_time ASC
        "#,
    )
    .bind(expert_id)
    .bind(range_start)
    .bind(range_end)
    .fetch_all(pool)
    .await?;

    Ok(slots)
}
