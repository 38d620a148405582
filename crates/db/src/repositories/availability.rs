use crate::models::DbAvailabilityWindow;
use bookwise_core::models::availability::ValidatedWindow;
use chrono::Utc;
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

/// Replaces an expert's entire weekly availability in one transaction.
///
/// Delete and insert commit together, so a concurrent slot query never
/// observes a transient empty-availability state.
pub async fn set_weekly_availability(
    pool: &Pool<Postgres>,
    expert_id: Uuid,
    timezone: &str,
    windows: &[ValidatedWindow],
) -> Result<Vec<DbAvailabilityWindow>> {
    tracing::debug!(
        "Replacing weekly availability: expert_id={}, windows={}",
        expert_id,
        windows.len()
    );

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        DELETE FROM expert_availability
        WHERE expert_id = $1
        "#,
    )
    .bind(expert_id)
    .execute(&mut *tx)
    .await?;

    let now = Utc::now();
    let mut inserted = Vec::with_capacity(windows.len());

    for window in windows {
        let row = sqlx::query_as::<_, DbAvailabilityWindow>(
            r#"
            INSERT INTO expert_availability
                (id, expert_id, day_of_week, start_time, end_time, timezone,
                 is_active, is_recurring, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, expert_id, day_of_week, start_time, end_time, timezone,
                      is_active, is_recurring, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(expert_id)
        .bind(window.day_of_week)
        .bind(window.start_time)
        .bind(window.end_time)
        .bind(timezone)
        .bind(window.is_active)
        .bind(window.is_recurring)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        inserted.push(row);
    }

    tx.commit().await?;

    tracing::debug!("Weekly availability replaced: expert_id={}", expert_id);
    Ok(inserted)
}

pub async fn list_availability(
    pool: &Pool<Postgres>,
    expert_id: Uuid,
) -> Result<Vec<DbAvailabilityWindow>> {
    let windows = sqlx::query_as::<_, DbAvailabilityWindow>(
        r#"
        SELECT id, expert_id, day_of_week, start_time, end_time, timezone,
               is_active, is_recurring, created_at
        FROM expert_availability
        WHERE expert_id = $1
        ORDER BY day_of_week ASC, start_time ASC
        "#,
    )
    .bind(expert_id)
    .fetch_all(pool)
    .await?;

    Ok(windows)
}
