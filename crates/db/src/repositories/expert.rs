use crate::models::DbExpert;
use chrono::Utc;
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

pub async fn create_expert(
    pool: &Pool<Postgres>,
    display_name: &str,
    timezone: &str,
    hourly_rate_cents: i64,
) -> Result<DbExpert> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    tracing::debug!("Creating expert: id={}, name={}", id, display_name);

    let expert = sqlx::query_as::<_, DbExpert>(
        r#"
        INSERT INTO experts (id, display_name, timezone, hourly_rate_cents, created_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, display_name, timezone, hourly_rate_cents, is_verified,
                  booking_enabled, payout_destination, calendar_connected,
                  calendar_last_synced_at, created_at
        "#,
    )
    .bind(id)
    .bind(display_name)
    .bind(timezone)
    .bind(hourly_rate_cents)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(expert)
}

pub async fn get_expert_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbExpert>> {
    tracing::debug!("Getting expert by id: {}", id);

    let expert = sqlx::query_as::<_, DbExpert>(
        r#"
        SELECT id, display_name, timezone, hourly_rate_cents, is_verified,
               booking_enabled, payout_destination, calendar_connected,
               calendar_last_synced_at, created_at
        FROM experts
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(expert)
}
