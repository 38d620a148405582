use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // Create experts table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS experts (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            display_name VARCHAR(255) NOT NULL,
            timezone VARCHAR(64) NOT NULL DEFAULT 'UTC',
            hourly_rate_cents BIGINT NOT NULL DEFAULT 0,
            is_verified BOOLEAN NOT NULL DEFAULT FALSE,
            booking_enabled BOOLEAN NOT NULL DEFAULT TRUE,
            payout_destination VARCHAR(255) NULL,
            calendar_connected BOOLEAN NOT NULL DEFAULT FALSE,
            calendar_last_synced_at TIMESTAMP WITH TIME ZONE NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create expert_availability table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS expert_availability (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            expert_id UUID NOT NULL REFERENCES experts(id),
            day_of_week SMALLINT NOT NULL,
            start_time TIME NOT NULL,
            end_time TIME NOT NULL,
            timezone VARCHAR(64) NOT NULL DEFAULT 'UTC',
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            is_recurring BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_day CHECK (day_of_week BETWEEN 0 AND 6),
            CONSTRAINT valid_window CHECK (end_time > start_time)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create blocked_time_slots table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS blocked_time_slots (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            expert_id UUID NOT NULL REFERENCES experts(id),
            start_date_time TIMESTAMP WITH TIME ZONE NOT NULL,
            end_date_time TIMESTAMP WITH TIME ZONE NOT NULL,
            reason VARCHAR(500) NULL,
            is_all_day BOOLEAN NOT NULL DEFAULT FALSE,
            is_recurring BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_block_range CHECK (end_date_time > start_date_time)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create appointments table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS appointments (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            expert_id UUID NOT NULL REFERENCES experts(id),
            client_id UUID NULL,
            client_name VARCHAR(255) NOT NULL,
            client_email VARCHAR(255) NOT NULL,
            scheduled_at TIMESTAMP WITH TIME ZONE NOT NULL,
            scheduled_at_timezone VARCHAR(64) NOT NULL DEFAULT 'UTC',
            duration_minutes INTEGER NOT NULL,
            status VARCHAR(16) NOT NULL DEFAULT 'pending',
            total_amount BIGINT NOT NULL,
            platform_fee BIGINT NOT NULL,
            expert_earnings BIGINT NOT NULL,
            payment_hold_ref VARCHAR(255) NOT NULL,
            hold_captured BOOLEAN NOT NULL DEFAULT FALSE,
            payout_destination_ref VARCHAR(255) NOT NULL,
            meeting_link VARCHAR(500) NULL,
            calendar_event_id VARCHAR(255) NULL,
            notes VARCHAR(2000) NULL,
            cancelled_at TIMESTAMP WITH TIME ZONE NULL,
            cancel_reason VARCHAR(500) NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_duration CHECK (duration_minutes > 0),
            CONSTRAINT valid_status CHECK (status IN ('pending', 'confirmed', 'completed', 'cancelled')),
            CONSTRAINT conserved_split CHECK (platform_fee + expert_earnings = total_amount)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Atomic slot reservation: at most one live appointment per expert and
    // start instant. Cancelled rows do not hold the slot.
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS uniq_live_appointment_slot
        ON appointments(expert_id, scheduled_at)
        WHERE status <> 'cancelled';
        "#,
    )
    .execute(pool)
    .await?;

    // Create appointment_reviews table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS appointment_reviews (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            appointment_id UUID NOT NULL REFERENCES appointments(id),
            reviewer_id UUID NOT NULL,
            reviewee_id UUID NOT NULL,
            rating SMALLINT NOT NULL,
            review_text VARCHAR(2000) NULL,
            is_public BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_rating CHECK (rating BETWEEN 1 AND 5),
            CONSTRAINT one_review_per_reviewer UNIQUE (appointment_id, reviewer_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_availability_expert_day ON expert_availability(expert_id, day_of_week);
        CREATE INDEX IF NOT EXISTS idx_blocked_expert_start ON blocked_time_slots(expert_id, start_date_time);
        CREATE INDEX IF NOT EXISTS idx_appointments_expert_scheduled ON appointments(expert_id, scheduled_at);
        CREATE INDEX IF NOT EXISTS idx_appointments_hold_ref ON appointments(payment_hold_ref);
        CREATE INDEX IF NOT EXISTS idx_reviews_appointment ON appointment_reviews(appointment_id);
        "#,
    )
    .execute(pool)
    .await?;

    info!("Database schema initialized successfully.");
    Ok(())
}
