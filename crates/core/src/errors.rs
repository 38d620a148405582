use thiserror::Error;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Payout not configured: {0}")]
    PayoutNotConfigured(String),

    #[error("Slot no longer available: {0}")]
    SlotConflict(String),

    #[error("Payment processor error: {0}")]
    Processor(String),

    #[error("Calendar sync error: {0}")]
    CalendarSync(String),

    #[error("Database error: {0}")]
    Database(#[from] eyre::Report),

    #[error("Internal server error: {0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

pub type BookingResult<T> = Result<T, BookingError>;
