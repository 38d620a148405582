//! # API Configuration Module
//!
//! This module handles loading and managing configuration for the Bookwise
//! API server. It retrieves configuration values from environment variables
//! and provides defaults where appropriate.
//!
//! ## Environment Variables
//!
//! - `API_HOST`: The host address to bind the server to (default: "0.0.0.0")
//! - `API_PORT`: The port to listen on (default: 3000)
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `LOG_LEVEL`: Logging level (default: "info")
//! - `API_CORS_ORIGINS`: Comma-separated list of allowed CORS origins
//! - `API_REQUEST_TIMEOUT_SECONDS`: Request timeout (default: 30)
//! - `BOOKING_FEE_RATE_STANDARD`: Platform fee rate on standard bookings (default: 0.10)
//! - `BOOKING_FEE_RATE_INSTANT`: Platform fee rate on instant bookings (default: 0.15)
//! - `BOOKING_MIN_AMOUNT_CENTS`: Minimum booking total (default: 500)
//! - `BOOKING_MAX_AMOUNT_CENTS`: Maximum booking total (default: 100000)
//! - `SLOT_STRIDE_MINUTES`: Default slot enumeration stride (default: 30)

use bookwise_core::payments::FeePolicy;
use eyre::{Result, WrapErr};
use std::env;
use tracing::Level;

/// Configuration for the Bookwise API server
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host address for the API server (e.g., "127.0.0.1", "0.0.0.0")
    pub host: String,

    /// Port for the API server to listen on
    pub port: u16,

    /// PostgreSQL database connection string
    pub database_url: String,

    /// Log level for the application
    pub log_level: Level,

    /// CORS allowed origins (optional)
    pub cors_origins: Option<Vec<String>>,

    /// Request timeout in seconds
    pub request_timeout: u64,

    /// Platform fee rate for standard bookings
    pub fee_rate_standard: f64,

    /// Platform fee rate for instant bookings. Two rates exist in production
    /// and are deliberately configured separately, never unified.
    pub fee_rate_instant: f64,

    /// Minimum allowed booking total, minor currency units
    pub min_amount_cents: i64,

    /// Maximum allowed booking total, minor currency units
    pub max_amount_cents: i64,

    /// Slot stride applied when a slot query does not specify one
    pub default_stride_minutes: i64,
}

impl ApiConfig {
    /// Creates a new ApiConfig from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` is unset, or if a numeric variable
    /// cannot be parsed.
    pub fn from_env() -> Result<Self> {
        // Network settings
        let host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("API_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .wrap_err("Invalid API_PORT value")?;

        // Database settings
        let database_url = env::var("DATABASE_URL")
            .wrap_err("DATABASE_URL environment variable must be set")?;

        // Logging settings
        let log_level = match env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()).as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };

        // CORS settings
        let cors_origins = env::var("API_CORS_ORIGINS")
            .ok()
            .map(|origins| origins.split(',').map(|s| s.trim().to_string()).collect());

        // Performance settings
        let request_timeout = env::var("API_REQUEST_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .unwrap_or(30);

        // Booking settings
        let fee_rate_standard = env::var("BOOKING_FEE_RATE_STANDARD")
            .unwrap_or_else(|_| "0.10".to_string())
            .parse()
            .wrap_err("Invalid BOOKING_FEE_RATE_STANDARD value")?;
        let fee_rate_instant = env::var("BOOKING_FEE_RATE_INSTANT")
            .unwrap_or_else(|_| "0.15".to_string())
            .parse()
            .wrap_err("Invalid BOOKING_FEE_RATE_INSTANT value")?;
        let min_amount_cents = env::var("BOOKING_MIN_AMOUNT_CENTS")
            .unwrap_or_else(|_| "500".to_string())
            .parse()
            .wrap_err("Invalid BOOKING_MIN_AMOUNT_CENTS value")?;
        let max_amount_cents = env::var("BOOKING_MAX_AMOUNT_CENTS")
            .unwrap_or_else(|_| "100000".to_string())
            .parse()
            .wrap_err("Invalid BOOKING_MAX_AMOUNT_CENTS value")?;
        let default_stride_minutes = env::var("SLOT_STRIDE_MINUTES")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .unwrap_or(30);

        Ok(Self {
            host,
            port,
            database_url,
            log_level,
            cors_origins,
            request_timeout,
            fee_rate_standard,
            fee_rate_instant,
            min_amount_cents,
            max_amount_cents,
            default_stride_minutes,
        })
    }

    /// Returns the server address as a string, e.g. "127.0.0.1:8080"
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn fee_standard(&self) -> FeePolicy {
        FeePolicy {
            rate: self.fee_rate_standard,
            min_amount_cents: self.min_amount_cents,
            max_amount_cents: self.max_amount_cents,
        }
    }

    pub fn fee_instant(&self) -> FeePolicy {
        FeePolicy {
            rate: self.fee_rate_instant,
            min_amount_cents: self.min_amount_cents,
            max_amount_cents: self.max_amount_cents,
        }
    }
}
