//! # Bookwise API
//!
//! The API crate provides the web server for the Bookwise appointment
//! scheduling and booking service. It exposes RESTful endpoints for slot
//! discovery, availability management, the appointment lifecycle, and
//! post-completion reviews.
//!
//! ## Architecture
//!
//! This crate follows a layered architecture:
//!
//! - **Routes**: Define API endpoints and URL structure
//! - **Handlers**: Implement request processing logic over the core domain
//! - **Middleware**: Cross-cutting concerns (error mapping, principal extraction)
//! - **Collaborators**: Stock implementations of the external payment,
//!   calendar, and notification interfaces
//! - **Config**: Environment and application configuration
//!
//! The API uses Axum as the web framework and SQLx for persistence. The
//! payment processor, calendar provider, and notification sender are
//! injected as trait objects; handlers never construct clients themselves.

/// Stock collaborator implementations (no-op calendar, logging notifier)
pub mod collaborators;
/// Configuration module for API settings
pub mod config;
/// Request handlers that implement business logic
pub mod handlers;
/// Middleware for principal extraction and error handling
pub mod middleware;
/// Route definitions and API endpoint structure
pub mod routes;

use std::sync::Arc;

use axum::Router;
use bookwise_core::collaborators::{CalendarProvider, NotificationSender};
use bookwise_core::payments::{FeePolicy, PaymentProcessor};
use eyre::Result;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

/// Shared application state accessible to all request handlers.
///
/// Holds the database pool, the injected collaborator clients, and the
/// named fee policies. There is no global mutable client state.
pub struct ApiState {
    /// PostgreSQL connection pool for database operations
    pub db_pool: PgPool,
    /// Payment processor collaborator (holds, refunds, destination status)
    pub payments: Arc<dyn PaymentProcessor>,
    /// Calendar collaborator; every call through it is best-effort
    pub calendar: Arc<dyn CalendarProvider>,
    /// Fire-and-forget notification sender
    pub notifier: Arc<dyn NotificationSender>,
    /// Fee policy for standard bookings
    pub fee_standard: FeePolicy,
    /// Fee policy for instant bookings (distinct rate, kept separate)
    pub fee_instant: FeePolicy,
    /// Slot stride applied when a slot query does not specify one
    pub default_stride_minutes: i64,
}

/// Starts the API server with the provided configuration, database
/// connection, and collaborator clients.
pub async fn start_server(
    config: config::ApiConfig,
    db_pool: PgPool,
    payments: Arc<dyn PaymentProcessor>,
    calendar: Arc<dyn CalendarProvider>,
    notifier: Arc<dyn NotificationSender>,
) -> Result<()> {
    // Initialize tracing for logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Create shared state with dependencies
    let state = Arc::new(ApiState {
        db_pool,
        payments,
        calendar,
        notifier,
        fee_standard: config.fee_standard(),
        fee_instant: config.fee_instant(),
        default_stride_minutes: config.default_stride_minutes,
    });

    // Build the application router with all routes
    let app = Router::new()
        // Health check endpoints
        .merge(routes::health::routes())
        // Slot discovery, availability, and rating endpoints
        .merge(routes::experts::routes())
        // Appointment lifecycle endpoints
        .merge(routes::appointments::routes())
        // Payment processor webhook
        .merge(routes::webhooks::routes())
        // Attach shared state to all routes
        .with_state(state);

    // Apply CORS configuration if origins are specified
    let app = if let Some(origins) = &config.cors_origins {
        let cors = tower_http::cors::CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PUT,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::AUTHORIZATION,
                axum::http::header::ACCEPT,
            ])
            .allow_origin(
                origins
                    .iter()
                    .map(|origin| origin.parse().unwrap())
                    .collect::<Vec<_>>(),
            )
            .allow_credentials(true);

        app.layer(cors)
    } else {
        app
    };

    // Add request timeout middleware
    let app = app.layer(tower_http::timeout::TimeoutLayer::new(
        std::time::Duration::from_secs(config.request_timeout),
    ));

    // Start the HTTP server
    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
