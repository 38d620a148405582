use axum::{routing::post, Router};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/appointments",
            post(handlers::appointments::create_appointment),
        )
        .route(
            "/api/appointments/:id/confirm",
            post(handlers::appointments::confirm_appointment),
        )
        .route(
            "/api/appointments/:id/cancel",
            post(handlers::appointments::cancel_appointment),
        )
        .route(
            "/api/appointments/:id/complete",
            post(handlers::appointments::complete_appointment),
        )
        .route(
            "/api/appointments/:id/reviews",
            post(handlers::reviews::create_review),
        )
}
