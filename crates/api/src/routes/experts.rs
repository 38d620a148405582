use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/experts/:id/slots", get(handlers::slots::get_slots))
        .route(
            "/api/experts/:id/availability",
            put(handlers::availability::set_weekly_availability),
        )
        .route(
            "/api/experts/:id/availability",
            get(handlers::availability::list_availability),
        )
        .route(
            "/api/experts/:id/blocked-slots",
            post(handlers::availability::add_blocked_slot),
        )
        .route(
            "/api/experts/:id/blocked-slots",
            get(handlers::availability::list_blocked_slots),
        )
        .route(
            "/api/experts/:id/blocked-slots/:slot_id",
            delete(handlers::availability::remove_blocked_slot),
        )
        .route(
            "/api/experts/:id/rating",
            get(handlers::reviews::get_aggregate_rating),
        )
}
