use axum::routing::{get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer};
use crate::handlers::{attendance, checkout, health_check, lots};
use crate::state::AppState;

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/events/:event_id/attendance",
            post(attendance::request_join).delete(attendance::leave),
        )
        .route(
            "/events/:event_id/attendance/:user_id/decision",
            post(attendance::decide),
        )
        .route("/events/:event_id/attendees", get(attendance::list_attendees))
        .route("/events/:event_id/lots", post(lots::create).get(lots::list))
        .route(
            "/events/:event_id/lots/:lot_id",
            put(lots::update).delete(lots::remove),
        )
        .route("/events/:event_id/checkout", post(checkout::start))
        .route("/payments/return", get(checkout::payment_return))
        .layer(TraceLayer::new_for_http())
        .layer(create_security_headers_layer())
        .layer(create_cors_layer())
        .with_state(state)
}
