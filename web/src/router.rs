//! Router configuration.

use crate::handlers::{editions, guests, health_check, preselections};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

/// Build the complete Axum router: `/health` plus the JSON API under `/api`.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Editions
        .route(
            "/editions",
            get(editions::list_editions).post(editions::create_edition),
        )
        .route("/editions/active", get(editions::active_edition))
        .route("/editions/:id/archive", post(editions::archive_edition))
        .route("/editions/:id/activate", post(editions::activate_edition))
        // Guests
        .route("/guests", get(guests::list_guests).post(guests::invite_guest))
        .route("/guests/confirmed", get(guests::list_confirmed))
        .route("/guests/stats", get(guests::checkin_stats))
        .route("/guests/confirm", post(guests::confirm_guest))
        .route(
            "/guests/:id",
            get(guests::get_guest).patch(guests::enrich_guest),
        )
        .route("/guests/:id/check-in", post(guests::check_in_guest))
        .route("/guests/:id/undo-check-in", post(guests::undo_check_in))
        // Preselections
        .route(
            "/preselections",
            get(preselections::list_preselections).post(preselections::create_preselection),
        )
        .route(
            "/preselections/:id/promote",
            post(preselections::promote_preselection),
        );

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
