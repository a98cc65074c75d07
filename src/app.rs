use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/toggle_activity", post(handlers::toggle_activity))
        .route("/api/set_balance", post(handlers::set_balance))
        .route("/api/toggle_vip", post(handlers::toggle_vip))
        .route("/api/toggle_event", post(handlers::toggle_event))
        .route("/api/user_data", get(handlers::get_user_data))
        .route("/api/activity_bp_values", get(handlers::get_activity_bp_values))
        .route("/api/user_stats", get(handlers::get_user_stats))
        .route("/api/dashboard", get(handlers::get_dashboard))
        .with_state(state)
}
