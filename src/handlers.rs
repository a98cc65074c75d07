use crate::engine::PointsEngine;
use crate::errors::{AppError, LedgerResult};
use crate::models::{
    SetBalanceRequest, SetBalanceResponse, ToggleActivityRequest, ToggleActivityResponse,
    ToggleEventRequest, ToggleEventResponse, ToggleVipRequest, ToggleVipResponse, UserDataResponse,
};
use crate::state::AppState;
use crate::stats::{BpValues, Dashboard, UserStats};
use crate::ui::render_dashboard;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    response::Html,
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

/// Identity supplied by whatever authenticated the caller upstream.
pub const USER_ID_HEADER: &str = "x-user-id";

pub async fn index(State(state): State<AppState>, headers: HeaderMap) -> Result<Html<String>, AppError> {
    let user = caller(&headers)?;
    let now = Utc::now();
    let page_user = user.clone();
    let dashboard = run(&state, move |engine| engine.dashboard(&user, now)).await?;
    Ok(Html(render_dashboard(&page_user, &dashboard)))
}

pub async fn toggle_activity(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ToggleActivityRequest>, JsonRejection>,
) -> Result<Json<ToggleActivityResponse>, AppError> {
    let user = caller(&headers)?;
    let request = body(payload)?;
    if request.activity_id.trim().is_empty() {
        return Err(AppError::bad_request("Missing activity_id"));
    }

    let now = Utc::now();
    let outcome = run(&state, move |engine| {
        engine.toggle(&user, request.activity_id.trim(), request.completed, now)
    })
    .await?;

    Ok(Json(ToggleActivityResponse {
        success: true,
        new_balance: outcome.new_balance,
        bp_change: outcome.bp_delta,
    }))
}

pub async fn set_balance(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<SetBalanceRequest>, JsonRejection>,
) -> Result<Json<SetBalanceResponse>, AppError> {
    let user = caller(&headers)?;
    let request = body(payload)?;
    let new_balance = run(&state, move |engine| engine.set_balance(&user, request.amount)).await?;
    Ok(Json(SetBalanceResponse {
        success: true,
        new_balance,
    }))
}

pub async fn toggle_vip(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ToggleVipRequest>, JsonRejection>,
) -> Result<Json<ToggleVipResponse>, AppError> {
    let user = caller(&headers)?;
    let request = body(payload)?;
    let vip_status = run(&state, move |engine| engine.set_vip(&user, request.vip_status)).await?;
    Ok(Json(ToggleVipResponse {
        success: true,
        vip_status,
    }))
}

pub async fn toggle_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ToggleEventRequest>, JsonRejection>,
) -> Result<Json<ToggleEventResponse>, AppError> {
    let user = caller(&headers)?;
    if !state.is_admin(&user) {
        warn!(user = %user, "non-admin attempted to toggle the double BP event");
        return Err(AppError::forbidden("Admin access required"));
    }
    let request = body(payload)?;
    let event_active = run(&state, move |engine| engine.set_event_active(request.enabled)).await?;
    info!(user = %user, event_active, "double BP event toggled from web");
    Ok(Json(ToggleEventResponse {
        success: true,
        event_active,
    }))
}

pub async fn get_user_data(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserDataResponse>, AppError> {
    let user = caller(&headers)?;
    let now = Utc::now();
    let snapshot = run(&state, move |engine| engine.ledger().snapshot(&user, engine.day_of(now))).await?;
    Ok(Json(UserDataResponse {
        vip_status: snapshot.vip,
        balance: snapshot.balance,
        completed_activities: snapshot.completed,
        event_active: snapshot.event_active,
    }))
}

pub async fn get_activity_bp_values(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<BpValues>, AppError> {
    let user = caller(&headers)?;
    let now = Utc::now();
    let values = run(&state, move |engine| engine.activity_bp_values(&user, now)).await?;
    Ok(Json(values))
}

pub async fn get_user_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserStats>, AppError> {
    let user = caller(&headers)?;
    let now = Utc::now();
    let stats = run(&state, move |engine| engine.stats(&user, now)).await?;
    Ok(Json(stats))
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Dashboard>, AppError> {
    let user = caller(&headers)?;
    let now = Utc::now();
    let dashboard = run(&state, move |engine| engine.dashboard(&user, now)).await?;
    Ok(Json(dashboard))
}

fn caller(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(String::from)
        .ok_or_else(|| AppError::unauthorized("Missing X-User-Id header"))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}

// Ledger calls block on SQLite; keep them off the async workers.
async fn run<T, F>(state: &AppState, f: F) -> Result<T, AppError>
where
    F: FnOnce(&PointsEngine) -> LedgerResult<T> + Send + 'static,
    T: Send + 'static,
{
    let engine = Arc::clone(&state.engine);
    let result = tokio::task::spawn_blocking(move || f(engine.as_ref())).await?;
    Ok(result?)
}
