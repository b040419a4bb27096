use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::{error, info};

use crate::state::AppState;

/// Seconds since the persisted routes were last replaced.
pub async fn age(State(state): State<Arc<AppState>>) -> Result<Response, StatusCode> {
    match state.provider.refreshed_at().await {
        Some(refreshed_at) => {
            let seconds = (Utc::now() - refreshed_at).num_seconds().max(0);
            Ok(seconds.to_string().into_response())
        }
        None => Err(StatusCode::NOT_FOUND),
    }
}

pub async fn update(State(state): State<Arc<AppState>>) -> Result<Response, StatusCode> {
    let outcome = state.provider.update_database().await;
    if outcome.success {
        info!("Database updated");
        Ok(Json(outcome).into_response())
    } else {
        error!(
            "Database update failed: {}",
            outcome.message.as_deref().unwrap_or_default()
        );
        Ok((StatusCode::BAD_GATEWAY, Json(outcome)).into_response())
    }
}
