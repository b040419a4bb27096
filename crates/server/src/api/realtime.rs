use std::{collections::HashMap, sync::Arc};

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{api::into_status, state::AppState};

/// `?routes=1,2,3`
pub async fn realtime(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let Some(routes) = params.get("routes") else {
        return Err(StatusCode::BAD_REQUEST);
    };
    let route_ids = routes
        .split(',')
        .filter(|value| !value.trim().is_empty())
        .map(|value| value.trim().parse::<i64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| StatusCode::BAD_REQUEST)?;

    let positions = state
        .provider
        .provide_real_time_positions(&route_ids)
        .await
        .map_err(into_status)?;
    Ok(Json(positions).into_response())
}
