use std::{collections::HashMap, sync::Arc};

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use citytransit::provider::Error;

use crate::{api::into_status, dto::StopDto, state::AppState};

pub async fn stops(State(state): State<Arc<AppState>>) -> Result<Response, StatusCode> {
    let stops = state.provider.provide_stops().await.map_err(into_status)?;
    let result: Vec<_> = stops.iter().map(StopDto::from).collect();
    Ok(Json(result).into_response())
}

pub async fn arrivals(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let stop_id: i64 = match params.get("stop") {
        Some(value) => value.parse().map_err(|_| StatusCode::BAD_REQUEST)?,
        None => return Err(StatusCode::BAD_REQUEST),
    };
    let stops = state.provider.provide_stops().await.map_err(into_status)?;
    let stop = stops
        .iter()
        .find(|stop| stop.id == stop_id)
        .ok_or_else(|| into_status(Error::StopNotFound(stop_id)))?;
    let arrivals = state
        .provider
        .provide_arrivals(stop)
        .await
        .map_err(into_status)?;
    Ok(Json(arrivals).into_response())
}
