use std::{collections::BTreeMap, sync::Arc};

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use citytransit::{provider::Error, repository::RouteKind};

use crate::{
    api::into_status,
    dto::{RouteDto, RouteSummaryDto},
    state::AppState,
};

pub async fn routes(State(state): State<Arc<AppState>>) -> Result<Response, StatusCode> {
    let (routes, _) = state.provider.provide_routes().await.map_err(into_status)?;
    let result: Vec<_> = routes.iter().map(RouteSummaryDto::from).collect();
    Ok(Json(result).into_response())
}

pub async fn route(
    Path(id): Path<i64>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let route = state
        .provider
        .provide_routes_with_ids(&[id])
        .await
        .map_err(into_status)?
        .into_iter()
        .next()
        .ok_or_else(|| into_status(Error::RouteNotFound(id)))?;
    Ok(Json(RouteDto::from(&route)).into_response())
}

pub async fn routes_by_kind(State(state): State<Arc<AppState>>) -> Result<Response, StatusCode> {
    state.provider.provide_routes().await.map_err(into_status)?;
    let result: BTreeMap<RouteKind, Vec<RouteSummaryDto>> = state
        .provider
        .routes_by_kind()
        .into_iter()
        .map(|(kind, routes)| (kind, routes.iter().map(RouteSummaryDto::from).collect()))
        .collect();
    Ok(Json(result).into_response())
}

pub async fn selected_routes(State(state): State<Arc<AppState>>) -> Result<Response, StatusCode> {
    let routes = state
        .provider
        .provide_selected_routes()
        .await
        .map_err(into_status)?;
    let result: Vec<_> = routes.iter().map(RouteSummaryDto::from).collect();
    Ok(Json(result).into_response())
}
