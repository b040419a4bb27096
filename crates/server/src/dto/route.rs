use citytransit::{
    repository::{Route, RouteKind},
    shared::geo::Coordinate,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDto {
    pub id: i64,
    pub name: String,
    pub full_name: String,
    pub kind: RouteKind,
    pub lines: Vec<Vec<Coordinate>>,
}

impl RouteDto {
    pub fn from(route: &Route) -> Self {
        Self {
            id: route.id,
            name: route.name.clone(),
            full_name: route.full_name.clone(),
            kind: route.kind,
            lines: route
                .lines
                .iter()
                .map(|line| line.points.clone())
                .collect(),
        }
    }
}

/// Route list entry without geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSummaryDto {
    pub id: i64,
    pub name: String,
    pub full_name: String,
    pub kind: RouteKind,
}

impl RouteSummaryDto {
    pub fn from(route: &Route) -> Self {
        Self {
            id: route.id,
            name: route.name.clone(),
            full_name: route.full_name.clone(),
            kind: route.kind,
        }
    }
}
