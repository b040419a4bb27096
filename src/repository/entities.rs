use std::{
    collections::BTreeMap,
    hash::{Hash, Hasher},
};

use serde::{Deserialize, Serialize};

use crate::{gtfs::GtfsStop, shared::Coordinate};

/// The data partition a provider works on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct City {
    pub id: u32,
    pub name: String,
}

impl City {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl Default for City {
    fn default() -> Self {
        Self::new(1, "Lviv")
    }
}

/// Vehicle class of a route.
///
/// Declaration order is the display order used when grouping routes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RouteKind {
    #[default]
    Bus,
    Trolleybus,
    Tram,
    NightRoute,
    Unknown,
}

/// Ordered points describing the path of one route variant.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub points: Vec<Coordinate>,
}

impl From<Vec<Coordinate>> for Polyline {
    fn from(points: Vec<Coordinate>) -> Self {
        Self { points }
    }
}

/// Canonical route, independent of the source it came from.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Route {
    /// Unique per city and source.
    pub id: i64,
    /// Short label shown to riders, e.g. `"12"` or `"Н5"`.
    pub name: String,
    pub full_name: String,
    pub kind: RouteKind,
    /// One polyline per distinct shape variant.
    pub lines: Vec<Polyline>,
}

impl PartialEq for Route {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Route {}

impl Hash for Route {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Stop record as the feed delivers it. Kept beside the canonical stops
/// because the arrivals feed is keyed by `code`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStop {
    pub id: i64,
    pub name: String,
    pub coordinate: Coordinate,
    pub code: Option<String>,
}

impl From<GtfsStop> for RawStop {
    fn from(value: GtfsStop) -> Self {
        Self {
            id: value.stop_id,
            name: value.stop_name,
            coordinate: Coordinate::new(value.stop_lat, value.stop_lon),
            code: value.stop_code,
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Stop {
    pub id: i64,
    pub name: String,
    pub coordinate: Coordinate,
}

impl From<&RawStop> for Stop {
    fn from(value: &RawStop) -> Self {
        Self {
            id: value.id,
            name: value.name.clone(),
            coordinate: value.coordinate,
        }
    }
}

impl PartialEq for Stop {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Stop {}

impl Hash for Stop {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A live vehicle position. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transport {
    pub id: i64,
    pub coordinate: Coordinate,
    /// Azimuth in whole degrees.
    pub bearing: i32,
    pub vehicle_number: String,
    pub route_id: Option<i64>,
    pub route_name: Option<String>,
}

/// A predicted arrival at a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Arrival {
    pub route_id: i64,
    /// Arrivals carry no vehicle identity, so this is always `-1`.
    pub transport_id: i64,
    pub time: i64,
}

impl Arrival {
    pub const UNKNOWN_TRANSPORT: i64 = -1;

    pub fn new(route_id: i64, time: i64) -> Self {
        Self {
            route_id,
            transport_id: Self::UNKNOWN_TRANSPORT,
            time,
        }
    }
}

/// Buckets routes by kind. Groups iterate in kind display order and keep the
/// relative order of `routes`.
pub fn group_by_kind(routes: &[Route]) -> BTreeMap<RouteKind, Vec<Route>> {
    let mut groups: BTreeMap<RouteKind, Vec<Route>> = BTreeMap::new();
    routes
        .iter()
        .for_each(|route| groups.entry(route.kind).or_default().push(route.clone()));
    groups
}
