use std::collections::{HashMap, HashSet};

mod entities;
pub mod normalize;
pub use entities::*;
pub use normalize::{Normalized, normalize};

use crate::shared::compare_route_names;

/// In-memory route and stop tables for one city.
#[derive(Debug, Clone, Default)]
pub struct Repository {
    routes: Vec<Route>,
    stops: HashSet<Stop>,
    raw_stops: Vec<RawStop>,

    route_lookup: HashMap<i64, usize>,
    raw_stop_lookup: HashMap<i64, usize>,
}

impl Repository {
    pub fn new() -> Self {
        Default::default()
    }

    /// Replaces the route table. Routes are kept in the order given.
    pub fn with_routes(mut self, routes: Vec<Route>) -> Self {
        self.route_lookup = routes
            .iter()
            .enumerate()
            .map(|(i, route)| (route.id, i))
            .collect();
        self.routes = routes;
        self
    }

    /// Replaces both stop tables; canonical stops are derived from the raw ones.
    pub fn with_raw_stops(mut self, raw_stops: Vec<RawStop>) -> Self {
        self.stops = raw_stops.iter().map(Stop::from).collect();
        self.raw_stop_lookup = raw_stops
            .iter()
            .enumerate()
            .map(|(i, stop)| (stop.id, i))
            .collect();
        self.raw_stops = raw_stops;
        self
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn stops(&self) -> &HashSet<Stop> {
        &self.stops
    }

    pub fn raw_stops(&self) -> &[RawStop] {
        &self.raw_stops
    }

    pub fn has_routes(&self) -> bool {
        !self.routes.is_empty()
    }

    pub fn has_stops(&self) -> bool {
        !self.raw_stops.is_empty()
    }

    pub fn route(&self, id: i64) -> Option<&Route> {
        self.route_lookup.get(&id).map(|idx| &self.routes[*idx])
    }

    pub fn raw_stop(&self, id: i64) -> Option<&RawStop> {
        self.raw_stop_lookup.get(&id).map(|idx| &self.raw_stops[*idx])
    }

    /// Routes whose id is in `ids`, in table order.
    pub fn routes_with_ids(&self, ids: &[i64]) -> Vec<Route> {
        filter_routes(&self.routes, ids)
    }
}

pub fn filter_routes(routes: &[Route], ids: &[i64]) -> Vec<Route> {
    let ids: HashSet<i64> = ids.iter().copied().collect();
    routes
        .iter()
        .filter(|route| ids.contains(&route.id))
        .cloned()
        .collect()
}

pub fn sort_routes(routes: &mut [Route]) {
    routes.sort_by(|a, b| compare_route_names(&a.name, &b.name));
}

#[test]
fn repository_lookup_test() {
    let routes = vec![
        Route {
            id: 7,
            name: "3".into(),
            ..Default::default()
        },
        Route {
            id: 2,
            name: "1".into(),
            ..Default::default()
        },
    ];
    let repository = Repository::new().with_routes(routes);
    assert_eq!(repository.route(2).map(|r| r.name.as_str()), Some("1"));
    assert!(repository.route(5).is_none());
    let filtered = repository.routes_with_ids(&[2, 7, 9]);
    assert_eq!(filtered.iter().map(|r| r.id).collect::<Vec<_>>(), vec![7, 2]);
}

#[test]
fn repository_stops_dedup_test() {
    let raw = vec![
        RawStop {
            id: 1,
            name: "Ринок".into(),
            ..Default::default()
        },
        RawStop {
            id: 1,
            name: "Площа Ринок".into(),
            ..Default::default()
        },
    ];
    let repository = Repository::new().with_raw_stops(raw);
    assert_eq!(repository.stops().len(), 1);
}
