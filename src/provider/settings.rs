use std::time::Duration;

use crate::{oblast, repository::City};

/// Everything a provider needs to know about the session it serves.
#[derive(Debug, Clone)]
pub struct Settings {
    pub city: City,
    /// Ignore the persisted mirror and refresh from the network on the next
    /// `provide_routes`.
    pub must_refresh: bool,
    /// Restore `selected_routes` when the route list is first shown.
    pub persist_selected_routes: bool,
    pub selected_routes: Vec<i64>,
    /// Regional route names merged into the city list.
    pub oblast_route_names: Vec<String>,
    pub oblast_request_interval: Duration,
    /// Polling period of [`ObservingProvider`](crate::provider::ObservingProvider).
    pub observe_interval: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            city: City::default(),
            must_refresh: false,
            persist_selected_routes: true,
            selected_routes: Vec::new(),
            oblast_route_names: oblast::DEFAULT_ROUTE_NAMES
                .iter()
                .map(|name| name.to_string())
                .collect(),
            oblast_request_interval: oblast::DEFAULT_REQUEST_INTERVAL,
            observe_interval: Duration::from_secs(10),
        }
    }
}
