//! Regional ("oblast") routes fetched from the secondary service and merged
//! into the city route list.

use std::{sync::Arc, time::Duration, time::Instant};

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::{
    repository::{Route, sort_routes},
    source::TransitService,
};

/// Regional routes the app knows how to show.
pub const DEFAULT_ROUTE_NAMES: [&str; 8] =
    ["184А", "156", "184", "1001", "799", "816", "131", "217А"];

pub const DEFAULT_REQUEST_INTERVAL: Duration = Duration::from_millis(50);

pub fn is_oblast_route(names: &[String], name: &str) -> bool {
    names.iter().any(|known| known == name)
}

pub struct OblastMerger {
    service: Arc<dyn TransitService>,
    names: Vec<String>,
    request_interval: Duration,
}

impl OblastMerger {
    pub fn new(service: Arc<dyn TransitService>, names: Vec<String>) -> Self {
        Self {
            service,
            names,
            request_interval: DEFAULT_REQUEST_INTERVAL,
        }
    }

    /// Pause inserted before each path request. Zero disables it.
    pub fn request_interval(mut self, interval: Duration) -> Self {
        self.request_interval = interval;
        self
    }

    /// Fetches the allow-listed regional routes with their paths.
    ///
    /// Never fails: an unavailable service yields no routes, and a route whose
    /// path could not be fetched keeps the lines it was listed with.
    pub async fn merge(&self) -> Vec<Route> {
        debug!("Merging oblast routes...");
        let now = Instant::now();
        let listed = match self.service.oblast_routes().await {
            Ok(routes) => routes,
            Err(err) => {
                warn!("Oblast routes unavailable: {err}");
                return Vec::new();
            }
        };

        let mut routes: Vec<Route> = listed
            .into_iter()
            .filter(|route| is_oblast_route(&self.names, &route.name))
            .collect();

        let mut paths = JoinSet::new();
        for (idx, route) in routes.iter().enumerate() {
            if !self.request_interval.is_zero() {
                tokio::time::sleep(self.request_interval).await;
            }
            let service = Arc::clone(&self.service);
            let route_id = route.id;
            paths.spawn(async move { (idx, route_id, service.oblast_route_path(route_id).await) });
        }

        let mut fetched = 0;
        while let Some(joined) = paths.join_next().await {
            match joined {
                Ok((idx, _, Ok(line))) => {
                    routes[idx].lines = vec![line];
                    fetched += 1;
                }
                Ok((_, route_id, Err(err))) => {
                    warn!("Path for oblast route {route_id} unavailable: {err}")
                }
                Err(err) => warn!("Path request aborted: {err}"),
            }
        }

        sort_routes(&mut routes);
        debug!(
            "Merging oblast routes took {:?} ({} routes, {} paths)",
            now.elapsed(),
            routes.len(),
            fetched
        );
        routes
    }
}
