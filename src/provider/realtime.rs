use std::collections::{HashMap, HashSet};

use futures::future::join_all;
use tracing::{debug, warn};

use crate::{
    oblast::is_oblast_route,
    provider::{Error, TransitDataProvider},
    repository::Transport,
    source::FeedTransportRecord,
};

impl TransitDataProvider {
    /// Live vehicles for `route_ids`, bucketed by route id.
    ///
    /// Regional routes are asked for one by one and may be missing from the
    /// result; the general feed is required and its failure fails the call.
    pub async fn provide_real_time_positions(
        &self,
        route_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<Transport>>, Error> {
        let names = &self.settings().oblast_route_names;
        let oblast: Vec<i64> = route_ids
            .iter()
            .filter_map(|id| self.provide_route_sync(*id))
            .filter(|route| is_oblast_route(names, &route.name))
            .map(|route| route.id)
            .collect();

        let service = &self.inner.service;
        let fetched = join_all(oblast.iter().map(|route_id| async move {
            (*route_id, service.oblast_transport(*route_id).await)
        }))
        .await;

        let mut result: HashMap<i64, Vec<Transport>> = HashMap::new();
        for (route_id, transports) in fetched {
            match transports {
                Ok(transports) => {
                    result.insert(route_id, transports);
                }
                Err(err) => warn!("Vehicles for oblast route {route_id} unavailable: {err}"),
            }
        }

        let records = service.general_feed().await.map_err(Error::GeneralFeed)?;
        let requested: HashSet<i64> = route_ids.iter().copied().collect();
        let mut route_names: HashMap<i64, Option<String>> = HashMap::new();
        let mut joined = 0;
        for record in records {
            let Some((id, route_id)) = record_ids(&record) else {
                continue;
            };
            if !requested.contains(&route_id) {
                continue;
            }
            let route_name = route_names
                .entry(route_id)
                .or_insert_with(|| self.provide_route_sync(route_id).map(|route| route.name))
                .clone();
            result.entry(route_id).or_default().push(Transport {
                id,
                coordinate: record.coordinate,
                bearing: record.bearing as i32,
                vehicle_number: record.vehicle_number,
                route_id: Some(route_id),
                route_name,
            });
            joined += 1;
        }
        debug!(
            "Joined {joined} vehicles from the general feed, {} oblast routes",
            oblast.len()
        );
        Ok(result)
    }
}

fn record_ids(record: &FeedTransportRecord) -> Option<(i64, i64)> {
    let id = record.id.trim().parse().ok()?;
    let route_id = record.route_id.as_deref()?.trim().parse().ok()?;
    Some((id, route_id))
}
