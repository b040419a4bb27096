use tracing::debug;

use crate::{
    provider::{Error, TransitDataProvider},
    repository::{Arrival, Route, Stop},
    shared::parse_digits,
    source::FeedArrivalRecord,
};

impl TransitDataProvider {
    /// Upcoming arrivals at `stop`, matched to canonical routes.
    pub async fn provide_arrivals(&self, stop: &Stop) -> Result<Vec<Arrival>, Error> {
        let code = self.stop_code(stop.id).await?;
        let encoded = urlencoding::encode(&code).into_owned();
        let records = self
            .inner
            .service
            .arrivals(&encoded)
            .await
            .map_err(Error::Network)?;

        let arrivals = match_arrivals(self.inner.repository().routes(), &records);
        debug!(
            "Matched {} of {} arrivals at stop {}",
            arrivals.len(),
            records.len(),
            stop.id
        );
        Ok(arrivals)
    }

    async fn stop_code(&self, stop_id: i64) -> Result<String, Error> {
        self.load_persisted_stops().await;
        let repository = self.inner.repository();
        let stop = repository
            .raw_stop(stop_id)
            .ok_or(Error::StopNotFound(stop_id))?;
        stop.code
            .clone()
            .filter(|code| !code.is_empty())
            .ok_or(Error::StopWithoutCode(stop_id))
    }
}

/// Pairs each arrival with the first route whose prefixed name and kind agree
/// with it. Arrivals without a readable time or a matching route are dropped.
pub fn match_arrivals(routes: &[Route], records: &[FeedArrivalRecord]) -> Vec<Arrival> {
    records
        .iter()
        .filter_map(|record| {
            let time = parse_digits(&record.time_left)?;
            let prefix = record.route_type.prefix();
            let kind = record.route_type.kind();
            let label = record.route_name.to_lowercase();
            routes
                .iter()
                .find(|route| {
                    route.kind == kind && format!("{prefix}{}", route.name).to_lowercase() == label
                })
                .map(|route| Arrival::new(route.id, time))
        })
        .collect()
}

#[cfg(test)]
fn test_route(id: i64, name: &str, kind: crate::repository::RouteKind) -> Route {
    Route {
        id,
        name: name.into(),
        kind,
        ..Default::default()
    }
}

#[cfg(test)]
fn test_record(
    route_name: &str,
    route_type: crate::source::ArrivalRouteType,
    time_left: &str,
) -> FeedArrivalRecord {
    FeedArrivalRecord {
        route_name: route_name.into(),
        route_type,
        time_left: time_left.into(),
    }
}

#[test]
fn bus_label_matches_bus_route_test() {
    use crate::{repository::RouteKind, source::ArrivalRouteType};
    let routes = [test_route(12, "12", RouteKind::Bus)];
    let arrivals = match_arrivals(&routes, &[test_record("a12", ArrivalRouteType::Bus, "5 min")]);
    assert_eq!(arrivals, vec![Arrival::new(12, 5)]);
    assert_eq!(arrivals[0].transport_id, -1);
}

#[test]
fn kind_mismatch_is_skipped_test() {
    use crate::{repository::RouteKind, source::ArrivalRouteType};
    let routes = [test_route(12, "12", RouteKind::Tram)];
    let arrivals = match_arrivals(&routes, &[test_record("a12", ArrivalRouteType::Bus, "5 min")]);
    assert!(arrivals.is_empty());
}

#[test]
fn tram_uses_t_prefix_test() {
    use crate::{repository::RouteKind, source::ArrivalRouteType};
    let routes = [
        test_route(1, "6", RouteKind::Bus),
        test_route(2, "6", RouteKind::Tram),
    ];
    let arrivals = match_arrivals(&routes, &[test_record("Т6", ArrivalRouteType::Tram, "3")]);
    assert!(arrivals.is_empty());
    let arrivals = match_arrivals(&routes, &[test_record("T6", ArrivalRouteType::Tram, "3")]);
    assert_eq!(arrivals, vec![Arrival::new(2, 3)]);
}

#[test]
fn night_bus_uses_t_prefix_test() {
    use crate::{repository::RouteKind, source::ArrivalRouteType};
    let routes = [test_route(45, "Н5", RouteKind::NightRoute)];
    let arrivals = match_arrivals(&routes, &[test_record("TН5", ArrivalRouteType::NightBus, "5")]);
    assert_eq!(arrivals, vec![Arrival::new(45, 5)]);
    let arrivals = match_arrivals(&routes, &[test_record("AН5", ArrivalRouteType::NightBus, "5")]);
    assert!(arrivals.is_empty());
}

#[test]
fn unreadable_time_is_skipped_test() {
    use crate::{repository::RouteKind, source::ArrivalRouteType};
    let routes = [test_route(12, "12", RouteKind::Bus)];
    let arrivals = match_arrivals(&routes, &[test_record("A12", ArrivalRouteType::Bus, "soon")]);
    assert!(arrivals.is_empty());
}

#[test]
fn suburban_bus_matches_bus_route_test() {
    use crate::{repository::RouteKind, source::ArrivalRouteType};
    let routes = [test_route(156, "156", RouteKind::Bus)];
    let arrivals = match_arrivals(
        &routes,
        &[test_record("A156", ArrivalRouteType::SuburbanBus, "12 хв")],
    );
    assert_eq!(arrivals, vec![Arrival::new(156, 12)]);
}
