mod common;

use citytransit::{
    provider::Error,
    repository::{Arrival, Stop},
    source::{ArrivalRouteType, FeedArrivalRecord},
};
use common::*;

fn record(route_name: &str, route_type: ArrivalRouteType, time_left: &str) -> FeedArrivalRecord {
    FeedArrivalRecord {
        route_name: route_name.into(),
        route_type,
        time_left: time_left.into(),
    }
}

fn stop(id: i64) -> Stop {
    Stop {
        id,
        ..Default::default()
    }
}

fn service() -> FakeService {
    FakeService {
        arrivals: vec![
            record("A12", ArrivalRouteType::Bus, "5 min"),
            record("T6", ArrivalRouteType::Tram, "2 хв"),
            record("T7", ArrivalRouteType::Trolleybus, "9 хв"),
            record("TН5", ArrivalRouteType::NightBus, "4 хв"),
            record("AН5", ArrivalRouteType::NightBus, "8 хв"),
            record("A99", ArrivalRouteType::Bus, "1 min"),
            record("A12", ArrivalRouteType::Bus, "за розкладом"),
        ],
        ..Default::default()
    }
}

#[tokio::test]
async fn arrivals_are_matched_to_routes_test() {
    let harness = Harness::new(settings(), service());
    harness.provider.provide_routes().await.unwrap();

    let arrivals = harness.provider.provide_arrivals(&stop(100)).await.unwrap();
    assert_eq!(
        arrivals,
        vec![
            Arrival::new(1, 5),
            Arrival::new(3, 2),
            Arrival::new(2, 9),
            Arrival::new(4, 4)
        ]
    );
    assert_eq!(*harness.service.arrival_codes.lock().unwrap(), vec!["0100"]);
}

#[tokio::test]
async fn stop_without_code_test() {
    let harness = Harness::new(settings(), service());
    harness.provider.provide_routes().await.unwrap();

    let result = harness.provider.provide_arrivals(&stop(101)).await;
    assert!(matches!(result, Err(Error::StopWithoutCode(101))));
    assert_eq!(harness.service.arrival_calls(), 0);
}

#[tokio::test]
async fn unknown_stop_test() {
    let harness = Harness::new(settings(), service());
    let result = harness.provider.provide_arrivals(&stop(555)).await;
    assert!(matches!(result, Err(Error::StopNotFound(555))));
    assert_eq!(harness.service.arrival_calls(), 0);
    assert_eq!(harness.downloader.calls(), 0);
}
