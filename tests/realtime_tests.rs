mod common;

use std::collections::HashMap;

use citytransit::{
    provider::Error,
    repository::Transport,
    shared::Coordinate,
    source::FeedTransportRecord,
};
use common::*;

fn record(id: &str, route_id: Option<&str>) -> FeedTransportRecord {
    FeedTransportRecord {
        id: id.into(),
        route_id: route_id.map(Into::into),
        coordinate: Coordinate::new(49.84, 24.03),
        bearing: 90.7,
        vehicle_number: format!("BC{id}"),
    }
}

fn oblast_transport(id: i64, route_id: i64) -> Transport {
    Transport {
        id,
        coordinate: Coordinate::new(49.9, 24.2),
        bearing: 0,
        vehicle_number: "oblast".into(),
        route_id: Some(route_id),
        route_name: None,
    }
}

fn service() -> FakeService {
    FakeService {
        oblast_routes: Some(vec![route(9001, "156"), route(9002, "184")]),
        transports: HashMap::from([(9001, vec![oblast_transport(501, 9001)])]),
        general_feed: Some(vec![
            record("10", Some("1")),
            record("x", Some("1")),
            record("12", Some("3")),
            record("11", Some(" 1 ")),
            record("13", Some("99")),
            record("14", None),
            record("15", Some("tram")),
        ]),
        ..Default::default()
    }
}

#[tokio::test]
async fn buckets_general_feed_by_route_test() {
    let harness = Harness::new(settings(), service());
    harness.provider.provide_routes().await.unwrap();

    let positions = harness
        .provider
        .provide_real_time_positions(&[1, 3])
        .await
        .unwrap();
    assert_eq!(positions.len(), 2);

    let bus: Vec<i64> = positions[&1].iter().map(|t| t.id).collect();
    assert_eq!(bus, vec![10, 11]);
    assert_eq!(positions[&1][0].route_name.as_deref(), Some("12"));
    assert_eq!(positions[&1][0].route_id, Some(1));
    assert_eq!(positions[&1][0].bearing, 90);
    assert_eq!(positions[&1][0].vehicle_number, "BC10");
    assert_eq!(positions[&3].len(), 1);
}

#[tokio::test]
async fn oblast_routes_are_fail_soft_test() {
    let harness = Harness::new(settings(), service());
    harness.provider.provide_routes().await.unwrap();

    let positions = harness
        .provider
        .provide_real_time_positions(&[1, 9001, 9002])
        .await
        .unwrap();
    assert_eq!(positions[&9001], vec![oblast_transport(501, 9001)]);
    assert!(!positions.contains_key(&9002));
    assert_eq!(positions[&1].len(), 2);
}

#[tokio::test]
async fn general_feed_failure_fails_the_call_test() {
    let harness = Harness::new(
        settings(),
        FakeService {
            general_feed: None,
            ..service()
        },
    );
    harness.provider.provide_routes().await.unwrap();

    let result = harness.provider.provide_real_time_positions(&[1, 9001]).await;
    assert!(matches!(result, Err(Error::GeneralFeed(_))));
}

#[tokio::test]
async fn unknown_routes_keep_no_name_test() {
    let harness = Harness::new(settings(), service());
    let positions = harness
        .provider
        .provide_real_time_positions(&[99])
        .await
        .unwrap();
    assert_eq!(positions[&99].len(), 1);
    assert_eq!(positions[&99][0].route_name, None);
    assert_eq!(harness.downloader.calls(), 0);
}

#[tokio::test]
async fn oblast_vehicles_come_before_feed_vehicles_test() {
    let mut general_feed = service().general_feed.unwrap();
    general_feed.push(record("20", Some("9001")));
    let harness = Harness::new(
        settings(),
        FakeService {
            general_feed: Some(general_feed),
            ..service()
        },
    );
    harness.provider.provide_routes().await.unwrap();

    let positions = harness
        .provider
        .provide_real_time_positions(&[9001])
        .await
        .unwrap();
    let bucket: Vec<i64> = positions[&9001].iter().map(|t| t.id).collect();
    assert_eq!(bucket, vec![501, 20]);
    assert_eq!(positions[&9001][0], oblast_transport(501, 9001));
    assert_eq!(positions[&9001][1].route_name.as_deref(), Some("156"));
    assert_eq!(positions.len(), 1);
}
