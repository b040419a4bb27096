use crate::{
    gtfs::{FeedData, GtfsRoute, GtfsShape},
    repository::{Polyline, RawStop, Route, RouteKind},
    shared::{Coordinate, digit_run},
};
use rayon::prelude::*;
use std::{collections::HashMap, time::Instant};
use tracing::debug;

const BUS_PREFIX: &str = "А";
const TROLLEYBUS_PREFIX: &str = "Тр";
const TRAM_PREFIX: &str = "Т";
const NIGHT_ROUTE_PREFIX: &str = "Н-А";
const NIGHT_ROUTE_MARK: &str = "Н";

/// Output of one feed ingest.
#[derive(Debug, Default)]
pub struct Normalized {
    pub routes: Vec<Route>,
    pub raw_stops: Vec<RawStop>,
}

/// Turns raw feed tables into canonical routes. Routes whose name carries no
/// usable number are dropped. Route order follows the feed.
pub fn normalize(data: FeedData) -> Normalized {
    debug!("Normalizing feed...");
    let now = Instant::now();
    let FeedData {
        routes,
        stops,
        trips,
        shapes,
    } = data;

    let lines_by_shape = build_lines(&shapes);

    let mut shapes_by_route: HashMap<i64, Vec<&str>> = HashMap::new();
    trips
        .iter()
        .filter_map(|trip| trip.shape_id.as_deref().map(|id| (trip.route_id, id)))
        .for_each(|(route_id, shape_id)| {
            let shape_ids = shapes_by_route.entry(route_id).or_default();
            if !shape_ids.contains(&shape_id) {
                shape_ids.push(shape_id);
            }
        });

    let normalized: Vec<Route> = routes
        .par_iter()
        .filter_map(|raw| {
            let lines = shapes_by_route
                .get(&raw.route_id)
                .map(|shape_ids| {
                    shape_ids
                        .iter()
                        .filter_map(|id| lines_by_shape.get(id).cloned())
                        .collect()
                })
                .unwrap_or_default();
            normalize_route(raw, lines)
        })
        .collect();

    debug!(
        "Normalizing feed took {:?} ({} routes kept, {} dropped)",
        now.elapsed(),
        normalized.len(),
        routes.len() - normalized.len()
    );
    Normalized {
        routes: normalized,
        raw_stops: stops.into_iter().map(RawStop::from).collect(),
    }
}

fn build_lines(shapes: &[GtfsShape]) -> HashMap<&str, Polyline> {
    let mut points_by_shape: HashMap<&str, Vec<&GtfsShape>> = HashMap::new();
    shapes.iter().for_each(|point| {
        points_by_shape
            .entry(point.shape_id.as_str())
            .or_default()
            .push(point)
    });
    points_by_shape
        .into_par_iter()
        .map(|(id, mut points)| {
            points.sort_by_key(|point| point.shape_pt_sequence);
            let points: Vec<Coordinate> = points
                .iter()
                .map(|point| Coordinate::new(point.shape_pt_lat, point.shape_pt_lon))
                .collect();
            (id, Polyline::from(points))
        })
        .collect()
}

pub fn normalize_route(raw: &GtfsRoute, lines: Vec<Polyline>) -> Option<Route> {
    let raw_name = raw.route_short_name.as_deref().unwrap_or_default();
    let (name, kind) = parse_route_name(raw_name)?;
    Some(Route {
        id: raw.route_id,
        name,
        full_name: raw.route_long_name.clone().unwrap_or_default(),
        kind,
        lines,
    })
}

/// Splits a raw feed name such as `"Тр07"` into its display label and kind.
///
/// The digits of the name must form one contiguous run; the text before the
/// run decides the kind. Returns `None` when there is no such run.
pub fn parse_route_name(raw: &str) -> Option<(String, RouteKind)> {
    let digits = digit_run(raw);
    if digits.is_empty() {
        return None;
    }
    let start = raw.find(digits.as_str())?;
    let number = digits
        .parse::<i64>()
        .map(|number| number.to_string())
        .unwrap_or(digits);

    let parsed = match &raw[..start] {
        BUS_PREFIX => (number, RouteKind::Bus),
        TROLLEYBUS_PREFIX => (number, RouteKind::Trolleybus),
        TRAM_PREFIX => (number, RouteKind::Tram),
        NIGHT_ROUTE_PREFIX => (format!("{NIGHT_ROUTE_MARK}{number}"), RouteKind::NightRoute),
        _ => (number, RouteKind::Bus),
    };
    Some(parsed)
}

#[test]
fn prefixes_select_kind_test() {
    assert_eq!(parse_route_name("А12"), Some(("12".into(), RouteKind::Bus)));
    assert_eq!(
        parse_route_name("Тр07"),
        Some(("7".into(), RouteKind::Trolleybus))
    );
    assert_eq!(parse_route_name("Т6"), Some(("6".into(), RouteKind::Tram)));
    assert_eq!(
        parse_route_name("Н-А5"),
        Some(("Н5".into(), RouteKind::NightRoute))
    );
}

#[test]
fn unknown_prefix_defaults_to_bus_test() {
    assert_eq!(parse_route_name("Х3"), Some(("3".into(), RouteKind::Bus)));
    assert_eq!(parse_route_name("42"), Some(("42".into(), RouteKind::Bus)));
}

#[test]
fn names_without_contiguous_digits_are_rejected_test() {
    assert_eq!(parse_route_name("Нічний"), None);
    assert_eq!(parse_route_name(""), None);
    assert_eq!(parse_route_name("1А2"), None);
}

#[test]
fn leading_zeros_are_stripped_test() {
    assert_eq!(parse_route_name("А007"), Some(("7".into(), RouteKind::Bus)));
}

#[test]
fn oversized_numbers_keep_their_digits_test() {
    let raw = "А99999999999999999999";
    assert_eq!(
        parse_route_name(raw),
        Some(("99999999999999999999".into(), RouteKind::Bus))
    );
}
