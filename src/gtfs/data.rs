use crate::gtfs::{GtfsRoute, GtfsShape, GtfsStop, GtfsTrip};

/// The four tables the normalizer consumes.
#[derive(Default, Debug)]
pub struct FeedData {
    pub routes: Vec<GtfsRoute>,
    pub stops: Vec<GtfsStop>,
    pub trips: Vec<GtfsTrip>,
    pub shapes: Vec<GtfsShape>,
}

impl From<Vec<FeedTable>> for FeedData {
    fn from(value: Vec<FeedTable>) -> Self {
        let mut data = Self::default();
        value.into_iter().for_each(|table| match table {
            FeedTable::Routes(routes) => data.routes = routes,
            FeedTable::Stops(stops) => data.stops = stops,
            FeedTable::Trips(trips) => data.trips = trips,
            FeedTable::Shapes(shapes) => data.shapes = shapes,
            FeedTable::Unknown => (),
        });
        data
    }
}

#[derive(Debug)]
pub enum FeedTable {
    Routes(Vec<GtfsRoute>),
    Stops(Vec<GtfsStop>),
    Trips(Vec<GtfsTrip>),
    Shapes(Vec<GtfsShape>),
    Unknown,
}
