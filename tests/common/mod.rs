#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    io::{Cursor, Write},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use citytransit::{
    provider::{Settings, TransitDataProvider},
    repository::{City, Polyline, RawStop, Route, Transport},
    shared::Coordinate,
    source::{
        self, FeedArrivalRecord, FeedDownloader, FeedTransportRecord, MemoryStore, RouteStore,
        TransitService,
    },
};
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

pub const ROUTES: &str = "route_id,agency_id,route_short_name,route_long_name,route_type
1,1,А12,Стрийська - Рясне,3
2,1,Тр07,Площа Ринок - Сихів,800
3,1,Т6,Миколайчука - Торфяна,0
4,1,Н-А5,Вокзал - Сихів,3
5,1,Нічний,Службовий,3
";

pub const STOPS: &str = "stop_id,stop_code,stop_name,stop_lat,stop_lon
100,0100,Площа Ринок,49.8418,24.0315
101,,Оперний театр,49.8440,24.0262
";

pub const TRIPS: &str = "route_id,service_id,trip_id,shape_id
1,1,t1,s1
1,1,t2,s1
1,1,t3,s2
3,1,t4,s3
4,1,t5,missing
";

pub const SHAPES: &str = "shape_id,shape_pt_lat,shape_pt_lon,shape_pt_sequence
s1,49.80,24.00,2
s1,49.81,24.01,1
s2,49.90,24.10,1
s3,49.70,23.90,1
s3,49.71,23.91,2
";

/// Zip archive holding the given `(name, contents)` members.
pub fn archive(files: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, contents) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

pub fn feed() -> Vec<u8> {
    archive(&[
        ("agency.txt", "agency_id,agency_name\n1,ЛКП\n"),
        ("routes.txt", ROUTES),
        ("stops.txt", STOPS),
        ("trips.txt", TRIPS),
        ("shapes.txt", SHAPES),
    ])
}

pub fn route(id: i64, name: &str) -> Route {
    Route {
        id,
        name: name.into(),
        ..Default::default()
    }
}

pub fn ids(routes: &[Route]) -> Vec<i64> {
    routes.iter().map(|route| route.id).collect()
}

pub fn settings() -> Settings {
    Settings {
        oblast_request_interval: Duration::ZERO,
        ..Default::default()
    }
}

#[derive(Default)]
pub struct FakeDownloader {
    pub bytes: Vec<u8>,
    pub fail: AtomicBool,
    pub delay: Duration,
    pub calls: AtomicUsize,
}

impl FakeDownloader {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedDownloader for FakeDownloader {
    async fn download(&self) -> Result<Vec<u8>, source::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(source::Error::Unavailable("feed".into()));
        }
        Ok(self.bytes.clone())
    }
}

/// Memory store whose next `failing_route_saves` route writes fail.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub failing_route_saves: AtomicUsize,
}

#[async_trait]
impl RouteStore for FlakyStore {
    async fn routes(&self, city: &City) -> Result<Vec<Route>, source::Error> {
        self.inner.routes(city).await
    }

    async fn stops(&self, city: &City) -> Result<Vec<RawStop>, source::Error> {
        self.inner.stops(city).await
    }

    async fn remove_routes(&self, city: &City) -> Result<(), source::Error> {
        self.inner.remove_routes(city).await
    }

    async fn remove_stops(&self, city: &City) -> Result<(), source::Error> {
        self.inner.remove_stops(city).await
    }

    async fn save_routes(&self, routes: &[Route], city: &City) -> Result<(), source::Error> {
        let fail = self
            .failing_route_saves
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if fail {
            return Err(source::Error::Unavailable("disk full".into()));
        }
        self.inner.save_routes(routes, city).await
    }

    async fn save_stops(&self, stops: &[RawStop], city: &City) -> Result<(), source::Error> {
        self.inner.save_stops(stops, city).await
    }

    async fn routes_with_ids(&self, ids: &[i64], city: &City) -> Result<Vec<Route>, source::Error> {
        self.inner.routes_with_ids(ids, city).await
    }

    async fn refreshed_at(&self, city: &City) -> Option<DateTime<Utc>> {
        self.inner.refreshed_at(city).await
    }

    fn route_sync(&self, id: i64, city: &City) -> Option<Route> {
        self.inner.route_sync(id, city)
    }
}

/// Scripted secondary service. `None` fields answer with an error.
#[derive(Default)]
pub struct FakeService {
    pub oblast_routes: Option<Vec<Route>>,
    pub failing_paths: HashSet<i64>,
    pub transports: HashMap<i64, Vec<Transport>>,
    pub general_feed: Option<Vec<FeedTransportRecord>>,
    pub arrivals: Vec<FeedArrivalRecord>,
    pub arrival_codes: Mutex<Vec<String>>,
    pub path_calls: AtomicUsize,
}

impl FakeService {
    pub fn arrival_calls(&self) -> usize {
        self.arrival_codes.lock().unwrap().len()
    }
}

#[async_trait]
impl TransitService for FakeService {
    async fn oblast_routes(&self) -> Result<Vec<Route>, source::Error> {
        self.oblast_routes
            .clone()
            .ok_or_else(|| source::Error::Unavailable("oblast routes".into()))
    }

    async fn oblast_route_path(&self, route_id: i64) -> Result<Polyline, source::Error> {
        self.path_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_paths.contains(&route_id) {
            return Err(source::Error::Status(500));
        }
        Ok(Polyline::from(vec![
            Coordinate::new(49.0, 24.0),
            Coordinate::new(49.5, route_id as f64),
        ]))
    }

    async fn oblast_transport(&self, route_id: i64) -> Result<Vec<Transport>, source::Error> {
        self.transports
            .get(&route_id)
            .cloned()
            .ok_or(source::Error::Status(404))
    }

    async fn general_feed(&self) -> Result<Vec<FeedTransportRecord>, source::Error> {
        self.general_feed
            .clone()
            .ok_or_else(|| source::Error::Unavailable("general feed".into()))
    }

    async fn arrivals(&self, stop_code: &str) -> Result<Vec<FeedArrivalRecord>, source::Error> {
        self.arrival_codes.lock().unwrap().push(stop_code.to_owned());
        Ok(self.arrivals.clone())
    }
}

pub struct Harness {
    pub provider: TransitDataProvider,
    pub downloader: Arc<FakeDownloader>,
    pub store: Arc<MemoryStore>,
    pub service: Arc<FakeService>,
}

impl Harness {
    pub fn new(settings: Settings, service: FakeService) -> Self {
        Self::with_parts(
            settings,
            Arc::new(FakeDownloader::new(feed())),
            Arc::new(MemoryStore::new()),
            Arc::new(service),
        )
    }

    pub fn with_parts(
        settings: Settings,
        downloader: Arc<FakeDownloader>,
        store: Arc<MemoryStore>,
        service: Arc<FakeService>,
    ) -> Self {
        let provider = TransitDataProvider::new(
            settings,
            downloader.clone(),
            store.clone(),
            service.clone(),
        );
        Self {
            provider,
            downloader,
            store,
            service,
        }
    }
}
