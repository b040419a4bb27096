use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{
        Arc, PoisonError, RwLock, RwLockReadGuard, Weak,
        atomic::{AtomicBool, Ordering},
    },
    time::Instant,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

mod arrivals;
mod observer;
mod realtime;
mod settings;
pub use arrivals::match_arrivals;
pub use observer::*;
pub use settings::*;

use crate::{
    gtfs::{self, Feed},
    oblast::OblastMerger,
    repository::{
        Arrival, City, Normalized, RawStop, Repository, Route, RouteKind, Stop, Transport,
        filter_routes, group_by_kind, normalize, sort_routes,
    },
    source::{self, FeedDownloader, RouteStore, TransitService},
};

#[derive(Error, Debug)]
pub enum Error {
    #[error("Could not download the feed: {0}")]
    FeedDownload(#[source] source::Error),
    #[error("Could not parse the feed: {0}")]
    FeedParse(#[from] gtfs::Error),
    #[error("Stop {0} not found")]
    StopNotFound(i64),
    #[error("Stop {0} has no code")]
    StopWithoutCode(i64),
    #[error("Network error: {0}")]
    Network(#[source] source::Error),
    #[error("Real-time feed unavailable: {0}")]
    GeneralFeed(#[source] source::Error),
    #[error("Persistence error: {0}")]
    Persistence(#[source] source::Error),
    #[error("Route {0} not found")]
    RouteNotFound(i64),
    #[error("Worker failed: {0}")]
    Worker(String),
    #[error("Provider was dropped before the refresh finished")]
    Cancelled,
}

/// Freshness of the in-memory tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum State {
    #[default]
    Unloaded,
    LoadingFromCache,
    LoadingFromNetwork,
    Ready,
    Failed(String),
}

/// Result of an explicit refresh, reduced to what a user needs to see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateOutcome {
    pub success: bool,
    pub message: Option<String>,
}

/// Operations every transit provider offers.
#[async_trait]
pub trait TransitProvider: Send + Sync {
    fn city(&self) -> &City;

    /// Refreshes from the network regardless of the persisted mirror.
    async fn update_database(&self) -> UpdateOutcome;

    /// All routes of the city; the flag tells whether the network was used.
    async fn provide_routes(&self) -> Result<(Vec<Route>, bool), self::Error>;

    /// May block on persistence when nothing is loaded yet.
    fn provide_route_sync(&self, route_id: i64) -> Option<Route>;

    async fn provide_routes_with_ids(&self, ids: &[i64]) -> Result<Vec<Route>, self::Error>;

    async fn provide_stops(&self) -> Result<HashSet<Stop>, self::Error>;

    async fn provide_real_time_positions(
        &self,
        route_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<Transport>>, self::Error>;

    async fn provide_arrivals(&self, stop: &Stop) -> Result<Vec<Arrival>, self::Error>;
}

struct Inner {
    settings: Settings,
    must_refresh: AtomicBool,
    force_network: AtomicBool,
    repository: RwLock<Repository>,
    state: RwLock<State>,

    downloader: Arc<dyn FeedDownloader>,
    store: Arc<dyn RouteStore>,
    service: Arc<dyn TransitService>,
}

impl Inner {
    fn repository(&self) -> RwLockReadGuard<'_, Repository> {
        self.repository
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn update_repository<F>(&self, f: F)
    where
        F: FnOnce(Repository) -> Repository,
    {
        let mut repository = self
            .repository
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let current = std::mem::take(&mut *repository);
        *repository = f(current);
    }

    fn set_state(&self, state: State) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn state(&self) -> State {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn fail(&self, err: &Error) {
        if self.repository().has_routes() {
            self.set_state(State::Ready);
        } else {
            self.set_state(State::Failed(err.to_string()));
        }
    }

    fn oblast_merger(&self) -> OblastMerger {
        OblastMerger::new(
            Arc::clone(&self.service),
            self.settings.oblast_route_names.clone(),
        )
        .request_interval(self.settings.oblast_request_interval)
    }

    /// Replaces the persisted mirror. When a write fails the previous rows are
    /// written back, so the mirror never stays half replaced.
    async fn persist(&self, routes: &[Route], raw_stops: &[RawStop]) -> Result<(), Error> {
        let city = &self.settings.city;
        let previous_routes = self.store.routes(city).await.map_err(Error::Persistence)?;
        let previous_stops = self.store.stops(city).await.map_err(Error::Persistence)?;

        let result = self.replace_mirror(routes, raw_stops).await;
        if let Err(err) = &result {
            warn!("Persisting {} failed, restoring previous rows: {err}", city.name);
            if let Err(err) = self.replace_mirror(&previous_routes, &previous_stops).await {
                warn!("Restoring previous rows failed: {err}");
            }
        }
        result
    }

    /// Old rows go first, then the new ones.
    async fn replace_mirror(&self, routes: &[Route], raw_stops: &[RawStop]) -> Result<(), Error> {
        let city = &self.settings.city;
        self.store
            .remove_stops(city)
            .await
            .map_err(Error::Persistence)?;
        self.store
            .remove_routes(city)
            .await
            .map_err(Error::Persistence)?;
        self.store
            .save_routes(routes, city)
            .await
            .map_err(Error::Persistence)?;
        self.store
            .save_stops(raw_stops, city)
            .await
            .map_err(Error::Persistence)?;
        Ok(())
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        info!("Provider for {} dropped", self.settings.city.name);
    }
}

/// Route and stop provider for one city.
///
/// Cloning is cheap and yields a handle to the same tables.
#[derive(Clone)]
pub struct TransitDataProvider {
    inner: Arc<Inner>,
}

/// Non-owning handle used by background work.
#[derive(Clone)]
pub struct WeakProvider {
    inner: Weak<Inner>,
}

impl WeakProvider {
    pub fn upgrade(&self) -> Option<TransitDataProvider> {
        self.inner
            .upgrade()
            .map(|inner| TransitDataProvider { inner })
    }
}

impl TransitDataProvider {
    pub fn new(
        settings: Settings,
        downloader: Arc<dyn FeedDownloader>,
        store: Arc<dyn RouteStore>,
        service: Arc<dyn TransitService>,
    ) -> Self {
        let must_refresh = AtomicBool::new(settings.must_refresh);
        Self {
            inner: Arc::new(Inner {
                settings,
                must_refresh,
                force_network: AtomicBool::new(false),
                repository: RwLock::new(Repository::new()),
                state: RwLock::new(State::Unloaded),
                downloader,
                store,
                service,
            }),
        }
    }

    pub fn downgrade(&self) -> WeakProvider {
        WeakProvider {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn city(&self) -> &City {
        &self.inner.settings.city
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub fn state(&self) -> State {
        self.inner.state()
    }

    pub fn force_network(&self) -> bool {
        self.inner.force_network.load(Ordering::SeqCst)
    }

    pub fn set_force_network(&self, force: bool) {
        self.inner.force_network.store(force, Ordering::SeqCst);
    }

    /// Routes currently loaded in memory, without triggering any loading.
    pub fn routes(&self) -> Vec<Route> {
        self.inner.repository().routes().to_vec()
    }

    pub async fn update_database(&self) -> UpdateOutcome {
        self.set_force_network(true);
        let result = self.provide_routes().await;
        self.set_force_network(false);
        match result {
            Ok(_) => UpdateOutcome {
                success: true,
                message: None,
            },
            Err(err) => UpdateOutcome {
                success: false,
                message: Some(err.to_string()),
            },
        }
    }

    pub async fn provide_routes(&self) -> Result<(Vec<Route>, bool), self::Error> {
        let inner = &self.inner;
        if inner.must_refresh.load(Ordering::SeqCst) || self.force_network() {
            return self.refresh_from_network().await.map(|routes| (routes, true));
        }

        inner.set_state(State::LoadingFromCache);
        let cached = match inner.store.routes(&inner.settings.city).await {
            Ok(routes) => routes,
            Err(err) => {
                warn!("Reading persisted routes failed: {err}");
                Vec::new()
            }
        };
        if !cached.is_empty() && !self.force_network() {
            debug!("Using {} persisted routes", cached.len());
            let routes = cached.clone();
            inner.update_repository(|repository| repository.with_routes(routes));
            inner.set_state(State::Ready);
            return Ok((cached, false));
        }
        self.refresh_from_network().await.map(|routes| (routes, true))
    }

    async fn refresh_from_network(&self) -> Result<Vec<Route>, self::Error> {
        self.inner.set_state(State::LoadingFromNetwork);
        let pipeline = tokio::spawn(refresh_pipeline(Arc::downgrade(&self.inner)));
        let result = match pipeline.await {
            Ok(result) => result,
            Err(err) => Err(Error::Worker(err.to_string())),
        };
        if let Err(err) = &result {
            warn!("Refreshing {} failed: {err}", self.city().name);
            self.inner.fail(err);
        }
        result
    }

    pub fn provide_route_sync(&self, route_id: i64) -> Option<Route> {
        {
            let repository = self.inner.repository();
            if repository.has_routes() {
                return repository.route(route_id).cloned();
            }
        }
        self.inner.store.route_sync(route_id, self.city())
    }

    /// Never loads just the requested ids: an empty table triggers the full
    /// route flow first.
    pub async fn provide_routes_with_ids(&self, ids: &[i64]) -> Result<Vec<Route>, self::Error> {
        {
            let repository = self.inner.repository();
            if repository.has_routes() {
                return Ok(repository.routes_with_ids(ids));
            }
        }
        let (routes, _) = self.provide_routes().await?;
        Ok(filter_routes(&routes, ids))
    }

    pub async fn provide_stops(&self) -> Result<HashSet<Stop>, self::Error> {
        if !self.load_persisted_stops().await {
            self.provide_routes().await?;
        }
        Ok(self.inner.repository().stops().clone())
    }

    /// Makes sure raw stops are in memory, reading the mirror when needed.
    /// Returns whether any stops are loaded.
    async fn load_persisted_stops(&self) -> bool {
        let loaded = self.inner.repository().has_stops();
        if loaded {
            return true;
        }
        match self.inner.store.stops(self.city()).await {
            Ok(raw_stops) if !raw_stops.is_empty() => {
                debug!("Using {} persisted stops", raw_stops.len());
                self.inner
                    .update_repository(|repository| repository.with_raw_stops(raw_stops));
                true
            }
            Ok(_) => false,
            Err(err) => {
                warn!("Reading persisted stops failed: {err}");
                false
            }
        }
    }

    /// Previously selected routes, when the session keeps them.
    pub async fn provide_selected_routes(&self) -> Result<Vec<Route>, self::Error> {
        let settings = &self.inner.settings;
        if !settings.persist_selected_routes || settings.selected_routes.is_empty() {
            return Ok(Vec::new());
        }
        self.inner
            .store
            .routes_with_ids(&settings.selected_routes, &settings.city)
            .await
            .map_err(Error::Persistence)
    }

    pub fn routes_by_kind(&self) -> BTreeMap<RouteKind, Vec<Route>> {
        group_by_kind(self.inner.repository().routes())
    }

    /// When the persisted mirror was last replaced.
    pub async fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.inner.store.refreshed_at(self.city()).await
    }
}

fn upgrade(inner: &Weak<Inner>) -> Result<Arc<Inner>, self::Error> {
    inner.upgrade().ok_or(Error::Cancelled)
}

/// Download, parse, merge, persist, commit. Each stage re-checks that the
/// provider still exists; nothing is written once it is gone.
async fn refresh_pipeline(inner: Weak<Inner>) -> Result<Vec<Route>, self::Error> {
    let now = Instant::now();
    let (downloader, merger) = {
        let inner = upgrade(&inner)?;
        (Arc::clone(&inner.downloader), inner.oblast_merger())
    };

    let bytes = downloader.download().await.map_err(Error::FeedDownload)?;
    debug!("Downloaded feed ({} bytes)", bytes.len());

    let Normalized { routes, raw_stops } = tokio::task::spawn_blocking(move || {
        Feed::new(gtfs::Config::default())
            .from_bytes(bytes)
            .read()
            .map(normalize)
    })
    .await
    .map_err(|err| Error::Worker(err.to_string()))??;

    upgrade(&inner)?;
    let oblast = merger.merge().await;

    let mut routes = routes;
    routes.extend(oblast);
    sort_routes(&mut routes);

    let inner = upgrade(&inner)?;
    inner.persist(&routes, &raw_stops).await?;
    let committed = routes.clone();
    inner.update_repository(|_| {
        Repository::new()
            .with_routes(committed)
            .with_raw_stops(raw_stops)
    });
    inner.must_refresh.store(false, Ordering::SeqCst);
    inner.set_state(State::Ready);
    info!(
        "Refreshed {} from the network in {:?} ({} routes)",
        inner.settings.city.name,
        now.elapsed(),
        routes.len()
    );
    Ok(routes)
}

#[async_trait]
impl TransitProvider for TransitDataProvider {
    fn city(&self) -> &City {
        TransitDataProvider::city(self)
    }

    async fn update_database(&self) -> UpdateOutcome {
        TransitDataProvider::update_database(self).await
    }

    async fn provide_routes(&self) -> Result<(Vec<Route>, bool), self::Error> {
        TransitDataProvider::provide_routes(self).await
    }

    fn provide_route_sync(&self, route_id: i64) -> Option<Route> {
        TransitDataProvider::provide_route_sync(self, route_id)
    }

    async fn provide_routes_with_ids(&self, ids: &[i64]) -> Result<Vec<Route>, self::Error> {
        TransitDataProvider::provide_routes_with_ids(self, ids).await
    }

    async fn provide_stops(&self) -> Result<HashSet<Stop>, self::Error> {
        TransitDataProvider::provide_stops(self).await
    }

    async fn provide_real_time_positions(
        &self,
        route_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<Transport>>, self::Error> {
        TransitDataProvider::provide_real_time_positions(self, route_ids).await
    }

    async fn provide_arrivals(&self, stop: &Stop) -> Result<Vec<Arrival>, self::Error> {
        TransitDataProvider::provide_arrivals(self, stop).await
    }
}
