use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::{
    provider::{Error, TransitDataProvider, TransitProvider, UpdateOutcome},
    repository::{Arrival, City, Route, Stop, Transport},
};

const MIN_OBSERVE_INTERVAL: Duration = Duration::from_millis(10);

/// Receives pushed vehicle positions from an [`ObservingProvider`].
pub trait PositionsDelegate: Send + Sync {
    fn update_transport_positions(&self, transports: HashMap<i64, Vec<Transport>>);
}

type DelegateSlot = Arc<Mutex<Option<Weak<dyn PositionsDelegate>>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Provider that keeps pushing live positions of its active routes to a
/// delegate instead of waiting to be asked.
pub struct ObservingProvider {
    provider: TransitDataProvider,
    active_routes: Arc<Mutex<Vec<i64>>>,
    delegate: DelegateSlot,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ObservingProvider {
    pub fn new(provider: TransitDataProvider) -> Self {
        Self {
            provider,
            active_routes: Default::default(),
            delegate: Default::default(),
            task: Mutex::new(None),
        }
    }

    pub fn provider(&self) -> &TransitDataProvider {
        &self.provider
    }

    pub fn active_routes(&self) -> Vec<i64> {
        lock(&self.active_routes).clone()
    }

    pub fn set_active_routes(&self, route_ids: Vec<i64>) {
        *lock(&self.active_routes) = route_ids;
    }

    /// The delegate is held weakly; observing stops once it is dropped.
    pub fn set_delegate(&self, delegate: Weak<dyn PositionsDelegate>) {
        *lock(&self.delegate) = Some(delegate);
    }

    pub fn is_observing(&self) -> bool {
        lock(&self.task)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Starts polling, replacing the active routes when `active_routes` is given.
    pub fn start_observing(&self, active_routes: Option<Vec<i64>>) {
        if let Some(route_ids) = active_routes {
            self.set_active_routes(route_ids);
        }
        let task = tokio::spawn(observe(
            self.provider.downgrade(),
            Arc::clone(&self.active_routes),
            Arc::clone(&self.delegate),
            self.provider
                .settings()
                .observe_interval
                .max(MIN_OBSERVE_INTERVAL),
        ));
        if let Some(previous) = lock(&self.task).replace(task) {
            previous.abort();
        }
    }

    pub fn stop_observing(&self, clear_active_routes: bool) {
        if let Some(task) = lock(&self.task).take() {
            task.abort();
        }
        if clear_active_routes {
            lock(&self.active_routes).clear();
        }
    }

    pub async fn provide_route_info(&self, route_id: i64) -> Result<Route, Error> {
        self.provider
            .provide_routes_with_ids(&[route_id])
            .await?
            .into_iter()
            .next()
            .ok_or(Error::RouteNotFound(route_id))
    }
}

impl Drop for ObservingProvider {
    fn drop(&mut self) {
        self.stop_observing(false);
    }
}

async fn observe(
    provider: crate::provider::WeakProvider,
    active_routes: Arc<Mutex<Vec<i64>>>,
    delegate: DelegateSlot,
    period: Duration,
) {
    let mut ticker = tokio::time::interval(period);
    loop {
        ticker.tick().await;
        let Some(provider) = provider.upgrade() else {
            debug!("Provider gone, observing stopped");
            return;
        };
        let route_ids = lock(&active_routes).clone();
        if route_ids.is_empty() {
            continue;
        }
        match provider.provide_real_time_positions(&route_ids).await {
            Ok(positions) => {
                let target = lock(&delegate).as_ref().and_then(Weak::upgrade);
                let Some(target) = target else {
                    debug!("Delegate gone, observing stopped");
                    return;
                };
                target.update_transport_positions(positions);
            }
            Err(err) => warn!("Observing positions failed: {err}"),
        }
    }
}

#[async_trait]
impl TransitProvider for ObservingProvider {
    fn city(&self) -> &City {
        self.provider.city()
    }

    async fn update_database(&self) -> UpdateOutcome {
        self.provider.update_database().await
    }

    async fn provide_routes(&self) -> Result<(Vec<Route>, bool), Error> {
        self.provider.provide_routes().await
    }

    fn provide_route_sync(&self, route_id: i64) -> Option<Route> {
        self.provider.provide_route_sync(route_id)
    }

    async fn provide_routes_with_ids(&self, ids: &[i64]) -> Result<Vec<Route>, Error> {
        self.provider.provide_routes_with_ids(ids).await
    }

    async fn provide_stops(&self) -> Result<HashSet<Stop>, Error> {
        self.provider.provide_stops().await
    }

    async fn provide_real_time_positions(
        &self,
        route_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<Transport>>, Error> {
        self.provider.provide_real_time_positions(route_ids).await
    }

    async fn provide_arrivals(&self, stop: &Stop) -> Result<Vec<Arrival>, Error> {
        self.provider.provide_arrivals(stop).await
    }
}
