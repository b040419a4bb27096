use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    repository::{City, RawStop, Route, filter_routes},
    source::{self, RouteStore},
};

#[derive(Debug, Default, Clone)]
struct Partition {
    routes: Vec<Route>,
    stops: Vec<RawStop>,
    refreshed_at: Option<DateTime<Utc>>,
}

/// Process-local store partitioned by city id.
#[derive(Debug, Default)]
pub struct MemoryStore {
    partitions: RwLock<HashMap<u32, Partition>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Default::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<u32, Partition>> {
        self.partitions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<u32, Partition>> {
        self.partitions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl RouteStore for MemoryStore {
    async fn routes(&self, city: &City) -> Result<Vec<Route>, source::Error> {
        Ok(self
            .read()
            .get(&city.id)
            .map(|partition| partition.routes.clone())
            .unwrap_or_default())
    }

    async fn stops(&self, city: &City) -> Result<Vec<RawStop>, source::Error> {
        Ok(self
            .read()
            .get(&city.id)
            .map(|partition| partition.stops.clone())
            .unwrap_or_default())
    }

    async fn remove_routes(&self, city: &City) -> Result<(), source::Error> {
        if let Some(partition) = self.write().get_mut(&city.id) {
            partition.routes.clear();
        }
        Ok(())
    }

    async fn remove_stops(&self, city: &City) -> Result<(), source::Error> {
        if let Some(partition) = self.write().get_mut(&city.id) {
            partition.stops.clear();
        }
        Ok(())
    }

    async fn save_routes(&self, routes: &[Route], city: &City) -> Result<(), source::Error> {
        let mut partitions = self.write();
        let partition = partitions.entry(city.id).or_default();
        partition.routes.extend_from_slice(routes);
        partition.refreshed_at = Some(Utc::now());
        Ok(())
    }

    async fn save_stops(&self, stops: &[RawStop], city: &City) -> Result<(), source::Error> {
        self.write()
            .entry(city.id)
            .or_default()
            .stops
            .extend_from_slice(stops);
        Ok(())
    }

    async fn routes_with_ids(&self, ids: &[i64], city: &City) -> Result<Vec<Route>, source::Error> {
        Ok(self
            .read()
            .get(&city.id)
            .map(|partition| filter_routes(&partition.routes, ids))
            .unwrap_or_default())
    }

    async fn refreshed_at(&self, city: &City) -> Option<DateTime<Utc>> {
        self.read()
            .get(&city.id)
            .and_then(|partition| partition.refreshed_at)
    }

    fn route_sync(&self, id: i64, city: &City) -> Option<Route> {
        self.read()
            .get(&city.id)
            .and_then(|partition| partition.routes.iter().find(|route| route.id == id))
            .cloned()
    }
}

#[cfg(test)]
fn test_route(id: i64, name: &str) -> Route {
    Route {
        id,
        name: name.into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn partitions_are_isolated_by_city_test() {
    let store = MemoryStore::new();
    let lviv = City::new(1, "Lviv");
    let kyiv = City::new(2, "Kyiv");
    store.save_routes(&[test_route(1, "1")], &lviv).await.unwrap();
    assert_eq!(store.routes(&lviv).await.unwrap().len(), 1);
    assert!(store.routes(&kyiv).await.unwrap().is_empty());
    assert!(store.refreshed_at(&lviv).await.is_some());
    assert!(store.refreshed_at(&kyiv).await.is_none());
}

#[tokio::test]
async fn remove_then_save_replaces_rows_test() {
    let store = MemoryStore::new();
    let city = City::default();
    store
        .save_routes(&[test_route(1, "1"), test_route(2, "2")], &city)
        .await
        .unwrap();
    store.remove_routes(&city).await.unwrap();
    store.save_routes(&[test_route(3, "3")], &city).await.unwrap();
    let ids: std::collections::HashSet<i64> = store
        .routes(&city)
        .await
        .unwrap()
        .iter()
        .map(|route| route.id)
        .collect();
    assert_eq!(ids, std::collections::HashSet::from([3]));
    assert_eq!(store.route_sync(3, &city).map(|r| r.id), Some(3));
    assert!(store.route_sync(1, &city).is_none());
}
