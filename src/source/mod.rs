//! Contracts for the collaborators the provider depends on, with the
//! implementations this crate ships.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

mod http;
mod memory;
mod records;
pub use http::*;
pub use memory::*;
pub use records::*;

use crate::repository::{City, Polyline, RawStop, Route, Transport};

#[derive(Error, Debug)]
pub enum Error {
    #[error("Http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Request failed with status {0}")]
    Status(u16),
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Unavailable: {0}")]
    Unavailable(String),
}

/// Fetches the static feed archive.
#[async_trait]
pub trait FeedDownloader: Send + Sync {
    async fn download(&self) -> Result<Vec<u8>, self::Error>;
}

/// Durable mirror of a city's routes and raw stops.
#[async_trait]
pub trait RouteStore: Send + Sync {
    async fn routes(&self, city: &City) -> Result<Vec<Route>, self::Error>;
    async fn stops(&self, city: &City) -> Result<Vec<RawStop>, self::Error>;
    async fn remove_routes(&self, city: &City) -> Result<(), self::Error>;
    async fn remove_stops(&self, city: &City) -> Result<(), self::Error>;
    async fn save_routes(&self, routes: &[Route], city: &City) -> Result<(), self::Error>;
    async fn save_stops(&self, stops: &[RawStop], city: &City) -> Result<(), self::Error>;
    async fn routes_with_ids(&self, ids: &[i64], city: &City) -> Result<Vec<Route>, self::Error>;
    async fn refreshed_at(&self, city: &City) -> Option<DateTime<Utc>>;

    /// Blocks the calling thread until the lookup completes.
    fn route_sync(&self, id: i64, city: &City) -> Option<Route>;
}

/// Secondary network service: regional routes, live positions and arrivals.
#[async_trait]
pub trait TransitService: Send + Sync {
    async fn oblast_routes(&self) -> Result<Vec<Route>, self::Error>;
    async fn oblast_route_path(&self, route_id: i64) -> Result<Polyline, self::Error>;
    async fn oblast_transport(&self, route_id: i64) -> Result<Vec<Transport>, self::Error>;
    async fn general_feed(&self) -> Result<Vec<FeedTransportRecord>, self::Error>;
    async fn arrivals(&self, stop_code: &str) -> Result<Vec<FeedArrivalRecord>, self::Error>;
}
