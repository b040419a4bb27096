pub mod gtfs;
pub mod oblast;
pub mod provider;
pub mod repository;
pub mod shared;
pub mod source;

pub mod prelude {
    pub use crate::gtfs::{Feed, FeedData};
    pub use crate::provider::{
        ObservingProvider, PositionsDelegate, Settings, State, TransitDataProvider,
        TransitProvider, UpdateOutcome,
    };
    pub use crate::repository::{
        Arrival, City, Polyline, RawStop, Route, RouteKind, Stop, Transport, group_by_kind,
    };
    pub use crate::shared::{Coordinate, compare_route_names};
    pub use crate::source::{
        FeedDownloader, HttpDownloader, HttpTransitService, MemoryStore, RouteStore,
        TransitService,
    };
}
