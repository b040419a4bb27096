use serde::{Deserialize, Serialize};

use crate::{repository::RouteKind, shared::Coordinate};

/// One vehicle from the general real-time feed. Identifiers arrive as text
/// and are only usable when they parse as integers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedTransportRecord {
    pub id: String,
    pub route_id: Option<String>,
    pub coordinate: Coordinate,
    pub bearing: f64,
    pub vehicle_number: String,
}

/// Vehicle category reported by the arrivals feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArrivalRouteType {
    Bus,
    SuburbanBus,
    VillageBus,
    NightBus,
    Trolleybus,
    Tram,
    #[serde(other)]
    Unknown,
}

impl ArrivalRouteType {
    pub fn is_bus_family(self) -> bool {
        matches!(self, Self::Bus | Self::SuburbanBus | Self::VillageBus)
    }

    /// Letter the arrivals feed puts in front of route numbers. Night buses
    /// are labelled like trams and trolleybuses.
    pub fn prefix(self) -> &'static str {
        if self.is_bus_family() { "A" } else { "T" }
    }

    pub fn kind(self) -> RouteKind {
        match self {
            Self::Bus | Self::SuburbanBus | Self::VillageBus => RouteKind::Bus,
            Self::NightBus => RouteKind::NightRoute,
            Self::Trolleybus => RouteKind::Trolleybus,
            Self::Tram => RouteKind::Tram,
            Self::Unknown => RouteKind::Unknown,
        }
    }
}

/// One line of the textual arrivals board for a stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedArrivalRecord {
    pub route_name: String,
    pub route_type: ArrivalRouteType,
    /// Free text such as `"5 min"`.
    pub time_left: String,
}

#[test]
fn night_bus_prefix_test() {
    assert!(!ArrivalRouteType::NightBus.is_bus_family());
    assert_eq!(ArrivalRouteType::NightBus.prefix(), "T");
    assert_eq!(ArrivalRouteType::NightBus.kind(), RouteKind::NightRoute);
    assert_eq!(ArrivalRouteType::VillageBus.prefix(), "A");
}
