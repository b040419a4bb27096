use citytransit::{repository::Stop, shared::geo::Coordinate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopDto {
    pub id: i64,
    pub name: String,
    pub coordinate: Coordinate,
}

impl StopDto {
    pub fn from(stop: &Stop) -> Self {
        Self {
            id: stop.id,
            name: stop.name.clone(),
            coordinate: stop.coordinate,
        }
    }
}
