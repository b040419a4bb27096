mod gtfs;
mod realtime;
mod routes;
mod stops;

pub use gtfs::*;
pub use realtime::*;
pub use routes::*;
pub use stops::*;

use axum::http::StatusCode;
use citytransit::provider::Error;
use tracing::error;

fn into_status(err: Error) -> StatusCode {
    error!("Request failed: {err}");
    match err {
        Error::StopNotFound(_) | Error::RouteNotFound(_) => StatusCode::NOT_FOUND,
        Error::StopWithoutCode(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::FeedDownload(_) | Error::Network(_) | Error::GeneralFeed(_) => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
