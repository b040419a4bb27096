use async_trait::async_trait;
use reqwest::header::ACCEPT_ENCODING;
use serde::de::DeserializeOwned;
use tracing::error;

use crate::{
    repository::{Polyline, Route, Transport},
    source::{self, FeedArrivalRecord, FeedDownloader, FeedTransportRecord, TransitService},
};

async fn get(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, source::Error> {
    let response = client
        .get(url)
        .header(ACCEPT_ENCODING, "gzip, deflate")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        error!("Request to {url} returned {status}: {body}");
        return Err(source::Error::Status(status.as_u16()));
    }
    Ok(response.bytes().await?.to_vec())
}

/// Downloads the static feed archive from a fixed url.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: reqwest::Client,
    url: String,
}

impl HttpDownloader {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl FeedDownloader for HttpDownloader {
    async fn download(&self) -> Result<Vec<u8>, source::Error> {
        get(&self.client, &self.url).await
    }
}

/// JSON client for the secondary transit service.
#[derive(Debug, Clone)]
pub struct HttpTransitService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransitService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, source::Error> {
        let url = format!("{}{path}", self.base_url);
        let body = get(&self.client, &url).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl TransitService for HttpTransitService {
    async fn oblast_routes(&self) -> Result<Vec<Route>, source::Error> {
        self.get_json("/oblast/routes").await
    }

    async fn oblast_route_path(&self, route_id: i64) -> Result<Polyline, source::Error> {
        self.get_json(&format!("/oblast/routes/{route_id}/path"))
            .await
    }

    async fn oblast_transport(&self, route_id: i64) -> Result<Vec<Transport>, source::Error> {
        self.get_json(&format!("/oblast/routes/{route_id}/vehicles"))
            .await
    }

    async fn general_feed(&self) -> Result<Vec<FeedTransportRecord>, source::Error> {
        self.get_json("/realtime/vehicles").await
    }

    /// `stop_code` must already be url-encoded.
    async fn arrivals(&self, stop_code: &str) -> Result<Vec<FeedArrivalRecord>, source::Error> {
        self.get_json(&format!("/stops/{stop_code}/arrivals"))
            .await
    }
}
