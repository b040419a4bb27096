use std::env;

use citytransit::repository::City;

const DEFAULT_FEED_URL: &str = "http://track.ua-gis.com/gtfs/lviv/static.zip";
const DEFAULT_SERVICE_URL: &str = "http://track.ua-gis.com/api";
const DEFAULT_PORT: u16 = 3000;

/// Server configuration read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub feed_url: String,
    pub service_url: String,
    pub port: u16,
    pub city: City,
    pub must_refresh: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.into(),
            service_url: DEFAULT_SERVICE_URL.into(),
            port: DEFAULT_PORT,
            city: City::default(),
            must_refresh: false,
        }
    }
}

impl Config {
    /// Unset or unreadable variables fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let city = match env::var("CITY") {
            Ok(name) if !name.trim().is_empty() => City::new(defaults.city.id, name.trim()),
            _ => defaults.city,
        };
        Self {
            feed_url: env::var("FEED_URL").unwrap_or(defaults.feed_url),
            service_url: env::var("SERVICE_URL").unwrap_or(defaults.service_url),
            port: env::var("PORT")
                .ok()
                .and_then(|port| port.parse().ok())
                .unwrap_or(defaults.port),
            city,
            must_refresh: env::var("MUST_REFRESH").is_ok_and(|value| value == "1" || value == "true"),
        }
    }
}
