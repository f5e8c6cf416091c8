use async_trait::async_trait;
use serde::Deserialize;
use std::fmt::Debug;

use crate::{
    ApiKey, CityQuery, Config, Geopoint, Report,
    config::{Endpoints, RetryPolicy},
    error::AirqError,
    http::{HttpTransport, ReqwestTransport},
};

pub mod geocoding;
pub mod pollution;

/// The two-stage lookup behind a report: place name to coordinates, then
/// coordinates to the latest measurement.
#[async_trait]
pub trait AirQualityProvider: Send + Sync + Debug {
    async fn resolve_city(&self, city: &CityQuery) -> Result<Geopoint, AirqError>;

    async fn fetch_report(&self, point: &Geopoint) -> Result<Report, AirqError>;
}

/// OpenWeather geocoding + air pollution APIs.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider<T = ReqwestTransport> {
    api_key: ApiKey,
    http: T,
    endpoints: Endpoints,
    retry: RetryPolicy,
}

impl OpenWeatherProvider<ReqwestTransport> {
    /// Build a provider with a real HTTP client configured from `config`.
    pub fn from_config(api_key: ApiKey, config: &Config) -> Result<Self, AirqError> {
        let http = ReqwestTransport::new(config.timeout())?;
        Ok(Self::with_transport(api_key, http, config))
    }
}

impl<T: HttpTransport> OpenWeatherProvider<T> {
    pub fn with_transport(api_key: ApiKey, http: T, config: &Config) -> Self {
        Self {
            api_key,
            http,
            endpoints: config.endpoints.clone(),
            retry: config.retry,
        }
    }
}

#[async_trait]
impl<T: HttpTransport> AirQualityProvider for OpenWeatherProvider<T> {
    async fn resolve_city(&self, city: &CityQuery) -> Result<Geopoint, AirqError> {
        self.geocode(city).await
    }

    async fn fetch_report(&self, point: &Geopoint) -> Result<Report, AirqError> {
        self.fetch_pollution(point).await
    }
}

/// Error payload OpenWeather sends alongside non-200 statuses,
/// e.g. `{"cod":401,"message":"Invalid API key"}`.
#[derive(Debug, Deserialize)]
struct OwErrorBody {
    message: String,
}

/// The top-level `message` string of a JSON body, if there is one.
fn remote_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<OwErrorBody>(body).ok().map(|b| b.message)
}

fn truncate_body(body: &[u8]) -> String {
    const MAX: usize = 200;
    let text = String::from_utf8_lossy(body);
    match text.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.into_owned(),
    }
}
