use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{
    CityQuery, Geopoint,
    error::AirqError,
    http::{HttpError, HttpResponse, HttpTransport, QueryValue},
};

use super::{OpenWeatherProvider, remote_message, truncate_body};

#[derive(Debug, Deserialize)]
struct OwGeoEntry {
    name: String,
    lat: f64,
    lon: f64,
}

/// How a single geocoding request ended.
#[derive(Debug, PartialEq)]
enum Attempt {
    Found(Geopoint),
    /// The service answered with `(0, 0)`, its stand-in for "unknown".
    NullIsland,
    /// Worth retrying. Carries the server's `message` if the body had one.
    Failed(Option<String>),
}

impl<T: HttpTransport> OpenWeatherProvider<T> {
    /// Resolve a city to coordinates, retrying with exponential backoff.
    ///
    /// Transport failures, non-200 statuses, unparsable bodies and empty
    /// result arrays all count as failed attempts. Once attempts run out the
    /// last response's `message` (if any) becomes a [`AirqError::RemoteError`],
    /// otherwise the city is [`AirqError::NotFound`].
    pub(crate) async fn geocode(&self, city: &CityQuery) -> Result<Geopoint, AirqError> {
        let params = [
            ("q", QueryValue::Text(city.as_str())),
            ("limit", QueryValue::Text("1")),
            ("appid", QueryValue::Text(self.api_key.expose())),
        ];

        let mut last_message = None;
        for attempt in 1..=self.retry.attempts {
            let delay = self.retry.delay_before(attempt);
            if !delay.is_zero() {
                debug!(attempt, delay_ms = delay.as_millis() as u64, "backing off before geocoding retry");
                tokio::time::sleep(delay).await;
            }

            let response = self.http.get(&self.endpoints.geocoding, &params).await;
            match interpret(response) {
                Attempt::Found(point) => {
                    debug!(attempt, name = %point.resolved_name, lat = point.lat, lon = point.lon, "city resolved");
                    return Ok(point);
                }
                Attempt::NullIsland => {
                    debug!(attempt, "geocoder returned (0, 0)");
                    return Err(AirqError::NotFound);
                }
                Attempt::Failed(message) => {
                    debug!(attempt, ?message, "geocoding attempt failed");
                    last_message = message;
                }
            }
        }

        Err(last_message.map_or(AirqError::NotFound, AirqError::RemoteError))
    }
}

fn interpret(response: Result<HttpResponse, HttpError>) -> Attempt {
    let body = match response {
        Ok(res) => res.body,
        Err(HttpError::NonSuccessStatus { status, body }) => {
            debug!(status, body = %truncate_body(&body), "geocoding returned an error status");
            return Attempt::Failed(remote_message(&body));
        }
        Err(HttpError::Transport(reason)) => {
            debug!(%reason, "geocoding transport failure");
            return Attempt::Failed(None);
        }
    };

    let Ok(root) = serde_json::from_slice::<Value>(&body) else {
        return Attempt::Failed(None);
    };

    let first = match &root {
        Value::Array(items) => items.first(),
        _ => None,
    };

    let Some(entry) = first.and_then(|v| OwGeoEntry::deserialize(v).ok()) else {
        return Attempt::Failed(remote_message(&body));
    };

    let point = Geopoint { resolved_name: entry.name, lat: entry.lat, lon: entry.lon };
    if point.is_null_island() {
        Attempt::NullIsland
    } else if !point.in_range() {
        Attempt::Failed(None)
    } else {
        Attempt::Found(point)
    }
}
