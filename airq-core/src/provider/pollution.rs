use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::{
    Geopoint, Pollutant, Report,
    error::AirqError,
    http::{HttpError, HttpTransport, QueryValue},
    model::Aqi,
};

use super::{OpenWeatherProvider, remote_message, truncate_body};

const FALLBACK_MESSAGE: &str = "Failed to fetch pollution report";

#[derive(Debug, Deserialize)]
struct OwMain {
    aqi: u8,
}

#[derive(Debug, Deserialize)]
struct OwComponents {
    co: f64,
    no: f64,
    no2: f64,
    o3: f64,
    so2: f64,
    nh3: f64,
    pm2_5: f64,
    pm10: f64,
}

impl OwComponents {
    fn value(&self, kind: Pollutant) -> f64 {
        match kind {
            Pollutant::Co => self.co,
            Pollutant::No => self.no,
            Pollutant::No2 => self.no2,
            Pollutant::O3 => self.o3,
            Pollutant::So2 => self.so2,
            Pollutant::Nh3 => self.nh3,
            Pollutant::Pm2_5 => self.pm2_5,
            Pollutant::Pm10 => self.pm10,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwPollutionEntry {
    dt: Option<i64>,
    main: OwMain,
    components: OwComponents,
}

#[derive(Debug, Deserialize)]
struct OwPollutionResponse {
    list: Vec<OwPollutionEntry>,
}

impl<T: HttpTransport> OpenWeatherProvider<T> {
    /// Fetch the current measurement for `point`. Single attempt, no retry.
    pub(crate) async fn fetch_pollution(&self, point: &Geopoint) -> Result<Report, AirqError> {
        let params = [
            ("lat", QueryValue::Number(point.lat)),
            ("lon", QueryValue::Number(point.lon)),
            ("appid", QueryValue::Text(self.api_key.expose())),
        ];

        let body = match self.http.get(&self.endpoints.pollution, &params).await {
            Ok(res) => res.body,
            Err(HttpError::NonSuccessStatus { status, body }) => {
                debug!(status, body = %truncate_body(&body), "pollution request failed");
                let message = remote_message(&body).unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
                return Err(AirqError::RemoteError(message));
            }
            Err(HttpError::Transport(reason)) => return Err(AirqError::Transport(reason)),
        };

        parse_report(point, &body)
    }
}

fn parse_report(point: &Geopoint, body: &[u8]) -> Result<Report, AirqError> {
    let parsed: OwPollutionResponse = serde_json::from_slice(body)
        .map_err(|e| AirqError::Malformed(format!("unexpected pollution response: {e}")))?;

    let entry = parsed
        .list
        .into_iter()
        .next()
        .ok_or_else(|| AirqError::Malformed("pollution response contained no data".into()))?;

    let aqi = Aqi::try_from(entry.main.aqi)?;

    let values = Pollutant::ALL.map(|kind| entry.components.value(kind));
    if let Some(kind) = Pollutant::ALL.into_iter().find(|k| values[k.index()] < 0.0) {
        return Err(AirqError::Malformed(format!("negative concentration for {}", kind.label())));
    }

    let observed_at = entry.dt.and_then(unix_to_utc);
    debug!(aqi = aqi.value(), ?observed_at, "pollution report parsed");

    Ok(Report::new(point.clone(), aqi, values, observed_at))
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ApiKey, Config, Severity, http::testing::ScriptedTransport};

    const PARIS_REPORT: &str = r#"{
        "coord": {"lon": 2.35, "lat": 48.85},
        "list": [{
            "dt": 1700000000,
            "components": {"pm10": 15, "pm2_5": 8, "nh3": 1, "so2": 2, "o3": 60, "no2": 12, "no": 0.1, "co": 230},
            "main": {"aqi": 2}
        }]
    }"#;

    fn paris() -> Geopoint {
        Geopoint { resolved_name: "Paris".into(), lat: 48.8566, lon: 2.3522 }
    }

    fn provider(http: ScriptedTransport) -> OpenWeatherProvider<ScriptedTransport> {
        OpenWeatherProvider::with_transport(ApiKey::new("KEY").unwrap(), http, &Config::default())
    }

    fn report_with(components: &str, aqi: u8) -> String {
        format!(r#"{{"list":[{{"main":{{"aqi":{aqi}}},"components":{components}}}]}}"#)
    }

    #[tokio::test]
    async fn parses_report_in_canonical_order() {
        let p = provider(ScriptedTransport::new().ok(PARIS_REPORT));

        let report = p.fetch_pollution(&paris()).await.unwrap();

        assert_eq!(report.aqi.value(), 2);
        assert_eq!(report.point.resolved_name, "Paris");
        let values: Vec<_> = report.readings.iter().map(|r| r.value).collect();
        assert_eq!(values, [230.0, 0.1, 12.0, 60.0, 2.0, 1.0, 8.0, 15.0]);
        assert!(report.readings.iter().all(|r| r.severity() == Severity::Good));
        assert_eq!(report.observed_at, DateTime::from_timestamp(1_700_000_000, 0));
    }

    #[tokio::test]
    async fn coordinates_use_two_decimals() {
        let p = provider(ScriptedTransport::new().ok(PARIS_REPORT));

        p.fetch_pollution(&paris()).await.unwrap();

        assert_eq!(
            p.http.calls(),
            ["http://api.openweathermap.org/data/2.5/air_pollution?lat=48.86&lon=2.35&appid=KEY"]
        );
    }

    #[tokio::test]
    async fn boundary_values_classify_by_truncation() {
        let components = r#"{"co":4401,"no":0,"no2":0,"o3":0,"so2":0,"nh3":0,"pm2_5":0,"pm10":201}"#;
        let p = provider(ScriptedTransport::new().ok(&report_with(components, 3)));

        let report = p.fetch_pollution(&paris()).await.unwrap();

        assert_eq!(report.reading(Pollutant::Co).severity(), Severity::Fair);
        assert_eq!(report.reading(Pollutant::Pm10).severity(), Severity::VeryPoor);
        assert_eq!(report.observed_at, None);
    }

    #[tokio::test]
    async fn unauthorized_surfaces_server_message() {
        let p = provider(ScriptedTransport::new().status(401, r#"{"cod":401,"message":"Invalid API key"}"#));

        let err = p.fetch_pollution(&paris()).await.unwrap_err();

        assert_eq!(err, AirqError::RemoteError("Invalid API key".into()));
        assert!(err.to_string().contains("Invalid API key"));
    }

    #[tokio::test]
    async fn error_status_without_message_uses_fallback() {
        let p = provider(ScriptedTransport::new().status(502, "Bad Gateway"));

        let err = p.fetch_pollution(&paris()).await.unwrap_err();
        assert_eq!(err, AirqError::RemoteError(FALLBACK_MESSAGE.into()));
    }

    #[tokio::test]
    async fn transport_failure_is_not_retried() {
        let p = provider(ScriptedTransport::new().transport_error());

        let err = p.fetch_pollution(&paris()).await.unwrap_err();
        assert!(matches!(err, AirqError::Transport(_)));
        assert_eq!(p.http.calls().len(), 1);
    }

    #[tokio::test]
    async fn missing_component_is_malformed() {
        let components = r#"{"co":1,"no":0,"no2":0,"o3":0,"so2":0,"nh3":0,"pm2_5":0}"#;
        let p = provider(ScriptedTransport::new().ok(&report_with(components, 1)));

        assert!(matches!(p.fetch_pollution(&paris()).await, Err(AirqError::Malformed(_))));
    }

    #[tokio::test]
    async fn wrong_type_is_malformed() {
        let components = r#"{"co":"high","no":0,"no2":0,"o3":0,"so2":0,"nh3":0,"pm2_5":0,"pm10":0}"#;
        let p = provider(ScriptedTransport::new().ok(&report_with(components, 1)));

        assert!(matches!(p.fetch_pollution(&paris()).await, Err(AirqError::Malformed(_))));
    }

    #[tokio::test]
    async fn aqi_out_of_range_is_malformed() {
        let components = r#"{"co":1,"no":0,"no2":0,"o3":0,"so2":0,"nh3":0,"pm2_5":0,"pm10":0}"#;
        for aqi in [0, 6] {
            let p = provider(ScriptedTransport::new().ok(&report_with(components, aqi)));
            assert!(matches!(p.fetch_pollution(&paris()).await, Err(AirqError::Malformed(_))));
        }
    }

    #[tokio::test]
    async fn empty_list_is_malformed() {
        let p = provider(ScriptedTransport::new().ok(r#"{"list":[]}"#));

        let err = p.fetch_pollution(&paris()).await.unwrap_err();
        assert_eq!(err, AirqError::Malformed("pollution response contained no data".into()));
    }

    #[tokio::test]
    async fn negative_concentration_is_malformed() {
        let components = r#"{"co":1,"no":-3,"no2":0,"o3":0,"so2":0,"nh3":0,"pm2_5":0,"pm10":0}"#;
        let p = provider(ScriptedTransport::new().ok(&report_with(components, 1)));

        assert!(matches!(p.fetch_pollution(&paris()).await, Err(AirqError::Malformed(_))));
    }
}
