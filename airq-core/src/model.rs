use chrono::{DateTime, Utc};
use std::fmt;

use crate::{classify::Severity, error::AirqError};

/// Longest city name or credential accepted, in bytes.
pub const MAX_PARAM_BYTES: usize = 512;

/// Unit every pollutant concentration is reported in.
pub const CONCENTRATION_UNIT: &str = "µg/m³";

/// Free-form city text from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityQuery(String);

impl CityQuery {
    /// Build a query from raw user input.
    ///
    /// Input longer than [`MAX_PARAM_BYTES`] is cut at the last char boundary
    /// that fits. Blank input is rejected as a missing city.
    pub fn parse(raw: &str) -> Result<Self, AirqError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AirqError::MissingCity);
        }

        Ok(Self(truncate_at_boundary(trimmed, MAX_PARAM_BYTES).to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CityQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// API credential. `Debug` never prints the token.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(token: impl Into<String>) -> Result<Self, AirqError> {
        let token = token.into();
        if token.is_empty() {
            return Err(AirqError::MissingCredential);
        }
        if token.len() > MAX_PARAM_BYTES {
            return Err(AirqError::InvalidCredential { max: MAX_PARAM_BYTES });
        }
        Ok(Self(token))
    }

    /// Read the credential from an environment lookup result.
    pub fn from_env_value(value: Option<String>) -> Result<Self, AirqError> {
        value.map_or(Err(AirqError::MissingCredential), Self::new)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// A resolved location.
#[derive(Debug, Clone, PartialEq)]
pub struct Geopoint {
    pub resolved_name: String,
    pub lat: f64,
    pub lon: f64,
}

impl Geopoint {
    pub fn in_range(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }

    /// `(0, 0)` is what the geocoder hands back for an unresolved place.
    pub fn is_null_island(&self) -> bool {
        self.lat == 0.0 && self.lon == 0.0
    }
}

/// Pollutants in report order. The discriminant is the row index into
/// [`crate::classify::THRESHOLDS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pollutant {
    Co = 0,
    No = 1,
    No2 = 2,
    O3 = 3,
    So2 = 4,
    Nh3 = 5,
    Pm2_5 = 6,
    Pm10 = 7,
}

impl Pollutant {
    pub const ALL: [Pollutant; 8] = [
        Pollutant::Co,
        Pollutant::No,
        Pollutant::No2,
        Pollutant::O3,
        Pollutant::So2,
        Pollutant::Nh3,
        Pollutant::Pm2_5,
        Pollutant::Pm10,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Pollutant::Co => "Carbon monoxide (CO)",
            Pollutant::No => "Nitrogen monoxide (NO)",
            Pollutant::No2 => "Nitrogen dioxide (NO₂)",
            Pollutant::O3 => "Ozone (O₃)",
            Pollutant::So2 => "Sulphur dioxide (SO₂)",
            Pollutant::Nh3 => "Ammonia (NH₃)",
            Pollutant::Pm2_5 => "Fine particles (PM2.5)",
            Pollutant::Pm10 => "Coarse particles (PM10)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollutantReading {
    pub kind: Pollutant,
    pub value: f64,
}

impl PollutantReading {
    pub fn severity(&self) -> Severity {
        crate::classify::classify(self.kind, self.value)
    }
}

/// Overall Air Quality Index, 1 (Good) ..= 5 (Very Poor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aqi(u8);

impl Aqi {
    pub fn value(self) -> u8 {
        self.0
    }

    pub fn severity(self) -> Severity {
        Severity::ALL[usize::from(self.0 - 1)]
    }
}

impl TryFrom<u8> for Aqi {
    type Error = AirqError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (1..=5).contains(&value) {
            Ok(Self(value))
        } else {
            Err(AirqError::Malformed(format!("AQI {value} is outside 1..=5")))
        }
    }
}

/// The latest measurement for one place, built once and rendered once.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub point: Geopoint,
    pub aqi: Aqi,
    /// Always in [`Pollutant::ALL`] order.
    pub readings: [PollutantReading; 8],
    pub observed_at: Option<DateTime<Utc>>,
}

impl Report {
    /// `values` is indexed by [`Pollutant::index`].
    pub fn new(
        point: Geopoint,
        aqi: Aqi,
        values: [f64; 8],
        observed_at: Option<DateTime<Utc>>,
    ) -> Self {
        let readings = Pollutant::ALL.map(|kind| PollutantReading { kind, value: values[kind.index()] });
        Self { point, aqi, readings, observed_at }
    }

    pub fn reading(&self, kind: Pollutant) -> &PollutantReading {
        &self.readings[kind.index()]
    }
}

fn truncate_at_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
