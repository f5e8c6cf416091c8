//! Core library for the `airq` CLI.
//!
//! This crate defines:
//! - Configuration (endpoints, timeouts, retry schedule)
//! - The HTTP layer and the OpenWeather geocoding/pollution provider
//! - Shared domain models and the severity classifier
//!
//! It is used by `airq-cli`, but can also be reused by other binaries or services.

pub mod classify;
pub mod config;
pub mod error;
pub mod http;
pub mod model;
pub mod provider;

pub use classify::{Severity, THRESHOLDS, classify};
pub use config::{Config, RetryPolicy};
pub use error::AirqError;
pub use model::{Aqi, ApiKey, CityQuery, Geopoint, Pollutant, PollutantReading, Report};
pub use provider::{AirQualityProvider, OpenWeatherProvider};
