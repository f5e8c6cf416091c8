use clap::Parser;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "airq",
    version,
    about = "Current air quality for a city",
    after_help = "The OpenWeather API key is read from the API_KEY environment variable."
)]
pub struct Cli {
    /// City name, e.g. "paris" or "São Paulo".
    pub city: Option<String>,
}
