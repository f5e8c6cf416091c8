//! Top-level flow: validate inputs, run the lookup behind the progress
//! indicator, then render. Every failure funnels through [`run`], which prints
//! one red line to stderr and exits with status 1.

use std::{
    future::Future,
    io::{self, IsTerminal, Write},
    process::ExitCode,
};

use airq_core::{
    AirQualityProvider, AirqError, ApiKey, CityQuery, Config, OpenWeatherProvider,
    config::API_KEY_ENV,
};
use clap::error::ErrorKind;
use tracing::{debug, warn};

use crate::{
    cli::Cli,
    render::render,
    spinner::Spinner,
    term::{RED, RESET},
};

pub const LOADING_LABEL: &str = "Loading data";

pub async fn run(args: Result<Cli, clap::Error>) -> ExitCode {
    match execute(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_failure(&mut io::stderr(), &err);
            ExitCode::FAILURE
        }
    }
}

async fn execute(args: Result<Cli, clap::Error>) -> Result<(), AirqError> {
    let args = match args {
        Ok(cli) => Ok(cli),
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => Err(usage_error(&err)),
    };

    let api_key = ApiKey::from_env_value(std::env::var(API_KEY_ENV).ok())?;
    let cli = args?;
    let city = CityQuery::parse(cli.city.as_deref().unwrap_or_default())?;

    let config = Config::load()?;
    debug!(?config, "configuration loaded");

    let provider = OpenWeatherProvider::from_config(api_key, &config)?;

    let spinner = if io::stdout().is_terminal() {
        Spinner::start(LOADING_LABEL, || io::stdout().lock())
    } else {
        Spinner::idle()
    };

    report(&provider, &city, spinner, &mut io::stdout(), interrupted()).await
}

/// Run the two-stage lookup while `spinner` animates, stop it, then render
/// to `out`. The spinner is stopped before anything is written, on every path.
pub async fn report<P, W, I>(
    provider: &P,
    city: &CityQuery,
    spinner: Spinner,
    out: &mut W,
    interrupt: I,
) -> Result<(), AirqError>
where
    P: AirQualityProvider + ?Sized,
    W: Write,
    I: Future<Output = ()>,
{
    let lookup = async {
        let point = provider.resolve_city(city).await?;
        provider.fetch_report(&point).await
    };

    let outcome = tokio::select! {
        res = lookup => res,
        () = interrupt => Err(AirqError::Interrupted),
    };

    if let Err(err) = spinner.stop() {
        warn!(%err, "failed to clear progress indicator");
    }

    let report = outcome?;
    render(out, &report).map_err(|e| AirqError::Output(e.to_string()))
}

pub fn report_failure<W: Write>(err_out: &mut W, err: &AirqError) {
    // Nothing sensible is left to do if stderr itself is gone.
    let _ = writeln!(err_out, "{RED}{err}{RESET}");
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

fn usage_error(err: &clap::Error) -> AirqError {
    let rendered = err.to_string();
    let first = rendered.lines().next().unwrap_or_default();
    AirqError::Usage(first.trim_start_matches("error: ").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spinner::testing::SharedBuf;
    use airq_core::{Aqi, Geopoint, Report};
    use async_trait::async_trait;
    use clap::Parser;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct FakeProvider {
        geocode: Result<Geopoint, AirqError>,
        pollution: Result<[f64; 8], AirqError>,
        hang: bool,
        pollution_calls: AtomicUsize,
    }

    impl FakeProvider {
        fn paris() -> Self {
            Self {
                geocode: Ok(Geopoint { resolved_name: "Paris".into(), lat: 48.85, lon: 2.35 }),
                pollution: Ok([230.0, 0.1, 12.0, 60.0, 2.0, 1.0, 8.0, 15.0]),
                hang: false,
                pollution_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl AirQualityProvider for FakeProvider {
        async fn resolve_city(&self, _city: &CityQuery) -> Result<Geopoint, AirqError> {
            if self.hang {
                std::future::pending::<()>().await;
            }
            self.geocode.clone()
        }

        async fn fetch_report(&self, point: &Geopoint) -> Result<Report, AirqError> {
            self.pollution_calls.fetch_add(1, Ordering::SeqCst);
            let values = self.pollution.clone()?;
            Ok(Report::new(point.clone(), Aqi::try_from(2u8)?, values, None))
        }
    }

    fn city() -> CityQuery {
        CityQuery::parse("paris").unwrap()
    }

    fn spinner_on(buf: &SharedBuf) -> Spinner {
        let sink = buf.clone();
        Spinner::start(LOADING_LABEL, move || sink)
    }

    async fn run_report(provider: &FakeProvider, screen: &SharedBuf) -> (Result<(), AirqError>, String) {
        let mut out = Vec::new();
        let res = report(provider, &city(), spinner_on(screen), &mut out, std::future::pending()).await;
        (res, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn happy_path_stops_spinner_then_renders() {
        let screen = SharedBuf::default();
        let (res, out) = run_report(&FakeProvider::paris(), &screen).await;

        res.unwrap();
        assert!(out.starts_with("Air quality in Paris "));
        assert!(out.contains("\tAQI 2 (Fair)\n"));
        assert!(screen.contents().ends_with("\x1b[2K\r\x1b[?25h"));
    }

    #[tokio::test]
    async fn geocode_failure_skips_pollution_and_restores_cursor() {
        let provider = FakeProvider { geocode: Err(AirqError::NotFound), ..FakeProvider::paris() };
        let screen = SharedBuf::default();

        let (res, out) = run_report(&provider, &screen).await;

        assert_eq!(res.unwrap_err(), AirqError::NotFound);
        assert!(out.is_empty());
        assert_eq!(provider.pollution_calls.load(Ordering::SeqCst), 0);
        assert!(screen.contents().ends_with("\x1b[?25h"));
    }

    #[tokio::test]
    async fn remote_error_is_passed_through() {
        let provider = FakeProvider {
            pollution: Err(AirqError::RemoteError("Invalid API key".into())),
            ..FakeProvider::paris()
        };
        let screen = SharedBuf::default();

        let (res, out) = run_report(&provider, &screen).await;

        assert_eq!(res.unwrap_err().to_string(), "Invalid API key");
        assert!(out.is_empty());
        assert!(screen.contents().ends_with("\x1b[?25h"));
    }

    #[tokio::test]
    async fn interrupt_cancels_lookup() {
        let provider = FakeProvider { hang: true, ..FakeProvider::paris() };
        let screen = SharedBuf::default();
        let mut out = Vec::new();

        let res = report(&provider, &city(), spinner_on(&screen), &mut out, async {}).await;

        assert_eq!(res.unwrap_err(), AirqError::Interrupted);
        assert!(screen.contents().ends_with("\x1b[?25h"));
    }

    #[tokio::test]
    async fn identical_runs_print_identical_bytes() {
        let provider = FakeProvider::paris();
        let mut first = Vec::new();
        let mut second = Vec::new();

        report(&provider, &city(), Spinner::idle(), &mut first, std::future::pending()).await.unwrap();
        report(&provider, &city(), Spinner::idle(), &mut second, std::future::pending()).await.unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn failure_line_is_red() {
        let mut err = Vec::new();
        report_failure(&mut err, &AirqError::MissingCredential);

        assert_eq!(String::from_utf8(err).unwrap(), "\x1b[31mPlease provide API_KEY\x1b[0m\n");
    }

    #[test]
    fn usage_error_keeps_first_line_only() {
        let err = Cli::try_parse_from(["airq", "paris", "london"]).unwrap_err();

        let AirqError::Usage(msg) = usage_error(&err) else {
            panic!("expected a usage error");
        };
        assert!(msg.contains("unexpected argument"), "{msg}");
        assert!(!msg.contains('\n'));
    }
}
