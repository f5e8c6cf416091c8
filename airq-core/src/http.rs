//! Thin GET-only HTTP layer.
//!
//! Query strings are built here once: keys and values are percent-encoded
//! and numbers always carry two fractional digits with a `.` separator.

use async_trait::async_trait;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{Client, StatusCode};
use std::{fmt::Debug, time::Duration};
use thiserror::Error;
use tracing::debug;

use crate::error::AirqError;

/// Bodies larger than this are refused.
pub const MAX_BODY_BYTES: usize = 512 * 1024;

// RFC 3986 unreserved characters pass through untouched.
const QUERY_SAFE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QueryValue<'a> {
    Text(&'a str),
    Number(f64),
}

impl QueryValue<'_> {
    fn render(&self) -> String {
        match self {
            QueryValue::Text(s) => utf8_percent_encode(s, QUERY_SAFE).to_string(),
            QueryValue::Number(n) => format!("{n:.2}"),
        }
    }
}

pub type QueryParam<'a> = (&'a str, QueryValue<'a>);

/// Encode `params` in order as `k1=v1&k2=v2`.
pub fn encode_query(params: &[QueryParam<'_>]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", utf8_percent_encode(key, QUERY_SAFE), value.render()))
        .collect::<Vec<_>>()
        .join("&")
}

/// Append the encoded query to `base_url`.
pub fn build_url(base_url: &str, params: &[QueryParam<'_>]) -> String {
    if params.is_empty() {
        return base_url.to_string();
    }
    let sep = if base_url.contains('?') { '&' } else { '?' };
    format!("{base_url}{sep}{}", encode_query(params))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpError {
    #[error("{0}")]
    Transport(String),

    /// Anything but 200. The body is kept so callers can pull out the
    /// server's own error message.
    #[error("unexpected HTTP status {status}")]
    NonSuccessStatus { status: u16, body: Vec<u8> },
}

#[async_trait]
pub trait HttpTransport: Send + Sync + Debug {
    async fn get(&self, base_url: &str, params: &[QueryParam<'_>]) -> Result<HttpResponse, HttpError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, AirqError> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(concat!("airq/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AirqError::InternalSetup(e.to_string()))?;

        Ok(Self { http })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, base_url: &str, params: &[QueryParam<'_>]) -> Result<HttpResponse, HttpError> {
        let url = build_url(base_url, params);

        let mut res = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(transport_error)?;

        let status = res.status();
        debug!(endpoint = base_url, status = status.as_u16(), "received response");

        if res.content_length().is_some_and(|len| len > MAX_BODY_BYTES as u64) {
            return Err(body_too_large());
        }

        let mut body = Vec::new();
        while let Some(chunk) = res.chunk().await.map_err(transport_error)? {
            if body.len() + chunk.len() > MAX_BODY_BYTES {
                return Err(body_too_large());
            }
            body.extend_from_slice(&chunk);
        }

        if status != StatusCode::OK {
            return Err(HttpError::NonSuccessStatus { status: status.as_u16(), body });
        }

        Ok(HttpResponse { status: status.as_u16(), body })
    }
}

fn body_too_large() -> HttpError {
    HttpError::Transport(format!("response body exceeds {} KiB", MAX_BODY_BYTES / 1024))
}

// The request URL carries the credential, so it is stripped from the message.
fn transport_error(err: reqwest::Error) -> HttpError {
    HttpError::Transport(err.without_url().to_string())
}
