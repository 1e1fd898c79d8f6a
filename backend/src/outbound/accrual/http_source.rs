//! Reqwest-backed accrual source adapter.
//!
//! This adapter owns transport details only: URL construction, the client
//! timeout, HTTP status mapping and JSON decoding. Retries and pacing belong
//! to the reconciliation worker.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, RETRY_AFTER};
use reqwest::{Client, StatusCode, Url};

use super::dto::AccrualResponseDto;
use crate::domain::OrderNumber;
use crate::domain::ports::{AccrualLookup, AccrualSource, AccrualSourceError};

/// Pause applied when a 429 response carries no usable `Retry-After`.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Accrual source adapter querying `GET {base}/api/orders/{number}`.
pub struct AccrualHttpSource {
    client: Client,
    base: Url,
}

impl AccrualHttpSource {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base })
    }

    fn order_url(&self, number: &OrderNumber) -> Result<Url, AccrualSourceError> {
        let mut url = self.base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                AccrualSourceError::rejected(format!("base url {} cannot carry a path", self.base))
            })?;
            segments
                .pop_if_empty()
                .extend(["api", "orders", number.as_ref()]);
        }
        Ok(url)
    }
}

#[async_trait]
impl AccrualSource for AccrualHttpSource {
    async fn lookup(&self, number: &OrderNumber) -> Result<AccrualLookup, AccrualSourceError> {
        let response = self
            .client
            .get(self.order_url(number)?)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let retry_after = response.headers().get(RETRY_AFTER).cloned();
        let body = response.bytes().await.map_err(map_transport_error)?;
        interpret_response(number, status, retry_after.as_ref(), body.as_ref())
    }
}

fn interpret_response(
    number: &OrderNumber,
    status: StatusCode,
    retry_after: Option<&HeaderValue>,
    body: &[u8],
) -> Result<AccrualLookup, AccrualSourceError> {
    match status {
        StatusCode::OK => parse_lookup(number, body),
        StatusCode::NO_CONTENT => Ok(AccrualLookup::Unknown),
        StatusCode::TOO_MANY_REQUESTS => Err(AccrualSourceError::rate_limited(
            parse_retry_after(retry_after),
        )),
        _ => Err(map_status_error(status, body)),
    }
}

fn parse_lookup(number: &OrderNumber, body: &[u8]) -> Result<AccrualLookup, AccrualSourceError> {
    let decoded: AccrualResponseDto = serde_json::from_slice(body).map_err(|error| {
        AccrualSourceError::decode(format!("invalid accrual JSON payload: {error}"))
    })?;
    decoded
        .into_lookup(number)
        .map_err(AccrualSourceError::decode)
}

/// Seconds form only; HTTP-date values fall back to the default pause.
fn parse_retry_after(value: Option<&HeaderValue>) -> Duration {
    value
        .and_then(|raw| raw.to_str().ok())
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .map_or(DEFAULT_RETRY_AFTER, Duration::from_secs)
}

fn map_transport_error(error: reqwest::Error) -> AccrualSourceError {
    if error.is_timeout() {
        AccrualSourceError::timeout(error.to_string())
    } else {
        AccrualSourceError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> AccrualSourceError {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            AccrualSourceError::timeout(message)
        }
        _ if status.is_server_error() => AccrualSourceError::transport(message),
        _ => AccrualSourceError::rejected(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 120;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
