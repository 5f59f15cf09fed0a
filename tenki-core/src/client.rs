//! HTTP client for the forecast endpoint, wrapping `reqwest` with the
//! service's retry policy.
//!
//! A request is retried, up to `retry_count` extra attempts, when:
//! - the response status is 500, 502, 503 or 504, or
//! - the host cannot be reached at all (connection-level failure).
//!
//! Before each retry the client announces the wait on its notice sink and
//! sleeps. The wait is the server's `Retry-After` hint when that is a plain
//! positive integer strictly below `max_seconds_before_retry`, otherwise the
//! fixed `seconds_before_retry`. Redirects and all other statuses terminate
//! immediately. One request is in flight at a time; nothing else runs while
//! waiting.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};

use crate::config::Config;
use crate::error::WeatherError;
use crate::model::WeatherReport;

/// Receives the user-visible retry notices. Defaults to stdout; tests swap
/// in a collector.
pub type NoticeSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Result of one transport attempt, before any retry decision.
#[derive(Debug)]
enum RequestOutcome {
    Response { status: StatusCode, body: String, retry_after: Option<i64> },
    HostUnreachable,
}

pub struct WeatherClient {
    http: reqwest::Client,
    config: Config,
    notices: NoticeSink,
}

impl WeatherClient {
    pub fn new(config: Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            // Redirect statuses must surface to the retry classification.
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("tenki/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to construct HTTP client")?;

        Ok(Self {
            http,
            config,
            notices: Arc::new(|line| println!("{line}")),
        })
    }

    /// Replace the sink the retry notices are written to.
    pub fn with_notice_sink(mut self, notices: NoticeSink) -> Self {
        self.notices = notices;
        self
    }

    /// The underlying transport, shared with the city table loader.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Fetch the forecast for a resolved city identifier, applying the retry
    /// policy. Returns the parsed report on the first 200, or the terminal
    /// failure once the policy gives up.
    pub async fn get_weather(&self, city_id: &str) -> Result<WeatherReport, WeatherError> {
        let mut attempts = 0u32;
        let mut retry_after: Option<i64> = None;
        let mut last_status: Option<StatusCode> = None;
        let mut should_wait = false;

        loop {
            if should_wait {
                let wait = wait_seconds(
                    retry_after,
                    self.config.seconds_before_retry,
                    self.config.max_seconds_before_retry,
                );
                (self.notices)(&format!(
                    "Could not get weather information, automatic retry after {wait} seconds"
                ));
                tokio::time::sleep(Duration::from_secs(wait)).await;
            }

            match self.send_request(city_id).await? {
                RequestOutcome::Response { status, body, retry_after: hint } => {
                    let report = WeatherReport::from_http(status, &body)?;
                    match status {
                        StatusCode::OK => return Ok(report),
                        StatusCode::MOVED_PERMANENTLY
                        | StatusCode::FOUND
                        | StatusCode::TEMPORARY_REDIRECT => {
                            return Err(WeatherError::ServiceRelocated);
                        }
                        StatusCode::INTERNAL_SERVER_ERROR
                        | StatusCode::BAD_GATEWAY
                        | StatusCode::SERVICE_UNAVAILABLE
                        | StatusCode::GATEWAY_TIMEOUT => {
                            tracing::warn!(status = status.as_u16(), "retryable forecast status");
                            last_status = Some(status);
                            retry_after = hint;
                        }
                        other => {
                            return Err(WeatherError::RequestFailed(reason_phrase(other)));
                        }
                    }
                }
                RequestOutcome::HostUnreachable => {
                    tracing::warn!("forecast host unreachable");
                    retry_after = None;
                }
            }

            should_wait = true;
            attempts += 1;
            if attempts > self.config.retry_count {
                break;
            }
        }

        match last_status {
            Some(status) => Err(WeatherError::RequestFailed(reason_phrase(status))),
            None => Err(WeatherError::ServiceUnavailable),
        }
    }

    async fn send_request(&self, city_id: &str) -> Result<RequestOutcome, WeatherError> {
        let url = format!("{}{}", self.config.forecast_url, city_id);
        tracing::debug!(%url, "requesting forecast");

        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(err) if err.is_connect() => {
                tracing::debug!(error = %err, "connection failed");
                return Ok(RequestOutcome::HostUnreachable);
            }
            Err(err) => {
                tracing::debug!(error = %err, "request failed");
                return Err(WeatherError::RequestFailed(
                    "Could not get weather information".to_string(),
                ));
            }
        };

        let status = response.status();
        let retry_after = parse_retry_after(response.headers());
        let body = response.text().await.map_err(|err| {
            tracing::debug!(error = %err, "failed to read response body");
            WeatherError::RequestFailed("Could not get weather information".to_string())
        })?;

        Ok(RequestOutcome::Response { status, body, retry_after })
    }
}

/// `Retry-After` as a plain integer number of seconds. An HTTP-date (or any
/// other non-numeric value) is discarded, which makes the wait fall back to
/// the fixed setting.
fn parse_retry_after(headers: &HeaderMap) -> Option<i64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<i64>().ok())
}

/// The seconds to sleep before the next attempt. The server hint wins only
/// when it is positive and strictly below the ceiling.
fn wait_seconds(hint: Option<i64>, fixed: u64, ceiling: u64) -> u64 {
    match hint {
        Some(hint) if hint > 0 && (hint as u64) < ceiling => hint as u64,
        _ => fixed,
    }
}

fn reason_phrase(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map_or_else(|| status.as_str().to_string(), str::to_string)
}
