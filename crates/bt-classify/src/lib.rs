//! Classification backend client for the browser time tracker.
//!
//! The backend scores browsing history as productive or distracting:
//! - `POST /classify` with `{"history": [...]}` returns a report
//! - `GET /history` lists the most recently classified records
//! - `POST /clear` wipes the backend's stored logs
//! - `GET /status` is a health probe

use std::fmt;
use std::time::Duration;

use bt_core::HistoryEntry;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default request timeout for API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Where the backend listens unless configured otherwise.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000";

/// Classification client errors.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The configured endpoint is unusable.
    #[error("invalid endpoint: {reason}")]
    InvalidEndpoint { reason: &'static str },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Backend returned an error response.
    #[error("backend error: {message}")]
    Api { message: String },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// How the backend labelled a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Classification {
    Productive,
    Distracting,
}

impl Classification {
    /// Parses a backend label. Anything that does not mention
    /// "productive" counts as distracting.
    pub fn from_label(label: &str) -> Self {
        if label.to_lowercase().contains("productive") {
            Self::Productive
        } else {
            Self::Distracting
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Productive => "Productive",
            Self::Distracting => "Distracting",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Classification {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label))
    }
}

/// One classified title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDetail {
    pub title: String,
    #[serde(default)]
    pub urls: Vec<String>,
    /// Seconds.
    pub duration: f64,
    pub classification: Classification,
    /// When the backend classified the record, as the backend formats it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Productive and distracting totals over a period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    /// Seconds classified as productive.
    pub productive_time: f64,
    /// Seconds classified as distracting.
    pub distracting_time: f64,
}

/// The backend's answer to a classification request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// Seconds classified as productive.
    pub productive_time: f64,
    /// Seconds classified as distracting.
    pub distracting_time: f64,
    #[serde(default)]
    pub details: Vec<ReportDetail>,
    /// Everything the backend classified since midnight UTC, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub today_total: Option<Totals>,
}

/// Backends either answer with the report itself or nest it under
/// `current_session` next to the day's running totals.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResponseBody {
    Session {
        current_session: ClassificationReport,
        #[serde(default)]
        today_total: Option<Totals>,
    },
    Flat(ClassificationReport),
}

impl ClassificationReport {
    pub fn total_time(&self) -> f64 {
        self.productive_time + self.distracting_time
    }
}

/// Classification backend client.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    endpoint: String,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    history: &'a [HistoryEntry],
}

impl Client {
    /// Creates a new client for the backend at `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is empty or not an http(s) url, or
    /// if the HTTP client fails to build.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, ClassifyError> {
        let endpoint = endpoint.into();
        let endpoint = endpoint.trim().trim_end_matches('/').to_string();

        if endpoint.is_empty() {
            return Err(ClassifyError::InvalidEndpoint {
                reason: "endpoint cannot be empty",
            });
        }
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ClassifyError::InvalidEndpoint {
                reason: "endpoint must be an http(s) url",
            });
        }

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(ClassifyError::ClientBuild)?;

        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends `history` for classification.
    ///
    /// An empty history is answered locally without a request.
    pub async fn classify(
        &self,
        history: &[HistoryEntry],
    ) -> Result<ClassificationReport, ClassifyError> {
        if history.is_empty() {
            return Ok(ClassificationReport::default());
        }

        tracing::debug!(entries = history.len(), endpoint = %self.endpoint, "classifying history");
        let response = self
            .http
            .post(format!("{}/classify", self.endpoint))
            .json(&ClassifyRequest { history })
            .send()
            .await?;

        let body = checked_body(response).await?;
        parse_report(&body)
    }

    /// Fetches the most recently classified records, newest first. The
    /// backend caps the list at 100.
    pub async fn history(&self) -> Result<Vec<ReportDetail>, ClassifyError> {
        let response = self
            .http
            .get(format!("{}/history", self.endpoint))
            .send()
            .await?;

        let body = checked_body(response).await?;
        parse_history(&body)
    }

    /// Asks the backend to wipe its stored logs.
    pub async fn clear(&self) -> Result<(), ClassifyError> {
        let response = self
            .http
            .post(format!("{}/clear", self.endpoint))
            .send()
            .await?;
        checked_body(response).await?;
        Ok(())
    }

    /// Returns `true` if the backend answers its health probe.
    pub async fn is_up(&self) -> bool {
        match self.http.get(format!("{}/status", self.endpoint)).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                tracing::debug!(error = %err, "backend status probe failed");
                false
            }
        }
    }
}

async fn checked_body(response: reqwest::Response) -> Result<String, ClassifyError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(parse_api_error(&body).unwrap_or_else(|| ClassifyError::Api {
            message: format!("status {status}: {body}"),
        }));
    }
    Ok(body)
}

fn parse_api_error(body: &str) -> Option<ClassifyError> {
    #[derive(Deserialize)]
    struct ErrorPayload {
        error: String,
    }

    serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .map(|payload| ClassifyError::Api {
            message: payload.error,
        })
}

fn parse_report(body: &str) -> Result<ClassificationReport, ClassifyError> {
    let body: ResponseBody = serde_json::from_str(body)
        .map_err(|err| ClassifyError::InvalidResponse(err.to_string()))?;
    Ok(match body {
        ResponseBody::Session {
            mut current_session,
            today_total,
        } => {
            current_session.today_total = today_total.or(current_session.today_total);
            current_session
        }
        ResponseBody::Flat(report) => report,
    })
}

fn parse_history(body: &str) -> Result<Vec<ReportDetail>, ClassifyError> {
    serde_json::from_str(body).map_err(|err| ClassifyError::InvalidResponse(err.to_string()))
}
