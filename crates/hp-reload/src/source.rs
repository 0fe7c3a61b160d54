//! Marker sources.
//!
//! A [`MarkerSource`] performs one fetch of the version marker per call.
//! [`HttpMarkerSource`] fetches it over HTTP with caching disabled.

use std::future::Future;
use std::time::Duration;

use ureq::Agent;

/// Headers sent with every marker request so each poll reaches the origin.
const CACHE_BYPASS_HEADERS: [(&str, &str); 2] =
    [("Cache-Control", "no-cache"), ("Pragma", "no-cache")];

/// HTTP timeout for a single marker request.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of a completed marker fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MarkerResponse {
    /// Success status; the body is the marker, compared verbatim.
    Found(String),
    /// Non-success status: this deployment has no marker (yet).
    Absent {
        /// HTTP status code returned.
        status: u16,
    },
}

/// Transport-level failure: the request could not complete.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Connection, DNS, TLS or body read failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] ureq::Error),
    /// The blocking fetch task panicked or was cancelled.
    #[error("Fetch task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    /// Failure reported by a non-HTTP source.
    #[error("{0}")]
    Other(String),
}

/// Source of the version marker.
///
/// Implementations must not block the async runtime.
pub trait MarkerSource: Send + Sync + 'static {
    /// Fetch the current marker once.
    fn fetch(&self) -> impl Future<Output = Result<MarkerResponse, FetchError>> + Send;
}

/// Fetches the marker resource from an HTTP server.
///
/// Requests run on the blocking thread pool so a slow server never stalls
/// the runtime.
#[derive(Clone, Debug)]
pub struct HttpMarkerSource {
    agent: Agent,
    url: String,
}

impl HttpMarkerSource {
    /// Create a source for `marker_path` on the server at `base_url`.
    ///
    /// ```ignore
    /// let source = HttpMarkerSource::new("http://127.0.0.1:8000/", "/sha256.txt");
    /// assert_eq!(source.url(), "http://127.0.0.1:8000/sha256.txt");
    /// ```
    #[must_use]
    pub fn new(base_url: &str, marker_path: &str) -> Self {
        let url = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            marker_path.trim_start_matches('/')
        );
        Self {
            agent: create_agent(DEFAULT_TIMEOUT),
            url,
        }
    }

    /// Full URL of the marker resource.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl MarkerSource for HttpMarkerSource {
    async fn fetch(&self) -> Result<MarkerResponse, FetchError> {
        let agent = self.agent.clone();
        let url = self.url.clone();
        tokio::task::spawn_blocking(move || fetch_blocking(&agent, &url)).await?
    }
}

/// Create an HTTP agent that reports error statuses as responses.
fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// Issue one cache-bypassing GET and classify the response.
fn fetch_blocking(agent: &Agent, url: &str) -> Result<MarkerResponse, FetchError> {
    let mut request = agent.get(url);
    for (name, value) in CACHE_BYPASS_HEADERS {
        request = request.header(name, value);
    }

    let response = request.call()?;
    let status = response.status();
    if !status.is_success() {
        return Ok(MarkerResponse::Absent {
            status: status.as_u16(),
        });
    }

    let marker = response.into_body().read_to_string()?;
    Ok(MarkerResponse::Found(marker))
}
