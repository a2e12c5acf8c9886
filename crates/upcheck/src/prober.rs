use std::time::{Duration, Instant};

use anyhow::Result;
use reqwest::{Client, Method, StatusCode};
use tracing::debug;

use crate::types::ProbeResult;
use crate::{DEFAULT_MAX_REDIRECTS, DEFAULT_TIMEOUT_MS};

/// Probe abstraction so schedulers can run against a substitute executor
#[async_trait::async_trait]
pub trait Probe: Send + Sync {
    /// Probe a single URL and classify the outcome
    ///
    /// Never fails: every outcome, including transport errors, is
    /// converted into a [`ProbeResult`].
    async fn probe(&self, url: &str, options: &ProbeOptions) -> ProbeResult;
}

/// Per-call probe options
#[derive(Debug, Clone, Default)]
pub struct ProbeOptions {
    /// Overrides the prober's default timeout when set
    pub timeout: Option<Duration>,

    /// Extra request headers
    pub headers: Option<Vec<(String, String)>>,
}

impl ProbeOptions {
    pub fn from_tracked(tracked: &crate::types::TrackedUrl) -> Self {
        Self {
            timeout: tracked.timeout_ms.map(Duration::from_millis),
            headers: tracked.headers.clone(),
        }
    }
}

/// Prober configuration
#[derive(Debug, Clone)]
pub struct ProberConfig {
    pub timeout: Duration,
    pub user_agent: String,
    pub max_redirects: usize,
}

impl Default for ProberConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            user_agent: "upcheck/1.0".to_string(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

/// HTTP probe executor
///
/// Issues a HEAD request and falls back to GET when the server rejects
/// HEAD with 405.
pub struct Prober {
    client: Client,
}

impl Prober {
    pub fn new(config: ProberConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client })
    }

    /// Issue one request and map the response or transport error
    async fn send(
        &self,
        method: Method,
        url: &str,
        options: &ProbeOptions,
    ) -> std::result::Result<StatusCode, reqwest::Error> {
        let mut request = self.client.request(method, url);

        if let Some(timeout) = options.timeout {
            request = request.timeout(timeout);
        }
        if let Some(headers) = &options.headers {
            for (key, value) in headers {
                request = request.header(key, value);
            }
        }

        let response = request.send().await?;
        Ok(response.status())
    }

    /// Classify a received HTTP status code
    fn classify_status(status: StatusCode, elapsed_ms: u64) -> ProbeResult {
        let code = status.as_u16();
        if code < 400 {
            ProbeResult::accessible(elapsed_ms, code)
        } else {
            ProbeResult::inaccessible_status(elapsed_ms, code)
        }
    }

    /// Classify a transport-level failure
    fn classify_error(error: &reqwest::Error, elapsed_ms: u64) -> ProbeResult {
        let cause = if error.is_timeout() {
            "timeout".to_string()
        } else if error.is_connect() {
            "connection failed".to_string()
        } else if error.is_redirect() {
            "too many redirects".to_string()
        } else if error.is_builder() {
            "invalid URL".to_string()
        } else {
            "network error".to_string()
        };

        ProbeResult::inaccessible(elapsed_ms, cause)
    }
}

#[async_trait::async_trait]
impl Probe for Prober {
    async fn probe(&self, url: &str, options: &ProbeOptions) -> ProbeResult {
        let start = Instant::now();

        match self.send(Method::HEAD, url, options).await {
            Ok(status) if status == StatusCode::METHOD_NOT_ALLOWED => {
                // Some servers reject HEAD outright; retry the same URL
                // with GET and classify that response instead.
                debug!("HEAD returned 405, falling back to GET: {url}");
                match self.send(Method::GET, url, options).await {
                    Ok(status) => {
                        Self::classify_status(status, start.elapsed().as_millis() as u64)
                    }
                    Err(error) => {
                        Self::classify_error(&error, start.elapsed().as_millis() as u64)
                    }
                }
            }
            Ok(status) => Self::classify_status(status, start.elapsed().as_millis() as u64),
            Err(error) => Self::classify_error(&error, start.elapsed().as_millis() as u64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProbeStatus;

    #[test]
    fn test_classify_status_boundaries() {
        let ok = Prober::classify_status(StatusCode::OK, 10);
        assert_eq!(ok.status, ProbeStatus::Accessible);

        let redirect = Prober::classify_status(StatusCode::MOVED_PERMANENTLY, 10);
        assert_eq!(redirect.status, ProbeStatus::Accessible);

        let client_error = Prober::classify_status(StatusCode::BAD_REQUEST, 10);
        assert_eq!(client_error.status, ProbeStatus::Inaccessible);
        assert_eq!(client_error.error.as_deref(), Some("HTTP 400"));

        let server_error = Prober::classify_status(StatusCode::INTERNAL_SERVER_ERROR, 10);
        assert_eq!(server_error.error.as_deref(), Some("HTTP 500"));
    }

    #[tokio::test]
    async fn test_probe_unreachable_port_is_classified() {
        let prober = Prober::new(ProberConfig::default()).unwrap();

        // Port 1 on loopback is closed; connection is refused quickly.
        let result = prober
            .probe("http://127.0.0.1:1/", &ProbeOptions::default())
            .await;

        assert_eq!(result.status, ProbeStatus::Inaccessible);
        assert!(result.error.is_some());
        assert_eq!(result.http_status, None);
    }

    #[tokio::test]
    async fn test_probe_malformed_url_yields_result() {
        let prober = Prober::new(ProberConfig::default()).unwrap();

        let result = prober
            .probe("not a url at all", &ProbeOptions::default())
            .await;

        assert_eq!(result.status, ProbeStatus::Inaccessible);
        assert!(result.error.is_some(), "transport failure must carry a cause");
    }
}
