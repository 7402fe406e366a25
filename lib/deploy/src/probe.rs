//! Health probing of the green target.

use crate::error::{ProbeError, ValidationError};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use std::time::Duration;
use storefront_core::Result;
use tracing::{debug, instrument, warn};

/// Default time allowed for one health check request.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Checks whether the newly deployed target is serving.
///
/// This abstraction allows testing the hook without a live target.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Probes the target and returns the HTTP status it answered with.
    async fn check(&self) -> Result<StatusCode, ProbeError>;

    /// The URL being probed, for logging.
    fn target(&self) -> &str;
}

/// Probes the green target with a plain HTTP GET.
///
/// An endpoint that is not a URL, or whose scheme disagrees with the
/// security setting, still builds a probe; every check against it fails so
/// the hook reports `Failed` instead of never reporting.
#[derive(Debug, Clone)]
pub struct HttpHealthProbe {
    client: reqwest::Client,
    endpoint: String,
    url: std::result::Result<Url, ProbeError>,
}

impl HttpHealthProbe {
    /// Creates a probe for the configured test endpoint.
    ///
    /// `is_secure` selects the scheme the endpoint must use.
    ///
    /// # Errors
    ///
    /// Returns an error if no endpoint is configured or the HTTP client
    /// cannot be built.
    pub fn new(
        test_endpoint: Option<&str>,
        is_secure: bool,
        timeout: Duration,
    ) -> Result<Self, ValidationError> {
        let endpoint = test_endpoint
            .filter(|endpoint| !endpoint.trim().is_empty())
            .ok_or(ValidationError::MissingTestEndpoint)?
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ValidationError::HttpClient {
                details: e.to_string(),
            })?;

        let url = checked_url(&endpoint, is_secure);
        if let Err(problem) = &url {
            warn!(%problem, "test endpoint is unusable; health checks will fail");
        }

        Ok(Self {
            client,
            endpoint,
            url,
        })
    }
}

fn checked_url(endpoint: &str, is_secure: bool) -> std::result::Result<Url, ProbeError> {
    let url = Url::parse(endpoint).map_err(|e| ProbeError::InvalidEndpoint {
        url: endpoint.to_string(),
        details: e.to_string(),
    })?;

    let expected = if is_secure { "https" } else { "http" };
    if url.scheme() != expected {
        return Err(ProbeError::SchemeMismatch {
            url: endpoint.to_string(),
            is_secure,
        });
    }
    Ok(url)
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    #[instrument(skip(self), fields(url = %self.endpoint))]
    async fn check(&self) -> Result<StatusCode, ProbeError> {
        let url = self.url.clone()?;
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ProbeError::Timeout {
                    url: self.endpoint.clone(),
                }
            } else {
                ProbeError::RequestFailed {
                    url: self.endpoint.clone(),
                    details: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        debug!(%status, "health check response");
        Ok(status)
    }

    fn target(&self) -> &str {
        &self.endpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, http::StatusCode as AxumStatus, routing::get};
    use std::net::SocketAddr;

    async fn serve(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve");
        });
        addr
    }

    #[test]
    fn requires_endpoint() {
        let err = HttpHealthProbe::new(None, false, DEFAULT_PROBE_TIMEOUT).unwrap_err();
        assert!(err.to_string().contains("TEST_ENDPOINT"));

        let err = HttpHealthProbe::new(Some("  "), false, DEFAULT_PROBE_TIMEOUT).unwrap_err();
        assert!(err.to_string().contains("TEST_ENDPOINT"));
    }

    #[tokio::test]
    async fn invalid_url_fails_every_check() {
        let probe =
            HttpHealthProbe::new(Some("not a url"), false, DEFAULT_PROBE_TIMEOUT).expect("probe");
        assert_eq!(probe.target(), "not a url");
        let err = probe.check().await.unwrap_err();
        assert!(err.to_string().contains("invalid test endpoint"));
    }

    #[tokio::test]
    async fn scheme_must_match_security_setting() {
        let mismatched = HttpHealthProbe::new(
            Some("http://green.example.com:8080/"),
            true,
            DEFAULT_PROBE_TIMEOUT,
        )
        .expect("probe");
        let err = mismatched.check().await.unwrap_err();
        assert!(err.to_string().contains("must use https"));

        let probe = HttpHealthProbe::new(
            Some("https://green.example.com/"),
            true,
            DEFAULT_PROBE_TIMEOUT,
        )
        .expect("https endpoint");
        assert_eq!(probe.target(), "https://green.example.com/");
        assert!(probe.url.is_ok());
    }

    #[tokio::test]
    async fn reports_target_status() {
        let addr = serve(
            Router::new()
                .route("/", get(|| async { "Hello World" }))
                .route("/broken", get(|| async { AxumStatus::SERVICE_UNAVAILABLE })),
        )
        .await;

        let healthy = HttpHealthProbe::new(
            Some(&format!("http://{addr}/")),
            false,
            DEFAULT_PROBE_TIMEOUT,
        )
        .expect("probe");
        assert_eq!(healthy.check().await.expect("check"), StatusCode::OK);

        let broken = HttpHealthProbe::new(
            Some(&format!("http://{addr}/broken")),
            false,
            DEFAULT_PROBE_TIMEOUT,
        )
        .expect("probe");
        assert_eq!(
            broken.check().await.expect("check"),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn unreachable_target_is_an_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let probe = HttpHealthProbe::new(
            Some(&format!("http://{addr}/")),
            false,
            DEFAULT_PROBE_TIMEOUT,
        )
        .expect("probe");
        assert!(probe.check().await.is_err());
    }

    #[tokio::test]
    async fn slow_target_times_out() {
        let addr = serve(Router::new().route(
            "/",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                "late"
            }),
        ))
        .await;

        let probe = HttpHealthProbe::new(
            Some(&format!("http://{addr}/")),
            false,
            Duration::from_millis(50),
        )
        .expect("probe");
        let err = probe.check().await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
