//! Upstream page fetching
//!
//! One GET per call, with a browser-like `User-Agent` and a hard timeout.
//! Failures are classified into [`FetchError`] and never retried.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use crate::error::FetchError;

/// Identity sent upstream. Some pages refuse unknown clients.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Fetches raw markup from upstream pages.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    timeout: Duration,
}

impl Fetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GET `url` with `query` appended and return the body text.
    /// An empty `query` leaves the URL untouched.
    pub async fn fetch(&self, url: &str, query: &[(&str, &str)]) -> Result<String, FetchError> {
        let mut request = self.client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }

        debug!(url = %url, ?query, "Fetching upstream page");

        let response = request.send().await.map_err(|e| self.classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %response.url(), status = %status, "Upstream returned an error status");
            return Err(FetchError::Upstream {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
                url: response.url().to_string(),
            });
        }

        let body = response.text().await.map_err(|e| self.classify(url, e))?;
        debug!(url = %url, bytes = body.len(), "Fetched upstream page");
        Ok(body)
    }

    fn classify(&self, url: &str, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            warn!(url = %url, timeout = ?self.timeout, "Upstream request timed out");
            FetchError::Timeout(self.timeout)
        } else {
            warn!(url = %url, error = %err, "Upstream request failed");
            FetchError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use axum::extract::Query;
    use axum::http::{HeaderMap, StatusCode, header};
    use axum::routing::get;
    use axum::Router;
    use tokio::net::TcpListener;

    async fn spawn_upstream() -> String {
        let app = Router::new()
            .route(
                "/echo",
                get(|headers: HeaderMap, Query(params): Query<HashMap<String, String>>| async move {
                    let agent = headers
                        .get(header::USER_AGENT)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    let search = params.get("search").cloned().unwrap_or_default();
                    format!("{agent}|{search}")
                }),
            )
            .route("/down", get(|| async { StatusCode::SERVICE_UNAVAILABLE }))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(3)).await;
                    "late"
                }),
            );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn fetcher(timeout: Duration) -> Fetcher {
        Fetcher::new(BROWSER_USER_AGENT, timeout).unwrap()
    }

    #[tokio::test]
    async fn test_sends_identity_and_query() {
        let base = spawn_upstream().await;
        let body = fetcher(Duration::from_secs(5))
            .fetch(&format!("{base}/echo"), &[("search", "W1 ABC")])
            .await
            .unwrap();

        assert_eq!(body, format!("{BROWSER_USER_AGENT}|W1 ABC"));
    }

    #[tokio::test]
    async fn test_error_status_is_upstream_error() {
        let base = spawn_upstream().await;
        let err = fetcher(Duration::from_secs(5))
            .fetch(&format!("{base}/down"), &[])
            .await
            .unwrap_err();

        match err {
            FetchError::Upstream { status, reason, .. } => {
                assert_eq!(status, 503);
                assert_eq!(reason, "Service Unavailable");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_slow_upstream_times_out() {
        let base = spawn_upstream().await;
        let err = fetcher(Duration::from_secs(1))
            .fetch(&format!("{base}/slow"), &[])
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Timeout(d) if d == Duration::from_secs(1)));
    }

    #[tokio::test]
    async fn test_refused_connection_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = fetcher(Duration::from_secs(5))
            .fetch(&format!("http://{addr}/"), &[])
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Network(_)));
    }
}
