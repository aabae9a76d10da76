//! HTTP client with built-in retry logic.

use anyhow::{Context, Result, bail};
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use sha2::{Digest, Sha256};

use super::retry::{RetryPolicy, check_status, is_retryable};

/// HTTP client that retries transient failures according to a [`RetryPolicy`].
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    policy: RetryPolicy,
}

impl HttpClient {
    /// Wrap a reqwest Client using the default retry policy.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn inner(&self) -> &Client {
        &self.client
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// GET with query parameters, returning the body as text.
    #[tracing::instrument(skip(self, query))]
    pub async fn get_text_with_query(&self, url: &str, query: &[(&str, &str)]) -> Result<String> {
        debug!("GET {} with query {:?}...", url, query);

        self.with_retry("GET", || async {
            let response = self
                .client
                .get(url)
                .query(query)
                .send()
                .await
                .context("Failed to send request")?;

            let response = check_status(response)?;

            response.text().await.context("Failed to read response body")
        })
        .await
    }

    /// Probe `url` with a HEAD request.
    ///
    /// `Ok(false)` means the host answered 404. Other failures are errors.
    #[tracing::instrument(skip(self))]
    pub async fn exists(&self, url: &str) -> Result<bool> {
        debug!("HEAD {}...", url);

        self.with_retry("HEAD", || async {
            let response = self
                .client
                .head(url)
                .send()
                .await
                .context("Failed to send probe request")?;

            if response.status() == StatusCode::NOT_FOUND {
                return Ok(false);
            }

            check_status(response)?;
            Ok(true)
        })
        .await
    }

    /// Stream `url` and return the lowercase hex SHA-256 of its body.
    ///
    /// Fails when fewer bytes arrive than the response announced.
    #[tracing::instrument(skip(self))]
    pub async fn sha256(&self, url: &str) -> Result<String> {
        debug!("Hashing {}...", url);
        self.with_retry("Hash download", || self.sha256_once(url)).await
    }

    async fn sha256_once(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to start download request")?;

        let mut response = check_status(response)?;
        let expected = response.content_length();

        let mut hasher = Sha256::new();
        let mut downloaded: u64 = 0;

        while let Some(chunk) = response
            .chunk()
            .await
            .context("Failed to read chunk from download stream")?
        {
            hasher.update(&chunk);
            downloaded += chunk.len() as u64;
        }

        check_complete(expected, downloaded)?;

        debug!(
            "Hashed {:.2} MB from {}",
            downloaded as f64 / (1024.0 * 1024.0),
            url
        );

        Ok(hex::encode(hasher.finalize()))
    }

    async fn with_retry<F, Fut, T>(&self, operation_name: &str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let attempts = self.policy.attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if !is_retryable(&e) => {
                    debug!("{}: non-retryable error: {}", operation_name, e);
                    return Err(e);
                }
                Err(e) if attempt >= attempts => {
                    return Err(e.context(format!(
                        "{}: failed after {} attempt(s)",
                        operation_name, attempts
                    )));
                }
                Err(e) => {
                    warn!(
                        "{}: attempt {}/{} failed ({:#}), retrying in {}ms...",
                        operation_name,
                        attempt,
                        attempts,
                        e,
                        self.policy.delay.as_millis()
                    );
                    tokio::time::sleep(self.policy.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Fail when the body length differs from the announced `Content-Length`.
fn check_complete(expected: Option<u64>, downloaded: u64) -> Result<()> {
    if let Some(expected) = expected
        && expected != downloaded
    {
        bail!(
            "Download truncated: expected {} bytes, received {}",
            expected,
            downloaded
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::NonRetryableError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn fast_client() -> HttpClient {
        HttpClient::new(Client::new()).with_policy(RetryPolicy {
            attempts: 3,
            delay: Duration::ZERO,
        })
    }

    #[tokio::test]
    async fn test_get_text_with_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/releases?page=1&per_page=10")
            .with_status(200)
            .with_body(r#"["a", "b"]"#)
            .create_async()
            .await;

        let body = fast_client()
            .get_text_with_query(
                &format!("{}/releases", server.url()),
                &[("page", "1"), ("per_page", "10")],
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(body, r#"["a", "b"]"#);
    }

    #[tokio::test]
    async fn test_get_text_not_found_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let err = fast_client()
            .get_text_with_query(&format!("{}/missing", server.url()), &[])
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(err.downcast_ref::<NonRetryableError>().is_some());
    }

    #[tokio::test]
    async fn test_exists_true() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("HEAD", "/asset.zip")
            .with_status(200)
            .create_async()
            .await;

        let found = fast_client()
            .exists(&format!("{}/asset.zip", server.url()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(found);
    }

    #[tokio::test]
    async fn test_exists_false_on_404() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("HEAD", "/asset.zip")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let found = fast_client()
            .exists(&format!("{}/asset.zip", server.url()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(!found);
    }

    #[tokio::test]
    async fn test_exists_error_on_forbidden() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("HEAD", "/asset.zip")
            .with_status(403)
            .create_async()
            .await;

        let result = fast_client()
            .exists(&format!("{}/asset.zip", server.url()))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_sha256_of_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/asset.zip")
            .with_status(200)
            .with_body("hello world\n")
            .create_async()
            .await;

        let hash = fast_client()
            .sha256(&format!("{}/asset.zip", server.url()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(
            hash,
            "a948904f2f0f479b8f8197694b30184b0d2ed1c1cd2a1ec0fb85d299a192a447"
        );
    }

    #[test]
    fn test_check_complete() {
        assert!(check_complete(None, 12).is_ok());
        assert!(check_complete(Some(12), 12).is_ok());
        let err = check_complete(Some(4096), 12).unwrap_err();
        assert!(err.to_string().contains("Download truncated"));
    }

    #[tokio::test]
    async fn test_sha256_short_body_is_error() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await.unwrap();
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\n0123456789")
                .await
                .unwrap();
            socket.shutdown().await.unwrap();
        });

        let client = HttpClient::new(Client::new()).with_policy(RetryPolicy::none());
        let result = client.sha256(&format!("http://{}/asset.zip", addr)).await;

        server.await.unwrap();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_sha256_retries_server_errors_then_gives_up() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/asset.zip")
            .with_status(500)
            .expect(3)
            .create_async()
            .await;

        let result = fast_client()
            .sha256(&format!("{}/asset.zip", server.url()))
            .await;

        mock.assert_async().await;
        let err = result.unwrap_err();
        assert!(format!("{:#}", err).contains("failed after 3 attempt(s)"));
    }

    #[tokio::test]
    async fn test_with_retry_recovers() {
        let client = fast_client();
        let calls = Arc::new(AtomicUsize::new(0));

        let result = client
            .with_retry("test", || {
                let calls = Arc::clone(&calls);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(anyhow::anyhow!("connection reset"))
                    } else {
                        Ok("ok")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_policy_none_attempts_once() {
        let client = HttpClient::new(Client::new()).with_policy(RetryPolicy::none());
        let calls = Arc::new(AtomicUsize::new(0));

        let result: Result<()> = client
            .with_retry("test", || {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(anyhow::anyhow!("connection timeout"))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_with_retry_stops_on_non_retryable() {
        let client = fast_client();
        let calls = Arc::new(AtomicUsize::new(0));

        let result: Result<()> = client
            .with_retry("test", || {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(anyhow::Error::from(NonRetryableError::NotFound("x".into())))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
