//! Low-level HTTP send wrapper: composes auth headers, timeout, and the
//! retry policy around a single `reqwest` call. Grounded on
//! `llm/deepseek/src/llm.rs`'s send flow (`client.request(..).headers(..).json(..).send().await?.text().await?`
//! then `serde_json::from_str`), generalized from a single chat endpoint
//! to arbitrary Chroma REST calls.

use crate::auth::AuthProvider;
use crate::error::{Error, Result};
use crate::retry::{Idempotency, RetryPolicy};
use crate::wire::ErrorBody;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Shared HTTP transport: one `reqwest::Client`, one auth provider, one
/// retry policy, reused across every request a `ChromaClient` issues.
#[derive(Clone)]
pub struct Transport {
    http: Client,
    auth: Arc<dyn AuthProvider>,
    retry: RetryPolicy,
}

impl Transport {
    /// Build a transport around an existing `reqwest::Client`.
    pub fn new(http: Client, auth: Arc<dyn AuthProvider>, retry: RetryPolicy) -> Self {
        Transport { http, auth, retry }
    }

    /// Issue a request with a JSON body, retrying per `idempotency` and
    /// this transport's [`RetryPolicy`].
    pub async fn send_json<B, T>(
        &self,
        method: Method,
        url: url::Url,
        body: Option<&B>,
        idempotency: Idempotency,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut attempt = 1;
        loop {
            let mut headers = reqwest::header::HeaderMap::new();
            self.auth.apply(&mut headers);
            let mut request = self.http.request(method.clone(), url.clone()).headers(headers);
            if let Some(body) = body {
                request = request.json(body);
            }

            tracing::debug!(method = %method, url = %crate::error::redacted_url(&url), attempt, "sending request");
            let result = self.execute(request).await;

            match result {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let retry_after = match &err {
                        Error::RateLimited { retry_after } => *retry_after,
                        _ => None,
                    };
                    if !self.retry.should_retry(&err, attempt, idempotency) {
                        return Err(err);
                    }
                    let delay = self.retry.delay_for(attempt, retry_after);
                    tracing::warn!(attempt, ?delay, error = %err, "retrying request");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn execute<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            let text = response.text().await?;
            if text.is_empty() {
                return serde_json::from_str("null").map_err(Error::from);
            }
            return serde_json::from_str(&text).map_err(Error::from);
        }
        self.handle_error_status(status, response).await
    }

    async fn handle_error_status<T>(&self, status: StatusCode, response: reqwest::Response) -> Result<T> {
        let headers = response.headers().clone();
        let text = response.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
        let message = body.into_message(&text);
        if status.as_u16() == 429 {
            return Err(Error::RateLimited { retry_after: response_retry_after(&headers) });
        }
        Err(Error::from_status(status, message))
    }
}

fn response_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
}
