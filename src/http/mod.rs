//! HTTP client used by every resource API.
//!
//! DESIGN
//! ======
//! One `HttpClient` per session wraps a pooled `reqwest::Client`, the API base
//! URL, a bearer token and a [`RetryPolicy`]. It is constructed explicitly by
//! the session and shared behind an `Arc`; there is no global instance.
//!
//! ERROR HANDLING
//! ==============
//! Non-2xx responses become [`HttpError::Api`] with the parsed problem body.
//! Timeouts and transport failures become [`HttpError::Timeout`] and
//! [`HttpError::Network`]. Idempotent requests are retried with capped
//! exponential backoff while the error is retryable; HTTP 500, 404 and 429
//! are returned immediately.

pub mod body;
pub mod config;
pub mod error;
pub mod query;
pub mod retry;

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use futures_util::{StreamExt, stream};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

pub use body::{Progress, ProgressFn, RequestBody, UploadFile};
pub use config::{HttpConfig, HttpTimeouts};
pub use error::{ApiErrorBody, HttpError, InvalidParam};
pub use query::Query;
pub use retry::RetryPolicy;

use crate::error::ErrorCode;

/// Correlation header; one value per logical request, shared by its retries.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Per-file progress callback for batch uploads: `(file index, progress)`.
pub type BatchProgressFn = Arc<dyn Fn(usize, Progress) + Send + Sync>;

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
    token: RwLock<Option<String>>,
}

impl HttpClient {
    /// Build a client from typed config.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::ClientBuild`] if the TLS backend fails to initialize.
    pub fn new(config: HttpConfig) -> Result<Self, HttpError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| HttpError::ClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url,
            retry: config.retry,
            token: RwLock::new(None),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn set_token(&self, token: &str) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.to_owned());
    }

    pub fn clear_token(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Resolve `path` against the base URL and append `query`.
    ///
    /// Absolute `http(s)://` paths are used as-is, which lets callers follow
    /// `next` links and download URLs returned by the API. Requests to another
    /// origin go out without the bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::InvalidUrl`] when the result does not parse.
    pub fn url(&self, path: &str, query: &Query) -> Result<Url, HttpError> {
        let raw = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_owned()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        };
        let mut url = Url::parse(&raw).map_err(|e| HttpError::InvalidUrl(format!("{raw}: {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.pairs());
        }
        Ok(url)
    }

    /// Whether `url` points at the API host; the bearer token is only sent there.
    fn same_origin(&self, url: &Url) -> bool {
        Url::parse(&self.base_url).is_ok_and(|base| base.origin() == url.origin())
    }

    // -------------------------------------------------------------------------
    // typed verbs
    // -------------------------------------------------------------------------

    /// `GET path?query` and decode the JSON body.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::send`]; also [`HttpError::Decode`] for a body that
    /// does not match `T`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &Query) -> Result<T, HttpError> {
        let resp = self.send(Method::GET, path, query, &RequestBody::Empty, None).await?;
        decode_json(resp).await
    }

    /// `GET` raw bytes, e.g. a generated report file.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::send`].
    pub async fn get_bytes(&self, path: &str, query: &Query) -> Result<Vec<u8>, HttpError> {
        let resp = self.send(Method::GET, path, query, &RequestBody::Empty, None).await?;
        let bytes = resp.bytes().await.map_err(HttpError::from_reqwest)?;
        Ok(bytes.to_vec())
    }

    /// # Errors
    ///
    /// See [`HttpClient::get`].
    pub async fn post<T: DeserializeOwned>(&self, path: &str, body: &RequestBody) -> Result<T, HttpError> {
        let resp = self.send(Method::POST, path, &Query::new(), body, None).await?;
        decode_json(resp).await
    }

    /// # Errors
    ///
    /// See [`HttpClient::get`].
    pub async fn put<T: DeserializeOwned>(&self, path: &str, body: &RequestBody) -> Result<T, HttpError> {
        let resp = self.send(Method::PUT, path, &Query::new(), body, None).await?;
        decode_json(resp).await
    }

    /// # Errors
    ///
    /// See [`HttpClient::get`].
    pub async fn patch<T: DeserializeOwned>(&self, path: &str, body: &RequestBody) -> Result<T, HttpError> {
        let resp = self.send(Method::PATCH, path, &Query::new(), body, None).await?;
        decode_json(resp).await
    }

    /// `DELETE path`, ignoring any response body.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::send`].
    pub async fn delete(&self, path: &str) -> Result<(), HttpError> {
        self.send(Method::DELETE, path, &Query::new(), &RequestBody::Empty, None)
            .await
            .map(drop)
    }

    // -------------------------------------------------------------------------
    // uploads
    // -------------------------------------------------------------------------

    /// `POST` a body, streaming multipart files with progress when
    /// `on_progress` is set and sending them in one piece otherwise.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::get`].
    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &RequestBody,
        on_progress: Option<ProgressFn>,
    ) -> Result<T, HttpError> {
        let resp = self
            .send(Method::POST, path, &Query::new(), body, on_progress.as_ref())
            .await?;
        decode_json(resp).await
    }

    /// Upload each file as its own request, at most `concurrency` at a time.
    /// Results come back in input order.
    pub async fn upload_batch<T: DeserializeOwned>(
        &self,
        path: &str,
        files: Vec<UploadFile>,
        concurrency: usize,
        on_progress: Option<BatchProgressFn>,
    ) -> Vec<Result<T, HttpError>> {
        let uploads = files.into_iter().enumerate().map(|(index, file)| {
            let progress = on_progress.as_ref().map(|cb| {
                let cb = Arc::clone(cb);
                Arc::new(move |p: Progress| cb(index, p)) as ProgressFn
            });
            async move {
                let body = RequestBody::Multipart { fields: Vec::new(), files: vec![file] };
                self.upload(path, &body, progress).await
            }
        });

        stream::iter(uploads).buffered(concurrency.max(1)).collect().await
    }

    // -------------------------------------------------------------------------
    // core
    // -------------------------------------------------------------------------

    /// Send a request, retrying per the policy, and return the 2xx response.
    ///
    /// # Errors
    ///
    /// - [`HttpError::Api`] for a non-2xx response
    /// - [`HttpError::Timeout`] / [`HttpError::Network`] once retries are exhausted
    /// - [`HttpError::InvalidUrl`] for an unparsable path
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        query: &Query,
        body: &RequestBody,
        progress: Option<&ProgressFn>,
    ) -> Result<reqwest::Response, HttpError> {
        let url = self.url(path, query)?;
        let attempts = if self.retry.allows_method(&method) { self.retry.max_attempts() } else { 1 };
        // Same id on every attempt so the server can collapse retries.
        let request_id = Uuid::new_v4().to_string();

        let mut attempt = 1;
        loop {
            let mut req = self
                .http
                .request(method.clone(), url.clone())
                .header(REQUEST_ID_HEADER, &request_id);
            if let Some(token) = self.token().filter(|_| self.same_origin(&url)) {
                req = req.bearer_auth(token);
            }
            req = body.apply(req, progress);

            debug!(%method, %url, %request_id, attempt, "sending request");
            let err = match req.send().await {
                Ok(resp) if resp.status().is_success() => return Ok(resp),
                Ok(resp) => api_error(resp).await,
                Err(e) => HttpError::from_reqwest(e),
            };

            if !err.retryable() || attempt >= attempts {
                debug!(%method, %url, %request_id, code = err.error_code(), "request failed");
                return Err(err);
            }

            let delay = self.retry.backoff(attempt - 1);
            warn!(
                error = %err,
                %method,
                %url,
                %request_id,
                attempt,
                total = attempts,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "request failed; retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

async fn api_error(resp: reqwest::Response) -> HttpError {
    let status = resp.status().as_u16();
    let text = resp.text().await.unwrap_or_default();
    HttpError::Api { status, body: ApiErrorBody::parse(&text) }
}

/// Decode a JSON response; an empty body decodes as `null` so `()` and
/// `Option<T>` work for 204 responses.
async fn decode_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, HttpError> {
    let text = resp.text().await.map_err(HttpError::from_reqwest)?;
    let text = if text.trim().is_empty() { "null" } else { text.as_str() };
    serde_json::from_str(text).map_err(|e| HttpError::Decode(e.to_string()))
}
