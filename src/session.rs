//! Per-login service container.
//!
//! DESIGN
//! ======
//! A [`Session`] is built once at startup and owns everything a logged-in
//! user needs: the HTTP client, the query cache, the permission snapshot and
//! the notification listener. Nothing is global; tests and the CLI construct
//! their own. [`Session::logout`] tears all of it down so the same session
//! can log in again as someone else.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use permissions::{Manifest, ManifestError, PermissionClient};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use validator::Validate;

use crate::api::reports::ReportApi;
use crate::api::{Resource, ResourceApi};
use crate::cache::QueryCache;
use crate::error::ErrorCode;
use crate::http::{HttpClient, HttpConfig, HttpError, Query, RequestBody};
use crate::notifications::{Notification, NotificationConfig, NotificationListener};

pub const LOGIN_PATH: &str = "/auth/login";
pub const LOGOUT_PATH: &str = "/auth/logout";
pub const MANIFEST_PATH: &str = "/permissions/manifest";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionConfig {
    pub http: HttpConfig,
    pub notifications: NotificationConfig,
}

impl SessionConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self { http: HttpConfig::from_env(), notifications: NotificationConfig::from_env() }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[validate(email)]
    pub email_address: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub user_id: Option<String>,
    /// Unix seconds.
    #[serde(default)]
    pub expires_at: Option<i64>,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("permission manifest rejected: {0}")]
    Manifest(#[from] ManifestError),

    #[error("not logged in")]
    NotAuthenticated,
}

impl ErrorCode for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Http(e) => e.error_code(),
            Self::Manifest(_) => "E_MANIFEST",
            Self::NotAuthenticated => "E_NOT_AUTHENTICATED",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Http(e) if e.retryable())
    }
}

pub struct Session {
    http: Arc<HttpClient>,
    cache: Arc<QueryCache>,
    permissions: RwLock<Option<Arc<PermissionClient>>>,
    notification_config: NotificationConfig,
    listener: Mutex<Option<NotificationListener>>,
}

impl Session {
    /// Construct the HTTP client and an empty cache. No request is made.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Http`] if the HTTP client cannot be built.
    pub fn bootstrap(config: SessionConfig) -> Result<Self, SessionError> {
        let http = HttpClient::new(config.http)?;
        info!(base_url = http.base_url(), "session bootstrapped");
        Ok(Self {
            http: Arc::new(http),
            cache: Arc::new(QueryCache::new()),
            permissions: RwLock::new(None),
            notification_config: config.notifications,
            listener: Mutex::new(None),
        })
    }

    #[must_use]
    pub fn http(&self) -> &Arc<HttpClient> {
        &self.http
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    /// Adopt a token issued elsewhere, e.g. from `TRENOVA_TOKEN`.
    pub fn resume(&self, token: &str) {
        self.http.set_token(token);
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.http.token().is_some()
    }

    /// Log in, store the bearer token and load the permission manifest.
    ///
    /// # Errors
    ///
    /// [`HttpError::Validation`] for malformed credentials (no request is
    /// sent), otherwise login or manifest errors. A failed manifest fetch
    /// leaves the token in place so the caller can retry the fetch.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, SessionError> {
        credentials.validate().map_err(HttpError::from)?;
        let login: LoginResponse = self.http.post(LOGIN_PATH, &RequestBody::json(credentials)?).await?;
        self.http.set_token(&login.token);
        info!(user_id = login.user_id.as_deref().unwrap_or_default(), "logged in");
        self.refresh_permissions().await?;
        Ok(login)
    }

    /// Current permission snapshot, if one has been loaded.
    #[must_use]
    pub fn permissions(&self) -> Option<Arc<PermissionClient>> {
        self.permissions.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Fetch a fresh manifest and replace the snapshot.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotAuthenticated`] without a token, otherwise request
    /// or manifest errors.
    pub async fn refresh_permissions(&self) -> Result<Arc<PermissionClient>, SessionError> {
        if !self.is_authenticated() {
            return Err(SessionError::NotAuthenticated);
        }
        let manifest: Manifest = self.http.get(MANIFEST_PATH, &Query::new()).await?;
        let client = Arc::new(PermissionClient::new(manifest)?);
        info!(
            user_id = %client.manifest().user_id,
            resources = client.manifest().resources.len(),
            expires_at = client.manifest().expires_at,
            "permission manifest loaded"
        );
        *self.permissions.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&client));
        Ok(client)
    }

    /// Return the snapshot, refreshing it first when missing or expired.
    ///
    /// # Errors
    ///
    /// See [`Session::refresh_permissions`].
    pub async fn ensure_permissions(&self) -> Result<Arc<PermissionClient>, SessionError> {
        match self.permissions() {
            Some(client) if !client.is_expired() => Ok(client),
            _ => self.refresh_permissions().await,
        }
    }

    /// Resource client sharing this session's HTTP client and cache.
    #[must_use]
    pub fn resource<T: Resource>(&self) -> ResourceApi<T> {
        ResourceApi::new(Arc::clone(&self.http), Arc::clone(&self.cache))
    }

    #[must_use]
    pub fn reports(&self) -> ReportApi {
        ReportApi::new(Arc::clone(&self.http))
    }

    /// Start (or restart) the notification listener with the current token.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotAuthenticated`] without a token.
    pub async fn start_notifications(&self) -> Result<mpsc::Receiver<Notification>, SessionError> {
        let token = self.http.token().ok_or(SessionError::NotAuthenticated)?;
        self.stop_notifications().await;
        let (listener, rx) = NotificationListener::spawn(self.notification_config.clone(), Some(token));
        *self.lock_listener() = Some(listener);
        Ok(rx)
    }

    pub async fn stop_notifications(&self) {
        let listener = self.lock_listener().take();
        if let Some(listener) = listener {
            listener.shutdown().await;
        }
    }

    /// Best-effort server logout, then drop token, permissions, cache and
    /// notifications. Never fails.
    pub async fn logout(&self) {
        if self.is_authenticated() {
            if let Err(e) = self.http.post::<serde_json::Value>(LOGOUT_PATH, &RequestBody::Empty).await {
                warn!(error = %e, "server logout failed; clearing local session anyway");
            }
        }
        self.stop_notifications().await;
        self.http.clear_token();
        *self.permissions.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.cache.clear();
        info!("logged out");
    }

    fn lock_listener(&self) -> std::sync::MutexGuard<'_, Option<NotificationListener>> {
        self.listener.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;
