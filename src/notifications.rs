//! Live notification feed over WebSocket.
//!
//! DESIGN
//! ======
//! [`NotificationListener::spawn`] starts one background task that owns the
//! socket. Parsed notifications go out on a bounded mpsc channel; frames that
//! are not notifications are logged and skipped.
//!
//! When the socket drops or a connect fails the task waits and reconnects.
//! The wait doubles per consecutive failure from `reconnect_base` up to
//! `reconnect_max`, and falls back to `reconnect_base` once a connection
//! succeeds. A down server therefore costs one attempt per `reconnect_max`,
//! not a busy loop.
//!
//! The task exits on [`NotificationListener::shutdown`] or when the receiver
//! is dropped. Either way the sender is dropped, so the receiver sees `None`.

use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use crate::config::{env_parse, env_string};

pub const DEFAULT_WS_URL: &str = "ws://127.0.0.1:8000/ws/notifications";
pub const DEFAULT_RECONNECT_BASE_MS: u64 = 1_000;
pub const DEFAULT_RECONNECT_MAX_MS: u64 = 30_000;
pub const CHANNEL_CAPACITY: usize = 64;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

// =============================================================================
// CONFIG
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotificationConfig {
    pub url: String,
    pub reconnect_base: Duration,
    pub reconnect_max: Duration,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_WS_URL.to_owned(),
            reconnect_base: Duration::from_millis(DEFAULT_RECONNECT_BASE_MS),
            reconnect_max: Duration::from_millis(DEFAULT_RECONNECT_MAX_MS),
        }
    }
}

impl NotificationConfig {
    /// Build config from environment variables.
    ///
    /// - `TRENOVA_WS_URL` (default `ws://127.0.0.1:8000/ws/notifications`)
    /// - `TRENOVA_WS_RECONNECT_BASE_MS` (default 1000)
    /// - `TRENOVA_WS_RECONNECT_MAX_MS` (default 30000)
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            url: env_string("TRENOVA_WS_URL", DEFAULT_WS_URL),
            reconnect_base: Duration::from_millis(env_parse(
                "TRENOVA_WS_RECONNECT_BASE_MS",
                DEFAULT_RECONNECT_BASE_MS,
            )),
            reconnect_max: Duration::from_millis(env_parse("TRENOVA_WS_RECONNECT_MAX_MS", DEFAULT_RECONNECT_MAX_MS)),
        }
    }

    /// Wait before the next connect after `failures` consecutive failures.
    #[must_use]
    pub fn reconnect_delay(&self, failures: u32) -> Duration {
        let factor = 2_u32.saturating_pow(failures.min(16));
        self.reconnect_base.saturating_mul(factor).min(self.reconnect_max)
    }

    fn connect_url(&self, token: Option<&str>) -> Result<Url, String> {
        let mut url = Url::parse(&self.url).map_err(|e| e.to_string())?;
        if let Some(token) = token {
            url.query_pairs_mut().append_pair("token", token);
        }
        Ok(url)
    }
}

// =============================================================================
// NOTIFICATION
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    /// `info`, `success`, `warning`, `error` or a server-defined kind.
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub link: Option<String>,
    /// Unix seconds.
    #[serde(default)]
    pub created_at: i64,
}

fn default_kind() -> String {
    "info".to_owned()
}

// =============================================================================
// LISTENER
// =============================================================================

enum PumpEnd {
    Closed,
    Shutdown,
    ReceiverGone,
}

pub struct NotificationListener {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl NotificationListener {
    /// Start the background connection task. `token` is passed as the
    /// `token` query parameter.
    #[must_use]
    pub fn spawn(config: NotificationConfig, token: Option<String>) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run(config, token, tx, shutdown_rx));
        (Self { shutdown, task }, rx)
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop the task and wait for it to close the socket.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "notification task ended abnormally");
        }
    }
}

async fn run(
    config: NotificationConfig,
    token: Option<String>,
    tx: mpsc::Sender<Notification>,
    mut shutdown: watch::Receiver<bool>,
) {
    let url = match config.connect_url(token.as_deref()) {
        Ok(url) => url,
        Err(e) => {
            warn!(error = %e, url = %config.url, "invalid notification URL; listener not started");
            return;
        }
    };

    let mut failures: u32 = 0;
    loop {
        if *shutdown.borrow() {
            break;
        }

        let connected = tokio::select! {
            _ = shutdown.changed() => break,
            res = connect_async(url.as_str()) => res,
        };

        match connected {
            Ok((socket, _)) => {
                info!(url = %config.url, "notifications connected");
                failures = 0;
                match pump(socket, &tx, &mut shutdown).await {
                    PumpEnd::Shutdown | PumpEnd::ReceiverGone => break,
                    PumpEnd::Closed => {}
                }
            }
            Err(e) => {
                warn!(error = %e, url = %config.url, failures, "notification connect failed");
            }
        }

        let delay = config.reconnect_delay(failures);
        failures = failures.saturating_add(1);
        warn!(
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "notifications disconnected; reconnecting"
        );
        tokio::select! {
            _ = shutdown.changed() => break,
            () = tokio::time::sleep(delay) => {}
        }
    }
    debug!("notification listener stopped");
}

async fn pump(mut socket: Socket, tx: &mpsc::Sender<Notification>, shutdown: &mut watch::Receiver<bool>) -> PumpEnd {
    loop {
        let msg = tokio::select! {
            _ = shutdown.changed() => {
                let _ = socket.close(None).await;
                return PumpEnd::Shutdown;
            }
            msg = socket.next() => msg,
        };

        match msg {
            Some(Ok(Message::Text(text))) => match serde_json::from_str::<Notification>(text.as_str()) {
                Ok(notification) => {
                    debug!(id = %notification.id, kind = %notification.kind, "notification received");
                    if tx.send(notification).await.is_err() {
                        let _ = socket.close(None).await;
                        return PumpEnd::ReceiverGone;
                    }
                }
                Err(e) => debug!(error = %e, "ignoring non-notification frame"),
            },
            Some(Ok(Message::Close(_))) | None => return PumpEnd::Closed,
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                warn!(error = %e, "notification stream error");
                return PumpEnd::Closed;
            }
        }
    }
}

#[cfg(test)]
#[path = "notifications_test.rs"]
mod notifications_test;
