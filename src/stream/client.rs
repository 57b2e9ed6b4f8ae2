//! Reconnecting WebSocket ingress client.
//!
//! Owns one exchange connection, handles ping/pong/close frames, reconnects
//! with exponential backoff on any disconnect or stale-data timeout, and
//! forwards parsed events to the caller through a channel rather than a
//! callback, since the engine glue already runs an async select loop.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

pub use crate::stream::parse::StreamEvent;
use crate::stream::parse::{build_stream_path, parse_message};
use crate::stream::session::{BackoffCalculator, SessionConfig, SessionState};

pub const MAINNET_HOST: &str = "stream.binance.com:9443";
pub const TESTNET_HOST: &str = "testnet.binance.vision:443";

pub type ConnectCallback = Box<dyn Fn(bool) + Send + Sync>;
pub type ErrorCallback = Box<dyn Fn(&str) + Send + Sync>;
pub type ReconnectCallback = Box<dyn Fn(u32, bool) + Send + Sync>;

fn now_ns() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos() as u64).unwrap_or(0)
}

pub struct StreamClientConfig {
    pub host: String,
    pub streams: Vec<String>,
    pub session: SessionConfig,
    pub pin_core: Option<usize>,
}

impl StreamClientConfig {
    pub fn mainnet(streams: Vec<String>) -> Self {
        Self { host: MAINNET_HOST.to_string(), streams, session: SessionConfig::default(), pin_core: None }
    }
}

/// Shared connection-health state, cloneable so callers can poll
/// `is_healthy`/request `force_reconnect` from outside the `run` future.
#[derive(Clone)]
pub struct StreamHealth {
    state: Arc<Mutex<SessionState>>,
    connected: Arc<AtomicBool>,
    last_data_ns: Arc<AtomicU64>,
    reconnect_requested: Arc<AtomicBool>,
}

impl StreamHealth {
    fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState::Disconnected)),
            connected: Arc::new(AtomicBool::new(false)),
            last_data_ns: Arc::new(AtomicU64::new(0)),
            reconnect_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    fn set_state(&self, s: SessionState) {
        *self.state.lock().unwrap() = s;
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock().unwrap()
    }

    /// True iff connected and a message arrived within `timeout_seconds`.
    pub fn is_healthy(&self, timeout_seconds: u64) -> bool {
        if !self.connected.load(Ordering::Relaxed) {
            return false;
        }
        let last = self.last_data_ns.load(Ordering::Relaxed);
        now_ns().saturating_sub(last) < timeout_seconds * 1_000_000_000
    }

    /// Request that the current connection be torn down and re-established,
    /// regardless of its apparent health. Picked up at the next read.
    pub fn force_reconnect(&self) {
        self.reconnect_requested.store(true, Ordering::Relaxed);
    }

    fn take_reconnect_request(&self) -> bool {
        self.reconnect_requested.swap(false, Ordering::Relaxed)
    }
}

/// A reconnecting ingress connection. `run` drives the connection until
/// `shutdown` is requested, emitting events on `events`.
pub struct StreamClient {
    config: StreamClientConfig,
    shutdown: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<StreamEvent>,
    health: StreamHealth,
    on_connect: Option<ConnectCallback>,
    on_error: Option<ErrorCallback>,
    on_reconnect: Option<ReconnectCallback>,
}

impl StreamClient {
    pub fn new(config: StreamClientConfig) -> (Self, mpsc::UnboundedReceiver<StreamEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = Self {
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
            events: tx,
            health: StreamHealth::new(),
            on_connect: None,
            on_error: None,
            on_reconnect: None,
        };
        (client, rx)
    }

    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    /// A cloneable handle for polling connection health or forcing a
    /// reconnect from outside the task driving `run`.
    pub fn health_handle(&self) -> StreamHealth {
        self.health.clone()
    }

    pub fn set_connect_callback(&mut self, cb: impl Fn(bool) + Send + Sync + 'static) {
        self.on_connect = Some(Box::new(cb));
    }

    pub fn set_error_callback(&mut self, cb: impl Fn(&str) + Send + Sync + 'static) {
        self.on_error = Some(Box::new(cb));
    }

    pub fn set_reconnect_callback(&mut self, cb: impl Fn(u32, bool) + Send + Sync + 'static) {
        self.on_reconnect = Some(Box::new(cb));
    }

    /// Pin the calling OS thread to a core, best-effort. Failures are logged
    /// and otherwise ignored; pinning is a latency optimization, not a
    /// correctness requirement.
    fn pin_current_thread(core_id: usize) {
        match core_affinity::get_core_ids() {
            Some(core_ids) => match core_ids.get(core_id) {
                Some(&target) => {
                    if !core_affinity::set_for_current(target) {
                        warn!(core_id, "failed to set CPU affinity");
                    }
                }
                None => warn!(core_id, "requested core id out of range"),
            },
            None => warn!("core_affinity::get_core_ids() returned None"),
        }
    }

    /// Run the reconnect loop until shutdown. Each iteration connects,
    /// streams until the socket closes, errors, or goes stale, then backs off.
    pub async fn run(self) -> Result<()> {
        if let Some(core_id) = self.config.pin_core {
            Self::pin_current_thread(core_id);
        }

        let mut backoff = BackoffCalculator::new(self.config.session.clone());
        let mut first_attempt = true;

        while !self.shutdown.load(Ordering::Relaxed) {
            self.health.set_state(SessionState::Connecting);
            let result = self.run_connection().await;

            self.health.connected.store(false, Ordering::Relaxed);
            self.health.set_state(SessionState::Disconnected);
            if let Some(cb) = &self.on_connect {
                cb(false);
            }

            let success = result.is_ok();
            if let Err(e) = &result {
                warn!(error = %e, attempt = backoff.attempt(), "ingress connection failed");
                if let Some(cb) = &self.on_error {
                    cb(&e.to_string());
                }
            }

            if !first_attempt {
                if let Some(cb) = &self.on_reconnect {
                    cb(backoff.attempt(), success);
                }
            }
            first_attempt = false;

            if success {
                // Clean close or stale timeout: reconnect immediately without
                // growing backoff unless the disconnect was itself a failure.
                backoff.reset();
            } else {
                let delay = backoff.next_backoff();
                tokio::time::sleep(delay).await;
            }
        }

        Ok(())
    }

    async fn run_connection(&self) -> Result<()> {
        let path = build_stream_path(&self.config.streams);
        let url = format!("wss://{}{}", self.config.host, path);

        info!(url = %url, "connecting to ingress stream");
        let (ws_stream, _) = tokio_tungstenite::connect_async(&url).await.context("websocket connect failed")?;
        info!("ingress stream connected");

        self.health.connected.store(true, Ordering::Relaxed);
        self.health.last_data_ns.store(now_ns(), Ordering::Relaxed);
        self.health.set_state(SessionState::Connected);
        if let Some(cb) = &self.on_connect {
            cb(true);
        }

        let (mut write, mut read) = ws_stream.split();
        let stale_timeout = Duration::from_millis(self.config.session.stale_data_timeout_ms);

        while !self.shutdown.load(Ordering::Relaxed) {
            if self.health.take_reconnect_request() {
                debug!("force_reconnect requested, tearing down connection");
                return Ok(());
            }

            let msg = match tokio::time::timeout(stale_timeout, read.next()).await {
                Ok(Some(Ok(m))) => m,
                Ok(Some(Err(e))) => return Err(e).context("websocket read error"),
                Ok(None) => return Ok(()),
                Err(_elapsed) => {
                    self.health.set_state(SessionState::Stale);
                    warn!(timeout_ms = stale_timeout.as_millis(), "no data received, forcing reconnect");
                    return Err(anyhow::anyhow!("stale connection: no message within {:?}", stale_timeout));
                }
            };

            self.health.last_data_ns.store(now_ns(), Ordering::Relaxed);
            self.health.set_state(SessionState::Receiving);

            match msg {
                Message::Text(text) => {
                    if let Some(event) = parse_message(&text) {
                        if self.events.send(event).is_err() {
                            debug!("event receiver dropped, stopping connection");
                            return Ok(());
                        }
                    }
                }
                Message::Binary(_) => {}
                Message::Ping(payload) => {
                    write.send(Message::Pong(payload)).await.context("pong send failed")?;
                }
                Message::Pong(_) => {}
                Message::Close(frame) => {
                    debug!(?frame, "server closed ingress stream");
                    return Ok(());
                }
                Message::Frame(_) => {}
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_health_handle_is_unhealthy() {
        let health = StreamHealth::new();
        assert!(!health.is_healthy(30));
        assert_eq!(health.state(), SessionState::Disconnected);
    }

    #[test]
    fn connected_with_recent_data_is_healthy() {
        let health = StreamHealth::new();
        health.connected.store(true, Ordering::Relaxed);
        health.last_data_ns.store(now_ns(), Ordering::Relaxed);
        assert!(health.is_healthy(30));
    }

    #[test]
    fn connected_with_stale_data_is_unhealthy() {
        let health = StreamHealth::new();
        health.connected.store(true, Ordering::Relaxed);
        health.last_data_ns.store(now_ns() - 60 * 1_000_000_000, Ordering::Relaxed);
        assert!(!health.is_healthy(30));
    }

    #[test]
    fn force_reconnect_sets_and_clears_the_flag_once() {
        let health = StreamHealth::new();
        assert!(!health.take_reconnect_request());
        health.force_reconnect();
        assert!(health.take_reconnect_request());
        assert!(!health.take_reconnect_request());
    }
}
