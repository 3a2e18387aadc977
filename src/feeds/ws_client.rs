//! Streaming price feed.
//!
//! One multiplexed WebSocket session covers the whole configured symbol
//! set. Parsed ticker frames land in the price store; anything else is
//! dropped. Transport faults reconnect with capped exponential backoff
//! until the attempt budget is spent, after which the feed surfaces a
//! persistent error and stops.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use serde::Deserialize;
use tokio::sync::watch;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

use crate::engine::state::PriceStore;
use crate::error::{Error, Result};
use crate::types::{Quote, Symbol};

/// Application-level liveness ping, sent on a fixed cadence to keep the
/// session from idling out.
const HEARTBEAT_FRAME: &str = r#"{"method":"ping"}"#;

#[derive(Debug, Clone)]
pub struct WsFeedConfig {
    pub ws_url: String,
    pub symbols: Vec<Symbol>,
    pub heartbeat: Duration,
    pub reconnect_base: Duration,
    pub reconnect_cap: Duration,
    pub max_reconnect_attempts: u32,
}

/// Connection life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Closed,
}

/// Shutdown signal for a running [`TickerFeed`]. Dropping the handle also
/// closes the feed.
pub struct FeedHandle {
    shutdown_tx: watch::Sender<bool>,
}

impl FeedHandle {
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

enum SessionEnd {
    Shutdown,
    Transport(String),
}

pub struct TickerFeed {
    config: WsFeedConfig,
    store: Arc<PriceStore>,
    state: RwLock<FeedState>,
    shutdown: watch::Receiver<bool>,
}

impl TickerFeed {
    pub fn new(config: WsFeedConfig, store: Arc<PriceStore>) -> (Self, FeedHandle) {
        let (shutdown_tx, shutdown) = watch::channel(false);
        (
            Self {
                config,
                store,
                state: RwLock::new(FeedState::Disconnected),
                shutdown,
            },
            FeedHandle { shutdown_tx },
        )
    }

    pub fn state(&self) -> FeedState {
        *self.state.read()
    }

    fn set_state(&self, state: FeedState) {
        *self.state.write() = state;
    }

    /// Drive the feed until shutdown or reconnect exhaustion.
    ///
    /// Returns `Ok(())` on orderly shutdown and `FeedExhausted` once the
    /// retry budget is spent; the exhaustion is also surfaced through the
    /// price store's error flag so stale reads degrade instead of crash.
    pub async fn run(&self) -> Result<()> {
        let mut shutdown = self.shutdown.clone();
        let mut attempts: u32 = 0;

        loop {
            match self.session(&mut shutdown, &mut attempts).await {
                Ok(SessionEnd::Shutdown) => {
                    self.set_state(FeedState::Closed);
                    info!("price feed closed");
                    return Ok(());
                }
                Ok(SessionEnd::Transport(reason)) => {
                    warn!(%reason, "price feed connection lost");
                }
                Err(e) => warn!("price feed connection failed: {e}"),
            }

            attempts += 1;
            if attempts > self.config.max_reconnect_attempts {
                let err = Error::FeedExhausted(self.config.max_reconnect_attempts);
                self.store.set_error(Some(err.to_string()));
                self.set_state(FeedState::Disconnected);
                return Err(err);
            }

            let delay = reconnect_delay(
                self.config.reconnect_base,
                self.config.reconnect_cap,
                attempts,
            );
            self.set_state(FeedState::Reconnecting);
            info!(
                attempt = attempts,
                delay_ms = delay.as_millis() as u64,
                "reconnecting price feed"
            );
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.changed() => {
                    self.set_state(FeedState::Closed);
                    info!("price feed closed");
                    return Ok(());
                }
            }
        }
    }

    async fn session(
        &self,
        shutdown: &mut watch::Receiver<bool>,
        attempts: &mut u32,
    ) -> Result<SessionEnd> {
        if *shutdown.borrow() {
            return Ok(SessionEnd::Shutdown);
        }

        self.set_state(FeedState::Connecting);
        let raw = self.stream_url();
        let url =
            Url::parse(&raw).map_err(|e| Error::FeedTransport(format!("invalid url {raw}: {e}")))?;
        debug!(%url, "connecting to price feed");

        let (ws, _) = connect_async(url.as_str())
            .await
            .map_err(|e| Error::FeedTransport(e.to_string()))?;

        // Established: the retry budget starts over.
        *attempts = 0;
        self.set_state(FeedState::Connected);
        self.store.set_error(None);
        self.store.set_loading(false);
        info!(symbols = self.config.symbols.len(), "price feed connected");

        let (mut write, mut read) = ws.split();
        let mut heartbeat = tokio::time::interval_at(
            tokio::time::Instant::now() + self.config.heartbeat,
            self.config.heartbeat,
        );

        loop {
            tokio::select! {
                message = read.next() => match message {
                    Some(Ok(Message::Text(text))) => match parse_ticker_frame(&text) {
                        Some(quote) => self.store.upsert(quote),
                        None => debug!("dropped unrecognized frame"),
                    },
                    Some(Ok(Message::Ping(payload))) => {
                        write
                            .send(Message::Pong(payload))
                            .await
                            .map_err(|e| Error::FeedTransport(e.to_string()))?;
                    }
                    Some(Ok(Message::Close(_))) => {
                        return Ok(SessionEnd::Transport("closed by server".to_string()));
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Ok(SessionEnd::Transport(e.to_string())),
                    None => return Ok(SessionEnd::Transport("stream ended".to_string())),
                },
                _ = heartbeat.tick() => {
                    write
                        .send(Message::Text(HEARTBEAT_FRAME.to_string()))
                        .await
                        .map_err(|e| Error::FeedTransport(e.to_string()))?;
                }
                _ = shutdown.changed() => {
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(SessionEnd::Shutdown);
                }
            }
        }
    }

    /// Combined-stream endpoint covering every configured symbol.
    fn stream_url(&self) -> String {
        let streams: Vec<String> = self
            .config
            .symbols
            .iter()
            .map(|s| format!("{}@ticker", s.as_str().to_lowercase()))
            .collect();
        format!("{}/stream?streams={}", self.config.ws_url, streams.join("/"))
    }
}

/// `min(base * 2^(attempt-1), cap)`, attempts counted from 1.
pub(crate) fn reconnect_delay(base: Duration, cap: Duration, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(30);
    base.saturating_mul(1u32 << exponent).min(cap)
}

#[derive(Debug, Deserialize)]
struct StreamFrame {
    stream: String,
    data: TickerPayload,
}

#[derive(Debug, Deserialize)]
struct TickerPayload {
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "c")]
    last_price: String,
    #[serde(rename = "P")]
    change_pct: String,
    #[serde(rename = "v")]
    volume: String,
    #[serde(rename = "h")]
    high: String,
    #[serde(rename = "l")]
    low: String,
}

/// Extract a quote from one combined-stream frame. Anything that is not a
/// well-formed ticker frame yields `None` and is dropped by the caller.
pub(crate) fn parse_ticker_frame(text: &str) -> Option<Quote> {
    let frame: StreamFrame = serde_json::from_str(text).ok()?;
    if !frame.stream.ends_with("@ticker") {
        return None;
    }
    Some(Quote {
        symbol: Symbol::new(frame.data.symbol),
        price: frame.data.last_price.parse().ok()?,
        change_pct: frame.data.change_pct.parse().ok()?,
        volume: frame.data.volume.parse().ok()?,
        high: frame.data.high.parse().ok()?,
        low: frame.data.low.parse().ok()?,
        updated_at: chrono::Utc::now(),
    })
}
