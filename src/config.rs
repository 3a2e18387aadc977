//! Runtime configuration.
//!
//! Loads from `papertrade.toml` (or `config.toml`) at the project root.
//! Every field has a default, so the engine runs with no config file at all.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::feeds::ws_client::WsFeedConfig;
use crate::types::Symbol;

/// Streaming and request/response market-data endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedSection {
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    #[serde(default = "default_rest_url")]
    pub rest_url: String,
    /// Instruments covered by the single multiplexed stream
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
    /// Liveness ping cadence
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
    #[serde(default = "default_reconnect_base_ms")]
    pub reconnect_base_ms: u64,
    #[serde(default = "default_reconnect_cap_ms")]
    pub reconnect_cap_ms: u64,
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
}

/// Simulated trading parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct TradingSection {
    /// Starting cash balance in quote currency (USDT)
    #[serde(default = "default_seed_balance")]
    pub seed_balance: f64,
    /// Artificial processing delay for simulated fills
    #[serde(default = "default_fill_delay_ms")]
    pub fill_delay_ms: u64,
    /// Max candles per historical fetch
    #[serde(default = "default_kline_limit")]
    pub kline_limit: u32,
    /// Max levels per order book side
    #[serde(default = "default_depth_limit")]
    pub depth_limit: usize,
}

/// Local ledger persistence.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LedgerSection {
    /// Snapshot file; no persistence when unset
    #[serde(default)]
    pub persist_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub feed: FeedSection,
    #[serde(default)]
    pub trading: TradingSection,
    #[serde(default)]
    pub ledger: LedgerSection,
}

fn default_ws_url() -> String {
    "wss://stream.binance.com:9443".to_string()
}
fn default_rest_url() -> String {
    "https://api.binance.com/api".to_string()
}
fn default_symbols() -> Vec<String> {
    ["BTCUSDT", "ETHUSDT", "SOLUSDT", "ADAUSDT"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_heartbeat_secs() -> u64 {
    30
}
fn default_reconnect_base_ms() -> u64 {
    1000
}
fn default_reconnect_cap_ms() -> u64 {
    10_000
}
fn default_max_reconnect_attempts() -> u32 {
    5
}
fn default_seed_balance() -> f64 {
    10_000.0
}
fn default_fill_delay_ms() -> u64 {
    500
}
fn default_kline_limit() -> u32 {
    100
}
fn default_depth_limit() -> usize {
    20
}

impl Default for FeedSection {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            rest_url: default_rest_url(),
            symbols: default_symbols(),
            heartbeat_secs: default_heartbeat_secs(),
            reconnect_base_ms: default_reconnect_base_ms(),
            reconnect_cap_ms: default_reconnect_cap_ms(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
        }
    }
}

impl Default for TradingSection {
    fn default() -> Self {
        Self {
            seed_balance: default_seed_balance(),
            fill_delay_ms: default_fill_delay_ms(),
            kline_limit: default_kline_limit(),
            depth_limit: default_depth_limit(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            feed: FeedSection::default(),
            trading: TradingSection::default(),
            ledger: LedgerSection::default(),
        }
    }
}

impl AppConfig {
    /// Load config from the given TOML file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
    }

    /// Load from the default locations, falling back to built-in defaults.
    pub fn load_default() -> Self {
        let candidates = [
            "papertrade.toml",
            "config.toml",
            concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml"),
        ];

        for path in &candidates {
            if Path::new(path).is_file() {
                match Self::load(Path::new(path)) {
                    Ok(cfg) => {
                        tracing::info!("loaded config from {path}");
                        return cfg;
                    }
                    Err(e) => tracing::warn!("ignoring {path}: {e}"),
                }
            }
        }

        tracing::warn!("no config file found, using defaults");
        Self::default()
    }

    /// Feed-manager view of the config.
    pub fn ws_feed_config(&self) -> WsFeedConfig {
        WsFeedConfig {
            ws_url: self.feed.ws_url.clone(),
            symbols: self.feed.symbols.iter().map(|s| Symbol::new(s.as_str())).collect(),
            heartbeat: Duration::from_secs(self.feed.heartbeat_secs),
            reconnect_base: Duration::from_millis(self.feed.reconnect_base_ms),
            reconnect_cap: Duration::from_millis(self.feed.reconnect_cap_ms),
            max_reconnect_attempts: self.feed.max_reconnect_attempts,
        }
    }

    /// Seed balance as an exact decimal amount.
    pub fn seed_balance(&self) -> Decimal {
        Decimal::try_from(self.trading.seed_balance).unwrap_or(Decimal::ZERO)
    }

    pub fn fill_delay(&self) -> Duration {
        Duration::from_millis(self.trading.fill_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_missing_sections() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.feed.max_reconnect_attempts, 5);
        assert_eq!(cfg.feed.symbols.len(), 4);
        assert_eq!(cfg.trading.fill_delay_ms, 500);
        assert!(cfg.ledger.persist_path.is_none());
    }

    #[test]
    fn test_partial_override() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [feed]
            symbols = ["BTCUSDT"]
            max_reconnect_attempts = 3

            [trading]
            seed_balance = 2500.0
            "#,
        )
        .unwrap();
        assert_eq!(cfg.feed.symbols, vec!["BTCUSDT"]);
        assert_eq!(cfg.feed.max_reconnect_attempts, 3);
        assert_eq!(cfg.seed_balance(), Decimal::from(2500));
        assert_eq!(cfg.feed.heartbeat_secs, 30);
    }
}
