//! Error hierarchy for the trading engine.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::engine::validate::ValidationError;
use crate::types::Symbol;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Order parameters failed a validation rule
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Market order with no quote in the price store
    #[error("no market price available for {0}")]
    PriceUnavailable(Symbol),

    /// Ledger rejected a buy
    #[error("insufficient funds: available {available}, required {required}")]
    InsufficientFunds { available: Decimal, required: Decimal },

    /// Ledger rejected a sell
    #[error("insufficient assets: held {held}, requested {requested}")]
    InsufficientAssets { held: Decimal, requested: Decimal },

    /// Feed connection dropped or failed to establish
    #[error("feed transport: {0}")]
    FeedTransport(String),

    /// Reconnect budget spent; manual restart required
    #[error("feed unavailable after {0} reconnect attempts")]
    FeedExhausted(u32),

    /// Simulated fill failed mid-flight
    #[error("execution: {0}")]
    Execution(String),

    /// Registry insert with an id that is already tracked
    #[error("order {0} is already tracked")]
    DuplicateOrder(String),

    /// HTTP/network errors
    #[error("network: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("config: {0}")]
    Config(String),
}
