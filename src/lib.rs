//! papertrade - simulated cryptocurrency trading engine.
//!
//! Live market data streams into a process-wide price store; simulated
//! orders are validated, filled after a fixed delay, and settled against
//! a virtual ledger of cash, positions, and trade history.

pub mod adapter;
pub mod config;
pub mod engine;
pub mod error;
pub mod feeds;
pub mod types;

pub use engine::Engine;
pub use error::{Error, Result};
pub use types::*;
