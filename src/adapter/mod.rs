//! Execution venue abstraction.
//!
//! The pipeline drives orders through this trait so the simulated venue
//! can be swapped for a live exchange adapter without touching validation
//! or ledger logic.

pub mod paper;

pub use paper::PaperVenue;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Order;

#[async_trait]
pub trait ExecutionVenue: Send + Sync {
    /// Venue name (e.g. "paper")
    fn name(&self) -> &str;

    /// Drive one order to a terminal state, mutating it in place.
    async fn submit(&self, order: &mut Order) -> Result<()>;
}
