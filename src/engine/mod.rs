//! Trading engine - price state, validation, execution, tracking, ledger.

pub mod execution;
pub mod ledger;
pub mod order;
pub mod state;
pub mod validate;

pub use execution::ExecutionPipeline;
pub use ledger::Ledger;
pub use order::{OrderRegistry, Subscription};
pub use state::PriceStore;

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::adapter::ExecutionVenue;
use crate::error::Result;
use crate::types::{Order, OrderParams, OrderResult, Side, Symbol, Trade};

/// Facade over the engine components; the surface the presentation layer
/// talks to. Components stay individually constructible for tests.
pub struct Engine {
    prices: Arc<PriceStore>,
    registry: Arc<OrderRegistry>,
    ledger: Arc<Ledger>,
    pipeline: ExecutionPipeline,
}

impl Engine {
    pub fn new(
        prices: Arc<PriceStore>,
        registry: Arc<OrderRegistry>,
        ledger: Arc<Ledger>,
        venue: Arc<dyn ExecutionVenue>,
    ) -> Self {
        let pipeline = ExecutionPipeline::new(prices.clone(), registry.clone(), venue);
        Self {
            prices,
            registry,
            ledger,
            pipeline,
        }
    }

    pub async fn place_order(&self, params: OrderParams) -> Result<OrderResult> {
        self.pipeline.place_order(params).await
    }

    pub fn get_order(&self, order_id: &str) -> Option<Order> {
        self.registry.get(order_id)
    }

    pub fn subscribe_order(
        &self,
        order_id: &str,
        callback: impl Fn(&Order) + Send + Sync + 'static,
    ) -> Subscription {
        self.registry.subscribe(order_id, callback)
    }

    pub fn execute_trade(
        &self,
        symbol: &Symbol,
        side: Side,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<Trade> {
        self.ledger.execute_trade(symbol, side, quantity, price)
    }

    /// Portfolio value marked to the live price store.
    pub fn portfolio_value(&self) -> Decimal {
        self.ledger.portfolio_value(&self.prices.prices())
    }

    /// Portfolio value against an explicit price set.
    pub fn portfolio_value_at(&self, prices: &HashMap<Symbol, Decimal>) -> Decimal {
        self.ledger.portfolio_value(prices)
    }

    pub fn total_profit_loss(&self) -> Decimal {
        self.ledger.total_profit_loss(&self.prices.prices())
    }

    pub fn prices(&self) -> &PriceStore {
        &self.prices
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }
}
