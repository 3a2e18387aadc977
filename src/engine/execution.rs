//! Order execution pipeline - turns validated parameters into tracked
//! orders and drives them through simulated fills.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{error, info};
use uuid::Uuid;

use crate::adapter::ExecutionVenue;
use crate::engine::order::OrderRegistry;
use crate::engine::state::PriceStore;
use crate::engine::validate;
use crate::error::{Error, Result};
use crate::types::{Order, OrderParams, OrderResult, OrderStatus, OrderType};

pub struct ExecutionPipeline {
    prices: Arc<PriceStore>,
    registry: Arc<OrderRegistry>,
    venue: Arc<dyn ExecutionVenue>,
}

impl ExecutionPipeline {
    pub fn new(
        prices: Arc<PriceStore>,
        registry: Arc<OrderRegistry>,
        venue: Arc<dyn ExecutionVenue>,
    ) -> Self {
        Self {
            prices,
            registry,
            venue,
        }
    }

    /// Place one order: resolve the execution price, validate, create the
    /// main order plus any conditional legs, fill them in sequence, and
    /// register everything with the tracking registry.
    ///
    /// A failed placement registers nothing.
    pub async fn place_order(&self, params: OrderParams) -> Result<OrderResult> {
        let mut params = params;
        let entry_price = match params.order_type {
            OrderType::Market => self
                .prices
                .price_of(&params.symbol)
                .ok_or_else(|| Error::PriceUnavailable(params.symbol.clone()))?,
            OrderType::Limit => params
                .price
                .ok_or(validate::ValidationError::MissingLimitPrice)?,
        };
        params.price = Some(entry_price);

        validate::validate_params(&params)?;

        let mut main_order = new_order(&params, entry_price);
        let mut take_profit_order = params
            .take_profit
            .map(|trigger| conditional_order(&params, trigger, &main_order.id));
        let mut stop_loss_order = params
            .stop_loss
            .map(|trigger| conditional_order(&params, trigger, &main_order.id));

        self.fill(&mut main_order).await?;
        if let Some(order) = take_profit_order.as_mut() {
            self.fill(order).await?;
        }
        if let Some(order) = stop_loss_order.as_mut() {
            self.fill(order).await?;
        }

        self.registry.add(main_order.clone())?;
        if let Some(order) = &take_profit_order {
            self.registry.add(order.clone())?;
        }
        if let Some(order) = &stop_loss_order {
            self.registry.add(order.clone())?;
        }

        let legs = u8::from(take_profit_order.is_some()) + u8::from(stop_loss_order.is_some());
        info!(
            order_id = %main_order.id,
            symbol = %main_order.symbol,
            side = %main_order.side,
            quantity = %main_order.quantity,
            price = %main_order.price,
            conditionals = legs,
            "order placed"
        );

        Ok(OrderResult {
            main_order,
            take_profit_order,
            stop_loss_order,
        })
    }

    async fn fill(&self, order: &mut Order) -> Result<()> {
        self.venue.submit(order).await.map_err(|e| {
            // Surface the partially constructed order for diagnostics; it
            // is never registered as active.
            error!(
                order_id = %order.id,
                symbol = %order.symbol,
                status = ?order.status,
                "fill failed: {e}"
            );
            Error::Execution(format!("order {} failed to fill: {e}", order.id))
        })
    }
}

fn new_order(params: &OrderParams, price: Decimal) -> Order {
    Order {
        id: Uuid::new_v4().to_string(),
        symbol: params.symbol.clone(),
        order_type: params.order_type,
        side: params.side,
        quantity: params.quantity,
        price,
        status: OrderStatus::Pending,
        created_at: Utc::now().timestamp_millis(),
        filled_quantity: Decimal::ZERO,
        remaining_quantity: params.quantity,
        avg_fill_price: None,
        is_conditional: false,
        parent_order_id: None,
    }
}

/// A conditional leg closes the main order's exposure: same symbol and
/// quantity, opposite side, limit type at the trigger price.
fn conditional_order(params: &OrderParams, trigger: Decimal, parent_id: &str) -> Order {
    Order {
        id: Uuid::new_v4().to_string(),
        symbol: params.symbol.clone(),
        order_type: OrderType::Limit,
        side: params.side.opposite(),
        quantity: params.quantity,
        price: trigger,
        status: OrderStatus::Pending,
        created_at: Utc::now().timestamp_millis(),
        filled_quantity: Decimal::ZERO,
        remaining_quantity: params.quantity,
        avg_fill_price: None,
        is_conditional: true,
        parent_order_id: Some(parent_id.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::PaperVenue;
    use crate::engine::validate::ValidationError;
    use crate::types::{Quote, Side, Symbol};
    use std::time::Duration;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn pipeline_with_quote(symbol: &str, price: &str) -> ExecutionPipeline {
        let prices = Arc::new(PriceStore::new());
        prices.upsert(Quote {
            symbol: Symbol::new(symbol),
            price: d(price),
            change_pct: Decimal::ZERO,
            volume: Decimal::ZERO,
            high: d(price),
            low: d(price),
            updated_at: chrono::Utc::now(),
        });
        ExecutionPipeline::new(
            prices,
            Arc::new(OrderRegistry::new()),
            Arc::new(PaperVenue::new(Duration::ZERO)),
        )
    }

    #[tokio::test]
    async fn test_bracket_order_creates_conditional_legs() {
        let pipeline = pipeline_with_quote("BTCUSDT", "100");
        let params = OrderParams {
            take_profit: Some(d("110")),
            stop_loss: Some(d("90")),
            ..OrderParams::market("BTCUSDT", Side::Buy, d("1"))
        };

        let result = pipeline.place_order(params).await.unwrap();

        assert_eq!(result.main_order.status, OrderStatus::Filled);
        assert_eq!(result.main_order.price, d("100"));
        assert!(!result.main_order.is_conditional);

        let tp = result.take_profit_order.unwrap();
        assert_eq!(tp.side, Side::Sell);
        assert_eq!(tp.order_type, OrderType::Limit);
        assert_eq!(tp.price, d("110"));
        assert!(tp.is_conditional);
        assert_eq!(tp.parent_order_id.as_deref(), Some(result.main_order.id.as_str()));

        let sl = result.stop_loss_order.unwrap();
        assert_eq!(sl.side, Side::Sell);
        assert_eq!(sl.price, d("90"));
        assert_eq!(sl.parent_order_id.as_deref(), Some(result.main_order.id.as_str()));
        assert_ne!(tp.id, sl.id);
    }

    #[tokio::test]
    async fn test_market_order_resolves_store_price() {
        let pipeline = pipeline_with_quote("ETHUSDT", "2500");
        let result = pipeline
            .place_order(OrderParams::market("ETHUSDT", Side::Buy, d("2")))
            .await
            .unwrap();

        assert_eq!(result.main_order.price, d("2500"));
        assert_eq!(result.main_order.avg_fill_price, Some(d("2500")));
        assert_eq!(result.main_order.filled_quantity, d("2"));
        assert_eq!(result.main_order.remaining_quantity, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_market_order_without_quote_fails() {
        let pipeline = pipeline_with_quote("BTCUSDT", "100");
        let err = pipeline
            .place_order(OrderParams::market("DOGEUSDT", Side::Buy, d("1")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PriceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_invalid_params_register_nothing() {
        let prices = Arc::new(PriceStore::new());
        let registry = Arc::new(OrderRegistry::new());
        let pipeline = ExecutionPipeline::new(
            prices,
            registry.clone(),
            Arc::new(PaperVenue::new(Duration::ZERO)),
        );

        let err = pipeline
            .place_order(OrderParams::limit("BTCUSDT", Side::Buy, d("0"), d("100")))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::NonPositiveQuantity)
        ));
        assert!(registry.all().is_empty());
    }

    #[tokio::test]
    async fn test_placed_orders_are_registered() {
        let prices = Arc::new(PriceStore::new());
        prices.upsert(Quote {
            symbol: Symbol::new("BTCUSDT"),
            price: d("100"),
            change_pct: Decimal::ZERO,
            volume: Decimal::ZERO,
            high: d("100"),
            low: d("100"),
            updated_at: chrono::Utc::now(),
        });
        let registry = Arc::new(OrderRegistry::new());
        let pipeline = ExecutionPipeline::new(
            prices,
            registry.clone(),
            Arc::new(PaperVenue::new(Duration::ZERO)),
        );

        let params = OrderParams {
            take_profit: Some(d("110")),
            ..OrderParams::market("BTCUSDT", Side::Buy, d("1"))
        };
        let result = pipeline.place_order(params).await.unwrap();

        assert_eq!(registry.all().len(), 2);
        let tracked = registry.get(&result.main_order.id).unwrap();
        assert_eq!(tracked.status, OrderStatus::Filled);
    }
}
