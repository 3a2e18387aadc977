//! Simulated execution venue.

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::debug;

use crate::adapter::ExecutionVenue;
use crate::error::Result;
use crate::types::{Order, OrderStatus};

/// Fills every order at its own price after a fixed processing delay.
/// No order book interaction, no partial fills.
pub struct PaperVenue {
    fill_delay: Duration,
}

impl PaperVenue {
    pub fn new(fill_delay: Duration) -> Self {
        Self { fill_delay }
    }
}

#[async_trait]
impl ExecutionVenue for PaperVenue {
    fn name(&self) -> &str {
        "paper"
    }

    async fn submit(&self, order: &mut Order) -> Result<()> {
        tokio::time::sleep(self.fill_delay).await;

        order.status = OrderStatus::Filled;
        order.filled_quantity = order.quantity;
        order.remaining_quantity = Decimal::ZERO;
        order.avg_fill_price = Some(order.price);

        debug!(
            order_id = %order.id,
            symbol = %order.symbol,
            price = %order.price,
            "simulated fill"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrderType, Side, Symbol};

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_submit_fills_at_order_price() {
        let venue = PaperVenue::new(Duration::ZERO);
        let mut order = Order {
            id: "x".to_string(),
            symbol: Symbol::new("BTCUSDT"),
            order_type: OrderType::Limit,
            side: Side::Buy,
            quantity: d("1.5"),
            price: d("42000"),
            status: OrderStatus::Pending,
            created_at: 0,
            filled_quantity: Decimal::ZERO,
            remaining_quantity: d("1.5"),
            avg_fill_price: None,
            is_conditional: false,
            parent_order_id: None,
        };

        venue.submit(&mut order).await.unwrap();

        assert_eq!(order.status, OrderStatus::Filled);
        assert_eq!(order.filled_quantity, d("1.5"));
        assert_eq!(order.remaining_quantity, Decimal::ZERO);
        assert_eq!(order.avg_fill_price, Some(d("42000")));
    }
}
