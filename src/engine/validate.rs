//! Order parameter validation - pure checks, no I/O, fail-fast.
//!
//! Market orders are expected to arrive here with their price already
//! resolved from the price store, so every rule below compares against a
//! concrete entry price.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::{OrderParams, OrderType, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("quantity must be greater than zero")]
    NonPositiveQuantity,

    #[error("price is required for limit orders")]
    MissingLimitPrice,

    #[error("price must be greater than zero")]
    NonPositivePrice,

    #[error("entry price is required when attaching conditional orders")]
    MissingEntryPrice,

    #[error("take profit {take_profit} must be above entry {entry} for buy orders")]
    TakeProfitNotAboveEntry { take_profit: Decimal, entry: Decimal },

    #[error("take profit {take_profit} must be below entry {entry} for sell orders")]
    TakeProfitNotBelowEntry { take_profit: Decimal, entry: Decimal },

    #[error("stop loss {stop_loss} must be below entry {entry} for buy orders")]
    StopLossNotBelowEntry { stop_loss: Decimal, entry: Decimal },

    #[error("stop loss {stop_loss} must be above entry {entry} for sell orders")]
    StopLossNotAboveEntry { stop_loss: Decimal, entry: Decimal },

    #[error("stop loss {stop_loss} must be below take profit {take_profit} for buy orders")]
    StopLossNotBelowTakeProfit { stop_loss: Decimal, take_profit: Decimal },

    #[error("stop loss {stop_loss} must be above take profit {take_profit} for sell orders")]
    StopLossNotAboveTakeProfit { stop_loss: Decimal, take_profit: Decimal },
}

pub fn validate_quantity(quantity: Decimal) -> Result<(), ValidationError> {
    if quantity <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveQuantity);
    }
    Ok(())
}

pub fn validate_price(price: Decimal) -> Result<(), ValidationError> {
    if price <= Decimal::ZERO {
        return Err(ValidationError::NonPositivePrice);
    }
    Ok(())
}

pub fn validate_take_profit(
    take_profit: Decimal,
    entry: Decimal,
    side: Side,
) -> Result<(), ValidationError> {
    validate_price(take_profit)?;
    match side {
        Side::Buy if take_profit <= entry => {
            Err(ValidationError::TakeProfitNotAboveEntry { take_profit, entry })
        }
        Side::Sell if take_profit >= entry => {
            Err(ValidationError::TakeProfitNotBelowEntry { take_profit, entry })
        }
        _ => Ok(()),
    }
}

pub fn validate_stop_loss(
    stop_loss: Decimal,
    entry: Decimal,
    side: Side,
) -> Result<(), ValidationError> {
    validate_price(stop_loss)?;
    match side {
        Side::Buy if stop_loss >= entry => {
            Err(ValidationError::StopLossNotBelowEntry { stop_loss, entry })
        }
        Side::Sell if stop_loss <= entry => {
            Err(ValidationError::StopLossNotAboveEntry { stop_loss, entry })
        }
        _ => Ok(()),
    }
}

fn validate_bracket(
    take_profit: Decimal,
    stop_loss: Decimal,
    side: Side,
) -> Result<(), ValidationError> {
    match side {
        Side::Buy if stop_loss >= take_profit => Err(ValidationError::StopLossNotBelowTakeProfit {
            stop_loss,
            take_profit,
        }),
        Side::Sell if stop_loss <= take_profit => Err(ValidationError::StopLossNotAboveTakeProfit {
            stop_loss,
            take_profit,
        }),
        _ => Ok(()),
    }
}

/// Check a full order request. Rules run in a fixed order and the first
/// violation wins; a passing request is internally consistent.
pub fn validate_params(params: &OrderParams) -> Result<(), ValidationError> {
    validate_quantity(params.quantity)?;

    if params.order_type == OrderType::Limit && params.price.is_none() {
        return Err(ValidationError::MissingLimitPrice);
    }

    if let Some(price) = params.price {
        validate_price(price)?;
    }

    match (params.price, params.take_profit, params.stop_loss) {
        (_, None, None) => {}
        (None, _, _) => return Err(ValidationError::MissingEntryPrice),
        (Some(entry), take_profit, stop_loss) => {
            if let Some(tp) = take_profit {
                validate_take_profit(tp, entry, params.side)?;
            }
            if let Some(sl) = stop_loss {
                validate_stop_loss(sl, entry, params.side)?;
            }
            if let (Some(tp), Some(sl)) = (take_profit, stop_loss) {
                validate_bracket(tp, sl, params.side)?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderParams;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn bracket_buy(entry: &str, take_profit: Option<&str>, stop_loss: Option<&str>) -> OrderParams {
        OrderParams {
            take_profit: take_profit.map(d),
            stop_loss: stop_loss.map(d),
            ..OrderParams::limit("BTCUSDT", Side::Buy, d("1"), d(entry))
        }
    }

    #[test]
    fn test_rejects_non_positive_quantity() {
        let params = OrderParams::limit("BTCUSDT", Side::Buy, d("0"), d("100"));
        assert_eq!(
            validate_params(&params),
            Err(ValidationError::NonPositiveQuantity)
        );

        let params = OrderParams::limit("BTCUSDT", Side::Buy, d("-1"), d("100"));
        assert_eq!(
            validate_params(&params),
            Err(ValidationError::NonPositiveQuantity)
        );
    }

    #[test]
    fn test_limit_order_requires_price() {
        let mut params = OrderParams::limit("BTCUSDT", Side::Buy, d("1"), d("100"));
        params.price = None;
        assert_eq!(
            validate_params(&params),
            Err(ValidationError::MissingLimitPrice)
        );
    }

    #[test]
    fn test_rejects_non_positive_price() {
        let params = OrderParams::limit("BTCUSDT", Side::Buy, d("1"), d("0"));
        assert_eq!(
            validate_params(&params),
            Err(ValidationError::NonPositivePrice)
        );
    }

    #[test]
    fn test_market_without_conditions_needs_no_price() {
        let params = OrderParams::market("BTCUSDT", Side::Buy, d("1"));
        assert_eq!(validate_params(&params), Ok(()));
    }

    #[test]
    fn test_conditions_require_entry_price() {
        let mut params = OrderParams::market("BTCUSDT", Side::Buy, d("1"));
        params.take_profit = Some(d("110"));
        assert_eq!(
            validate_params(&params),
            Err(ValidationError::MissingEntryPrice)
        );
    }

    #[test]
    fn test_buy_take_profit_must_exceed_entry() {
        let params = bracket_buy("100", Some("100"), None);
        assert_eq!(
            validate_params(&params),
            Err(ValidationError::TakeProfitNotAboveEntry {
                take_profit: d("100"),
                entry: d("100"),
            })
        );
        assert!(validate_params(&bracket_buy("100", Some("110"), None)).is_ok());
    }

    #[test]
    fn test_sell_take_profit_must_be_below_entry() {
        let mut params = bracket_buy("100", Some("110"), None);
        params.side = Side::Sell;
        assert_eq!(
            validate_params(&params),
            Err(ValidationError::TakeProfitNotBelowEntry {
                take_profit: d("110"),
                entry: d("100"),
            })
        );
    }

    #[test]
    fn test_buy_stop_loss_must_be_below_entry() {
        let params = bracket_buy("100", None, Some("100"));
        assert_eq!(
            validate_params(&params),
            Err(ValidationError::StopLossNotBelowEntry {
                stop_loss: d("100"),
                entry: d("100"),
            })
        );
        assert!(validate_params(&bracket_buy("100", None, Some("90"))).is_ok());
    }

    #[test]
    fn test_sell_stop_loss_must_be_above_entry() {
        let mut params = bracket_buy("100", None, Some("95"));
        params.side = Side::Sell;
        assert_eq!(
            validate_params(&params),
            Err(ValidationError::StopLossNotAboveEntry {
                stop_loss: d("95"),
                entry: d("100"),
            })
        );
    }

    #[test]
    fn test_valid_buy_bracket_passes() {
        let params = bracket_buy("100", Some("110"), Some("90"));
        assert!(validate_params(&params).is_ok());
    }

    #[test]
    fn test_buy_stop_loss_at_or_above_take_profit_rejected() {
        let params = bracket_buy("100", Some("110"), Some("115"));
        assert_eq!(
            validate_params(&params),
            Err(ValidationError::StopLossNotBelowEntry {
                stop_loss: d("115"),
                entry: d("100"),
            })
        );
    }

    #[test]
    fn test_valid_sell_bracket_passes() {
        let mut params = bracket_buy("100", Some("90"), Some("110"));
        params.side = Side::Sell;
        assert!(validate_params(&params).is_ok());
    }

    #[test]
    fn test_leg_checks_run_before_bracket_check() {
        // sell with both legs below entry: the stop-loss leg rule fires
        // before the bracket comparison
        let mut params = bracket_buy("100", Some("95"), Some("96"));
        params.side = Side::Sell;
        assert_eq!(
            validate_params(&params),
            Err(ValidationError::StopLossNotAboveEntry {
                stop_loss: d("96"),
                entry: d("100"),
            })
        );
    }

    #[test]
    fn test_rule_order_quantity_first() {
        let mut params = bracket_buy("0", Some("0"), None);
        params.quantity = d("0");
        assert_eq!(
            validate_params(&params),
            Err(ValidationError::NonPositiveQuantity)
        );
    }
}
