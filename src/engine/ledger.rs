//! Position & ledger engine - the only authority over cash balance,
//! positions, and trade history.
//!
//! Every mutation happens under one write lock, so readers never observe
//! a trade half-applied. A rejected trade leaves the ledger untouched.

use std::collections::HashMap;
use std::path::Path;

use chrono::Utc;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{Position, Side, Symbol, Trade};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LedgerState {
    balance: Decimal,
    positions: HashMap<Symbol, Position>,
    /// Most-recent-first
    trades: Vec<Trade>,
}

pub struct Ledger {
    seed_balance: Decimal,
    inner: RwLock<LedgerState>,
}

impl Ledger {
    pub fn new(seed_balance: Decimal) -> Self {
        Self {
            seed_balance,
            inner: RwLock::new(LedgerState {
                balance: seed_balance,
                positions: HashMap::new(),
                trades: Vec::new(),
            }),
        }
    }

    /// Settle one fill against the ledger.
    ///
    /// Sells require an existing position covering the quantity; buys
    /// require the cash balance to cover `price * quantity` (equality is
    /// enough). On success the balance, position, and trade history move
    /// in one step and the recorded trade is returned.
    pub fn execute_trade(
        &self,
        symbol: &Symbol,
        side: Side,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<Trade> {
        let total = price * quantity;
        let mut state = self.inner.write();

        match side {
            Side::Sell => {
                let held = state
                    .positions
                    .get(symbol)
                    .map(|p| p.quantity)
                    .unwrap_or(Decimal::ZERO);
                if held < quantity {
                    return Err(Error::InsufficientAssets {
                        held,
                        requested: quantity,
                    });
                }
            }
            Side::Buy => {
                if state.balance < total {
                    return Err(Error::InsufficientFunds {
                        available: state.balance,
                        required: total,
                    });
                }
            }
        }

        match side {
            Side::Buy => {
                state.balance -= total;
                let position = state
                    .positions
                    .entry(symbol.clone())
                    .or_insert_with(|| Position::flat(symbol.clone()));
                position.total_cost += total;
                position.quantity += quantity;
                position.average_price = position.total_cost / position.quantity;
            }
            Side::Sell => {
                state.balance += total;
                let drained = if let Some(position) = state.positions.get_mut(symbol) {
                    position.quantity -= quantity;
                    if position.quantity > Decimal::ZERO {
                        // Cost basis keeps the entry average; only the
                        // remaining quantity is rebased.
                        position.total_cost = position.average_price * position.quantity;
                        false
                    } else {
                        true
                    }
                } else {
                    false
                };
                if drained {
                    state.positions.remove(symbol);
                }
            }
        }

        let trade = Trade {
            id: Uuid::new_v4().to_string(),
            symbol: symbol.clone(),
            side,
            quantity,
            price,
            total,
            timestamp: Utc::now().timestamp_millis(),
        };
        state.trades.insert(0, trade.clone());

        info!(
            symbol = %symbol,
            side = %side,
            %quantity,
            %price,
            balance = %state.balance,
            "trade settled"
        );
        Ok(trade)
    }

    pub fn balance(&self) -> Decimal {
        self.inner.read().balance
    }

    pub fn position(&self, symbol: &Symbol) -> Option<Position> {
        self.inner.read().positions.get(symbol).cloned()
    }

    pub fn positions(&self) -> Vec<Position> {
        self.inner.read().positions.values().cloned().collect()
    }

    /// Trade history, most recent first.
    pub fn trades(&self) -> Vec<Trade> {
        self.inner.read().trades.clone()
    }

    /// Cash plus the mark-to-market value of all held positions.
    /// A symbol with no quote contributes zero.
    pub fn portfolio_value(&self, prices: &HashMap<Symbol, Decimal>) -> Decimal {
        let state = self.inner.read();
        let positions_value: Decimal = state
            .positions
            .values()
            .map(|p| p.quantity * prices.get(&p.symbol).copied().unwrap_or(Decimal::ZERO))
            .sum();
        state.balance + positions_value
    }

    pub fn total_profit_loss(&self, prices: &HashMap<Symbol, Decimal>) -> Decimal {
        self.portfolio_value(prices) - self.seed_balance
    }

    /// Write the ledger snapshot to a local JSON file. The format is an
    /// implementation detail, not a compatibility surface.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&*self.inner.read())?;
        std::fs::write(path, json)?;
        debug!(path = %path.display(), "ledger snapshot saved");
        Ok(())
    }

    /// Restore a ledger from a snapshot file, or start fresh with the seed
    /// balance when the file does not exist.
    pub fn load(path: &Path, seed_balance: Decimal) -> Result<Self> {
        if !path.is_file() {
            return Ok(Self::new(seed_balance));
        }
        let content = std::fs::read_to_string(path)?;
        let state: LedgerState = serde_json::from_str(&content)?;
        info!(path = %path.display(), balance = %state.balance, "ledger snapshot restored");
        Ok(Self {
            seed_balance,
            inner: RwLock::new(state),
        })
    }
}
