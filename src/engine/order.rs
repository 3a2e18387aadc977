//! Order tracking registry - central table of every order ever created,
//! plus per-order update subscriptions.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{Order, OrderUpdate};

type Listener = Arc<dyn Fn(&Order) + Send + Sync>;
type ListenerMap = HashMap<String, Vec<(u64, Listener)>>;

pub struct OrderRegistry {
    orders: RwLock<HashMap<String, Order>>,
    listeners: Arc<RwLock<ListenerMap>>,
    next_token: AtomicU64,
}

/// Guard for one order-update subscription. Dropping it (or calling
/// [`Subscription::unsubscribe`]) removes the callback deterministically.
pub struct Subscription {
    listeners: Arc<RwLock<ListenerMap>>,
    order_id: String,
    token: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut map = self.listeners.write();
        if let Some(list) = map.get_mut(&self.order_id) {
            list.retain(|(token, _)| *token != self.token);
            if list.is_empty() {
                map.remove(&self.order_id);
            }
        }
    }
}

impl OrderRegistry {
    pub fn new() -> Self {
        Self {
            orders: RwLock::new(HashMap::new()),
            listeners: Arc::new(RwLock::new(HashMap::new())),
            next_token: AtomicU64::new(0),
        }
    }

    /// Insert a freshly created order. Ids are unique; re-inserting an
    /// existing id is an error.
    pub fn add(&self, order: Order) -> Result<()> {
        let mut orders = self.orders.write();
        if orders.contains_key(&order.id) {
            return Err(Error::DuplicateOrder(order.id));
        }
        orders.insert(order.id.clone(), order);
        Ok(())
    }

    pub fn get(&self, order_id: &str) -> Option<Order> {
        self.orders.read().get(order_id).cloned()
    }

    pub fn all(&self) -> Vec<Order> {
        self.orders.read().values().cloned().collect()
    }

    /// Merge a status change into a tracked order and notify that order's
    /// subscribers in subscription order. Unknown ids are ignored.
    pub fn update(&self, update: OrderUpdate) {
        let updated = {
            let mut orders = self.orders.write();
            let Some(order) = orders.get_mut(&update.order_id) else {
                debug!(order_id = %update.order_id, "update for unknown order dropped");
                return;
            };
            order.status = update.status;
            if let Some(filled) = update.filled {
                order.filled_quantity = filled;
            }
            if let Some(avg) = update.avg_fill_price {
                order.avg_fill_price = Some(avg);
            }
            order.remaining_quantity = order.quantity - order.filled_quantity;
            order.clone()
        };

        // Listeners run outside the order-table lock so a callback may
        // query the registry or drop its own subscription.
        let listeners: Vec<Listener> = {
            let map = self.listeners.read();
            map.get(&updated.id)
                .map(|list| list.iter().map(|(_, l)| l.clone()).collect())
                .unwrap_or_default()
        };
        for listener in listeners {
            listener(&updated);
        }
    }

    /// Register a callback for every update to one order.
    pub fn subscribe(
        &self,
        order_id: &str,
        callback: impl Fn(&Order) + Send + Sync + 'static,
    ) -> Subscription {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .write()
            .entry(order_id.to_string())
            .or_default()
            .push((token, Arc::new(callback)));
        Subscription {
            listeners: self.listeners.clone(),
            order_id: order_id.to_string(),
            token,
        }
    }
}

impl Default for OrderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
