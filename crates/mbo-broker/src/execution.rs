use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use mbo_schemas::{Trade, TradeOutcome};

/// External collaborator (spec §6.2): the machine's outputs are *logical*
/// decisions (entries, stop changes, exits); a live executor consumes them
/// to place real orders. The core never blocks on execution confirmation —
/// these calls are notifications, not a request/response the session
/// waits on.
#[async_trait]
pub trait OrderExecutionProvider: Send + Sync {
    async fn on_trade_opened(&self, trade: &Trade);
    async fn on_stop_updated(&self, trade_id: &str, new_stop: i64);
    async fn on_trade_closed(&self, trade_id: &str, outcome: &TradeOutcome);
}

/// Discards every notification. Used for backtests, where there is nothing
/// to execute against.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullExecutionProvider;

#[async_trait]
impl OrderExecutionProvider for NullExecutionProvider {
    async fn on_trade_opened(&self, _trade: &Trade) {}
    async fn on_stop_updated(&self, _trade_id: &str, _new_stop: i64) {}
    async fn on_trade_closed(&self, _trade_id: &str, _outcome: &TradeOutcome) {}
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaperOrder {
    pub trade_id: String,
    pub entry_price: i64,
    pub current_stop: i64,
    pub closed: bool,
}

/// Deterministic in-memory ledger, keyed by trade id so replaying the same
/// session twice produces the same ledger contents (spec §8 invariant 8).
/// No randomness, no timestamps of its own — it only mirrors what the
/// machine already decided.
#[derive(Default)]
pub struct PaperExecutionProvider {
    orders: Mutex<BTreeMap<String, PaperOrder>>,
}

impl PaperExecutionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn orders(&self) -> Vec<PaperOrder> {
        self.orders
            .lock()
            .expect("paper ledger lock poisoned")
            .values()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl OrderExecutionProvider for PaperExecutionProvider {
    async fn on_trade_opened(&self, trade: &Trade) {
        let mut orders = self.orders.lock().expect("paper ledger lock poisoned");
        orders.insert(
            trade.id.clone(),
            PaperOrder {
                trade_id: trade.id.clone(),
                entry_price: trade.entry_price,
                current_stop: trade.current_stop,
                closed: false,
            },
        );
    }

    async fn on_stop_updated(&self, trade_id: &str, new_stop: i64) {
        let mut orders = self.orders.lock().expect("paper ledger lock poisoned");
        if let Some(order) = orders.get_mut(trade_id) {
            order.current_stop = new_stop;
        }
    }

    async fn on_trade_closed(&self, trade_id: &str, _outcome: &TradeOutcome) {
        let mut orders = self.orders.lock().expect("paper ledger lock poisoned");
        if let Some(order) = orders.get_mut(trade_id) {
            order.closed = true;
        }
    }
}
