//! Order submission interface and execution reports.

use crate::types::{Price, Quantity, Side, Symbol};

pub type OrderId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    Rejected,
}

#[derive(Debug, Clone, Copy)]
pub struct ExecutionReport {
    pub order_id: OrderId,
    pub symbol: Symbol,
    pub side: Side,
    pub filled_qty: Quantity,
    pub price: Price,
    pub status: OrderStatus,
}

/// External venue connectivity, abstracted so the engine can be driven by
/// test doubles without network I/O. A concrete exchange REST/WS adapter
/// is out of scope here.
pub trait OrderSink: Send {
    fn submit(&mut self, symbol: Symbol, side: Side, qty: Quantity, limit_price: Price) -> OrderId;
    fn cancel(&mut self, order_id: OrderId);

    /// Drain any execution reports that have arrived since the last poll.
    /// The engine calls this once per ingress tick; implementations that
    /// receive reports asynchronously should buffer them internally.
    fn poll_reports(&mut self) -> Vec<ExecutionReport>;
}

/// Immediately "fills" every submitted order at the limit price. Used both
/// as the paper-trading sink in `--paper-mode` and as a test double that
/// exercises the full engine pipeline without network I/O.
#[derive(Default)]
pub struct PaperOrderSink {
    next_id: OrderId,
    pending: Vec<ExecutionReport>,
}

impl OrderSink for PaperOrderSink {
    fn submit(&mut self, symbol: Symbol, side: Side, qty: Quantity, limit_price: Price) -> OrderId {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.push(ExecutionReport {
            order_id: id,
            symbol,
            side,
            filled_qty: qty,
            price: limit_price,
            status: OrderStatus::Filled,
        });
        id
    }

    fn cancel(&mut self, _order_id: OrderId) {}

    fn poll_reports(&mut self) -> Vec<ExecutionReport> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
pub mod test_support {
    pub use super::PaperOrderSink as ImmediateFillSink;
}
