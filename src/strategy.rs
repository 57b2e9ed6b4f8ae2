//! Strategy trait: a pure function of the current symbol slot state to a
//! trading decision. Concrete signal generators (mean-reversion, momentum,
//! OFI, etc.) are out of scope; this is the call contract the engine drives.

use crate::symbol_table::SymbolSlot;
use crate::types::{Price, Quantity, Side, Symbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Hold,
    Order { side: Side, quantity: Quantity, limit_price: Price },
}

pub trait Strategy: Send {
    /// Inspect the updated slot for `symbol` and decide whether to act.
    /// Called synchronously on the ingress thread; must not block or
    /// allocate.
    fn on_quote(&mut self, symbol: Symbol, slot: &SymbolSlot) -> Signal;

    /// Notified after a fill the engine attributed to this strategy's
    /// own signal. Default no-op for strategies that don't track state.
    fn on_fill(&mut self, _symbol: Symbol, _side: Side, _qty: Quantity, _price: Price) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysHold;
    impl Strategy for AlwaysHold {
        fn on_quote(&mut self, _symbol: Symbol, _slot: &SymbolSlot) -> Signal {
            Signal::Hold
        }
    }

    #[test]
    fn always_hold_never_signals_an_order() {
        let mut s = AlwaysHold;
        let slot = SymbolSlot::default();
        assert_eq!(s.on_quote(0, &slot), Signal::Hold);
    }
}
