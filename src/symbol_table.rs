//! Fixed-capacity, dense-indexed symbol table.
//!
//! A hash-map lookup plus a mutex acquire costs roughly 100ns on commodity
//! hardware; a bounds-checked array index costs roughly 1ns. The ingress
//! thread only ever touches `SymbolTable` through `lookup`/`update`/`id_for`
//! once a symbol is registered, so those paths must stay in the 1ns regime.
//! Registration itself (`register`) is not hot and is allowed to allocate.

use std::collections::HashMap;

use crate::types::{Price, Quantity, Symbol, INVALID_PRICE};

/// Symbols beyond this index are silently ignored rather than tracked; the
/// table is sized to exceed any realistic trading universe by 10x or more.
pub const MAX_SYMBOLS: usize = 10_000;

const TICKER_LEN: usize = 16;

/// Per-symbol hot state. Zero-initialized until `register` sets `active`.
#[derive(Debug, Clone, Copy)]
pub struct SymbolSlot {
    pub active: bool,
    ticker: [u8; TICKER_LEN],
    ticker_len: u8,
    pub last_bid: Price,
    pub last_ask: Price,
    pub last_bid_qty: Quantity,
    pub last_ask_qty: Quantity,
    pub position: i64,
    pub notional: i64,
    pub last_fill_price: Price,
}

impl Default for SymbolSlot {
    fn default() -> Self {
        Self {
            active: false,
            ticker: [0; TICKER_LEN],
            ticker_len: 0,
            last_bid: INVALID_PRICE,
            last_ask: INVALID_PRICE,
            last_bid_qty: 0,
            last_ask_qty: 0,
            position: 0,
            notional: 0,
            last_fill_price: 0,
        }
    }
}

impl SymbolSlot {
    #[inline]
    pub fn ticker(&self) -> &str {
        // SAFETY: only ASCII ticker bytes are ever written by `register`.
        unsafe { std::str::from_utf8_unchecked(&self.ticker[..self.ticker_len as usize]) }
    }

    #[inline]
    pub fn has_quote(&self) -> bool {
        self.last_bid != INVALID_PRICE && self.last_ask != INVALID_PRICE
    }
}

/// Error returned by symbol registration (startup path only, never hot).
#[derive(Debug, Clone)]
pub enum RegistryError {
    CapacityExceeded,
    DuplicateTicker(String),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::CapacityExceeded => write!(f, "symbol table at capacity ({MAX_SYMBOLS})"),
            RegistryError::DuplicateTicker(t) => write!(f, "ticker already registered: {t}"),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Pre-allocated, dense-indexed symbol state plus the registration-time
/// ticker -> id map. Owned exclusively by the ingress thread; see
/// SPEC_FULL.md §5 for the single-writer concurrency model.
pub struct SymbolTable {
    slots: Box<[SymbolSlot; MAX_SYMBOLS]>,
    ids: HashMap<String, Symbol>,
    next_id: Symbol,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            slots: Box::new([SymbolSlot::default(); MAX_SYMBOLS]),
            ids: HashMap::new(),
            next_id: 0,
        }
    }

    /// Assign a dense id to `ticker`. Not on the hot path.
    pub fn register(&mut self, ticker: &str) -> Result<Symbol, RegistryError> {
        if let Some(&id) = self.ids.get(ticker) {
            return Err(RegistryError::DuplicateTicker(ticker.to_string()));
        }
        if self.next_id as usize >= MAX_SYMBOLS {
            return Err(RegistryError::CapacityExceeded);
        }

        let id = self.next_id;
        self.next_id += 1;

        let bytes = ticker.as_bytes();
        let len = bytes.len().min(TICKER_LEN);
        let mut stored = [0u8; TICKER_LEN];
        stored[..len].copy_from_slice(&bytes[..len]);

        let slot = &mut self.slots[id as usize];
        *slot = SymbolSlot {
            active: true,
            ticker: stored,
            ticker_len: len as u8,
            ..SymbolSlot::default()
        };

        self.ids.insert(ticker.to_string(), id);
        Ok(id)
    }

    /// Resolve a textual ticker to its dense id. Consults the registration
    /// map, so callers on the hot path should cache the returned id rather
    /// than calling this per tick.
    #[inline]
    pub fn id_for(&self, ticker: &str) -> Option<Symbol> {
        self.ids.get(ticker).copied()
    }

    #[inline]
    pub fn lookup(&self, id: Symbol) -> Option<&SymbolSlot> {
        self.slots.get(id as usize)
    }

    #[inline]
    pub fn lookup_mut(&mut self, id: Symbol) -> Option<&mut SymbolSlot> {
        self.slots.get_mut(id as usize)
    }

    /// Apply a quote update. Crossed markets (`bid >= ask`) are rejected
    /// at ingress per SPEC_FULL.md §8 boundary behavior.
    #[inline]
    pub fn update_quote(&mut self, id: Symbol, bid: Price, ask: Price, bid_qty: Quantity, ask_qty: Quantity) {
        if id as usize >= MAX_SYMBOLS {
            return;
        }
        if bid != INVALID_PRICE && ask != INVALID_PRICE && bid >= ask {
            return;
        }
        let slot = &mut self.slots[id as usize];
        slot.last_bid = bid;
        slot.last_ask = ask;
        slot.last_bid_qty = bid_qty;
        slot.last_ask_qty = ask_qty;
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_lookup() {
        let mut t = SymbolTable::new();
        let id = t.register("BTCUSDT").unwrap();
        assert_eq!(t.id_for("BTCUSDT"), Some(id));
        assert!(t.lookup(id).unwrap().active);
        assert_eq!(t.lookup(id).unwrap().ticker(), "BTCUSDT");
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut t = SymbolTable::new();
        t.register("BTCUSDT").unwrap();
        assert!(matches!(t.register("BTCUSDT"), Err(RegistryError::DuplicateTicker(_))));
    }

    #[test]
    fn unregistered_id_is_inactive() {
        let t = SymbolTable::new();
        assert!(!t.lookup(0).unwrap().active);
    }

    #[test]
    fn boundary_id_returns_none() {
        let t = SymbolTable::new();
        assert!(t.lookup(MAX_SYMBOLS as Symbol).is_none());
    }

    #[test]
    fn crossed_market_is_rejected() {
        let mut t = SymbolTable::new();
        let id = t.register("BTCUSDT").unwrap();
        t.update_quote(id, 100, 99, 1, 1);
        assert!(!t.lookup(id).unwrap().has_quote());
    }

    #[test]
    fn valid_quote_updates_slot() {
        let mut t = SymbolTable::new();
        let id = t.register("BTCUSDT").unwrap();
        t.update_quote(id, 600_000_000, 600_100_000, 1, 2);
        let slot = t.lookup(id).unwrap();
        assert!(slot.has_quote());
        assert_eq!(slot.last_bid, 600_000_000);
        assert_eq!(slot.last_ask, 600_100_000);
    }
}
