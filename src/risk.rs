//! Pre-trade risk checks and post-fill exposure tracking.
//!
//! `check_order` is the hot path: it must stay O(1) and allocation-free, so
//! every limit is pre-allocated per symbol and short-circuits on the first
//! breach in a fixed check order (halt, order size, symbol position, symbol
//! notional, global notional).

use crate::symbol_table::MAX_SYMBOLS;
use crate::types::{Price, Quantity, Side, Symbol, PRICE_SCALE};

#[derive(Debug, Clone, Copy)]
pub struct RiskConfig {
    /// Max loss per trading day before the engine halts.
    pub daily_loss_limit: i64,
    /// Max drawdown from peak equity, expressed as a fraction (0.10 = 10%).
    pub max_drawdown_pct: f64,
    pub max_order_size: Quantity,
    pub max_total_notional: i64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            daily_loss_limit: 100_000,
            max_drawdown_pct: 0.10,
            max_order_size: 10_000,
            max_total_notional: 100_000_000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SymbolRiskLimit {
    /// 0 = no limit.
    pub max_position: i64,
    pub max_notional: i64,
}

#[derive(Debug, Clone, Copy, Default)]
struct SymbolRiskState {
    position: i64,
    notional: i64,
    last_price: Price,
}

impl SymbolRiskState {
    fn reset(&mut self) {
        *self = SymbolRiskState::default();
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RiskState {
    pub current_pnl: i64,
    pub daily_pnl: i64,
    pub peak_equity: i64,
    pub total_notional: i64,
    pub current_drawdown_pct: f64,
    pub can_trade: bool,
    pub daily_limit_breached: bool,
    pub drawdown_breached: bool,
}

/// Tracks global and per-symbol exposure and gates order submission.
///
/// `total_notional` is maintained incrementally on each fill (subtract the
/// symbol's old contribution, add its new one) rather than rescanned across
/// all symbols, so `on_fill` stays O(1) regardless of universe size.
pub struct RiskManager {
    config: RiskConfig,
    limits: Box<[SymbolRiskLimit; MAX_SYMBOLS]>,
    states: Box<[SymbolRiskState; MAX_SYMBOLS]>,

    initial_capital: i64,
    current_pnl: i64,
    peak_equity: i64,
    daily_start_pnl: i64,
    total_notional: i64,

    daily_limit_breached: bool,
    drawdown_breached: bool,
    halted: bool,
}

impl RiskManager {
    pub fn new(config: RiskConfig) -> Self {
        Self {
            config,
            limits: Box::new([SymbolRiskLimit::default(); MAX_SYMBOLS]),
            states: Box::new([SymbolRiskState::default(); MAX_SYMBOLS]),
            initial_capital: 0,
            current_pnl: 0,
            peak_equity: 0,
            daily_start_pnl: 0,
            total_notional: 0,
            daily_limit_breached: false,
            drawdown_breached: false,
            halted: false,
        }
    }

    pub fn set_initial_capital(&mut self, capital: i64) {
        self.initial_capital = capital;
        self.peak_equity = capital;
    }

    pub fn set_symbol_limit(&mut self, symbol: Symbol, max_position: i64, max_notional: i64) {
        if let Some(limit) = self.limits.get_mut(symbol as usize) {
            limit.max_position = max_position;
            limit.max_notional = max_notional;
        }
    }

    /// Update current P&L (on every fill, or periodically on mark-to-market)
    /// and re-evaluate the daily-loss and drawdown halts.
    pub fn update_pnl(&mut self, pnl: i64) {
        self.current_pnl = pnl;

        let current_equity = self.initial_capital + self.current_pnl;
        if current_equity > self.peak_equity {
            self.peak_equity = current_equity;
        }

        let daily_pnl = self.current_pnl - self.daily_start_pnl;
        if daily_pnl < -self.config.daily_loss_limit {
            self.daily_limit_breached = true;
            self.halted = true;
        }

        if self.peak_equity > 0 {
            let drawdown = (self.peak_equity - current_equity) as f64 / self.peak_equity as f64;
            if drawdown > self.config.max_drawdown_pct {
                self.drawdown_breached = true;
                self.halted = true;
            }
        }
    }

    /// Roll daily P&L tracking over at the start of a new trading day.
    /// Drawdown breach survives the roll; only the daily-loss breach clears.
    pub fn new_trading_day(&mut self) {
        self.daily_start_pnl = self.current_pnl;
        self.daily_limit_breached = false;
        if !self.drawdown_breached {
            self.halted = false;
        }
    }

    /// Pre-trade check, in fixed short-circuit order: halt, order size,
    /// symbol position, symbol notional, global notional.
    #[inline]
    pub fn check_order(&self, symbol: Symbol, side: Side, qty: Quantity, price: Price) -> bool {
        if self.halted {
            return false;
        }
        if qty > self.config.max_order_size {
            return false;
        }

        if let Some(idx) = usize::try_from(symbol).ok().filter(|&i| i < MAX_SYMBOLS) {
            let limit = &self.limits[idx];
            let state = &self.states[idx];

            if limit.max_position > 0 {
                let new_position = state.position + side.sign() * qty as i64;
                if new_position.abs() > limit.max_position {
                    return false;
                }
            }

            if limit.max_notional > 0 && price > 0 {
                let order_notional = qty as i64 * price / PRICE_SCALE;
                if state.notional + order_notional > limit.max_notional {
                    return false;
                }
            }
        }

        if self.config.max_total_notional > 0 {
            let order_notional = qty as i64 * price / PRICE_SCALE;
            if self.total_notional + order_notional > self.config.max_total_notional {
                return false;
            }
        }

        true
    }

    #[inline]
    pub fn can_trade(&self) -> bool {
        !self.halted
    }

    /// Apply a fill: update position/notional for `symbol` and adjust
    /// `total_notional` by the delta rather than rescanning every symbol.
    pub fn on_fill(&mut self, symbol: Symbol, side: Side, qty: Quantity, price: Price) {
        let idx = match usize::try_from(symbol).ok().filter(|&i| i < MAX_SYMBOLS) {
            Some(i) => i,
            None => return,
        };

        let state = &mut self.states[idx];
        let old_notional = state.notional;

        state.position += side.sign() * qty as i64;
        state.last_price = price;
        state.notional = state.position.abs() * price / PRICE_SCALE;

        self.total_notional += state.notional - old_notional;
    }

    /// Recompute `total_notional` from scratch across all symbols. Exposed
    /// as an explicit repair path for callers that suspect drift (e.g.
    /// after a manual state patch); not used by `on_fill` itself.
    pub fn recalculate_total_notional(&mut self) {
        self.total_notional = self.states.iter().map(|s| s.notional).sum();
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn is_daily_limit_breached(&self) -> bool {
        self.daily_limit_breached
    }

    pub fn is_drawdown_breached(&self) -> bool {
        self.drawdown_breached
    }

    pub fn current_pnl(&self) -> i64 {
        self.current_pnl
    }

    pub fn peak_equity(&self) -> i64 {
        self.peak_equity
    }

    pub fn total_notional(&self) -> i64 {
        self.total_notional
    }

    pub fn daily_pnl(&self) -> i64 {
        self.current_pnl - self.daily_start_pnl
    }

    pub fn current_drawdown_pct(&self) -> f64 {
        if self.peak_equity <= 0 {
            return 0.0;
        }
        let current_equity = self.initial_capital + self.current_pnl;
        (self.peak_equity - current_equity) as f64 / self.peak_equity as f64
    }

    pub fn symbol_position(&self, symbol: Symbol) -> i64 {
        usize::try_from(symbol).ok().filter(|&i| i < MAX_SYMBOLS).map(|i| self.states[i].position).unwrap_or(0)
    }

    pub fn symbol_notional(&self, symbol: Symbol) -> i64 {
        usize::try_from(symbol).ok().filter(|&i| i < MAX_SYMBOLS).map(|i| self.states[i].notional).unwrap_or(0)
    }

    pub fn state(&self) -> RiskState {
        RiskState {
            current_pnl: self.current_pnl,
            daily_pnl: self.daily_pnl(),
            peak_equity: self.peak_equity,
            total_notional: self.total_notional,
            current_drawdown_pct: self.current_drawdown_pct(),
            can_trade: !self.halted,
            daily_limit_breached: self.daily_limit_breached,
            drawdown_breached: self.drawdown_breached,
        }
    }

    pub fn halt(&mut self) {
        self.halted = true;
    }

    pub fn reset_halt(&mut self) {
        self.halted = false;
        self.daily_limit_breached = false;
        self.drawdown_breached = false;
    }

    pub fn reset_all(&mut self) {
        self.current_pnl = 0;
        self.peak_equity = self.initial_capital;
        self.daily_start_pnl = 0;
        self.total_notional = 0;
        self.daily_limit_breached = false;
        self.drawdown_breached = false;
        self.halted = false;
        for state in self.states.iter_mut() {
            state.reset();
        }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }
}

#[cfg(test)]
mod risk_tests;
