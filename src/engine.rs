//! Engine glue: wires the symbol table, risk manager, triangular detector,
//! strategies, order sink, and telemetry publisher into the single-threaded
//! ingress pipeline described in SPEC_FULL.md §4.G.

use tracing::{trace, warn};

use crate::arbitrage::{ArbOpportunity, TriangularDetector};
use crate::order_sink::{OrderSink, OrderStatus};
use crate::risk::RiskManager;
use crate::strategy::{Signal, Strategy};
use crate::symbol_table::SymbolTable;
use crate::telemetry::TelemetryPublisher;
use crate::types::{price_to_f64, Quantity, Side, Symbol};

pub struct Engine {
    symbols: SymbolTable,
    risk: RiskManager,
    detector: TriangularDetector,
    strategies: Vec<Box<dyn Strategy>>,
    order_sink: Box<dyn OrderSink>,
    telemetry: Option<TelemetryPublisher>,
}

impl Engine {
    pub fn new(
        symbols: SymbolTable,
        risk: RiskManager,
        detector: TriangularDetector,
        order_sink: Box<dyn OrderSink>,
        telemetry: Option<TelemetryPublisher>,
    ) -> Self {
        Self { symbols, risk, detector, strategies: Vec::new(), order_sink, telemetry }
    }

    pub fn register_strategy(&mut self, strategy: Box<dyn Strategy>) {
        self.strategies.push(strategy);
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn risk(&self) -> &RiskManager {
        &self.risk
    }

    pub fn detector(&self) -> &TriangularDetector {
        &self.detector
    }

    /// Steps 1-7 of SPEC_FULL.md §4.G for a single book-ticker update.
    /// Must not block or allocate on the steady-state path.
    pub fn on_quote(
        &mut self,
        ticker: &str,
        bid: crate::types::Price,
        ask: crate::types::Price,
        bid_qty: Quantity,
        ask_qty: Quantity,
        timestamp_ns: u64,
    ) {
        let symbol = match self.symbols.id_for(ticker) {
            Some(id) => id,
            None => {
                trace!(ticker, "quote for unregistered symbol, dropping");
                return;
            }
        };

        self.symbols.update_quote(symbol, bid, ask, bid_qty, ask_qty);

        let slot = match self.symbols.lookup(symbol) {
            Some(s) if s.has_quote() => *s,
            _ => return,
        };

        if let Some(telemetry) = &mut self.telemetry {
            telemetry.publish_quote(symbol as u16, bid, ask, bid_qty, ask_qty);
        }

        for strategy in self.strategies.iter_mut() {
            match strategy.on_quote(symbol, &slot) {
                Signal::Hold => {}
                Signal::Order { side, quantity, limit_price } => {
                    self.try_submit(symbol, side, quantity, limit_price);
                }
            }
        }

        self.drain_execution_reports();

        // Feed the detector from the slot's stored quote, not the raw
        // incoming bid/ask: a crossed tick against an already-quoted symbol
        // is rejected by `update_quote` but still reaches here via the old,
        // valid slot, and must not be mixed with fresh crossed prices.
        let opportunities =
            self.detector.on_price_update(ticker, price_to_f64(slot.last_bid), price_to_f64(slot.last_ask), timestamp_ns);
        for opp in opportunities {
            self.handle_arbitrage_opportunity(opp, timestamp_ns);
        }
    }

    fn try_submit(&mut self, symbol: Symbol, side: Side, qty: Quantity, price: crate::types::Price) {
        if !self.risk.check_order(symbol, side, qty, price) {
            trace!(symbol, ?side, qty, "order rejected by risk check");
            return;
        }
        self.order_sink.submit(symbol, side, qty, price);
    }

    fn drain_execution_reports(&mut self) {
        for report in self.order_sink.poll_reports() {
            if matches!(report.status, OrderStatus::Filled | OrderStatus::PartiallyFilled) {
                self.risk.on_fill(report.symbol, report.side, report.filled_qty, report.price);
                for strategy in self.strategies.iter_mut() {
                    strategy.on_fill(report.symbol, report.side, report.filled_qty, report.price);
                }
                if let Some(telemetry) = &mut self.telemetry {
                    telemetry.publish_fill(report.symbol as u16, report.side, report.filled_qty, report.price);
                }
            }
        }
    }

    fn handle_arbitrage_opportunity(&mut self, opp: ArbOpportunity, timestamp_ns: u64) {
        let mut all_accepted = true;
        for order in &opp.orders {
            let symbol = match self.symbols.id_for(&self.leg_ticker(&opp, order.leg)) {
                Some(id) => id,
                None => {
                    warn!(relation_index = opp.relation_index, leg = order.leg, "arbitrage leg symbol not registered");
                    all_accepted = false;
                    continue;
                }
            };
            let price = crate::types::price_from_f64(order.price);
            let qty = order.quantity.round() as Quantity;
            if !self.risk.check_order(symbol, order.side, qty, price) {
                all_accepted = false;
                continue;
            }
            self.order_sink.submit(symbol, order.side, qty, price);
        }

        if all_accepted {
            self.detector.mark_executed(&opp, timestamp_ns);
        }

        self.drain_execution_reports();
    }

    fn leg_ticker(&self, opp: &ArbOpportunity, leg: u8) -> String {
        let rel = &self.detector.relations()[opp.relation_index];
        match leg {
            1 => rel.leg1.original.clone(),
            2 => rel.leg2.original.clone(),
            _ => rel.leg3.original.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbitrage::ArbitrageConfig;
    use crate::order_sink::test_support::ImmediateFillSink;
    use crate::risk::RiskConfig;
    use crate::types::price_from_f64;

    fn build_engine(tickers: &[&str]) -> Engine {
        let mut symbols = SymbolTable::new();
        for t in tickers {
            symbols.register(t).unwrap();
        }
        let risk = RiskManager::new(RiskConfig::default());
        let mut detector = TriangularDetector::new(ArbitrageConfig::default());
        detector.detect_relationships(&tickers.iter().map(|s| s.to_string()).collect::<Vec<_>>());
        Engine::new(symbols, risk, detector, Box::new(ImmediateFillSink::default()), None)
    }

    #[test]
    fn crossed_market_quote_is_dropped_and_slot_stays_unquoted() {
        let mut engine = build_engine(&["BTC/USDT"]);
        engine.on_quote("BTC/USDT", price_from_f64(100.0), price_from_f64(99.0), 1, 1, 1_000);
        let id = engine.symbols().id_for("BTC/USDT").unwrap();
        assert!(!engine.symbols().lookup(id).unwrap().has_quote());
    }

    #[test]
    fn valid_quote_updates_slot_and_is_queryable() {
        let mut engine = build_engine(&["BTC/USDT"]);
        engine.on_quote("BTC/USDT", price_from_f64(100.0), price_from_f64(100.1), 1, 1, 1_000);
        let id = engine.symbols().id_for("BTC/USDT").unwrap();
        assert!(engine.symbols().lookup(id).unwrap().has_quote());
    }

    #[test]
    fn unregistered_ticker_is_ignored() {
        let mut engine = build_engine(&["BTC/USDT"]);
        engine.on_quote("ETH/USDT", price_from_f64(100.0), price_from_f64(100.1), 1, 1, 1_000);
        assert!(engine.symbols().id_for("ETH/USDT").is_none());
    }

    #[test]
    fn arbitrage_pipeline_feeds_detector_and_submits_orders() {
        let mut engine = build_engine(&["BTC/USDT", "ETH/BTC", "ETH/USDT"]);
        assert_eq!(engine.detector().relations().len(), 1);

        engine.on_quote("BTC/USDT", price_from_f64(50_000.0), price_from_f64(50_010.0), 1, 1, 1_000);
        engine.on_quote("ETH/BTC", price_from_f64(0.06), price_from_f64(0.0601), 1, 1, 1_000);
        // Implied forward ~= 50010 * 0.0601 ~= 3006.6; price this comfortably
        // above that to clear the default 0.1% spread threshold.
        engine.on_quote("ETH/USDT", price_from_f64(3_100.0), price_from_f64(3_101.0), 1, 1, 1_000);

        assert_eq!(engine.detector().stats().total_opportunities, 1);
    }
}
