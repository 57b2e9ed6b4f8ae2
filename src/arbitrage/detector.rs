//! Triangular arbitrage detection: build the `A/B -> C/A -> C/B` relationship
//! graph from a symbol universe, track per-leg prices, and surface
//! opportunities whose spread exceeds a configured threshold.

use std::collections::{HashMap, HashSet};

use crate::types::Side;

use super::config::{ArbitrageConfig, TriangularArbConfig, TriangularArbState};
use super::symbol_pair::SymbolPair;

#[derive(Debug, Clone)]
pub struct TriangularRelation {
    pub leg1: SymbolPair,
    pub leg2: SymbolPair,
    pub leg3: SymbolPair,
    pub config: TriangularArbConfig,
    pub state: TriangularArbState,
}

impl TriangularRelation {
    /// Which leg (1/2/3) the given textual symbol belongs to, or 0 if none.
    fn leg_index(&self, symbol: &str) -> u8 {
        if symbol == self.leg1.original || symbol == self.leg1.to_string_normalized() {
            1
        } else if symbol == self.leg2.original || symbol == self.leg2.to_string_normalized() {
            2
        } else if symbol == self.leg3.original || symbol == self.leg3.to_string_normalized() {
            3
        } else {
            0
        }
    }

    fn update_price(&mut self, leg: u8, bid: f64, ask: f64) {
        match leg {
            1 => {
                self.state.leg1_bid = bid;
                self.state.leg1_ask = ask;
            }
            2 => {
                self.state.leg2_bid = bid;
                self.state.leg2_ask = ask;
            }
            3 => {
                self.state.leg3_bid = bid;
                self.state.leg3_ask = ask;
            }
            _ => {}
        }
    }

    /// Forward = buy-cycle (buy leg1, buy leg2, sell leg3 at implied rate).
    /// Reverse = sell-cycle. Both divisions guard their denominator
    /// independently rather than relying on `has_all_prices`, per the
    /// resolved Open Question in SPEC_FULL.md §9.
    fn calculate_spreads(&mut self) {
        if !self.state.has_all_prices() {
            self.state.forward_spread = 0.0;
            self.state.reverse_spread = 0.0;
            return;
        }

        let implied_forward = self.state.leg1_ask * self.state.leg2_ask;
        self.state.forward_spread = if implied_forward > 0.0 {
            (self.state.leg3_bid / implied_forward) - 1.0
        } else {
            0.0
        };

        let implied_reverse = self.state.leg1_bid * self.state.leg2_bid;
        self.state.reverse_spread = if self.state.leg3_ask > 0.0 {
            (implied_reverse / self.state.leg3_ask) - 1.0
        } else {
            0.0
        };
    }

    fn has_opportunity(&self) -> bool {
        self.config.enabled
            && self.state.has_all_prices()
            && (self.state.forward_spread > self.config.min_spread_pct
                || self.state.reverse_spread > self.config.min_spread_pct)
    }

    fn profitable_direction(&self) -> i8 {
        if self.state.forward_spread > self.config.min_spread_pct {
            1
        } else if self.state.reverse_spread > self.config.min_spread_pct {
            -1
        } else {
            0
        }
    }

    fn best_spread(&self) -> f64 {
        self.state.forward_spread.max(self.state.reverse_spread)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ArbOrderSignal {
    pub relation_index: usize,
    pub leg: u8,
    pub side: Side,
    pub quantity: f64,
    /// Limit price, taken from the stale top-of-book quote at detection time.
    pub price: f64,
}

#[derive(Debug, Clone)]
pub struct ArbOpportunity {
    pub relation_index: usize,
    pub direction: i8,
    pub spread: f64,
    pub orders: Vec<ArbOrderSignal>,
    pub timestamp_ns: u64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DetectorStats {
    pub total_relations: usize,
    pub active_relations: usize,
    pub total_opportunities: u64,
    pub total_executions: u64,
    pub total_profit: f64,
}

/// Detects and tracks triangular arbitrage opportunities across a fixed set
/// of relationships built once from a symbol universe.
pub struct TriangularDetector {
    config: ArbitrageConfig,
    relations: Vec<TriangularRelation>,
    symbol_to_relations: HashMap<String, Vec<usize>>,
}

impl TriangularDetector {
    pub fn new(config: ArbitrageConfig) -> Self {
        Self {
            config,
            relations: Vec::new(),
            symbol_to_relations: HashMap::new(),
        }
    }

    pub fn relations(&self) -> &[TriangularRelation] {
        &self.relations
    }

    fn is_excluded(&self, symbol: &str) -> bool {
        self.config.excluded_symbols.iter().any(|excl| symbol.contains(excl.as_str()))
    }

    fn apply_manual_config(&self, rel: &mut TriangularRelation) {
        for manual in &self.config.manual_configs {
            let matches = (manual.leg1 == rel.config.leg1 || manual.leg1.is_empty())
                && (manual.leg2 == rel.config.leg2 || manual.leg2.is_empty())
                && (manual.leg3 == rel.config.leg3 || manual.leg3.is_empty());
            if matches {
                rel.config.min_spread_pct = manual.min_spread_pct;
                rel.config.max_quantity = manual.max_quantity;
                rel.config.enabled = manual.enabled;
                break;
            }
        }
    }

    fn build_symbol_map(&mut self) {
        self.symbol_to_relations.clear();
        for (i, rel) in self.relations.iter().enumerate() {
            for pair in [&rel.leg1, &rel.leg2, &rel.leg3] {
                self.symbol_to_relations.entry(pair.original.clone()).or_default().push(i);
                self.symbol_to_relations
                    .entry(pair.to_string_normalized())
                    .or_default()
                    .push(i);
            }
        }
    }

    /// Build the relationship graph from a flat symbol list. Returns the
    /// number of relationships discovered.
    pub fn detect_relationships(&mut self, symbols: &[String]) -> usize {
        self.relations.clear();
        self.symbol_to_relations.clear();

        let mut pairs = Vec::new();
        let mut symbol_set = HashSet::new();

        for sym in symbols {
            if self.is_excluded(sym) {
                continue;
            }
            if let Some(parsed) = SymbolPair::parse(sym) {
                if parsed.is_valid() {
                    symbol_set.insert(parsed.to_string_normalized());
                    pairs.push(parsed);
                }
            }
        }

        'outer: for ab in &pairs {
            for ca in &pairs {
                if ca.quote != ab.base {
                    continue;
                }
                if ca.base == ab.base || ca.base == ab.quote {
                    continue;
                }

                let cb_symbol = format!("{}/{}", ca.base, ab.quote);
                if !symbol_set.contains(&cb_symbol) {
                    continue;
                }

                let mut rel = TriangularRelation {
                    leg1: ab.clone(),
                    leg2: ca.clone(),
                    leg3: SymbolPair::new(ca.base.clone(), ab.quote.clone(), cb_symbol.clone()),
                    config: TriangularArbConfig {
                        leg1: ab.to_string_normalized(),
                        leg2: ca.to_string_normalized(),
                        leg3: cb_symbol,
                        min_spread_pct: self.config.default_min_spread_pct,
                        max_quantity: self.config.default_max_quantity,
                        enabled: true,
                    },
                    state: TriangularArbState::default(),
                };

                self.apply_manual_config(&mut rel);
                self.relations.push(rel);

                if self.relations.len() >= self.config.max_auto_relationships {
                    break 'outer;
                }
            }
        }

        self.build_symbol_map();
        self.relations.len()
    }

    fn generate_orders(rel: &TriangularRelation, relation_index: usize, direction: i8) -> Vec<ArbOrderSignal> {
        let qty = rel.config.max_quantity;
        match direction {
            1 => vec![
                ArbOrderSignal { relation_index, leg: 1, side: Side::Buy, quantity: qty, price: rel.state.leg1_ask },
                ArbOrderSignal { relation_index, leg: 2, side: Side::Buy, quantity: qty, price: rel.state.leg2_ask },
                ArbOrderSignal { relation_index, leg: 3, side: Side::Sell, quantity: qty, price: rel.state.leg3_bid },
            ],
            -1 => vec![
                ArbOrderSignal { relation_index, leg: 3, side: Side::Buy, quantity: qty, price: rel.state.leg3_ask },
                ArbOrderSignal { relation_index, leg: 2, side: Side::Sell, quantity: qty, price: rel.state.leg2_bid },
                ArbOrderSignal { relation_index, leg: 1, side: Side::Sell, quantity: qty, price: rel.state.leg1_bid },
            ],
            _ => Vec::new(),
        }
    }

    /// Feed a new (bid, ask) for `symbol` into every relationship that
    /// contains it, returning any resulting opportunities.
    pub fn on_price_update(&mut self, symbol: &str, bid: f64, ask: f64, timestamp_ns: u64) -> Vec<ArbOpportunity> {
        let mut opportunities = Vec::new();

        let indices = match self.symbol_to_relations.get(symbol) {
            Some(v) => v.clone(),
            None => match SymbolPair::parse(symbol) {
                Some(parsed) => match self.symbol_to_relations.get(&parsed.to_string_normalized()) {
                    Some(v) => v.clone(),
                    None => return opportunities,
                },
                None => return opportunities,
            },
        };

        for idx in indices {
            let rel = &mut self.relations[idx];
            let mut leg = rel.leg_index(symbol);
            if leg == 0 {
                if let Some(parsed) = SymbolPair::parse(symbol) {
                    leg = rel.leg_index(&parsed.to_string_normalized());
                }
            }
            if leg == 0 {
                continue;
            }

            rel.update_price(leg, bid, ask);
            rel.calculate_spreads();

            if !rel.has_opportunity() {
                continue;
            }

            let cooldown_ns = self.config.execution_cooldown_us * 1_000;
            if timestamp_ns > 0 && timestamp_ns.saturating_sub(rel.state.last_execution_ns) < cooldown_ns {
                continue;
            }

            rel.state.opportunities_detected += 1;
            let direction = rel.profitable_direction();
            let spread = rel.best_spread();
            let orders = Self::generate_orders(rel, idx, direction);

            opportunities.push(ArbOpportunity { relation_index: idx, direction, spread, orders, timestamp_ns });
        }

        opportunities
    }

    /// Mark an opportunity as executed, resetting its relationship's cooldown.
    pub fn mark_executed(&mut self, opp: &ArbOpportunity, timestamp_ns: u64) {
        if let Some(rel) = self.relations.get_mut(opp.relation_index) {
            rel.state.last_execution_ns = timestamp_ns;
            rel.state.opportunities_executed += 1;
            rel.state.total_profit += opp.spread;
        }
    }

    pub fn stats(&self) -> DetectorStats {
        let mut s = DetectorStats { total_relations: self.relations.len(), ..Default::default() };
        for rel in &self.relations {
            if rel.config.enabled {
                s.active_relations += 1;
            }
            s.total_opportunities += rel.state.opportunities_detected;
            s.total_executions += rel.state.opportunities_executed;
            s.total_profit += rel.state.total_profit;
        }
        s
    }
}

#[cfg(test)]
mod detector_tests;
