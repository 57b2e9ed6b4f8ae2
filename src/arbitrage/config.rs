//! Arbitrage configuration and per-relationship runtime state.

use serde::{Deserialize, Serialize};

/// Manual override / auto-detected configuration for one triangular
/// relationship.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriangularArbConfig {
    pub leg1: String,
    pub leg2: String,
    pub leg3: String,
    pub min_spread_pct: f64,
    pub max_quantity: f64,
    pub enabled: bool,
}

impl Default for TriangularArbConfig {
    fn default() -> Self {
        Self {
            leg1: String::new(),
            leg2: String::new(),
            leg3: String::new(),
            min_spread_pct: 0.001,
            max_quantity: 1.0,
            enabled: true,
        }
    }
}

/// Global triangular-arbitrage detector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbitrageConfig {
    pub auto_detect: bool,
    pub default_min_spread_pct: f64,
    pub default_max_quantity: f64,
    pub manual_configs: Vec<TriangularArbConfig>,
    pub excluded_symbols: Vec<String>,
    pub priority_quotes: Vec<String>,
    pub max_auto_relationships: usize,
    pub min_liquidity: f64,
    pub log_opportunities: bool,
    /// Minimum time between two executions on the same relationship.
    pub execution_cooldown_us: u64,
}

impl Default for ArbitrageConfig {
    fn default() -> Self {
        Self {
            auto_detect: true,
            default_min_spread_pct: 0.001,
            default_max_quantity: 1.0,
            manual_configs: Vec::new(),
            excluded_symbols: Vec::new(),
            priority_quotes: vec!["USDT".into(), "USDC".into(), "BTC".into(), "ETH".into()],
            max_auto_relationships: 100,
            min_liquidity: 0.0,
            log_opportunities: false,
            execution_cooldown_us: 1_000_000,
        }
    }
}

/// Live per-relationship price/spread state.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TriangularArbState {
    pub leg1_bid: f64,
    pub leg1_ask: f64,
    pub leg2_bid: f64,
    pub leg2_ask: f64,
    pub leg3_bid: f64,
    pub leg3_ask: f64,
    pub forward_spread: f64,
    pub reverse_spread: f64,
    pub last_execution_ns: u64,
    pub opportunities_detected: u64,
    pub opportunities_executed: u64,
    pub total_profit: f64,
}

impl TriangularArbState {
    pub fn has_all_prices(&self) -> bool {
        self.leg1_bid > 0.0
            && self.leg1_ask > 0.0
            && self.leg2_bid > 0.0
            && self.leg2_ask > 0.0
            && self.leg3_bid > 0.0
            && self.leg3_ask > 0.0
    }
}
