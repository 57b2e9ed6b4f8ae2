//! Engine configuration with the ambient three-layer precedence: compile-time
//! defaults, overridable via environment, overridable via CLI flags.

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "arb-engine")]
#[command(about = "Low-latency triangular arbitrage engine")]
pub struct EngineArgs {
    /// Symbols to subscribe to (comma-separated, e.g. BTCUSDT,ETHBTC,ETHUSDT)
    #[arg(long, env = "ARB_SYMBOLS", default_value = "BTCUSDT,ETHBTC,ETHUSDT")]
    pub symbols: String,

    /// Run against paper fills instead of a live venue
    #[arg(long, env = "ARB_PAPER_MODE", default_value_t = true)]
    pub paper_mode: bool,

    /// Starting capital, same units as Price
    #[arg(long, env = "ARB_CAPITAL", default_value_t = 100_000.0)]
    pub capital: f64,

    /// Max absolute position per symbol (0 = no limit)
    #[arg(long, env = "ARB_MAX_POSITION", default_value_t = 0)]
    pub max_position: i64,

    /// CPU core to pin the ingress thread to (-1 = no pinning)
    #[arg(long, env = "ARB_PIN_CORE")]
    pub pin_core: Option<usize>,

    /// Minimum triangular spread to act on, as a fraction (0.001 = 10bps)
    #[arg(long, env = "ARB_MIN_SPREAD_PCT", default_value_t = 0.001)]
    pub min_spread_pct: f64,

    /// Minimum time between two executions on the same relationship, in microseconds
    #[arg(long, env = "ARB_EXECUTION_COOLDOWN_US", default_value_t = 1_000_000)]
    pub execution_cooldown_us: u64,

    /// Enable UDP multicast telemetry publishing
    #[arg(long, env = "ARB_TELEMETRY_ENABLED", default_value_t = true)]
    pub telemetry_enabled: bool,

    /// Telemetry multicast group
    #[arg(long, env = "ARB_TELEMETRY_GROUP", default_value = "239.255.0.1")]
    pub telemetry_group: String,

    /// Telemetry multicast port
    #[arg(long, env = "ARB_TELEMETRY_PORT", default_value_t = 5555)]
    pub telemetry_port: u16,

    /// Duration to run, in seconds (0 = unlimited)
    #[arg(long, env = "ARB_DURATION_SECS", default_value_t = 0)]
    pub duration_secs: u64,

    /// Verbose logging
    #[arg(short, long, env = "ARB_VERBOSE", default_value_t = false)]
    pub verbose: bool,
}

impl EngineArgs {
    pub fn symbol_list(&self) -> Vec<String> {
        self.symbols.split(',').map(|s| s.trim().to_uppercase()).filter(|s| !s.is_empty()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_list_trims_and_uppercases() {
        let args = EngineArgs::parse_from(["arb-engine", "--symbols", " btcusdt, ethbtc ,ethusdt"]);
        assert_eq!(args.symbol_list(), vec!["BTCUSDT", "ETHBTC", "ETHUSDT"]);
    }

    #[test]
    fn defaults_apply_without_flags() {
        let args = EngineArgs::parse_from(["arb-engine"]);
        assert!(args.paper_mode);
        assert_eq!(args.capital, 100_000.0);
        assert_eq!(args.telemetry_port, 5555);
    }
}
