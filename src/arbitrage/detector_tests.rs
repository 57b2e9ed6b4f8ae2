use super::*;

fn universe() -> Vec<String> {
    vec!["BTC/USDT".into(), "ETH/BTC".into(), "ETH/USDT".into()]
}

#[test]
fn detect_relationships_finds_the_triangle() {
    let mut d = TriangularDetector::new(ArbitrageConfig::default());
    let count = d.detect_relationships(&universe());
    assert_eq!(count, 1);
    let rel = &d.relations()[0];
    assert_eq!(rel.leg1.to_string_normalized(), "BTC/USDT");
    assert_eq!(rel.leg2.to_string_normalized(), "ETH/BTC");
    assert_eq!(rel.leg3.to_string_normalized(), "ETH/USDT");
}

#[test]
fn excluded_symbols_are_skipped() {
    let mut config = ArbitrageConfig::default();
    config.excluded_symbols.push("ETH".into());
    let mut d = TriangularDetector::new(config);
    assert_eq!(d.detect_relationships(&universe()), 0);
}

#[test]
fn forward_opportunity_is_detected_above_threshold() {
    let mut config = ArbitrageConfig::default();
    config.default_min_spread_pct = 0.001;
    let mut d = TriangularDetector::new(config);
    d.detect_relationships(&universe());

    // leg1 = BTC/USDT, leg2 = ETH/BTC, leg3 = ETH/USDT
    assert!(d.on_price_update("BTC/USDT", 50_000.0, 50_010.0, 1_000).is_empty());
    assert!(d.on_price_update("ETH/BTC", 0.06, 0.0601, 1_000).is_empty());

    // implied_forward = leg1_ask * leg2_ask = 50010 * 0.0601 = 3006.601
    // make leg3_bid comfortably above that to clear the 0.1% threshold.
    let opps = d.on_price_update("ETH/USDT", 3_100.0, 3_101.0, 1_000);
    assert_eq!(opps.len(), 1);
    let opp = &opps[0];
    assert_eq!(opp.direction, 1);
    assert!(opp.spread > 0.001);
    assert_eq!(opp.orders.len(), 3);
    assert_eq!(opp.orders[0].side, Side::Buy);
    assert_eq!(opp.orders[2].side, Side::Sell);
}

#[test]
fn no_opportunity_below_threshold() {
    let mut d = TriangularDetector::new(ArbitrageConfig::default());
    d.detect_relationships(&universe());

    d.on_price_update("BTC/USDT", 50_000.0, 50_010.0, 1_000);
    d.on_price_update("ETH/BTC", 0.06, 0.0601, 1_000);
    // implied_forward ~= 3006.6, leg3_bid just barely above it — under 0.1%.
    let opps = d.on_price_update("ETH/USDT", 3_007.0, 3_008.0, 1_000);
    assert!(opps.is_empty());
}

#[test]
fn cooldown_suppresses_repeat_opportunities() {
    let mut config = ArbitrageConfig::default();
    config.execution_cooldown_us = 1_000_000; // 1ms
    let mut d = TriangularDetector::new(config);
    d.detect_relationships(&universe());

    d.on_price_update("BTC/USDT", 50_000.0, 50_010.0, 1_000);
    d.on_price_update("ETH/BTC", 0.06, 0.0601, 1_000);
    let first = d.on_price_update("ETH/USDT", 3_100.0, 3_101.0, 1_000_000_000);
    assert_eq!(first.len(), 1);

    d.mark_executed(&first[0], 1_000_000_000);

    // Re-trigger within the cooldown window (1ms = 1_000_000ns later).
    let second = d.on_price_update("ETH/USDT", 3_100.0, 3_101.0, 1_000_500_000);
    assert!(second.is_empty(), "cooldown should suppress re-detection");

    // Past the cooldown window, detection resumes.
    let third = d.on_price_update("ETH/USDT", 3_100.0, 3_101.0, 1_002_000_001);
    assert_eq!(third.len(), 1);
}

#[test]
fn zero_denominator_does_not_panic_or_falsely_trigger() {
    let mut d = TriangularDetector::new(ArbitrageConfig::default());
    d.detect_relationships(&universe());

    // leg1_ask == 0.0 would make implied_forward == 0 if not guarded away
    // by has_all_prices first.
    d.on_price_update("BTC/USDT", 0.0, 0.0, 1_000);
    d.on_price_update("ETH/BTC", 0.06, 0.0601, 1_000);
    let opps = d.on_price_update("ETH/USDT", 3_100.0, 3_101.0, 1_000);
    assert!(opps.is_empty());
}

#[test]
fn stats_track_detected_and_executed_counts() {
    let mut d = TriangularDetector::new(ArbitrageConfig::default());
    d.detect_relationships(&universe());

    d.on_price_update("BTC/USDT", 50_000.0, 50_010.0, 1_000);
    d.on_price_update("ETH/BTC", 0.06, 0.0601, 1_000);
    let opps = d.on_price_update("ETH/USDT", 3_100.0, 3_101.0, 1_000);
    assert_eq!(opps.len(), 1);

    let before = d.stats();
    assert_eq!(before.total_opportunities, 1);
    assert_eq!(before.total_executions, 0);

    d.mark_executed(&opps[0], 2_000);
    let after = d.stats();
    assert_eq!(after.total_executions, 1);
}
