use super::*;

#[test]
fn order_rejected_when_halted() {
    let mut rm = RiskManager::new(RiskConfig::default());
    rm.halt();
    assert!(!rm.check_order(0, Side::Buy, 10, 100));
}

#[test]
fn order_rejected_above_max_size() {
    let rm = RiskManager::new(RiskConfig { max_order_size: 100, ..Default::default() });
    assert!(!rm.check_order(0, Side::Buy, 101, 100));
    assert!(rm.check_order(0, Side::Buy, 100, 100));
}

#[test]
fn symbol_position_limit_blocks_order() {
    let mut rm = RiskManager::new(RiskConfig::default());
    rm.set_symbol_limit(0, 50, 0);
    assert!(rm.check_order(0, Side::Buy, 50, 100));
    assert!(!rm.check_order(0, Side::Buy, 51, 100));
}

#[test]
fn symbol_notional_limit_blocks_order() {
    let mut rm = RiskManager::new(RiskConfig::default());
    // notional limit of 1 unit; qty * price / PRICE_SCALE must stay <= 1
    rm.set_symbol_limit(0, 0, 1);
    assert!(!rm.check_order(0, Side::Buy, 1, PRICE_SCALE * 2));
}

#[test]
fn global_notional_limit_blocks_order() {
    let rm = RiskManager::new(RiskConfig { max_total_notional: 1, ..Default::default() });
    assert!(!rm.check_order(0, Side::Buy, 1, PRICE_SCALE * 2));
}

#[test]
fn daily_loss_limit_halts_trading() {
    let mut rm = RiskManager::new(RiskConfig { daily_loss_limit: 1_000, ..Default::default() });
    rm.set_initial_capital(100_000);
    rm.update_pnl(-1_001);
    assert!(rm.is_daily_limit_breached());
    assert!(rm.is_halted());
    assert!(!rm.check_order(0, Side::Buy, 1, 100));
}

#[test]
fn daily_loss_exactly_at_limit_does_not_breach() {
    let mut rm = RiskManager::new(RiskConfig { daily_loss_limit: 1_000, ..Default::default() });
    rm.set_initial_capital(100_000);
    rm.update_pnl(-1_000);
    assert!(!rm.is_daily_limit_breached());
    assert!(rm.can_trade());
}

#[test]
fn drawdown_breach_at_and_below_threshold() {
    let mut rm = RiskManager::new(RiskConfig { max_drawdown_pct: 0.10, ..Default::default() });
    rm.set_initial_capital(100_000);

    // Exactly 10% drawdown: (100000 - 90000) / 100000 == 0.10, not > 0.10.
    rm.update_pnl(-10_000);
    assert!(!rm.is_drawdown_breached());

    // Just over 10%.
    rm.update_pnl(-10_001);
    assert!(rm.is_drawdown_breached());
    assert!(rm.is_halted());
}

#[test]
fn new_trading_day_preserves_drawdown_latch_but_clears_daily_breach() {
    let mut rm = RiskManager::new(RiskConfig {
        daily_loss_limit: 1_000,
        max_drawdown_pct: 0.05,
        ..Default::default()
    });
    rm.set_initial_capital(100_000);
    rm.update_pnl(-10_000); // breaches both daily loss and drawdown
    assert!(rm.is_daily_limit_breached());
    assert!(rm.is_drawdown_breached());
    assert!(rm.is_halted());

    rm.new_trading_day();
    assert!(!rm.is_daily_limit_breached());
    assert!(rm.is_drawdown_breached(), "drawdown breach must survive the day roll");
    assert!(rm.is_halted(), "halt stays in effect while drawdown is breached");
}

#[test]
fn new_trading_day_clears_halt_when_drawdown_not_breached() {
    let mut rm = RiskManager::new(RiskConfig { daily_loss_limit: 1_000, ..Default::default() });
    rm.set_initial_capital(100_000);
    rm.update_pnl(-1_001);
    assert!(rm.is_halted());

    rm.new_trading_day();
    assert!(rm.can_trade());
}

#[test]
fn on_fill_updates_position_and_notional_incrementally() {
    let mut rm = RiskManager::new(RiskConfig::default());
    rm.on_fill(0, Side::Buy, 10, PRICE_SCALE);
    assert_eq!(rm.symbol_position(0), 10);
    assert_eq!(rm.symbol_notional(0), 10);
    assert_eq!(rm.total_notional(), 10);

    rm.on_fill(1, Side::Sell, 5, PRICE_SCALE * 2);
    assert_eq!(rm.symbol_position(1), -5);
    assert_eq!(rm.symbol_notional(1), 10);
    assert_eq!(rm.total_notional(), 20);

    // A further fill on symbol 0 must replace, not add, its contribution.
    rm.on_fill(0, Side::Buy, 10, PRICE_SCALE);
    assert_eq!(rm.symbol_position(0), 20);
    assert_eq!(rm.symbol_notional(0), 20);
    assert_eq!(rm.total_notional(), 40);
}

#[test]
fn recalculate_total_notional_matches_incremental_tracking() {
    let mut rm = RiskManager::new(RiskConfig::default());
    rm.on_fill(0, Side::Buy, 10, PRICE_SCALE);
    rm.on_fill(1, Side::Sell, 5, PRICE_SCALE * 2);
    let incremental = rm.total_notional();
    rm.recalculate_total_notional();
    assert_eq!(rm.total_notional(), incremental);
}

#[test]
fn reset_all_clears_state_but_restores_peak_to_initial_capital() {
    let mut rm = RiskManager::new(RiskConfig::default());
    rm.set_initial_capital(50_000);
    rm.update_pnl(5_000);
    rm.on_fill(0, Side::Buy, 10, PRICE_SCALE);
    rm.halt();

    rm.reset_all();
    assert_eq!(rm.current_pnl(), 0);
    assert_eq!(rm.peak_equity(), 50_000);
    assert_eq!(rm.total_notional(), 0);
    assert_eq!(rm.symbol_position(0), 0);
    assert!(!rm.is_halted());
}

#[test]
fn out_of_range_symbol_is_ignored_not_panicking() {
    let mut rm = RiskManager::new(RiskConfig::default());
    rm.on_fill(MAX_SYMBOLS as Symbol, Side::Buy, 10, PRICE_SCALE);
    assert_eq!(rm.symbol_position(MAX_SYMBOLS as Symbol), 0);
}
