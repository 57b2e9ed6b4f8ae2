//! Low-latency triangular arbitrage engine entry point.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use arb_engine::arbitrage::{ArbitrageConfig, TriangularArbConfig, TriangularDetector};
use arb_engine::config::EngineArgs;
use arb_engine::engine::Engine;
use arb_engine::order_sink::PaperOrderSink;
use arb_engine::risk::RiskConfig;
use arb_engine::risk::RiskManager;
use arb_engine::stream::client::{StreamClient, StreamClientConfig};
use arb_engine::stream::parse::{book_ticker_stream, StreamEvent};
use arb_engine::symbol_table::SymbolTable;
use arb_engine::telemetry::TelemetryPublisher;
use arb_engine::types::{price_from_f64, Quantity};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv::dotenv();

    let args = EngineArgs::parse();

    let default_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_level.into()))
        .init();

    info!(paper_mode = args.paper_mode, symbols = %args.symbols, "starting arbitrage engine");

    let symbol_list = args.symbol_list();

    let mut symbols = SymbolTable::new();
    for ticker in &symbol_list {
        if let Err(e) = symbols.register(ticker) {
            info!(ticker, error = %e, "symbol registration skipped");
        }
    }

    let mut risk = RiskManager::new(RiskConfig::default());
    risk.set_initial_capital(price_from_f64(args.capital));

    let arb_config = ArbitrageConfig {
        default_min_spread_pct: args.min_spread_pct,
        execution_cooldown_us: args.execution_cooldown_us,
        ..ArbitrageConfig::default()
    };
    let mut detector = TriangularDetector::new(arb_config);
    let relation_count = detector.detect_relationships(&symbol_list);
    info!(relation_count, "triangular relationships discovered");

    let telemetry = if args.telemetry_enabled {
        let group = args.telemetry_group.parse().context("invalid telemetry multicast group")?;
        Some(TelemetryPublisher::new(group, args.telemetry_port).context("failed to open telemetry publisher")?)
    } else {
        None
    };

    let mut engine = Engine::new(symbols, risk, detector, Box::new(PaperOrderSink::default()), telemetry);

    let streams = symbol_list.iter().map(|s| book_ticker_stream(s)).collect();
    let stream_config = StreamClientConfig { pin_core: args.pin_core, ..StreamClientConfig::mainnet(streams) };
    let (mut client, mut events) = StreamClient::new(stream_config);
    let shutdown = client.shutdown_handle();

    client.set_connect_callback(|connected| info!(connected, "ingress connection state changed"));
    client.set_error_callback(|msg| info!(error = msg, "ingress connection error"));
    client.set_reconnect_callback(|attempt, success| info!(attempt, success, "ingress reconnect attempt"));

    let run_handle = tokio::spawn(client.run());

    if args.duration_secs > 0 {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_secs(args.duration_secs)).await;
            shutdown.store(true, std::sync::atomic::Ordering::Relaxed);
        });
    }

    while let Some(event) = events.recv().await {
        if let StreamEvent::BookTicker(bt) = event {
            let bid_qty = bt.bid_qty.round() as Quantity;
            let ask_qty = bt.ask_qty.round() as Quantity;
            engine.on_quote(&bt.symbol, bt.bid_price, bt.ask_price, bid_qty, ask_qty, bt.update_time);
        }
    }

    run_handle.await.context("ingress task panicked")??;
    Ok(())
}
