//! Standalone UDP telemetry collector: joins the engine's multicast group
//! and prints each packet. In production this would forward to a
//! time-series store instead of stdout.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use arb_engine::telemetry::packet::TelemetryType;
use arb_engine::telemetry::{TelemetryPacket, TelemetrySubscriber};

#[derive(Parser, Debug)]
#[command(name = "telemetry_collector")]
#[command(about = "Receives UDP multicast telemetry from the arbitrage engine")]
struct Args {
    /// Multicast address to join
    #[arg(short, long, env = "COLLECTOR_ADDRESS", default_value = "239.255.0.1")]
    address: String,

    /// UDP port
    #[arg(short, long, env = "COLLECTOR_PORT", default_value_t = 5555)]
    port: u16,

    /// Only show fills and P&L updates
    #[arg(short, long, default_value_t = false)]
    quiet: bool,
}

fn type_name(t: TelemetryType) -> &'static str {
    match t {
        TelemetryType::Heartbeat => "HEARTBEAT",
        TelemetryType::Quote => "QUOTE",
        TelemetryType::Fill => "FILL",
        TelemetryType::Order => "ORDER",
        TelemetryType::Position => "POSITION",
        TelemetryType::PnL => "PNL",
        TelemetryType::Regime => "REGIME",
        TelemetryType::Risk => "RISK",
        TelemetryType::Latency => "LATENCY",
    }
}

fn print_packet(pkt: &TelemetryPacket) {
    let seq = pkt.sequence;
    let symbol_id = pkt.symbol_id;
    let ty = match pkt.packet_type() {
        Some(t) => t,
        None => {
            println!("[{seq:>5}] UNKNOWN type byte");
            return;
        }
    };

    print!("[{seq:>5}] {:>9}", type_name(ty));
    if symbol_id > 0 {
        print!(" sym={symbol_id}");
    }

    match ty {
        TelemetryType::Heartbeat => print!(" (alive)"),
        TelemetryType::Quote => {
            let (bid, ask, bid_size, ask_size) = pkt.read_quote();
            print!(
                " bid={:.2} ask={:.2} spread={:.2} bid_size={bid_size} ask_size={ask_size}",
                bid as f64 / 1e8,
                ask as f64 / 1e8,
                (ask - bid) as f64 / 1e8,
            );
        }
        TelemetryType::Fill => {
            let (price, qty, side, _fill_type) = pkt.read_fill();
            let side_str = if side == arb_engine::telemetry::Side::Buy { "BUY" } else { "SELL" };
            print!(" {side_str} qty={qty} price=${:.2}", price as f64 / 1e8);
        }
        TelemetryType::Position => {
            let (qty, avg_price, _market_value, unrealized_pnl) = pkt.read_position();
            print!(" qty={:.4} avg=${:.2} unrealized=${:.2}", qty as f64 / 1e8, avg_price as f64 / 1e8, unrealized_pnl as f64 / 1e8);
        }
        TelemetryType::PnL => {
            let (realized, unrealized, equity, wins, losses) = pkt.read_pnl();
            print!(
                " realized=${:.2} unrealized=${:.2} equity=${:.2} wins={wins} losses={losses}",
                realized as f64 / 1e8,
                unrealized as f64 / 1e8,
                equity as f64 / 1e8,
            );
        }
        TelemetryType::Regime => {
            let (regime, confidence, _volatility) = pkt.read_regime();
            print!(" regime={regime} confidence={confidence}%");
        }
        TelemetryType::Latency => {
            let (tick_to_decision, decision_to_order, _order_to_ack, total) = pkt.read_latency();
            print!(" tick_to_decision={tick_to_decision}ns decision_to_order={decision_to_order}ns total={total}ns");
        }
        TelemetryType::Order | TelemetryType::Risk => {}
    }
    println!();
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into())).init();

    let args = Args::parse();

    info!(address = %args.address, port = args.port, "starting telemetry collector");
    if args.quiet {
        info!("quiet mode: showing fills and P&L only");
    }

    let group = args.address.parse().context("invalid multicast address")?;
    let mut subscriber = TelemetrySubscriber::new(group, args.port).context("failed to open telemetry subscriber")?;
    let stats = subscriber.stats();

    let quiet = args.quiet;
    subscriber.start(move |pkt| {
        if quiet {
            match pkt.packet_type() {
                Some(TelemetryType::Fill) | Some(TelemetryType::PnL) => {}
                _ => return,
            }
        }
        print_packet(&pkt);
    });

    let running = Arc::new(AtomicBool::new(true));
    let ctrlc_flag = running.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        ctrlc_flag.store(false, Ordering::SeqCst);
    });

    while running.load(Ordering::Relaxed) {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    subscriber.stop();

    let received = stats.packets_received.load(Ordering::Relaxed);
    let dropped = stats.packets_dropped.load(Ordering::Relaxed);
    println!("\n--- Statistics ---");
    println!("Packets received: {received}");
    println!("Packets dropped:  {dropped}");
    if dropped > 0 {
        let loss_rate = 100.0 * dropped as f64 / (received + dropped) as f64;
        println!("Loss rate:        {loss_rate:.2}%");
    }

    Ok(())
}
