//! Fire-and-forget UDP multicast telemetry publisher.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::time::{SystemTime, UNIX_EPOCH};

use socket2::{Domain, Protocol, Socket, Type};
use tracing::trace;

use super::packet::{Side, TelemetryPacket, DEFAULT_MULTICAST_GROUP, DEFAULT_MULTICAST_PORT};

pub struct TelemetryPublisher {
    socket: UdpSocket,
    dest: SocketAddr,
    sequence: u32,
}

impl TelemetryPublisher {
    pub fn new(multicast_addr: Ipv4Addr, port: u16) -> std::io::Result<Self> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_multicast_ttl_v4(1)?;
        socket.set_multicast_loop_v4(false)?;
        socket.set_nonblocking(true)?;
        socket.bind(&SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0).into())?;

        Ok(Self { socket: socket.into(), dest: SocketAddrV4::new(multicast_addr, port).into(), sequence: 0 })
    }

    pub fn with_defaults() -> std::io::Result<Self> {
        Self::new(DEFAULT_MULTICAST_GROUP.parse().expect("valid default multicast address"), DEFAULT_MULTICAST_PORT)
    }

    fn now_ns() -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos() as u64).unwrap_or(0)
    }

    /// Stamp `timestamp_ns`/`sequence` and send. Errors (including
    /// would-block on a full send buffer) are dropped silently: telemetry
    /// is fire-and-forget by design.
    pub fn publish(&mut self, mut pkt: TelemetryPacket) {
        pkt.timestamp_ns = Self::now_ns();
        pkt.sequence = self.sequence;
        self.sequence = self.sequence.wrapping_add(1);

        let bytes = pkt.to_bytes();
        match self.socket.send_to(&bytes, self.dest) {
            Ok(_) => {}
            Err(e) => trace!(error = %e, "telemetry publish dropped"),
        }
    }

    pub fn publish_heartbeat(&mut self) {
        self.publish(TelemetryPacket::heartbeat());
    }

    pub fn publish_quote(&mut self, symbol_id: u16, bid: i64, ask: i64, bid_size: u32, ask_size: u32) {
        self.publish(TelemetryPacket::quote(symbol_id, bid, ask, bid_size, ask_size));
    }

    pub fn publish_fill(&mut self, symbol_id: u16, side: Side, qty: u32, price: i64) {
        self.publish(TelemetryPacket::fill(symbol_id, price, qty, side, 0));
    }

    pub fn publish_position(&mut self, symbol_id: u16, qty: i64, avg_price: i64, market_value: i64, unrealized_pnl: i64) {
        self.publish(TelemetryPacket::position(symbol_id, qty, avg_price, market_value, unrealized_pnl));
    }

    pub fn publish_pnl(&mut self, realized: i64, unrealized: i64, equity: i64, wins: u32, losses: u32) {
        self.publish(TelemetryPacket::pnl(realized, unrealized, equity, wins, losses));
    }

    pub fn publish_regime(&mut self, symbol_id: u16, regime: u8, confidence: u8, volatility: i64) {
        self.publish(TelemetryPacket::regime(symbol_id, regime, confidence, volatility));
    }

    pub fn publish_latency(&mut self, tick_to_decision_ns: u32, decision_to_order_ns: u32, order_to_ack_ns: u32, total_ns: u32) {
        self.publish(TelemetryPacket::latency(tick_to_decision_ns, decision_to_order_ns, order_to_ack_ns, total_ns));
    }
}
