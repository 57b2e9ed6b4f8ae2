//! Fixed 64-byte UDP telemetry wire format.
//!
//! Every packet shares an 8-byte header (timestamp, sequence, symbol,
//! type, flags) followed by a 40-byte type-specific payload and 8 bytes of
//! reserved padding. Unlike the edge-ingest wire format this carries no
//! checksum: telemetry is monitoring-grade, loss-tolerant by design.

pub const TELEMETRY_PACKET_SIZE: usize = 64;
pub const PAYLOAD_SIZE: usize = 40;

pub const DEFAULT_MULTICAST_GROUP: &str = "239.255.0.1";
pub const DEFAULT_MULTICAST_PORT: u16 = 5555;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TelemetryType {
    Heartbeat = 0,
    Quote = 1,
    Fill = 2,
    Order = 3,
    Position = 4,
    PnL = 5,
    Regime = 6,
    Risk = 7,
    Latency = 8,
}

impl TelemetryType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Heartbeat),
            1 => Some(Self::Quote),
            2 => Some(Self::Fill),
            3 => Some(Self::Order),
            4 => Some(Self::Position),
            5 => Some(Self::PnL),
            6 => Some(Self::Regime),
            7 => Some(Self::Risk),
            8 => Some(Self::Latency),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy = 0,
    Sell = 1,
}

/// A 64-byte telemetry packet. The payload is stored as raw bytes and
/// interpreted through the typed accessors below, rather than as a Rust
/// union, so every field access stays in safe code.
#[derive(Debug, Clone, Copy)]
#[repr(C, packed)]
pub struct TelemetryPacket {
    pub timestamp_ns: u64,
    pub sequence: u32,
    pub symbol_id: u16,
    pub packet_type: u8,
    pub flags: u8,
    pub payload: [u8; PAYLOAD_SIZE],
    pub _pad: [u8; 8],
}

const _: () = assert!(std::mem::size_of::<TelemetryPacket>() == TELEMETRY_PACKET_SIZE);

impl Default for TelemetryPacket {
    fn default() -> Self {
        Self {
            timestamp_ns: 0,
            sequence: 0,
            symbol_id: 0,
            packet_type: TelemetryType::Heartbeat as u8,
            flags: 0,
            payload: [0; PAYLOAD_SIZE],
            _pad: [0; 8],
        }
    }
}

impl TelemetryPacket {
    pub fn packet_type(&self) -> Option<TelemetryType> {
        TelemetryType::from_u8(self.packet_type)
    }

    pub fn to_bytes(&self) -> [u8; TELEMETRY_PACKET_SIZE] {
        let mut buf = [0u8; TELEMETRY_PACKET_SIZE];
        buf[0..8].copy_from_slice(&self.timestamp_ns.to_le_bytes());
        buf[8..12].copy_from_slice(&self.sequence.to_le_bytes());
        buf[12..14].copy_from_slice(&self.symbol_id.to_le_bytes());
        buf[14] = self.packet_type;
        buf[15] = self.flags;
        buf[16..56].copy_from_slice(&self.payload);
        buf[56..64].copy_from_slice(&self._pad);
        buf
    }

    pub fn from_bytes(buf: &[u8; TELEMETRY_PACKET_SIZE]) -> Self {
        let mut payload = [0u8; PAYLOAD_SIZE];
        payload.copy_from_slice(&buf[16..56]);
        Self {
            timestamp_ns: u64::from_le_bytes(buf[0..8].try_into().unwrap()),
            sequence: u32::from_le_bytes(buf[8..12].try_into().unwrap()),
            symbol_id: u16::from_le_bytes(buf[12..14].try_into().unwrap()),
            packet_type: buf[14],
            flags: buf[15],
            payload,
            _pad: buf[56..64].try_into().unwrap(),
        }
    }

    pub fn try_from_slice(buf: &[u8]) -> Option<Self> {
        if buf.len() != TELEMETRY_PACKET_SIZE {
            return None;
        }
        let arr: [u8; TELEMETRY_PACKET_SIZE] = buf.try_into().ok()?;
        Some(Self::from_bytes(&arr))
    }

    fn with_type(symbol_id: u16, ty: TelemetryType) -> Self {
        Self { symbol_id, packet_type: ty as u8, ..Self::default() }
    }

    pub fn heartbeat() -> Self {
        Self::with_type(0, TelemetryType::Heartbeat)
    }

    pub fn quote(symbol_id: u16, bid_price: i64, ask_price: i64, bid_size: u32, ask_size: u32) -> Self {
        let mut pkt = Self::with_type(symbol_id, TelemetryType::Quote);
        pkt.payload[0..8].copy_from_slice(&bid_price.to_le_bytes());
        pkt.payload[8..16].copy_from_slice(&ask_price.to_le_bytes());
        pkt.payload[16..20].copy_from_slice(&bid_size.to_le_bytes());
        pkt.payload[20..24].copy_from_slice(&ask_size.to_le_bytes());
        pkt
    }

    pub fn read_quote(&self) -> (i64, i64, u32, u32) {
        (
            i64::from_le_bytes(self.payload[0..8].try_into().unwrap()),
            i64::from_le_bytes(self.payload[8..16].try_into().unwrap()),
            u32::from_le_bytes(self.payload[16..20].try_into().unwrap()),
            u32::from_le_bytes(self.payload[20..24].try_into().unwrap()),
        )
    }

    pub fn fill(symbol_id: u16, price: i64, quantity: u32, side: Side, fill_type: u8) -> Self {
        let mut pkt = Self::with_type(symbol_id, TelemetryType::Fill);
        pkt.payload[0..8].copy_from_slice(&price.to_le_bytes());
        pkt.payload[8..12].copy_from_slice(&quantity.to_le_bytes());
        pkt.payload[12] = side as u8;
        pkt.payload[13] = fill_type;
        pkt
    }

    pub fn read_fill(&self) -> (i64, u32, Side, u8) {
        let side = if self.payload[12] == 0 { Side::Buy } else { Side::Sell };
        (
            i64::from_le_bytes(self.payload[0..8].try_into().unwrap()),
            u32::from_le_bytes(self.payload[8..12].try_into().unwrap()),
            side,
            self.payload[13],
        )
    }

    pub fn position(symbol_id: u16, quantity: i64, avg_price: i64, market_value: i64, unrealized_pnl: i64) -> Self {
        let mut pkt = Self::with_type(symbol_id, TelemetryType::Position);
        pkt.payload[0..8].copy_from_slice(&quantity.to_le_bytes());
        pkt.payload[8..16].copy_from_slice(&avg_price.to_le_bytes());
        pkt.payload[16..24].copy_from_slice(&market_value.to_le_bytes());
        pkt.payload[24..32].copy_from_slice(&unrealized_pnl.to_le_bytes());
        pkt
    }

    pub fn read_position(&self) -> (i64, i64, i64, i64) {
        (
            i64::from_le_bytes(self.payload[0..8].try_into().unwrap()),
            i64::from_le_bytes(self.payload[8..16].try_into().unwrap()),
            i64::from_le_bytes(self.payload[16..24].try_into().unwrap()),
            i64::from_le_bytes(self.payload[24..32].try_into().unwrap()),
        )
    }

    pub fn pnl(realized_pnl: i64, unrealized_pnl: i64, total_equity: i64, win_count: u32, loss_count: u32) -> Self {
        let mut pkt = Self::with_type(0, TelemetryType::PnL);
        pkt.payload[0..8].copy_from_slice(&realized_pnl.to_le_bytes());
        pkt.payload[8..16].copy_from_slice(&unrealized_pnl.to_le_bytes());
        pkt.payload[16..24].copy_from_slice(&total_equity.to_le_bytes());
        pkt.payload[24..28].copy_from_slice(&win_count.to_le_bytes());
        pkt.payload[28..32].copy_from_slice(&loss_count.to_le_bytes());
        pkt
    }

    pub fn read_pnl(&self) -> (i64, i64, i64, u32, u32) {
        (
            i64::from_le_bytes(self.payload[0..8].try_into().unwrap()),
            i64::from_le_bytes(self.payload[8..16].try_into().unwrap()),
            i64::from_le_bytes(self.payload[16..24].try_into().unwrap()),
            u32::from_le_bytes(self.payload[24..28].try_into().unwrap()),
            u32::from_le_bytes(self.payload[28..32].try_into().unwrap()),
        )
    }

    pub fn regime(symbol_id: u16, regime: u8, confidence: u8, volatility: i64) -> Self {
        let mut pkt = Self::with_type(symbol_id, TelemetryType::Regime);
        pkt.payload[0] = regime;
        pkt.payload[1] = confidence;
        pkt.payload[2..10].copy_from_slice(&volatility.to_le_bytes());
        pkt
    }

    pub fn read_regime(&self) -> (u8, u8, i64) {
        (self.payload[0], self.payload[1], i64::from_le_bytes(self.payload[2..10].try_into().unwrap()))
    }

    pub fn latency(
        tick_to_decision_ns: u32,
        decision_to_order_ns: u32,
        order_to_ack_ns: u32,
        total_roundtrip_ns: u32,
    ) -> Self {
        let mut pkt = Self::with_type(0, TelemetryType::Latency);
        pkt.payload[0..4].copy_from_slice(&tick_to_decision_ns.to_le_bytes());
        pkt.payload[4..8].copy_from_slice(&decision_to_order_ns.to_le_bytes());
        pkt.payload[8..12].copy_from_slice(&order_to_ack_ns.to_le_bytes());
        pkt.payload[12..16].copy_from_slice(&total_roundtrip_ns.to_le_bytes());
        pkt
    }

    pub fn read_latency(&self) -> (u32, u32, u32, u32) {
        (
            u32::from_le_bytes(self.payload[0..4].try_into().unwrap()),
            u32::from_le_bytes(self.payload[4..8].try_into().unwrap()),
            u32::from_le_bytes(self.payload[8..12].try_into().unwrap()),
            u32::from_le_bytes(self.payload[12..16].try_into().unwrap()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packet_is_exactly_64_bytes() {
        assert_eq!(std::mem::size_of::<TelemetryPacket>(), 64);
        assert_eq!(TelemetryPacket::heartbeat().to_bytes().len(), 64);
    }

    #[test]
    fn fill_roundtrip_preserves_all_fields() {
        let pkt = TelemetryPacket::fill(7, 5_000_000_000_000, 100, Side::Buy, 0);
        let bytes = pkt.to_bytes();
        let restored = TelemetryPacket::try_from_slice(&bytes).unwrap();

        assert_eq!(restored.symbol_id, 7);
        assert_eq!(restored.packet_type(), Some(TelemetryType::Fill));
        let (price, qty, side, fill_type) = restored.read_fill();
        assert_eq!(price, 5_000_000_000_000);
        assert_eq!(qty, 100);
        assert_eq!(side, Side::Buy);
        assert_eq!(fill_type, 0);
    }

    #[test]
    fn quote_roundtrip() {
        let pkt = TelemetryPacket::quote(3, 100, 200, 5, 6);
        let restored = TelemetryPacket::try_from_slice(&pkt.to_bytes()).unwrap();
        assert_eq!(restored.read_quote(), (100, 200, 5, 6));
    }

    #[test]
    fn pnl_roundtrip() {
        let pkt = TelemetryPacket::pnl(1_000, -200, 99_800, 12, 3);
        let restored = TelemetryPacket::try_from_slice(&pkt.to_bytes()).unwrap();
        assert_eq!(restored.read_pnl(), (1_000, -200, 99_800, 12, 3));
    }

    #[test]
    fn wrong_size_slice_is_rejected() {
        assert!(TelemetryPacket::try_from_slice(&[0u8; 63]).is_none());
    }

    #[test]
    fn unknown_type_byte_maps_to_none() {
        let mut pkt = TelemetryPacket::heartbeat();
        pkt.packet_type = 200;
        assert_eq!(pkt.packet_type(), None);
    }
}
