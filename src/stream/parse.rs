//! Tolerant, key-indexed parsing of Binance combined-stream JSON payloads.
//!
//! Uses `serde_json::Value` rather than strict derived structs: a stray or
//! missing field degrades a single update instead of failing the whole
//! connection, matching the substring-scanning extractors this replaces.

use serde_json::Value;

use crate::types::{price_from_f64, Price};

#[derive(Debug, Clone, PartialEq)]
pub struct BookTicker {
    pub symbol: String,
    pub bid_price: Price,
    pub bid_qty: f64,
    pub ask_price: Price,
    pub ask_qty: f64,
    pub update_time: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WsTrade {
    pub symbol: String,
    pub trade_id: u64,
    pub price: Price,
    pub quantity: f64,
    pub time: u64,
    pub is_buyer_maker: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WsKline {
    pub symbol: String,
    pub open_time: u64,
    pub close_time: u64,
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    pub volume: f64,
    pub trades: u32,
    pub is_closed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    BookTicker(BookTicker),
    Trade(WsTrade),
    Kline(WsKline),
}

fn field_str(v: &Value, key: &str) -> Option<&str> {
    v.get(key).and_then(Value::as_str)
}

fn field_f64(v: &Value, key: &str) -> f64 {
    match v.get(key) {
        Some(Value::String(s)) => s.parse().unwrap_or(0.0),
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn field_u64(v: &Value, key: &str) -> u64 {
    match v.get(key) {
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        _ => 0,
    }
}

fn field_bool(v: &Value, key: &str) -> bool {
    v.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn parse_book_ticker(data: &Value) -> Option<BookTicker> {
    let symbol = field_str(data, "s")?.to_string();
    Some(BookTicker {
        symbol,
        bid_price: price_from_f64(field_f64(data, "b")),
        bid_qty: field_f64(data, "B"),
        ask_price: price_from_f64(field_f64(data, "a")),
        ask_qty: field_f64(data, "A"),
        update_time: field_u64(data, "u"),
    })
}

fn parse_trade(data: &Value) -> Option<WsTrade> {
    let symbol = field_str(data, "s")?.to_string();
    Some(WsTrade {
        symbol,
        trade_id: field_u64(data, "t"),
        price: price_from_f64(field_f64(data, "p")),
        quantity: field_f64(data, "q"),
        time: field_u64(data, "T"),
        is_buyer_maker: field_bool(data, "m"),
    })
}

fn parse_kline(data: &Value) -> Option<WsKline> {
    let symbol = field_str(data, "s")?.to_string();
    let k = data.get("k")?;
    Some(WsKline {
        symbol,
        open_time: field_u64(k, "t"),
        close_time: field_u64(k, "T"),
        open: price_from_f64(field_f64(k, "o")),
        high: price_from_f64(field_f64(k, "h")),
        low: price_from_f64(field_f64(k, "l")),
        close: price_from_f64(field_f64(k, "c")),
        volume: field_f64(k, "v"),
        trades: field_u64(k, "n") as u32,
        is_closed: field_bool(k, "x"),
    })
}

/// Parse one incoming WebSocket text frame. Handles both the combined-stream
/// envelope (`{"stream": "...", "data": {...}}`) and a bare payload.
pub fn parse_message(raw: &str) -> Option<StreamEvent> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let data = if value.get("stream").is_some() {
        value.get("data")?
    } else {
        &value
    };

    if data.get("k").is_some() {
        return parse_kline(data).map(StreamEvent::Kline);
    }
    if data.get("b").is_some() && data.get("a").is_some() {
        return parse_book_ticker(data).map(StreamEvent::BookTicker);
    }
    if data.get("p").is_some() && data.get("q").is_some() {
        return parse_trade(data).map(StreamEvent::Trade);
    }
    None
}

/// Lowercase-stream-name suffix for a book-ticker subscription.
pub fn book_ticker_stream(symbol: &str) -> String {
    format!("{}@bookTicker", symbol.to_lowercase())
}

pub fn trade_stream(symbol: &str) -> String {
    format!("{}@trade", symbol.to_lowercase())
}

pub fn kline_stream(symbol: &str, interval: &str) -> String {
    format!("{}@kline_{interval}", symbol.to_lowercase())
}

/// Build the `/stream?streams=a/b/c` combined-stream path from subscriptions.
pub fn build_stream_path(streams: &[String]) -> String {
    if streams.len() == 1 {
        format!("/ws/{}", streams[0])
    } else {
        format!("/stream?streams={}", streams.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_book_ticker() {
        let raw = r#"{"u":123,"s":"BTCUSDT","b":"50000.00","B":"1.5","a":"50001.00","A":"2.0"}"#;
        match parse_message(raw).unwrap() {
            StreamEvent::BookTicker(bt) => {
                assert_eq!(bt.symbol, "BTCUSDT");
                assert_eq!(bt.bid_qty, 1.5);
                assert_eq!(bt.update_time, 123);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn parses_combined_stream_envelope() {
        let raw = r#"{"stream":"btcusdt@bookTicker","data":{"u":1,"s":"BTCUSDT","b":"1","B":"1","a":"2","A":"1"}}"#;
        assert!(matches!(parse_message(raw), Some(StreamEvent::BookTicker(_))));
    }

    #[test]
    fn parses_trade_and_kline() {
        let trade_raw = r#"{"s":"ETHUSDT","t":9,"p":"3000.5","q":"0.1","T":42,"m":true}"#;
        match parse_message(trade_raw).unwrap() {
            StreamEvent::Trade(t) => assert!(t.is_buyer_maker),
            other => panic!("unexpected event: {other:?}"),
        }

        let kline_raw = r#"{"s":"ETHUSDT","k":{"t":1,"T":2,"o":"1","h":"2","l":"0.5","c":"1.5","v":"10","n":3,"x":false}}"#;
        match parse_message(kline_raw).unwrap() {
            StreamEvent::Kline(k) => assert_eq!(k.trades, 3),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn malformed_json_yields_none_without_panicking() {
        assert!(parse_message("not json").is_none());
        assert!(parse_message("{}").is_none());
    }

    #[test]
    fn build_stream_path_single_vs_combined() {
        assert_eq!(build_stream_path(&["btcusdt@bookTicker".into()]), "/ws/btcusdt@bookTicker");
        assert_eq!(
            build_stream_path(&["a@bookTicker".into(), "b@trade".into()]),
            "/stream?streams=a@bookTicker/b@trade"
        );
    }
}
