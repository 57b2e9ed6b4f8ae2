//! Low-latency triangular-arbitrage engine core.
//!
//! Exposes the building blocks used by the engine binary and the telemetry
//! collector: a fixed symbol table, market-data ingress, the triangular
//! detector, risk management, and the UDP telemetry channel.

pub mod arbitrage;
pub mod config;
pub mod engine;
pub mod order_sink;
pub mod risk;
pub mod strategy;
pub mod stream;
pub mod symbol_table;
pub mod telemetry;
pub mod types;
