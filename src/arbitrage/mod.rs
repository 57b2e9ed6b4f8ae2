//! Triangular arbitrage: symbol-pair parsing, relationship configuration,
//! and spread detection.

pub mod config;
pub mod detector;
pub mod symbol_pair;

pub use config::{ArbitrageConfig, TriangularArbConfig, TriangularArbState};
pub use detector::{ArbOpportunity, ArbOrderSignal, TriangularDetector, TriangularRelation};
pub use symbol_pair::SymbolPair;
