//! cycle-arb: USD → USDT → ARS → USD arbitrage calculator.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod venues;
pub mod sources;
pub mod engine;
pub mod dashboard;
