//! Cycle engine: venue selection → leg arithmetic → orchestrated runs.

pub mod selector;
pub mod calculator;
pub mod runner;

pub use calculator::{ClosingRate, CycleCalculator, VenueLeg};
pub use runner::{CycleRequest, CycleRun, CycleRunner, RawData, RunDefaults, VenueLegRequest};
pub use selector::select_best;
