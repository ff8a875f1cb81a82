//! Integration tests: full calculation runs against in-memory sources.

mod cycle_run;
mod mock_sources;
