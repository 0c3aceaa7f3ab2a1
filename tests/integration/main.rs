//! Integration test harness: one binary, one module per area.

mod fleet_cycle;
mod mock_executor;
