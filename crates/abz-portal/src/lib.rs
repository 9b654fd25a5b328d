//! Domain core for the ABZ Group internal portal.
//!
//! The `performance` module carries the evaluation catalog, the weighted
//! scoring engine, and the disclosure rules applied whenever an evaluation
//! leaves the service. `config`, `telemetry`, and `error` form the shared
//! application shell used by the portal binaries.

pub mod config;
pub mod error;
pub mod performance;
pub mod telemetry;
