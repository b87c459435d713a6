//! Library exports for pulsemetrics, shared between the binary and tests.

pub mod config;
pub mod metrics;
pub mod routes;
pub mod simulator;
pub mod startup;
pub mod state;
pub mod utils;
