//! Runtime glue: validated configuration, tracing setup, and coordinator
//! telemetry counters.

pub mod config;
pub mod telemetry;
