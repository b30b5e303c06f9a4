//! EdgeLab Core — opening-range-breakout simulation.
//!
//! This crate contains the deterministic heart of the pipeline:
//! - Domain types (bars, instruments, trades, ranges, identifiers)
//! - Opening-range construction per session
//! - Breakout detection (close-through and boundary-touch rules)
//! - The trade-simulation state machine
//! - Execution cost model (canonical vs tradeable return-multiples)
//! - Sample aggregation and the setup filter set
//! - The bar-series provider seam
//!
//! Everything here is a pure function of its inputs: no I/O in the hot
//! loop, no process-wide state, identical outputs on identical bars.

pub mod breakout;
pub mod costs;
pub mod domain;
pub mod filters;
pub mod provider;
pub mod sample;
pub mod session;
pub mod sim;
pub mod strategy;
