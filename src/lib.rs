//! Day-ahead charge/discharge scheduling for residential battery storage.
//!
//! Two optimizers share one mixed-integer battery model:
//! - [`NetMeteringOptimizer`](optimizer::NetMeteringOptimizer): pure price arbitrage
//! - [`GeneralOptimizer`](optimizer::GeneralOptimizer): grid/surplus charging and
//!   grid/self-use discharging priced separately
//!
//! Each call builds its own problem, solves it once and either returns a
//! verified [`Schedule`](domain::Schedule) or an
//! [`OptimizerError`](optimizer::OptimizerError).

pub mod config;
pub mod domain;
pub mod optimizer;
pub mod telemetry;
