pub mod constraints;
pub mod cycle_yield;
pub mod error;
pub mod strategies;
pub mod types;

pub use constraints::{BatteryFlows, ScheduleProblem};
pub use cycle_yield::*;
pub use error::*;
pub use strategies::*;
pub use types::*;
