pub mod battery;
pub mod schedule;
pub mod series;
pub mod tariff;

pub use battery::*;
pub use schedule::*;
pub use series::*;
pub use tariff::*;
