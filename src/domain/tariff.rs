use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::optimizer::OptimizerError;

/// Retail tariff applied on top of the day-ahead price when grid exchange is
/// metered separately.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct Tariff {
    /// VAT as a fraction, e.g. 0.21.
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub vat_rate: f64,
    /// Fixed tax per kWh drawn from the grid, VAT included.
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub energy_tax_per_kwh: f64,
    /// Whether exported surplus is paid at the day-ahead price. If so, storing
    /// surplus forgoes that payment.
    #[serde(default)]
    pub feed_in_compensation: bool,
}

impl Tariff {
    /// VAT 21%, the given energy tax, surplus exported at day-ahead price.
    pub fn dutch_retail(energy_tax_per_kwh: f64) -> Self {
        Self {
            vat_rate: 0.21,
            energy_tax_per_kwh,
            feed_in_compensation: true,
        }
    }

    pub fn check(&self) -> Result<(), OptimizerError> {
        if !self.vat_rate.is_finite() || !self.energy_tax_per_kwh.is_finite() {
            return Err(OptimizerError::invalid("tariff rates must be finite"));
        }
        self.validate().map_err(OptimizerError::from)
    }

    /// What a kWh drawn from the grid costs the household.
    pub fn consumer_price(&self, day_ahead: f64) -> f64 {
        day_ahead * (1.0 + self.vat_rate) + self.energy_tax_per_kwh
    }

    /// Revenue forgone by storing a kWh of surplus instead of exporting it.
    pub fn surplus_price(&self, day_ahead: f64) -> f64 {
        if self.feed_in_compensation {
            day_ahead
        } else {
            0.0
        }
    }
}
