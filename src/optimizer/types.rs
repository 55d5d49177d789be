use serde::{Deserialize, Serialize};

use super::OptimizerError;
use crate::domain::{Household, PriceSeries, Schedule};

/// Minimum yield a full charge/discharge cycle must produce. Zero disables
/// the restriction.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Cutoff(f64);

impl Cutoff {
    pub const NONE: Cutoff = Cutoff(0.0);

    pub fn new(value: f64) -> Result<Self, OptimizerError> {
        if !value.is_finite() || value < 0.0 {
            return Err(OptimizerError::invalid(format!(
                "cutoff must be a non-negative number, got {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn is_active(self) -> bool {
        self.0 > 0.0
    }
}

impl TryFrom<f64> for Cutoff {
    type Error = OptimizerError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Cutoff::new(value)
    }
}

impl From<Cutoff> for f64 {
    fn from(cutoff: Cutoff) -> Self {
        cutoff.0
    }
}

/// Which grid exchanges the battery may take part in (general case).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPolicy {
    pub allow_grid_charge: bool,
    pub allow_grid_discharge: bool,
}

impl GridPolicy {
    pub const ARBITRAGE: GridPolicy = GridPolicy {
        allow_grid_charge: true,
        allow_grid_discharge: true,
    };

    /// Only surplus charging and self-use discharging.
    pub const SELF_CONSUMPTION: GridPolicy = GridPolicy {
        allow_grid_charge: false,
        allow_grid_discharge: false,
    };

    pub fn is_self_consumption(&self) -> bool {
        !self.allow_grid_charge && !self.allow_grid_discharge
    }
}

impl Default for GridPolicy {
    fn default() -> Self {
        Self::ARBITRAGE
    }
}

/// Inputs of a single optimization call.
#[derive(Debug, Clone)]
pub struct OptimizationRequest {
    pub prices: PriceSeries,
    pub cutoff: Cutoff,
    /// Required by the general optimizer, ignored under net metering.
    pub household: Option<Household>,
    pub policy: GridPolicy,
}

impl OptimizationRequest {
    pub fn new(prices: PriceSeries) -> Self {
        Self {
            prices,
            cutoff: Cutoff::NONE,
            household: None,
            policy: GridPolicy::default(),
        }
    }

    pub fn with_cutoff(mut self, cutoff: Cutoff) -> Self {
        self.cutoff = cutoff;
        self
    }

    pub fn with_household(mut self, household: Household) -> Self {
        self.household = Some(household);
        self
    }

    pub fn with_policy(mut self, policy: GridPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// A battery-schedule formulation over the shared constraint builder.
pub trait OptimizationStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn optimize(&self, request: &OptimizationRequest) -> Result<Schedule, OptimizerError>;
}

pub struct BatteryOptimizer {
    pub strategy: Box<dyn OptimizationStrategy>,
}

impl BatteryOptimizer {
    pub fn new(strategy: impl OptimizationStrategy + 'static) -> Self {
        Self {
            strategy: Box::new(strategy),
        }
    }

    pub fn optimize(&self, request: &OptimizationRequest) -> Result<Schedule, OptimizerError> {
        self.strategy.optimize(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cutoff_validation() {
        assert!(Cutoff::new(0.2).unwrap().is_active());
        assert!(!Cutoff::NONE.is_active());
        assert!(Cutoff::new(-0.1).is_err());
        assert!(Cutoff::new(f64::NAN).is_err());
    }

    #[test]
    fn test_self_consumption_policy() {
        assert!(GridPolicy::SELF_CONSUMPTION.is_self_consumption());
        assert!(!GridPolicy::default().is_self_consumption());
    }
}
