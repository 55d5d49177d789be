//! Minimum yield per cycle.
//!
//! A full cycle stores the usable window once and delivers
//! `deliverable_per_cycle_kwh` at the meter. The cutoff is that cycle's cost,
//! spread evenly over the delivered energy. An episode whose margin does not
//! cover its share of the cutoff lowers the objective and is left out, so the
//! solver prefers one wide price spread over several narrow ones.

use good_lp::{Expression, Variable};

use super::Cutoff;
use crate::domain::Battery;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleYieldEnforcer {
    cutoff: Cutoff,
    cost_per_kwh: f64,
}

impl CycleYieldEnforcer {
    pub fn new(battery: &Battery, cutoff: Cutoff) -> Self {
        let deliverable = battery.deliverable_per_cycle_kwh();
        // an empty window moves no energy, nothing to enforce
        let cost_per_kwh = if cutoff.is_active() && deliverable > 0.0 {
            cutoff.value() / deliverable
        } else {
            0.0
        };
        Self {
            cutoff,
            cost_per_kwh,
        }
    }

    pub fn is_active(&self) -> bool {
        self.cost_per_kwh > 0.0
    }

    pub fn cutoff(&self) -> Cutoff {
        self.cutoff
    }

    /// Cycle cost carried by each kWh delivered at the meter.
    pub fn cost_per_kwh_delivered(&self) -> f64 {
        self.cost_per_kwh
    }

    pub fn cycle_cost(&self, delivered_kwh: f64) -> f64 {
        self.cost_per_kwh * delivered_kwh
    }

    /// Subtract the amortised cycle cost of `discharge` from a yield objective.
    pub fn apply(&self, objective: Expression, discharge: &[Variable]) -> Expression {
        if !self.is_active() {
            return objective;
        }
        tracing::debug!(
            cutoff = self.cutoff.value(),
            cost_per_kwh = self.cost_per_kwh,
            "enforcing minimum yield per cycle"
        );
        let cost: Expression = discharge.iter().map(|&d| self.cost_per_kwh * d).sum();
        objective - cost
    }
}
