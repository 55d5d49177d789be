//! Shared battery-schedule problem.
//!
//! Both optimizers start from the same mixed-integer program:
//! - `charge[t]`, `discharge[t]`: energy drawn from / delivered to the meter (kWh)
//! - `soc[t]`: SoC at the end of step t, bounded by the usable window
//! - `charging[t]`: binary, 1 while charging and 0 while discharging
//!
//! The strategies add their own flow decomposition and objective on top.

use good_lp::{
    constraint, default_solver, variable, Constraint, Expression, ProblemVariables, Solution,
    SolverModel, Variable,
};

use super::OptimizerError;
use crate::domain::Battery;

/// Horizons beyond two days of quarter-hours get slow in branch and bound.
const LARGE_HORIZON: usize = 192;

const BOUNDARY_TOLERANCE_KWH: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct BatteryFlows {
    pub charge: Vec<Variable>,
    pub discharge: Vec<Variable>,
    pub soc: Vec<Variable>,
    pub charging: Vec<Variable>,
}

pub struct ScheduleProblem {
    vars: ProblemVariables,
    constraints: Vec<Constraint>,
    flows: BatteryFlows,
    max_charge_kwh: f64,
    max_discharge_kwh: f64,
}

impl ScheduleProblem {
    /// Build SoC dynamics, power limits, charge/discharge exclusivity and the
    /// boundary condition `soc[last] == end_soc_kwh`.
    pub fn new(
        battery: &Battery,
        horizon: usize,
        step_hours: f64,
        end_soc_kwh: f64,
    ) -> Result<Self, OptimizerError> {
        if horizon == 0 {
            return Err(OptimizerError::invalid("horizon has no time steps"));
        }
        if !end_soc_kwh.is_finite() || end_soc_kwh < 0.0 {
            return Err(OptimizerError::invalid(format!(
                "end SoC must be a non-negative number, got {end_soc_kwh}"
            )));
        }
        for (label, soc) in [("initial", battery.initial_soc_kwh), ("end", end_soc_kwh)] {
            if !battery.soc_within_window(soc, BOUNDARY_TOLERANCE_KWH) {
                return Err(OptimizerError::InfeasibleSchedule(format!(
                    "{label} SoC {soc} kWh lies outside the usable window [{}, {}] kWh",
                    battery.min_soc_kwh(),
                    battery.max_soc_kwh()
                )));
            }
        }
        if horizon > LARGE_HORIZON {
            tracing::warn!(
                horizon,
                "large horizon, the mixed-integer solve may take a while"
            );
        }

        let max_charge_kwh = battery.max_charge_per_step(step_hours);
        let max_discharge_kwh = battery.max_discharge_per_step(step_hours);
        let stored = battery.stored_per_kwh_charged();
        let withdrawn = battery.withdrawn_per_kwh_discharged();

        let mut vars = ProblemVariables::new();
        let charge = vars.add_vector(variable().min(0.0).max(max_charge_kwh), horizon);
        let discharge = vars.add_vector(variable().min(0.0).max(max_discharge_kwh), horizon);
        let soc = vars.add_vector(
            variable().min(battery.min_soc_kwh()).max(battery.max_soc_kwh()),
            horizon,
        );
        let charging = vars.add_vector(variable().binary(), horizon);

        let mut constraints = Vec::with_capacity(3 * horizon + 1);
        for t in 0..horizon {
            let net_in: Expression = charge[t] * stored - discharge[t] * withdrawn;
            constraints.push(if t == 0 {
                constraint!(soc[0] == net_in + battery.initial_soc_kwh)
            } else {
                constraint!(soc[t] == net_in + soc[t - 1])
            });

            // big-M with M = the step's own power limit
            constraints.push(constraint!(charge[t] <= charging[t] * max_charge_kwh));
            constraints.push(constraint!(
                Expression::from(discharge[t]) + charging[t] * max_discharge_kwh
                    <= max_discharge_kwh
            ));
        }
        constraints.push(constraint!(soc[horizon - 1] == end_soc_kwh));

        tracing::debug!(
            horizon,
            step_hours,
            max_charge_kwh,
            max_discharge_kwh,
            "built battery schedule problem"
        );

        Ok(Self {
            vars,
            constraints,
            flows: BatteryFlows {
                charge,
                discharge,
                soc,
                charging,
            },
            max_charge_kwh,
            max_discharge_kwh,
        })
    }

    pub fn flows(&self) -> &BatteryFlows {
        &self.flows
    }

    pub fn horizon(&self) -> usize {
        self.flows.soc.len()
    }

    pub fn max_charge_kwh(&self) -> f64 {
        self.max_charge_kwh
    }

    pub fn max_discharge_kwh(&self) -> f64 {
        self.max_discharge_kwh
    }

    /// One non-negative continuous variable per upper bound.
    pub fn add_flows(&mut self, upper_bounds: impl IntoIterator<Item = f64>) -> Vec<Variable> {
        upper_bounds
            .into_iter()
            .map(|upper| self.vars.add(variable().min(0.0).max(upper)))
            .collect()
    }

    pub fn constrain(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// Maximise `objective` subject to every constraint added so far.
    pub fn solve(self, objective: Expression) -> Result<impl Solution, OptimizerError> {
        let ScheduleProblem {
            vars, constraints, ..
        } = self;
        tracing::debug!(constraints = constraints.len(), "solving");

        let mut model = vars.maximise(objective).using(default_solver);
        for c in constraints {
            model = model.with(c);
        }
        model.solve().map_err(OptimizerError::from)
    }
}

/// Solved values of `vars`, with solver noise below zero clamped away.
pub fn flow_values(solution: &impl Solution, vars: &[Variable]) -> Vec<f64> {
    vars.iter().map(|&v| solution.value(v).max(0.0)).collect()
}

pub fn values(solution: &impl Solution, vars: &[Variable]) -> Vec<f64> {
    vars.iter().map(|&v| solution.value(v)).collect()
}
