use serde::{Deserialize, Serialize};
use strum::Display;

use super::Battery;

/// Dominant battery activity in one time step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Action {
    Charge,
    Discharge,
    Idle,
}

/// Energies of one time step, all in kWh at the meter.
///
/// Under net metering every exchange counts as grid exchange, so the surplus
/// and self-use fields stay zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub price: f64,
    pub charge_from_grid_kwh: f64,
    pub charge_from_surplus_kwh: f64,
    pub discharge_to_grid_kwh: f64,
    pub discharge_for_self_use_kwh: f64,
    /// SoC at the end of the step.
    pub soc_kwh: f64,
}

impl ScheduleEntry {
    pub fn charge_kwh(&self) -> f64 {
        self.charge_from_grid_kwh + self.charge_from_surplus_kwh
    }

    pub fn discharge_kwh(&self) -> f64 {
        self.discharge_to_grid_kwh + self.discharge_for_self_use_kwh
    }

    pub fn action(&self) -> Action {
        if self.charge_kwh() > ACTIVITY_THRESHOLD_KWH {
            Action::Charge
        } else if self.discharge_kwh() > ACTIVITY_THRESHOLD_KWH {
            Action::Discharge
        } else {
            Action::Idle
        }
    }
}

const ACTIVITY_THRESHOLD_KWH: f64 = 1e-6;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    /// Money made by the battery over the horizon, cutoff cost excluded.
    pub total_yield: f64,
    /// Equivalent full cycles of the usable SoC window.
    pub cycles: f64,
    pub charged_from_grid_kwh: f64,
    pub charged_from_surplus_kwh: f64,
    pub discharged_to_grid_kwh: f64,
    pub discharged_for_self_use_kwh: f64,
    /// Household energy cost without a battery (general case only).
    pub baseline_cost: Option<f64>,
    /// Household energy cost with this schedule applied (general case only).
    pub cost_with_battery: Option<f64>,
}

impl ScheduleSummary {
    pub fn from_entries(entries: &[ScheduleEntry], battery: &Battery, total_yield: f64) -> Self {
        let mut summary = Self {
            total_yield,
            ..Self::default()
        };
        for entry in entries {
            summary.charged_from_grid_kwh += entry.charge_from_grid_kwh;
            summary.charged_from_surplus_kwh += entry.charge_from_surplus_kwh;
            summary.discharged_to_grid_kwh += entry.discharge_to_grid_kwh;
            summary.discharged_for_self_use_kwh += entry.discharge_for_self_use_kwh;
        }
        summary.cycles = battery.cycles_for(summary.charged_kwh());
        summary
    }

    pub fn with_baseline_cost(mut self, baseline_cost: f64) -> Self {
        self.baseline_cost = Some(baseline_cost);
        self.cost_with_battery = Some(baseline_cost - self.total_yield);
        self
    }

    pub fn charged_kwh(&self) -> f64 {
        self.charged_from_grid_kwh + self.charged_from_surplus_kwh
    }

    pub fn discharged_kwh(&self) -> f64 {
        self.discharged_to_grid_kwh + self.discharged_for_self_use_kwh
    }

    pub fn yield_per_cycle(&self) -> Option<f64> {
        (self.cycles > 0.0).then(|| self.total_yield / self.cycles)
    }
}

/// Solved charge/discharge plan for one horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub optimizer_version: String,
    pub step_hours: f64,
    pub initial_soc_kwh: f64,
    pub entries: Vec<ScheduleEntry>,
    pub summary: ScheduleSummary,
}

impl Schedule {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// SoC before the first step followed by the SoC after every step.
    pub fn soc_trajectory(&self) -> Vec<f64> {
        std::iter::once(self.initial_soc_kwh)
            .chain(self.entries.iter().map(|e| e.soc_kwh))
            .collect()
    }

    pub fn final_soc_kwh(&self) -> f64 {
        self.entries.last().map_or(self.initial_soc_kwh, |e| e.soc_kwh)
    }

    pub fn actions(&self) -> Vec<Action> {
        self.entries.iter().map(ScheduleEntry::action).collect()
    }

    /// Check the physics of a decoded schedule: SoC window, per-step power
    /// limits, no simultaneous charge and discharge, and SoC dynamics.
    pub fn verify(&self, battery: &Battery, tolerance: f64) -> Result<(), String> {
        let max_charge = battery.max_charge_per_step(self.step_hours);
        let max_discharge = battery.max_discharge_per_step(self.step_hours);
        let mut previous = self.initial_soc_kwh;

        for (t, entry) in self.entries.iter().enumerate() {
            let flows = [
                entry.charge_from_grid_kwh,
                entry.charge_from_surplus_kwh,
                entry.discharge_to_grid_kwh,
                entry.discharge_for_self_use_kwh,
            ];
            if flows.iter().any(|f| *f < -tolerance) {
                return Err(format!("negative energy flow at step {t}"));
            }
            if entry.charge_kwh() > max_charge + tolerance {
                return Err(format!(
                    "charge {:.6} kWh exceeds limit {max_charge:.6} at step {t}",
                    entry.charge_kwh()
                ));
            }
            if entry.discharge_kwh() > max_discharge + tolerance {
                return Err(format!(
                    "discharge {:.6} kWh exceeds limit {max_discharge:.6} at step {t}",
                    entry.discharge_kwh()
                ));
            }
            if entry.charge_kwh() > tolerance && entry.discharge_kwh() > tolerance {
                return Err(format!("simultaneous charge and discharge at step {t}"));
            }
            if !battery.soc_within_window(entry.soc_kwh, tolerance) {
                return Err(format!(
                    "SoC {:.6} kWh outside [{:.6}, {:.6}] at step {t}",
                    entry.soc_kwh,
                    battery.min_soc_kwh(),
                    battery.max_soc_kwh()
                ));
            }
            let expected = previous + battery.soc_delta(entry.charge_kwh(), entry.discharge_kwh());
            if (entry.soc_kwh - expected).abs() > tolerance {
                return Err(format!(
                    "SoC {:.6} kWh does not follow from flows ({expected:.6}) at step {t}",
                    entry.soc_kwh
                ));
            }
            previous = entry.soc_kwh;
        }
        Ok(())
    }

    /// Check that the horizon finishes at the requested SoC.
    pub fn verify_end_soc(&self, end_soc_kwh: f64, tolerance: f64) -> Result<(), String> {
        let last = self.final_soc_kwh();
        if (last - end_soc_kwh).abs() > tolerance {
            return Err(format!(
                "final SoC {last:.6} kWh misses the boundary {end_soc_kwh:.6} kWh"
            ));
        }
        Ok(())
    }
}
