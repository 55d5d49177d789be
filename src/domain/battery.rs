use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use validator::{Validate, ValidationError};

use crate::optimizer::OptimizerError;

/// Which leg of a round trip carries the efficiency loss.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LossLeg {
    /// Stored energy equals drawn energy; only `efficiency` of a withdrawn kWh reaches the meter.
    #[default]
    Discharge,
    /// Only `efficiency` of a drawn kWh is stored; withdrawn energy reaches the meter in full.
    Charge,
}

/// Physical properties of a residential battery.
///
/// SoC limits are fractions of `capacity_kwh`; every energy the optimizers
/// exchange with the battery is measured at the meter in kWh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_battery"))]
pub struct Battery {
    #[validate(range(min = 0.0))]
    pub capacity_kwh: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub min_soc: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub max_soc: f64,
    #[validate(range(min = 0.0))]
    pub max_charge_kw: f64,
    #[validate(range(min = 0.0))]
    pub max_discharge_kw: f64,
    #[validate(range(exclusive_min = 0.0, max = 1.0))]
    pub efficiency: f64,
    #[serde(default)]
    pub loss_leg: LossLeg,
    #[validate(range(min = 0.0))]
    pub initial_soc_kwh: f64,
}

fn validate_battery(battery: &Battery) -> Result<(), ValidationError> {
    let fields = [
        battery.capacity_kwh,
        battery.min_soc,
        battery.max_soc,
        battery.max_charge_kw,
        battery.max_discharge_kw,
        battery.efficiency,
        battery.initial_soc_kwh,
    ];
    if fields.iter().any(|v| !v.is_finite()) {
        return Err(ValidationError::new("battery_not_finite")
            .with_message("battery properties must be finite numbers".into()));
    }
    if battery.min_soc > battery.max_soc {
        return Err(ValidationError::new("soc_window")
            .with_message("min_soc must not exceed max_soc".into()));
    }
    Ok(())
}

impl Battery {
    /// Full 0..100% window, lossless, symmetric power, starting empty.
    pub fn new(capacity_kwh: f64, max_power_kw: f64) -> Self {
        Self {
            capacity_kwh,
            min_soc: 0.0,
            max_soc: 1.0,
            max_charge_kw: max_power_kw,
            max_discharge_kw: max_power_kw,
            efficiency: 1.0,
            loss_leg: LossLeg::default(),
            initial_soc_kwh: 0.0,
        }
    }

    pub fn with_soc_window(mut self, min_soc: f64, max_soc: f64) -> Self {
        self.min_soc = min_soc;
        self.max_soc = max_soc;
        self
    }

    pub fn with_power(mut self, max_charge_kw: f64, max_discharge_kw: f64) -> Self {
        self.max_charge_kw = max_charge_kw;
        self.max_discharge_kw = max_discharge_kw;
        self
    }

    pub fn with_efficiency(mut self, efficiency: f64, loss_leg: LossLeg) -> Self {
        self.efficiency = efficiency;
        self.loss_leg = loss_leg;
        self
    }

    pub fn with_initial_soc_kwh(mut self, initial_soc_kwh: f64) -> Self {
        self.initial_soc_kwh = initial_soc_kwh;
        self
    }

    /// Start at the bottom of the usable window.
    pub fn starting_at_min_soc(mut self) -> Self {
        self.initial_soc_kwh = self.min_soc_kwh();
        self
    }

    pub fn check(&self) -> Result<(), OptimizerError> {
        self.validate().map_err(OptimizerError::from)
    }

    pub fn min_soc_kwh(&self) -> f64 {
        self.min_soc * self.capacity_kwh
    }

    pub fn max_soc_kwh(&self) -> f64 {
        self.max_soc * self.capacity_kwh
    }

    /// Energy between the SoC limits, i.e. what one full cycle stores.
    pub fn usable_kwh(&self) -> f64 {
        self.max_soc_kwh() - self.min_soc_kwh()
    }

    /// SoC increase per kWh drawn at the meter.
    pub fn stored_per_kwh_charged(&self) -> f64 {
        match self.loss_leg {
            LossLeg::Discharge => 1.0,
            LossLeg::Charge => self.efficiency,
        }
    }

    /// SoC decrease per kWh delivered at the meter.
    pub fn withdrawn_per_kwh_discharged(&self) -> f64 {
        match self.loss_leg {
            LossLeg::Discharge => 1.0 / self.efficiency,
            LossLeg::Charge => 1.0,
        }
    }

    /// Energy one full cycle of the usable window delivers at the meter.
    pub fn deliverable_per_cycle_kwh(&self) -> f64 {
        self.usable_kwh() / self.withdrawn_per_kwh_discharged()
    }

    /// SoC change caused by the given meter-side flows.
    pub fn soc_delta(&self, charged_kwh: f64, discharged_kwh: f64) -> f64 {
        self.stored_per_kwh_charged() * charged_kwh
            - self.withdrawn_per_kwh_discharged() * discharged_kwh
    }

    pub fn max_charge_per_step(&self, step_hours: f64) -> f64 {
        self.max_charge_kw * step_hours
    }

    pub fn max_discharge_per_step(&self, step_hours: f64) -> f64 {
        self.max_discharge_kw * step_hours
    }

    /// Equivalent full cycles for a total of meter-side charged energy.
    pub fn cycles_for(&self, charged_kwh: f64) -> f64 {
        let usable = self.usable_kwh();
        if usable <= 0.0 {
            return 0.0;
        }
        charged_kwh * self.stored_per_kwh_charged() / usable
    }

    pub fn soc_within_window(&self, soc_kwh: f64, tolerance: f64) -> bool {
        soc_kwh >= self.min_soc_kwh() - tolerance && soc_kwh <= self.max_soc_kwh() + tolerance
    }
}
