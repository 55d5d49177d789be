use std::path::Path;

use anyhow::{Context, Result};
use chrono::Duration;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

use crate::domain::{Battery, LossLeg, PriceSeries, Tariff};
use crate::optimizer::{Cutoff, GridPolicy};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub battery: BatteryConfig,
    #[serde(default)]
    pub tariff: Tariff,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatteryConfig {
    pub capacity_kwh: f64,
    #[serde(default)]
    pub min_soc: Option<f64>,
    #[serde(default)]
    pub max_soc: Option<f64>,
    pub max_charge_kw: f64,
    pub max_discharge_kw: f64,
    pub efficiency: f64,
    #[serde(default)]
    pub loss_leg: LossLeg,
    /// Defaults to the bottom of the SoC window.
    #[serde(default)]
    pub initial_soc_kwh: Option<f64>,
}

impl BatteryConfig {
    pub fn to_battery(&self) -> Result<Battery> {
        let battery = Battery::new(self.capacity_kwh, self.max_charge_kw)
            .with_soc_window(self.min_soc.unwrap_or(0.0), self.max_soc.unwrap_or(1.0))
            .with_power(self.max_charge_kw, self.max_discharge_kw)
            .with_efficiency(self.efficiency, self.loss_leg);
        let battery = match self.initial_soc_kwh {
            Some(kwh) => battery.with_initial_soc_kwh(kwh),
            None => battery.starting_at_min_soc(),
        };
        battery.check().context("invalid battery configuration")?;
        Ok(battery)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptimizerConfig {
    #[serde(default)]
    pub cutoff: f64,
    #[serde(default = "default_true")]
    pub allow_grid_charge: bool,
    #[serde(default = "default_true")]
    pub allow_grid_discharge: bool,
    #[serde(default = "default_step_minutes")]
    pub step_minutes: u32,
}

fn default_true() -> bool {
    true
}

fn default_step_minutes() -> u32 {
    60
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            cutoff: 0.0,
            allow_grid_charge: true,
            allow_grid_discharge: true,
            step_minutes: default_step_minutes(),
        }
    }
}

impl OptimizerConfig {
    pub fn cutoff(&self) -> Result<Cutoff> {
        Ok(Cutoff::new(self.cutoff)?)
    }

    pub fn policy(&self) -> GridPolicy {
        GridPolicy {
            allow_grid_charge: self.allow_grid_charge,
            allow_grid_discharge: self.allow_grid_discharge,
        }
    }

    pub fn step(&self) -> Result<Duration> {
        if self.step_minutes == 0 {
            anyhow::bail!("optimizer.step_minutes must be positive");
        }
        Ok(Duration::minutes(i64::from(self.step_minutes)))
    }

    /// Attach the configured step to a day's prices.
    pub fn price_series(&self, prices: Vec<f64>) -> Result<PriceSeries> {
        Ok(PriceSeries::new(prices, self.step()?)?)
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from("config/default.toml")
    }

    /// `path` merged with `BESS__SECTION__KEY` environment overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("BESS__").split("__"));
        let config: Config = figment.extract().context("failed to load configuration")?;
        config.tariff.check()?;
        Ok(config)
    }
}
