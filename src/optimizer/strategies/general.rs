//! General (separately metered) optimizer
//!
//! Without net metering the battery's flows are priced by where they go:
//! - charge from grid: costs the consumer price
//! - charge from surplus: costs the forgone feed-in payment (bounded by feed-in)
//! - discharge to grid: earns the day-ahead price
//! - discharge for self-use: saves the consumer price (bounded by usage)

use good_lp::{constraint, Expression};
use itertools::izip;

use super::{finish_schedule, warn_rejected};
use crate::domain::{
    Battery, Household, PriceSeries, Schedule, ScheduleEntry, ScheduleSummary, Tariff,
};
use crate::optimizer::constraints::{flow_values, values};
use crate::optimizer::{
    Cutoff, CycleYieldEnforcer, GridPolicy, OptimizationRequest, OptimizationStrategy,
    OptimizerError, ScheduleProblem,
};

pub const GENERAL_VERSION: &str = "general-milp-v1";

#[derive(Debug, Clone)]
pub struct GeneralOptimizer {
    battery: Battery,
    tariff: Tariff,
    end_soc_kwh: Option<f64>,
}

impl GeneralOptimizer {
    pub fn new(battery: Battery) -> Self {
        Self {
            battery,
            tariff: Tariff::default(),
            end_soc_kwh: None,
        }
    }

    pub fn with_tariff(mut self, tariff: Tariff) -> Self {
        self.tariff = tariff;
        self
    }

    pub fn with_end_soc_kwh(mut self, end_soc_kwh: f64) -> Self {
        self.end_soc_kwh = Some(end_soc_kwh);
        self
    }

    pub fn battery(&self) -> &Battery {
        &self.battery
    }

    pub fn tariff(&self) -> &Tariff {
        &self.tariff
    }

    #[tracing::instrument(
        name = "general",
        skip_all,
        fields(
            steps = prices.len(),
            cutoff = cutoff.value(),
            grid_charge = policy.allow_grid_charge,
            grid_discharge = policy.allow_grid_discharge,
        )
    )]
    pub fn optimize(
        &self,
        prices: &PriceSeries,
        household: &Household,
        cutoff: Cutoff,
        policy: GridPolicy,
    ) -> Result<Schedule, OptimizerError> {
        let battery = &self.battery;
        let tariff = &self.tariff;
        battery
            .check()
            .and_then(|()| tariff.check())
            .and_then(|()| household.check_aligned(prices))
            .inspect_err(warn_rejected)?;

        let step_hours = prices.step_hours();
        let end_soc_kwh = self.end_soc_kwh.unwrap_or(battery.initial_soc_kwh);
        let mut problem = ScheduleProblem::new(battery, prices.len(), step_hours, end_soc_kwh)
            .inspect_err(warn_rejected)?;
        let flows = problem.flows().clone();
        let max_charge = problem.max_charge_kwh();
        let max_discharge = problem.max_discharge_kwh();
        let horizon = problem.horizon();

        let grid_charge_limit = if policy.allow_grid_charge { max_charge } else { 0.0 };
        let grid_discharge_limit = if policy.allow_grid_discharge { max_discharge } else { 0.0 };
        let usage = household.usage.values();
        let feed_in = household.feed_in.values();

        let grid_charge = problem.add_flows(std::iter::repeat(grid_charge_limit).take(horizon));
        let surplus_charge = problem.add_flows(feed_in.iter().map(|f| f.min(max_charge)));
        let grid_discharge =
            problem.add_flows(std::iter::repeat(grid_discharge_limit).take(horizon));
        let self_use_discharge = problem.add_flows(usage.iter().map(|u| u.min(max_discharge)));

        for t in 0..horizon {
            problem.constrain(constraint!(flows.charge[t] == grid_charge[t] + surplus_charge[t]));
            problem.constrain(constraint!(
                flows.discharge[t] == grid_discharge[t] + self_use_discharge[t]
            ));
        }

        let net_value: Expression = izip!(
            prices.iter(),
            &grid_charge,
            &surplus_charge,
            &grid_discharge,
            &self_use_discharge
        )
        .map(|(price, &gc, &sc, &gd, &sd)| {
            let consumer = tariff.consumer_price(price);
            price * gd + consumer * sd - consumer * gc - tariff.surplus_price(price) * sc
        })
        .sum();
        let objective = CycleYieldEnforcer::new(battery, cutoff).apply(net_value, &flows.discharge);

        let solution = problem.solve(objective)?;
        let entries: Vec<ScheduleEntry> = izip!(
            prices.iter(),
            flow_values(&solution, &grid_charge),
            flow_values(&solution, &surplus_charge),
            flow_values(&solution, &grid_discharge),
            flow_values(&solution, &self_use_discharge),
            values(&solution, &flows.soc)
        )
        .map(|(price, gc, sc, gd, sd, soc_kwh)| ScheduleEntry {
            price,
            charge_from_grid_kwh: gc,
            charge_from_surplus_kwh: sc,
            discharge_to_grid_kwh: gd,
            discharge_for_self_use_kwh: sd,
            soc_kwh,
        })
        .collect();

        let total_yield: f64 = entries.iter().map(|e| entry_value(tariff, e)).sum();
        let baseline_cost = baseline_cost(tariff, prices, household);

        finish_schedule(
            battery,
            step_hours,
            end_soc_kwh,
            entries,
            |entries| {
                ScheduleSummary::from_entries(entries, battery, total_yield)
                    .with_baseline_cost(baseline_cost)
            },
            GENERAL_VERSION,
        )
    }
}

/// Money a step's battery flows make (negative when they cost).
fn entry_value(tariff: &Tariff, entry: &ScheduleEntry) -> f64 {
    let consumer = tariff.consumer_price(entry.price);
    entry.price * entry.discharge_to_grid_kwh + consumer * entry.discharge_for_self_use_kwh
        - consumer * entry.charge_from_grid_kwh
        - tariff.surplus_price(entry.price) * entry.charge_from_surplus_kwh
}

/// What the household pays without a battery.
fn baseline_cost(tariff: &Tariff, prices: &PriceSeries, household: &Household) -> f64 {
    izip!(prices.iter(), household.usage.values(), household.feed_in.values())
        .map(|(price, usage, feed_in)| {
            usage * tariff.consumer_price(price) - feed_in * tariff.surplus_price(price)
        })
        .sum()
}

impl OptimizationStrategy for GeneralOptimizer {
    fn name(&self) -> &'static str {
        "general"
    }

    fn optimize(&self, request: &OptimizationRequest) -> Result<Schedule, OptimizerError> {
        let household = request
            .household
            .as_ref()
            .ok_or_else(|| {
                OptimizerError::invalid("the general optimizer needs usage and feed-in series")
            })
            .inspect_err(warn_rejected)?;
        GeneralOptimizer::optimize(self, &request.prices, household, request.cutoff, request.policy)
    }
}
