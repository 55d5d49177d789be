//! Net-metering optimizer
//!
//! Grid draw and feed-in are billed symmetrically, so the household load drops
//! out and only the battery's own exchange with the meter matters:
//!
//! maximise Σ price(t) × (discharge(t) − charge(t)) − cycle cost
//!
//! subject to the shared SoC dynamics, power limits and boundary SoC.

use good_lp::Expression;
use itertools::izip;

use super::{finish_schedule, warn_rejected};
use crate::domain::{Battery, PriceSeries, Schedule, ScheduleEntry, ScheduleSummary};
use crate::optimizer::constraints::{flow_values, values};
use crate::optimizer::{
    Cutoff, CycleYieldEnforcer, OptimizationRequest, OptimizationStrategy, OptimizerError,
    ScheduleProblem,
};

pub const NET_METERING_VERSION: &str = "net-metering-milp-v1";

#[derive(Debug, Clone)]
pub struct NetMeteringOptimizer {
    battery: Battery,
    end_soc_kwh: Option<f64>,
}

impl NetMeteringOptimizer {
    pub fn new(battery: Battery) -> Self {
        Self {
            battery,
            end_soc_kwh: None,
        }
    }

    /// Finish the horizon at this SoC instead of the initial one.
    pub fn with_end_soc_kwh(mut self, end_soc_kwh: f64) -> Self {
        self.end_soc_kwh = Some(end_soc_kwh);
        self
    }

    pub fn battery(&self) -> &Battery {
        &self.battery
    }

    #[tracing::instrument(
        name = "net_metering",
        skip_all,
        fields(steps = prices.len(), cutoff = cutoff.value())
    )]
    pub fn optimize(
        &self,
        prices: &PriceSeries,
        cutoff: Cutoff,
    ) -> Result<Schedule, OptimizerError> {
        let battery = &self.battery;
        battery.check().inspect_err(warn_rejected)?;

        let step_hours = prices.step_hours();
        let end_soc_kwh = self.end_soc_kwh.unwrap_or(battery.initial_soc_kwh);
        let problem = ScheduleProblem::new(battery, prices.len(), step_hours, end_soc_kwh)
            .inspect_err(warn_rejected)?;
        let flows = problem.flows().clone();

        let arbitrage: Expression = izip!(prices.iter(), &flows.discharge, &flows.charge)
            .map(|(price, &discharge, &charge)| price * (discharge - charge))
            .sum();
        let objective = CycleYieldEnforcer::new(battery, cutoff).apply(arbitrage, &flows.discharge);

        let solution = problem.solve(objective)?;
        let charge = flow_values(&solution, &flows.charge);
        let discharge = flow_values(&solution, &flows.discharge);
        let soc = values(&solution, &flows.soc);

        let entries: Vec<ScheduleEntry> = izip!(prices.iter(), charge, discharge, soc)
            .map(|(price, charge, discharge, soc_kwh)| ScheduleEntry {
                price,
                charge_from_grid_kwh: charge,
                discharge_to_grid_kwh: discharge,
                soc_kwh,
                ..ScheduleEntry::default()
            })
            .collect();
        let total_yield: f64 = entries
            .iter()
            .map(|e| e.price * (e.discharge_kwh() - e.charge_kwh()))
            .sum();

        finish_schedule(
            battery,
            step_hours,
            end_soc_kwh,
            entries,
            |entries| ScheduleSummary::from_entries(entries, battery, total_yield),
            NET_METERING_VERSION,
        )
    }
}

impl OptimizationStrategy for NetMeteringOptimizer {
    fn name(&self) -> &'static str {
        "net-metering"
    }

    fn optimize(&self, request: &OptimizationRequest) -> Result<Schedule, OptimizerError> {
        if request.household.is_some() {
            tracing::debug!("household series are irrelevant under net metering, ignoring");
        }
        NetMeteringOptimizer::optimize(self, &request.prices, request.cutoff)
    }
}
