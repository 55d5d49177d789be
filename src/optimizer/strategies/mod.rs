//! Optimization strategies
//!
//! Both strategies share [`ScheduleProblem`](super::ScheduleProblem) and the
//! [`CycleYieldEnforcer`](super::CycleYieldEnforcer); they differ in how battery
//! flows are decomposed and priced:
//! - Net metering: every kWh is exchanged with the grid at the day-ahead price
//! - General: charge from grid or surplus, discharge to grid or self-use

pub mod general;
pub mod net_metering;

pub use general::*;
pub use net_metering::*;

use super::OptimizerError;
use crate::domain::{Battery, Schedule, ScheduleEntry, ScheduleSummary};

/// Absolute slack (kWh) tolerated when checking a solved schedule.
const VERIFY_TOLERANCE_KWH: f64 = 1e-5;

/// Log a rejected input before it is returned to the caller.
fn warn_rejected(error: &OptimizerError) {
    if let OptimizerError::InvalidInput(reason) = error {
        tracing::warn!(%reason, "optimization input rejected");
    }
}

/// Wrap decoded entries into a schedule and reject solver output that breaks
/// the battery physics.
fn finish_schedule(
    battery: &Battery,
    step_hours: f64,
    end_soc_kwh: f64,
    entries: Vec<ScheduleEntry>,
    summary: impl FnOnce(&[ScheduleEntry]) -> ScheduleSummary,
    optimizer_version: &str,
) -> Result<Schedule, OptimizerError> {
    let summary = summary(&entries);
    let schedule = Schedule {
        optimizer_version: optimizer_version.to_string(),
        step_hours,
        initial_soc_kwh: battery.initial_soc_kwh,
        entries,
        summary,
    };

    let checked = schedule
        .verify(battery, VERIFY_TOLERANCE_KWH)
        .and_then(|()| schedule.verify_end_soc(end_soc_kwh, VERIFY_TOLERANCE_KWH));
    if let Err(violation) = checked {
        tracing::warn!(%violation, optimizer_version, "solver returned an invalid schedule");
        return Err(OptimizerError::Solver(format!(
            "solution violates battery constraints: {violation}"
        )));
    }

    tracing::info!(
        optimizer_version,
        total_yield = schedule.summary.total_yield,
        cycles = schedule.summary.cycles,
        "schedule optimized"
    );
    Ok(schedule)
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::domain::{Household, PriceSeries};
    use crate::optimizer::{Cutoff, GridPolicy};

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn with_captured_logs(f: impl FnOnce()) -> String {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        logs.contents()
    }

    #[test]
    fn test_rejected_inputs_are_logged() {
        let prices = PriceSeries::hourly(vec![0.1, 0.2]).unwrap();
        let logs = with_captured_logs(|| {
            let result = NetMeteringOptimizer::new(Battery::new(5.0, -1.0))
                .optimize(&prices, Cutoff::NONE);
            assert!(matches!(result, Err(OptimizerError::InvalidInput(_))));

            let household = Household::from_values(vec![0.1; 3], vec![0.0; 3]).unwrap();
            let result = GeneralOptimizer::new(Battery::new(5.0, 1.0)).optimize(
                &prices,
                &household,
                Cutoff::NONE,
                GridPolicy::ARBITRAGE,
            );
            assert!(matches!(result, Err(OptimizerError::InvalidInput(_))));
        });

        assert_eq!(logs.matches("optimization input rejected").count(), 2);
        assert!(logs.contains("series lengths differ"));
    }

    #[test]
    fn test_infeasible_boundary_is_not_an_input_warning() {
        let prices = PriceSeries::hourly(vec![0.1, 0.2]).unwrap();
        let logs = with_captured_logs(|| {
            let battery = Battery::new(0.0, 1.0).with_initial_soc_kwh(1.0);
            let result = NetMeteringOptimizer::new(battery).optimize(&prices, Cutoff::NONE);
            assert!(matches!(result, Err(OptimizerError::InfeasibleSchedule(_))));
        });
        assert!(!logs.contains("optimization input rejected"));
    }
}
