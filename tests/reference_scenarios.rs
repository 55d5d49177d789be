//! Dutch day-ahead prices of 8 November 2022 against a 5 kWh home battery.

mod common;

use bess_optimizer::config::Config;
use bess_optimizer::domain::{Action, Battery, Household, PriceSeries, Tariff};
use bess_optimizer::optimizer::{
    BatteryOptimizer, Cutoff, GeneralOptimizer, GridPolicy, NetMeteringOptimizer,
    OptimizationRequest, OptimizationStrategy, OptimizerError,
};
use common::*;
use rstest::rstest;

const REPORT_TOLERANCE: f64 = 0.006;

#[rstest]
#[case::no_cutoff(0.0, 0.60, 2.0)]
#[case::cutoff_prunes_the_morning_episode(0.2, 0.43, 1.0)]
fn test_net_metering_reference_day(
    #[case] cutoff: f64,
    #[case] expected_yield: f64,
    #[case] expected_cycles: f64,
) {
    let battery = reference_battery();
    let schedule = NetMeteringOptimizer::new(battery.clone())
        .optimize(&reference_prices(), Cutoff::new(cutoff).unwrap())
        .unwrap();

    assert_eq!(schedule.len(), 24);
    assert_close(schedule.summary.total_yield, expected_yield, REPORT_TOLERANCE, "yield");
    assert_close(schedule.summary.cycles, expected_cycles, 0.01, "cycles");
    assert_close(schedule.final_soc_kwh(), battery.initial_soc_kwh, 1e-6, "final SoC");
    assert!(schedule.verify(&battery, 1e-6).is_ok());
}

#[test]
fn test_net_metering_charges_at_night_and_sells_at_the_evening_peak() {
    let schedule = NetMeteringOptimizer::new(reference_battery())
        .optimize(&reference_prices(), Cutoff::new(0.2).unwrap())
        .unwrap();
    let actions = schedule.actions();

    // the whole window goes out in the 18:00 peak
    assert_eq!(actions[18], Action::Discharge);
    assert_close(schedule.entries[18].discharge_kwh(), 3.375, 1e-4, "peak discharge");
    assert!(actions[..6].iter().all(|a| *a != Action::Discharge));
    assert!(actions[..6].contains(&Action::Charge));
}

#[test]
fn test_general_reference_day_with_dutch_taxes() {
    let battery = reference_battery();
    let schedule = GeneralOptimizer::new(battery.clone())
        .with_tariff(Tariff::dutch_retail(0.15))
        .optimize(
            &reference_prices(),
            &reference_household(),
            Cutoff::new(0.2).unwrap(),
            GridPolicy::ARBITRAGE,
        )
        .unwrap();

    let s = &schedule.summary;
    assert_close(s.total_yield, 0.38, REPORT_TOLERANCE, "yield");
    assert_close(s.cycles, 0.85, 0.01, "cycles");
    assert_close(s.charged_from_grid_kwh, 2.19, 0.01, "grid charge");
    assert_close(s.charged_from_surplus_kwh, 1.0, 0.01, "surplus charge");
    assert_close(s.discharged_to_grid_kwh, 0.0, 0.01, "grid discharge");
    assert_close(s.discharged_for_self_use_kwh, 2.87, 0.01, "self-use");

    // 90% of what went in comes back out
    assert_close(s.discharged_kwh(), 0.9 * s.charged_kwh(), 1e-5, "round trip");

    let baseline = s.baseline_cost.unwrap();
    let with_battery = s.cost_with_battery.unwrap();
    assert_close(baseline - with_battery, s.total_yield, 1e-9, "cost saving");
}

#[test]
fn test_general_respects_household_bounds() {
    let household = reference_household();
    let schedule = GeneralOptimizer::new(reference_battery())
        .with_tariff(Tariff::dutch_retail(0.15))
        .optimize(&reference_prices(), &household, Cutoff::NONE, GridPolicy::ARBITRAGE)
        .unwrap();

    for (t, entry) in schedule.entries.iter().enumerate() {
        assert!(entry.discharge_for_self_use_kwh <= household.usage.values()[t] + 1e-6);
        assert!(entry.charge_from_surplus_kwh <= household.feed_in.values()[t] + 1e-6);
    }
}

#[test]
fn test_self_consumption_keeps_the_battery_off_the_grid() {
    let schedule = GeneralOptimizer::new(reference_battery())
        .with_tariff(Tariff::dutch_retail(0.15))
        .optimize(
            &reference_prices(),
            &reference_household(),
            Cutoff::NONE,
            GridPolicy::SELF_CONSUMPTION,
        )
        .unwrap();

    for entry in &schedule.entries {
        assert!(entry.charge_from_grid_kwh.abs() < 1e-9);
        assert!(entry.discharge_to_grid_kwh.abs() < 1e-9);
    }
    // midday surplus is worth more in the evening
    assert!(schedule.summary.charged_from_surplus_kwh > 0.9);
    assert!(schedule.summary.total_yield > 0.0);
}

#[test]
fn test_empty_battery_cannot_hold_its_start_soc() {
    let battery = Battery::new(0.0, 2.5).with_initial_soc_kwh(1.0);
    let prices = reference_prices();

    let nm = NetMeteringOptimizer::new(battery.clone()).optimize(&prices, Cutoff::NONE);
    assert!(matches!(nm, Err(OptimizerError::InfeasibleSchedule(_))));

    let general = GeneralOptimizer::new(battery).optimize(
        &prices,
        &reference_household(),
        Cutoff::NONE,
        GridPolicy::ARBITRAGE,
    );
    assert!(general.unwrap_err().is_infeasible());
}

#[test]
fn test_zero_capacity_at_zero_soc_idles() {
    let battery = Battery::new(0.0, 2.5);
    let schedule = NetMeteringOptimizer::new(battery)
        .optimize(&reference_prices(), Cutoff::new(0.2).unwrap())
        .unwrap();
    assert!(schedule.actions().iter().all(|a| *a == Action::Idle));
    assert_eq!(schedule.summary.cycles, 0.0);
}

#[rstest]
#[case::net_metering(Box::new(NetMeteringOptimizer::new(reference_battery())), "net-metering")]
#[case::general(Box::new(GeneralOptimizer::new(reference_battery())), "general")]
fn test_strategies_behind_a_trait_object(
    #[case] strategy: Box<dyn OptimizationStrategy>,
    #[case] name: &str,
) {
    assert_eq!(strategy.name(), name);
    let request = OptimizationRequest::new(reference_prices())
        .with_cutoff(Cutoff::new(0.2).unwrap())
        .with_household(reference_household());
    let schedule = strategy.optimize(&request).unwrap();
    assert!(schedule.summary.total_yield > 0.0);
    assert!(schedule.verify(&reference_battery(), 1e-6).is_ok());
}

#[test]
fn test_battery_optimizer_delegates() {
    let optimizer = BatteryOptimizer::new(NetMeteringOptimizer::new(reference_battery()));
    let schedule = optimizer
        .optimize(&OptimizationRequest::new(reference_prices()))
        .unwrap();
    assert_close(schedule.summary.total_yield, 0.60, REPORT_TOLERANCE, "yield");
}

#[test]
fn test_default_config_runs_the_reference_day() {
    // integration tests run from the package root
    let config = Config::load().unwrap();
    let battery = config.battery.to_battery().unwrap();
    assert_eq!(battery, reference_battery());

    let prices = config
        .optimizer
        .price_series(EPEX_2022_11_08.to_vec())
        .unwrap();
    let request = OptimizationRequest::new(prices)
        .with_cutoff(config.optimizer.cutoff().unwrap())
        .with_household(reference_household())
        .with_policy(config.optimizer.policy());
    let schedule = GeneralOptimizer::new(battery)
        .with_tariff(config.tariff)
        .optimize(
            &request.prices,
            request.household.as_ref().unwrap(),
            request.cutoff,
            request.policy,
        )
        .unwrap();
    assert!(schedule.summary.total_yield > 0.0);
}

#[test]
fn test_schedule_serializes_for_reporting() {
    let schedule = NetMeteringOptimizer::new(reference_battery())
        .optimize(&reference_prices(), Cutoff::NONE)
        .unwrap();
    let json = serde_json::to_value(&schedule).unwrap();

    assert_eq!(json["entries"].as_array().unwrap().len(), 24);
    assert!(json["summary"]["total_yield"].is_f64());
    assert_eq!(json["optimizer_version"], "net-metering-milp-v1");
}

#[test]
fn test_nan_usage_counts_as_zero() {
    let prices = PriceSeries::hourly(vec![0.1, 0.4]).unwrap();
    let household = Household::from_values(vec![0.0, f64::NAN], vec![0.0, 0.0]).unwrap();
    assert_eq!(household.usage.values(), &[0.0, 0.0]);

    let schedule = GeneralOptimizer::new(reference_battery())
        .optimize(&prices, &household, Cutoff::NONE, GridPolicy::SELF_CONSUMPTION)
        .unwrap();
    assert!(schedule.summary.discharged_kwh() < 1e-9);
}
