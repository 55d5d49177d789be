#![allow(dead_code)]

use bess_optimizer::domain::{Battery, Household, LossLeg, PriceSeries};

/// Dutch EPEX day-ahead prices (EUR/kWh) for 8 November 2022.
pub const EPEX_2022_11_08: [f64; 24] = [
    0.04264, 0.02996, 0.0277, 0.02621, 0.03096, 0.03425, //
    0.068, 0.12827, 0.13552, 0.1001, 0.0814, 0.07927, //
    0.07535, 0.09123, 0.09346, 0.12103, 0.12067, 0.13951, //
    0.15773, 0.126, 0.118, 0.1217, 0.112, 0.098,
];

/// Simulated household grid draw (kWh) for the same day.
pub const USAGE_2022_11_08: [f64; 24] = [
    0.15, 0.12, 0.12, 0.15, 0.12, 0.14, //
    0.13, 0.12, 0.16, 0.15, 0.1, 0.45, //
    0.18, 0.01, 0.01, 0.06, 0.2, 0.71, //
    0.19, 0.29, 0.26, 0.25, 0.27, 0.21,
];

/// Simulated solar surplus (kWh) for the same day.
pub const FEED_IN_2022_11_08: [f64; 24] = [
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, //
    0.31, 0.49, 0.20, 0.01, 0.0, 0.0, //
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
];

/// 5 kWh, 15-90% window, 2.5 kW in, 3.68 kW out, 90% round trip, starts at 15%.
pub fn reference_battery() -> Battery {
    Battery::new(5.0, 2.5)
        .with_soc_window(0.15, 0.9)
        .with_power(2.5, 3.68)
        .with_efficiency(0.9, LossLeg::Discharge)
        .starting_at_min_soc()
}

pub fn reference_prices() -> PriceSeries {
    PriceSeries::hourly(EPEX_2022_11_08.to_vec()).expect("reference prices")
}

pub fn reference_household() -> Household {
    Household::from_values(USAGE_2022_11_08.to_vec(), FEED_IN_2022_11_08.to_vec())
        .expect("reference household")
}

pub fn assert_close(actual: f64, expected: f64, tolerance: f64, what: &str) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "{what}: expected {expected} ± {tolerance}, got {actual}"
    );
}
