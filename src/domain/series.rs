use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::optimizer::OptimizerError;

/// Day-ahead prices, one per time step, with a uniform step duration.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    prices: Vec<f64>,
    step: Duration,
}

impl PriceSeries {
    pub fn new(prices: Vec<f64>, step: Duration) -> Result<Self, OptimizerError> {
        if prices.is_empty() {
            return Err(OptimizerError::invalid("price series is empty"));
        }
        if step <= Duration::zero() {
            return Err(OptimizerError::invalid(format!(
                "time step must be positive, got {step}"
            )));
        }
        // Negative day-ahead prices are legitimate; only non-numbers are rejected.
        if let Some((t, p)) = prices.iter().enumerate().find(|(_, p)| !p.is_finite()) {
            return Err(OptimizerError::invalid(format!("price at step {t} is not finite: {p}")));
        }
        Ok(Self { prices, step })
    }

    pub fn hourly(prices: Vec<f64>) -> Result<Self, OptimizerError> {
        Self::new(prices, Duration::hours(1))
    }

    pub fn quarter_hourly(prices: Vec<f64>) -> Result<Self, OptimizerError> {
        Self::new(prices, Duration::minutes(15))
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    pub fn step_hours(&self) -> f64 {
        self.step.num_seconds() as f64 / 3600.0
    }

    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.prices.iter().copied()
    }
}

/// Per-step household energy (kWh), time-aligned with a [`PriceSeries`].
///
/// Missing readings (NaN) count as zero energy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergySeries(Vec<f64>);

/// Household grid draw per step.
pub type UsageSeries = EnergySeries;
/// Household surplus per step, available for charging or export.
pub type FeedInSeries = EnergySeries;

impl EnergySeries {
    pub fn new(values: Vec<f64>) -> Result<Self, OptimizerError> {
        let mut missing = 0usize;
        let values = values
            .into_iter()
            .enumerate()
            .map(|(t, v)| {
                if v.is_nan() {
                    missing += 1;
                    Ok(0.0)
                } else if v.is_infinite() || v < 0.0 {
                    Err(OptimizerError::invalid(format!(
                        "household energy at step {t} must be a non-negative number, got {v}"
                    )))
                } else {
                    Ok(v)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        if missing > 0 {
            tracing::debug!(missing, "treating missing household readings as zero");
        }
        Ok(Self(values))
    }

    pub fn zeros(len: usize) -> Self {
        Self(vec![0.0; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }
}

/// Predicted household usage and feed-in for the optimization horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Household {
    pub usage: UsageSeries,
    pub feed_in: FeedInSeries,
}

impl Household {
    pub fn new(usage: UsageSeries, feed_in: FeedInSeries) -> Self {
        Self { usage, feed_in }
    }

    pub fn from_values(usage: Vec<f64>, feed_in: Vec<f64>) -> Result<Self, OptimizerError> {
        Ok(Self::new(EnergySeries::new(usage)?, EnergySeries::new(feed_in)?))
    }

    /// Both series must cover exactly the price horizon.
    pub fn check_aligned(&self, prices: &PriceSeries) -> Result<(), OptimizerError> {
        if self.usage.len() != prices.len() || self.feed_in.len() != prices.len() {
            return Err(OptimizerError::invalid(format!(
                "series lengths differ: {} prices, {} usage, {} feed-in",
                prices.len(),
                self.usage.len(),
                self.feed_in.len()
            )));
        }
        Ok(())
    }
}
