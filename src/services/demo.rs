use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand_distr::{Distribution, Uniform};

use crate::error::{DashboardError, Result};
use crate::helpers::round_to_decimals;
use crate::models::PeriodRecord;

/// Random-walk candles shown when the history endpoint cannot be reached.
pub struct DemoSeries {
    volatility: Uniform<f64>,
    wick: Uniform<f64>,
    volume: Uniform<f64>,
}

impl DemoSeries {
    pub fn new() -> Result<Self> {
        let uniform = |low: f64, high: f64| {
            Uniform::new(low, high).map_err(|e| DashboardError::InvalidConfig(e.to_string()))
        };
        Ok(Self {
            volatility: uniform(0.02, 0.05)?,
            wick: uniform(0.0, 0.02)?,
            volume: uniform(1.0e10, 6.0e10)?,
        })
    }

    pub fn base_price(coin_id: &str) -> f64 {
        if coin_id == "bitcoin" {
            45_000.0
        } else {
            2_500.0
        }
    }

    /// `days` candles, the last one dated the day before `end`.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        coin_id: &str,
        days: u32,
        end: DateTime<Utc>,
        rng: &mut R,
    ) -> Vec<PeriodRecord> {
        let mut current = Self::base_price(coin_id);
        let mut records = Vec::with_capacity(days as usize);

        for i in 0..days {
            let at = end - Duration::days(i64::from(days - i));
            let direction = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
            let delta = current * self.volatility.sample(rng) * direction;

            let open = current;
            let close = current + delta;
            let high = open.max(close) * (1.0 + self.wick.sample(rng));
            let low = open.min(close) * (1.0 - self.wick.sample(rng));
            let change = close - open;

            records.push(PeriodRecord {
                date: at.date_naive(),
                timestamp: at.timestamp_millis(),
                open: round_to_decimals(open, 2),
                high: round_to_decimals(high, 2),
                low: round_to_decimals(low, 2),
                close: round_to_decimals(close, 2),
                volume: self.volume.sample(rng).round(),
                change: round_to_decimals(change, 2),
                change_percent: round_to_decimals(change / open * 100.0, 2),
            });

            current = close;
        }

        records
    }
}
