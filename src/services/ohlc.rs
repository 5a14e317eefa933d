use chrono::DateTime;
use rand::Rng;

use crate::error::{DashboardError, Result};
use crate::helpers::round_to_decimals;
use crate::models::{PeriodRecord, SeriesPoint};

/// How wide the synthetic high/low band may grow, as a fraction of the close.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JitterPolicy {
    Fixed(f64),
    /// A fraction drawn per period from `min..=max`.
    Range { min: f64, max: f64 },
}

impl JitterPolicy {
    pub fn validate(&self) -> Result<()> {
        let in_bounds = |f: f64| f.is_finite() && (0.0..1.0).contains(&f);
        match *self {
            JitterPolicy::Fixed(f) if in_bounds(f) => Ok(()),
            JitterPolicy::Range { min, max } if in_bounds(min) && in_bounds(max) && min <= max => {
                Ok(())
            }
            other => Err(DashboardError::InvalidConfig(format!(
                "jitter must be a fraction in [0, 1): {other:?}"
            ))),
        }
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match *self {
            JitterPolicy::Fixed(f) => f,
            JitterPolicy::Range { min, max } if min < max => rng.random_range(min..=max),
            JitterPolicy::Range { min, .. } => min,
        }
    }
}

impl Default for JitterPolicy {
    fn default() -> Self {
        JitterPolicy::Fixed(0.01)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthesisConfig {
    pub jitter: JitterPolicy,
    /// `None` keeps full precision, which matters for sub-cent coins.
    pub price_decimals: Option<u32>,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            jitter: JitterPolicy::default(),
            price_decimals: Some(2),
        }
    }
}

// Each period opens at the previous close; high and low are widened by random jitter.
pub struct OhlcSynthesizer {
    config: SynthesisConfig,
}

impl OhlcSynthesizer {
    pub fn new(config: SynthesisConfig) -> Result<Self> {
        config.jitter.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    pub fn synthesize<R: Rng + ?Sized>(
        &self,
        points: &[SeriesPoint],
        rng: &mut R,
    ) -> Result<Vec<PeriodRecord>> {
        if points.is_empty() {
            return Err(DashboardError::EmptySeries);
        }

        let mut records = Vec::with_capacity(points.len());
        let mut previous_close: Option<f64> = None;

        for point in points {
            let close = point.price;
            let open = previous_close.unwrap_or(close);

            let variation = close.abs() * self.config.jitter.sample(rng);
            let high = open.max(close) + rng.random::<f64>() * variation;
            let low = open.min(close) - rng.random::<f64>() * variation;

            let change = close - open;
            let change_percent = if open != 0.0 {
                change / open * 100.0
            } else {
                0.0
            };

            let date = DateTime::from_timestamp_millis(point.timestamp)
                .ok_or_else(|| {
                    DashboardError::MalformedSeries(format!(
                        "timestamp out of range: {}",
                        point.timestamp
                    ))
                })?
                .date_naive();

            records.push(PeriodRecord {
                date,
                timestamp: point.timestamp,
                open: self.round_price(open),
                high: self.round_price(high),
                low: self.round_price(low),
                close: self.round_price(close),
                volume: point.volume.round(),
                change: round_to_decimals(change, 2),
                change_percent: round_to_decimals(change_percent, 2),
            });

            previous_close = Some(close);
        }

        Ok(records)
    }

    fn round_price(&self, value: f64) -> f64 {
        match self.config.price_decimals {
            Some(decimals) => round_to_decimals(value, decimals),
            None => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const DAY_MS: i64 = 86_400_000;

    fn points(prices: &[f64]) -> Vec<SeriesPoint> {
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| SeriesPoint {
                timestamp: i as i64 * DAY_MS,
                price: *p,
                volume: 1_000.4,
                market_cap: 0.0,
            })
            .collect()
    }

    fn synthesizer(jitter: JitterPolicy) -> OhlcSynthesizer {
        OhlcSynthesizer::new(SynthesisConfig {
            jitter,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_zero_jitter_chains_open_to_previous_close() {
        let mut rng = StdRng::seed_from_u64(7);
        let records = synthesizer(JitterPolicy::Fixed(0.0))
            .synthesize(&points(&[100.0, 110.0, 99.0]), &mut rng)
            .unwrap();

        let opens: Vec<f64> = records.iter().map(|r| r.open).collect();
        let closes: Vec<f64> = records.iter().map(|r| r.close).collect();
        assert_eq!(opens, vec![100.0, 100.0, 110.0]);
        assert_eq!(closes, vec![100.0, 110.0, 99.0]);

        assert_eq!(records[1].high, 110.0);
        assert_eq!(records[1].low, 100.0);
        assert_eq!(records[1].change, 10.0);
        assert_eq!(records[1].change_percent, 10.0);
        assert_eq!(records[2].change_percent, -10.0);
        assert_eq!(records[0].volume, 1_000.0);
        assert_eq!(records[2].date_label(), "1970-01-03");
    }

    #[test]
    fn test_band_always_contains_open_and_close() {
        let mut rng = StdRng::seed_from_u64(42);
        let prices: Vec<f64> = (0..200)
            .map(|i| 1_000.0 + (i as f64 * 0.7).sin() * 150.0)
            .collect();

        for jitter in [
            JitterPolicy::Fixed(0.01),
            JitterPolicy::Fixed(0.5),
            JitterPolicy::Range { min: 0.01, max: 0.03 },
        ] {
            let records = synthesizer(jitter)
                .synthesize(&points(&prices), &mut rng)
                .unwrap();
            for r in &records {
                assert!(r.low <= r.open && r.open <= r.high, "{r:?}");
                assert!(r.low <= r.close && r.close <= r.high, "{r:?}");
            }
        }
    }

    #[test]
    fn test_same_seed_same_candles() {
        let prices = points(&[10.0, 12.5, 11.0, 13.0]);
        let synth = synthesizer(JitterPolicy::Fixed(0.03));

        let a = synth
            .synthesize(&prices, &mut StdRng::seed_from_u64(1))
            .unwrap();
        let b = synth
            .synthesize(&prices, &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_open_guards_change_percent() {
        let mut rng = StdRng::seed_from_u64(3);
        let records = synthesizer(JitterPolicy::Fixed(0.0))
            .synthesize(&points(&[0.0, 5.0]), &mut rng)
            .unwrap();
        assert_eq!(records[1].change, 5.0);
        assert_eq!(records[1].change_percent, 0.0);
    }

    #[test]
    fn test_unrounded_prices_are_kept_when_requested() {
        let synth = OhlcSynthesizer::new(SynthesisConfig {
            jitter: JitterPolicy::Fixed(0.0),
            price_decimals: None,
        })
        .unwrap();
        let records = synth
            .synthesize(&points(&[0.000123, 0.000125]), &mut StdRng::seed_from_u64(0))
            .unwrap();
        assert_eq!(records[1].close, 0.000125);
    }

    #[test]
    fn test_invalid_jitter_and_empty_input() {
        assert!(OhlcSynthesizer::new(SynthesisConfig {
            jitter: JitterPolicy::Fixed(1.5),
            ..Default::default()
        })
        .is_err());
        assert!(OhlcSynthesizer::new(SynthesisConfig {
            jitter: JitterPolicy::Range { min: 0.03, max: 0.01 },
            ..Default::default()
        })
        .is_err());

        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            synthesizer(JitterPolicy::Fixed(0.01)).synthesize(&[], &mut rng),
            Err(DashboardError::EmptySeries)
        ));
    }
}
