use crate::error::{DashboardError, Result};
use crate::models::PeriodRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSummary {
    pub highest: f64,
    pub lowest: f64,
    pub average: f64,
    pub period_return_percent: f64,
    pub volatility_percent: f64,
    pub bull_days: usize,
    pub total_days: usize,
    pub average_volume: f64,
    pub max_volume: f64,
    pub min_volume: f64,
}

impl SeriesSummary {
    /// Needs two records, since volatility is built from day-over-day returns.
    pub fn compute(records: &[PeriodRecord]) -> Result<Self> {
        let volatility_percent = volatility_percent(records)?;
        let n = records.len() as f64;

        Ok(Self {
            highest: records.iter().map(|r| r.high).fold(f64::NEG_INFINITY, f64::max),
            lowest: records.iter().map(|r| r.low).fold(f64::INFINITY, f64::min),
            average: records.iter().map(|r| r.close).sum::<f64>() / n,
            period_return_percent: period_return_percent(records)?,
            volatility_percent,
            bull_days: bull_days(records),
            total_days: records.len(),
            average_volume: records.iter().map(|r| r.volume).sum::<f64>() / n,
            max_volume: records.iter().map(|r| r.volume).fold(f64::NEG_INFINITY, f64::max),
            min_volume: records.iter().map(|r| r.volume).fold(f64::INFINITY, f64::min),
        })
    }
}

pub fn period_return_percent(records: &[PeriodRecord]) -> Result<f64> {
    let (first, last) = match (records.first(), records.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(DashboardError::EmptySeries),
    };
    if first.close == 0.0 {
        return Ok(0.0);
    }
    Ok((last.close - first.close) / first.close * 100.0)
}

/// Population standard deviation of day-over-day close returns, in percent.
pub fn volatility_percent(records: &[PeriodRecord]) -> Result<f64> {
    if records.len() < 2 {
        return Err(DashboardError::InsufficientData {
            required: 2,
            actual: records.len(),
        });
    }

    let returns: Vec<f64> = records
        .windows(2)
        .map(|w| {
            if w[0].close != 0.0 {
                (w[1].close - w[0].close) / w[0].close
            } else {
                0.0
            }
        })
        .collect();

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;

    Ok(variance.sqrt() * 100.0)
}

pub fn bull_days(records: &[PeriodRecord]) -> usize {
    records.iter().filter(|r| r.change_percent > 0.0).count()
}
