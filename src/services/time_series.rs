use log::{debug, warn};

use crate::error::{DashboardError, Result};
use crate::models::{HistoricalSeries, RawSeriesPoint, SeriesPoint};

/// Flattens the three parallel history sequences into one point per price sample.
///
/// Volume and market cap are looked up by position in their own sequences, not by
/// timestamp. A missing entry counts as `0`, as does a negative or non-finite one.
pub fn normalize(series: &HistoricalSeries) -> Result<Vec<SeriesPoint>> {
    if series.prices.is_empty() {
        return Err(DashboardError::EmptySeries);
    }

    if series.total_volumes.len() != series.prices.len()
        || series.market_caps.len() != series.prices.len()
    {
        debug!(
            "series lengths differ: prices={} volumes={} market_caps={}",
            series.prices.len(),
            series.total_volumes.len(),
            series.market_caps.len()
        );
    }

    series
        .prices
        .iter()
        .enumerate()
        .map(|(index, point)| {
            let price = point.value();
            if !price.is_finite() {
                return Err(DashboardError::MalformedSeries(format!(
                    "price at index {index} is not finite: {price}"
                )));
            }

            Ok(SeriesPoint {
                timestamp: point.timestamp(),
                price,
                volume: companion_value(&series.total_volumes, index, "volume"),
                market_cap: companion_value(&series.market_caps, index, "market cap"),
            })
        })
        .collect()
}

fn companion_value(values: &[RawSeriesPoint], index: usize, what: &str) -> f64 {
    match values.get(index) {
        Some(point) if point.value().is_finite() && point.value() >= 0.0 => point.value(),
        Some(point) => {
            warn!("discarding {what} {} at index {index}", point.value());
            0.0
        }
        None => 0.0,
    }
}
