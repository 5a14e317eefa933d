use serde::{Deserialize, Serialize};

/// A `[timestamp_millis, value]` pair as sent by the history endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSeriesPoint(pub i64, pub f64);

impl RawSeriesPoint {
    pub fn timestamp(&self) -> i64 {
        self.0
    }

    pub fn value(&self) -> f64 {
        self.1
    }
}

/// Response of `GET /api/crypto/history/{coinId}`.
///
/// The three sequences are paired by position, not by timestamp.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoricalSeries {
    pub prices: Vec<RawSeriesPoint>,
    #[serde(default)]
    pub market_caps: Vec<RawSeriesPoint>,
    #[serde(default)]
    pub total_volumes: Vec<RawSeriesPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub timestamp: i64,
    pub price: f64,
    pub volume: f64,
    pub market_cap: f64,
}
