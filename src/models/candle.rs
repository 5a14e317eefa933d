use chrono::NaiveDate;
use serde::Serialize;

/// One synthesised OHLCV entry for a single UTC calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodRecord {
    pub date: NaiveDate,
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub change: f64,
    pub change_percent: f64,
}

impl PeriodRecord {
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn date_label(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// Axis label in the `Mar 5` form.
    pub fn short_date_label(&self) -> String {
        self.date.format("%b %-d").to_string()
    }
}
