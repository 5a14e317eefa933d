use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{CryptoPrice, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RsiReading {
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacdReading {
    #[serde(rename = "valueMACD")]
    pub value_macd: f64,
    #[serde(rename = "valueMACDSignal")]
    pub value_macd_signal: f64,
    #[serde(rename = "valueMACDHist")]
    pub value_macd_hist: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Indicators {
    pub rsi: Option<RsiReading>,
    pub macd: Option<MacdReading>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinAnalysis {
    pub coin: String,
    pub price: CryptoPrice,
    #[serde(default)]
    pub indicators: Indicators,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAnalysis {
    #[serde(default)]
    pub analysis: String,
    #[serde(default)]
    pub trading_signals: Vec<serde_json::Value>,
    /// Either an object or a JSON document encoded as a string; see [`parse_forecast`].
    #[serde(default)]
    pub lstm_forecast: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisAlert {
    pub message: String,
    #[serde(deserialize_with = "crate::models::timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
}

/// Response of `GET /api/analysis`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    #[serde(deserialize_with = "crate::models::timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub data: Vec<CoinAnalysis>,
    #[serde(default)]
    pub ai_analysis: AiAnalysis,
    #[serde(default)]
    pub alerts: Vec<AnalysisAlert>,
}

impl AnalysisReport {
    pub fn forecast(&self) -> Result<Option<Forecast>> {
        self.ai_analysis
            .lstm_forecast
            .as_ref()
            .map(parse_forecast)
            .transpose()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsiZone {
    Overbought,
    Oversold,
    Neutral,
}

impl RsiZone {
    pub fn classify(rsi: f64) -> Self {
        if rsi >= 70.0 {
            RsiZone::Overbought
        } else if rsi <= 30.0 {
            RsiZone::Oversold
        } else {
            RsiZone::Neutral
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RsiZone::Overbought => "Overbought",
            RsiZone::Oversold => "Oversold",
            RsiZone::Neutral => "Neutral",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinForecast {
    pub next_day: f64,
    #[serde(default)]
    pub multi_step: Vec<f64>,
}

impl CoinForecast {
    /// Day-over-day percent changes for forecast days 2 through 8.
    pub fn step_changes(&self) -> Vec<(usize, f64)> {
        self.multi_step
            .windows(2)
            .take(7)
            .enumerate()
            .map(|(i, w)| {
                let change = if w[0] != 0.0 {
                    (w[1] - w[0]) / w[0] * 100.0
                } else {
                    0.0
                };
                (i + 2, change)
            })
            .collect()
    }
}

pub type Forecast = BTreeMap<String, CoinForecast>;

pub fn parse_forecast(value: &serde_json::Value) -> Result<Forecast> {
    let forecast = match value {
        serde_json::Value::String(encoded) => serde_json::from_str(encoded)?,
        other => serde_json::from_value(other.clone())?,
    };
    Ok(forecast)
}
