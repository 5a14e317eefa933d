use std::collections::BTreeMap;
use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CryptoPrice {
    pub usd: f64,
    #[serde(default)]
    pub usd_market_cap: f64,
    #[serde(default)]
    pub usd_24h_vol: f64,
    #[serde(default)]
    pub usd_24h_change: f64,
}

/// Response of `GET /api/crypto/prices`, keyed by coin id.
pub type PriceBoard = BTreeMap<String, CryptoPrice>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinInfo {
    pub id: String,
    pub name: String,
    pub symbol: String,
}

const KNOWN_COINS: &[(&str, &str, &str)] = &[
    ("bitcoin", "Bitcoin", "BTC"),
    ("ethereum", "Ethereum", "ETH"),
    ("binancecoin", "BNB", "BNB"),
];

impl CoinInfo {
    pub fn lookup(id: &str) -> Self {
        match KNOWN_COINS.iter().find(|(known, _, _)| *known == id) {
            Some((_, name, symbol)) => Self {
                id: id.to_string(),
                name: name.to_string(),
                symbol: symbol.to_string(),
            },
            None => Self {
                id: id.to_string(),
                name: id.to_string(),
                symbol: id.to_uppercase(),
            },
        }
    }

    /// Only the coins the backend keeps history for link to a chart.
    pub fn has_history(&self) -> bool {
        matches!(self.id.as_str(), "bitcoin" | "ethereum")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TimeRange {
    #[value(name = "7d")]
    Week,
    #[default]
    #[value(name = "30d")]
    Month,
    #[value(name = "90d")]
    Quarter,
    #[value(name = "1y")]
    Year,
}

impl TimeRange {
    pub const ALL: [TimeRange; 4] = [
        TimeRange::Week,
        TimeRange::Month,
        TimeRange::Quarter,
        TimeRange::Year,
    ];

    pub fn days(&self) -> u32 {
        match self {
            TimeRange::Week => 7,
            TimeRange::Month => 30,
            TimeRange::Quarter => 90,
            TimeRange::Year => 365,
        }
    }

    pub fn next(&self) -> Self {
        match self {
            TimeRange::Week => TimeRange::Month,
            TimeRange::Month => TimeRange::Quarter,
            TimeRange::Quarter => TimeRange::Year,
            TimeRange::Year => TimeRange::Week,
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TimeRange::Week => "7d",
            TimeRange::Month => "30d",
            TimeRange::Quarter => "90d",
            TimeRange::Year => "1y",
        };
        write!(f, "{label}")
    }
}
