use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    High,
    Medium,
    Low,
    #[serde(other)]
    Unknown,
}

impl Severity {
    pub fn rank(&self) -> u8 {
        match self {
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
            Severity::Unknown => 0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
            Severity::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub coin: String,
    pub message: String,
    pub severity: Severity,
    #[serde(deserialize_with = "crate::models::timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub status: String,
    pub price: Option<f64>,
    pub change: Option<f64>,
    pub rsi: Option<f64>,
    pub volume_change: Option<f64>,
    pub support_level: Option<f64>,
    pub resistance_level: Option<f64>,
}

impl Alert {
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("ACTIVE")
    }
}
