use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response of `GET /api/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub status: String,
    #[serde(deserialize_with = "crate::models::timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub services: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverallStatus {
    Operational,
    PartialOutage { active: usize, total: usize },
    MajorOutage,
}

impl ServiceStatus {
    pub fn active_services(&self) -> usize {
        self.services.values().filter(|up| **up).count()
    }

    pub fn overall(&self) -> OverallStatus {
        let running = self.status == "running";
        let active = self.active_services();
        let total = self.services.len();

        if running && active == total {
            OverallStatus::Operational
        } else if running && active > 0 {
            OverallStatus::PartialOutage { active, total }
        } else {
            OverallStatus::MajorOutage
        }
    }
}

impl OverallStatus {
    pub fn message(&self) -> String {
        match self {
            OverallStatus::Operational => "All systems are running normally".to_string(),
            OverallStatus::PartialOutage { active, total } => {
                format!("{active}/{total} services are operational")
            }
            OverallStatus::MajorOutage => "System is experiencing issues".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualAnalysisAck {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(state: &str, services: &[(&str, bool)]) -> ServiceStatus {
        ServiceStatus {
            status: state.to_string(),
            timestamp: Utc::now(),
            services: services
                .iter()
                .map(|(name, up)| (name.to_string(), *up))
                .collect(),
        }
    }

    #[test]
    fn test_overall_status() {
        let all_up = status("running", &[("coinGecko", true), ("taapi", true), ("openai", true)]);
        assert_eq!(all_up.overall(), OverallStatus::Operational);

        let partial = status("running", &[("coinGecko", true), ("taapi", false), ("openai", true)]);
        assert_eq!(
            partial.overall(),
            OverallStatus::PartialOutage { active: 2, total: 3 }
        );
        assert_eq!(partial.overall().message(), "2/3 services are operational");

        let stopped = status("stopped", &[("coinGecko", true)]);
        assert_eq!(stopped.overall(), OverallStatus::MajorOutage);

        let all_down = status("running", &[("coinGecko", false)]);
        assert_eq!(all_down.overall(), OverallStatus::MajorOutage);
    }

    #[test]
    fn test_status_parses() {
        let json = r#"{"status":"running","timestamp":"2025-06-01T00:00:00Z",
                       "services":{"coinGecko":true,"taapi":false,"openai":true}}"#;
        let parsed: ServiceStatus = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.active_services(), 2);
    }
}
