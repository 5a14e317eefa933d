use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::models::{Alert, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeverityFilter {
    #[default]
    All,
    Only(Severity),
}

impl SeverityFilter {
    pub fn matches(&self, severity: Severity) -> bool {
        match self {
            SeverityFilter::All => true,
            SeverityFilter::Only(wanted) => *wanted == severity,
        }
    }

    /// ALL -> HIGH -> MEDIUM -> LOW -> ALL
    pub fn next(&self) -> Self {
        match self {
            SeverityFilter::All => SeverityFilter::Only(Severity::High),
            SeverityFilter::Only(Severity::High) => SeverityFilter::Only(Severity::Medium),
            SeverityFilter::Only(Severity::Medium) => SeverityFilter::Only(Severity::Low),
            SeverityFilter::Only(_) => SeverityFilter::All,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SeverityFilter::All => "ALL",
            SeverityFilter::Only(severity) => severity.label(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlertSort {
    #[default]
    Newest,
    Severity,
}

impl AlertSort {
    pub fn toggle(&self) -> Self {
        match self {
            AlertSort::Newest => AlertSort::Severity,
            AlertSort::Severity => AlertSort::Newest,
        }
    }
}

/// Alerts as fetched plus the view's filter, sort order and dismissals.
#[derive(Debug, Clone, Default)]
pub struct AlertBoard {
    alerts: Vec<Alert>,
    dismissed: HashSet<u64>,
    pub filter: SeverityFilter,
    pub sort: AlertSort,
}

impl AlertBoard {
    pub fn new(alerts: Vec<Alert>) -> Self {
        Self {
            alerts,
            ..Default::default()
        }
    }

    /// Dismissals survive a refresh; filter and sort are untouched.
    pub fn replace(&mut self, alerts: Vec<Alert>) {
        self.alerts = alerts;
    }

    pub fn dismiss(&mut self, id: u64) {
        self.dismissed.insert(id);
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn visible(&self) -> Vec<&Alert> {
        let mut visible: Vec<&Alert> = self
            .alerts
            .iter()
            .filter(|a| !self.dismissed.contains(&a.id) && self.filter.matches(a.severity))
            .collect();

        match self.sort {
            AlertSort::Newest => visible.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
            AlertSort::Severity => visible.sort_by(|a, b| b.severity.rank().cmp(&a.severity.rank())),
        }
        visible
    }

    pub fn active_count(&self) -> usize {
        self.alerts
            .iter()
            .filter(|a| a.is_active() && !self.dismissed.contains(&a.id))
            .count()
    }
}

pub fn time_ago(now: DateTime<Utc>, then: DateTime<Utc>) -> String {
    let minutes = (now - then).num_minutes();
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("{days} days ago")
    } else if hours > 0 {
        format!("{hours} hours ago")
    } else if minutes > 0 {
        format!("{minutes} minutes ago")
    } else {
        "just now".to_string()
    }
}
