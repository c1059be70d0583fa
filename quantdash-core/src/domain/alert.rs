//! Data-quality alerts raised by the backend's anomaly detectors.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Alert severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQualityAlert {
    pub id: String,
    pub symbol: String,
    pub severity: Severity,
    /// Detector name → anomaly score.
    #[serde(default)]
    pub anomaly_scores: BTreeMap<String, f64>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub acknowledged: bool,
}

impl DataQualityAlert {
    /// Highest anomaly score across detectors, if any were reported.
    pub fn max_score(&self) -> Option<f64> {
        self.anomaly_scores
            .values()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.max(v))))
    }
}

/// Sort alerts most severe first, newest first within a severity.
pub fn sort_by_priority(alerts: &mut [DataQualityAlert]) {
    alerts.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| b.timestamp.cmp(&a.timestamp))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn alert(id: &str, severity: Severity, hour: u32) -> DataQualityAlert {
        DataQualityAlert {
            id: id.into(),
            symbol: "BTC-USD".into(),
            severity,
            anomaly_scores: BTreeMap::new(),
            message: "gap detected".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap(),
            acknowledged: false,
        }
    }

    #[test]
    fn priority_order() {
        let mut alerts = vec![
            alert("a", Severity::Low, 9),
            alert("b", Severity::Critical, 8),
            alert("c", Severity::Critical, 10),
            alert("d", Severity::Medium, 11),
        ];
        sort_by_priority(&mut alerts);
        let ids: Vec<&str> = alerts.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "d", "a"]);
    }

    #[test]
    fn max_score_ignores_non_finite() {
        let mut a = alert("a", Severity::High, 1);
        assert_eq!(a.max_score(), None);
        a.anomaly_scores.insert("zscore".into(), 3.2);
        a.anomaly_scores.insert("iforest".into(), 0.7);
        a.anomaly_scores.insert("broken".into(), f64::NAN);
        assert_eq!(a.max_score(), Some(3.2));
    }
}
