//! ML model listing DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelStatus {
    Training,
    Ready,
    Failed,
    Archived,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl ModelMetrics {
    /// F1 recomputed from precision and recall (0 when both are 0).
    pub fn derived_f1(&self) -> f64 {
        let denom = self.precision + self.recall;
        if denom == 0.0 {
            0.0
        } else {
            2.0 * self.precision * self.recall / denom
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlModel {
    pub version: String,
    pub model_type: String,
    pub status: ModelStatus,
    #[serde(default)]
    pub metrics: ModelMetrics,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trained_at: Option<DateTime<Utc>>,
}

/// Payload for `POST /ml/models/train`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainModelRequest {
    pub model_type: String,
    pub symbols: Vec<String>,
    pub features: Vec<String>,
    pub lookback_days: u32,
}

/// Pick the best ready model by F1, ties broken by accuracy.
pub fn best_model(models: &[MlModel]) -> Option<&MlModel> {
    models
        .iter()
        .filter(|m| m.status == ModelStatus::Ready)
        .max_by(|a, b| {
            a.metrics
                .f1
                .total_cmp(&b.metrics.f1)
                .then(a.metrics.accuracy.total_cmp(&b.metrics.accuracy))
        })
}
