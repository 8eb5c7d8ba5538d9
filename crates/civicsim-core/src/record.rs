//! Saved simulation records and their identifiers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use civicsim_logic::budget::Allocations;
use civicsim_logic::metrics::{compute_metrics, compute_score, CityMetric};

/// Unique identifier for a saved simulation.
///
/// New records get a random UUID. Any string is accepted when decoding so
/// that files with older timestamp-style ids still import.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Immutable snapshot of one budget plan and its evaluated outcome.
///
/// Field names serialize in camelCase (`cityMetrics`, `totalScore`,
/// `createdAt`), matching the browser app's saved and exported files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRecord {
    pub id: RecordId,
    pub name: String,
    pub allocations: Allocations,
    pub city_metrics: Vec<CityMetric>,
    pub total_score: u32,
    pub created_at: DateTime<Utc>,
}

impl SimulationRecord {
    /// Evaluate `allocations` and snapshot the result, stamped now.
    pub fn new(allocations: &Allocations) -> Self {
        Self::evaluated_at(allocations, Utc::now())
    }

    /// Evaluate `allocations` and snapshot the result with a fixed timestamp.
    ///
    /// Allocations are sanitised first so the snapshot always serializes.
    pub fn evaluated_at(allocations: &Allocations, created_at: DateTime<Utc>) -> Self {
        let allocations = allocations.sanitized();
        let city_metrics = compute_metrics(&allocations);
        let total_score = compute_score(&city_metrics);
        Self {
            id: RecordId::generate(),
            name: default_name(created_at),
            allocations,
            city_metrics,
            total_score,
            created_at,
        }
    }

    /// Replace the generated display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Whether the stored metrics and score agree with a fresh evaluation.
    ///
    /// Imported records are taken as-is; this lets callers spot hand-edited
    /// or stale files.
    pub fn is_consistent(&self) -> bool {
        let metrics = compute_metrics(&self.allocations);
        metrics == self.city_metrics && compute_score(&metrics) == self.total_score
    }
}

/// Date-stamped label, e.g. `Budget 10/18/2026`.
pub fn default_name(created_at: DateTime<Utc>) -> String {
    format!("Budget {}", created_at.format("%-m/%-d/%Y"))
}
