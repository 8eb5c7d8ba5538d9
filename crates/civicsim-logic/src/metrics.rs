//! Metrics engine - budget allocations to city health metrics and score.
//!
//! Each of the six city metrics is an affine function of exactly one budget
//! category, rounded to the nearest integer and capped at 100:
//!
//! | Metric | Category | Formula |
//! |--------|----------|---------|
//! | `education-quality` | `education` | 30 + a·2.5 |
//! | `public-health` | `healthcare` | 40 + a·2.2 |
//! | `infrastructure-quality` | `infrastructure` | 20 + a·4.0 |
//! | `crime-rate` (Safety Index) | `public-safety` | 35 + a·4.5 |
//! | `environmental-quality` | `environment` | 50 + a·4.0 |
//! | `housing-affordability` | `housing` | 20 + a·8.0 |
//!
//! `arts-culture` and `economic-development` feed no metric.
//!
//! ```
//! use civicsim_logic::budget::Allocations;
//! use civicsim_logic::metrics::{compute_metrics, compute_score};
//!
//! let metrics = compute_metrics(&Allocations::defaults());
//! assert_eq!(metrics.len(), 6);
//! assert_eq!(compute_score(&metrics), 87);
//! ```

use serde::{Deserialize, Serialize};

use crate::budget::{category_ids, Allocations};

/// Upper bound of every metric value.
pub const MAX_METRIC_VALUE: u32 = 100;

/// Static description of one metric and the formula that drives it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub unit: &'static str,
    /// Value shown before any allocation has been evaluated.
    pub baseline: u32,
    /// Category whose allocation drives this metric.
    pub source_category: &'static str,
    pub intercept: f64,
    /// Metric points per million allocated.
    pub rate: f64,
}

impl MetricDefinition {
    /// Evaluate the formula for one allocation amount.
    ///
    /// Negative and NaN amounts count as zero, so the result is always in
    /// `intercept.round()..=100`.
    pub fn evaluate(&self, amount: f64) -> u32 {
        let amount = if amount.is_nan() || amount < 0.0 {
            0.0
        } else {
            amount
        };
        let raw = (self.intercept + amount * self.rate).min(MAX_METRIC_VALUE as f64);
        raw.round() as u32
    }

    fn snapshot(&self, value: u32) -> CityMetric {
        CityMetric {
            id: self.id.to_string(),
            name: self.name.to_string(),
            description: self.description.to_string(),
            value,
            max_value: MAX_METRIC_VALUE,
            unit: self.unit.to_string(),
        }
    }
}

/// All metric definitions, in display order.
pub const METRIC_DEFINITIONS: [MetricDefinition; 6] = [
    MetricDefinition {
        id: "education-quality",
        name: "Education Quality",
        description: "School performance and graduation rates",
        unit: "%",
        baseline: 75,
        source_category: category_ids::EDUCATION,
        intercept: 30.0,
        rate: 2.5,
    },
    MetricDefinition {
        id: "public-health",
        name: "Public Health",
        description: "Healthcare access and population health",
        unit: "%",
        baseline: 80,
        source_category: category_ids::HEALTHCARE,
        intercept: 40.0,
        rate: 2.2,
    },
    MetricDefinition {
        id: "infrastructure-quality",
        name: "Infrastructure Quality",
        description: "Road conditions and public transit",
        unit: "%",
        baseline: 65,
        source_category: category_ids::INFRASTRUCTURE,
        intercept: 20.0,
        rate: 4.0,
    },
    MetricDefinition {
        id: "crime-rate",
        name: "Safety Index",
        description: "Public safety and crime prevention",
        unit: "%",
        baseline: 70,
        source_category: category_ids::PUBLIC_SAFETY,
        intercept: 35.0,
        rate: 4.5,
    },
    MetricDefinition {
        id: "environmental-quality",
        name: "Environmental Quality",
        description: "Air quality and green spaces",
        unit: "%",
        baseline: 85,
        source_category: category_ids::ENVIRONMENT,
        intercept: 50.0,
        rate: 4.0,
    },
    MetricDefinition {
        id: "housing-affordability",
        name: "Housing Affordability",
        description: "Affordable housing availability",
        unit: "%",
        baseline: 60,
        source_category: category_ids::HOUSING,
        intercept: 20.0,
        rate: 8.0,
    },
];

/// One evaluated city metric, as shown to the player and persisted in records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityMetric {
    pub id: String,
    pub name: String,
    pub description: String,
    pub value: u32,
    pub max_value: u32,
    pub unit: String,
}

/// Compute all six metrics for an allocation vector.
pub fn compute_metrics(allocations: &Allocations) -> Vec<CityMetric> {
    METRIC_DEFINITIONS
        .iter()
        .map(|def| def.snapshot(def.evaluate(allocations.get(def.source_category))))
        .collect()
}

/// Metrics at their static baseline values, before any allocation is evaluated.
pub fn baseline_metrics() -> Vec<CityMetric> {
    METRIC_DEFINITIONS
        .iter()
        .map(|def| def.snapshot(def.baseline))
        .collect()
}

/// Overall city score: the rounded mean of all metric values.
///
/// Order-independent. An empty slice scores 0.
pub fn compute_score(metrics: &[CityMetric]) -> u32 {
    if metrics.is_empty() {
        return 0;
    }
    let total: u64 = metrics.iter().map(|m| m.value as u64).sum();
    (total as f64 / metrics.len() as f64).round() as u32
}

/// Signed change of one metric against a previous evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricChange {
    pub id: String,
    pub change: i64,
}

/// Per-metric change between two evaluations, matched by id.
///
/// Metrics with no counterpart in `previous` report a change of 0.
pub fn metric_changes(current: &[CityMetric], previous: &[CityMetric]) -> Vec<MetricChange> {
    current
        .iter()
        .map(|metric| {
            let change = previous
                .iter()
                .find(|p| p.id == metric.id)
                .map(|p| metric.value as i64 - p.value as i64)
                .unwrap_or(0);
            MetricChange {
                id: metric.id.clone(),
                change,
            }
        })
        .collect()
}

/// Qualitative band for an overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Excellent,
    Good,
    Challenged,
}

impl ScoreBand {
    pub fn from_score(score: u32) -> Self {
        if score >= 80 {
            ScoreBand::Excellent
        } else if score >= 60 {
            ScoreBand::Good
        } else {
            ScoreBand::Challenged
        }
    }

    pub fn verdict(self) -> &'static str {
        match self {
            ScoreBand::Excellent => "Excellent! Your city is thriving across all metrics.",
            ScoreBand::Good => "Good progress! Some areas need attention.",
            ScoreBand::Challenged => {
                "Your city faces challenges. Consider reallocating resources."
            }
        }
    }
}
