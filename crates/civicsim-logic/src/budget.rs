//! Budget categories and allocation vectors.
//!
//! The city budget is split across a fixed set of eight departments. These
//! are static configuration, never user data. A player's plan is an
//! [`Allocations`] map from category id to an amount in millions.
//!
//! ```
//! use civicsim_logic::budget::{Allocations, TOTAL_BUDGET};
//!
//! let defaults = Allocations::defaults();
//! assert_eq!(defaults.get("education"), 25.0);
//! assert_eq!(defaults.total(), TOTAL_BUDGET);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Total budget in millions. Used for display only; over-allocation is allowed.
pub const TOTAL_BUDGET: f64 = 100.0;

/// Category id constants.
pub mod category_ids {
    pub const EDUCATION: &str = "education";
    pub const HEALTHCARE: &str = "healthcare";
    pub const INFRASTRUCTURE: &str = "infrastructure";
    pub const PUBLIC_SAFETY: &str = "public-safety";
    pub const ENVIRONMENT: &str = "environment";
    pub const HOUSING: &str = "housing";
    pub const ARTS_CULTURE: &str = "arts-culture";
    pub const ECONOMIC_DEVELOPMENT: &str = "economic-development";
}

/// A budget department the player can fund.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetCategory {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Starting allocation in millions.
    pub default_allocation: f64,
}

/// All budget categories, in display order.
pub const BUDGET_CATEGORIES: [BudgetCategory; 8] = [
    BudgetCategory {
        id: category_ids::EDUCATION,
        name: "Education",
        description: "Schools, teachers, educational programs",
        default_allocation: 25.0,
    },
    BudgetCategory {
        id: category_ids::HEALTHCARE,
        name: "Healthcare",
        description: "Hospitals, clinics, public health programs",
        default_allocation: 20.0,
    },
    BudgetCategory {
        id: category_ids::INFRASTRUCTURE,
        name: "Infrastructure",
        description: "Roads, bridges, public transportation",
        default_allocation: 15.0,
    },
    BudgetCategory {
        id: category_ids::PUBLIC_SAFETY,
        name: "Public Safety",
        description: "Police, fire department, emergency services",
        default_allocation: 12.0,
    },
    BudgetCategory {
        id: category_ids::ENVIRONMENT,
        name: "Environment",
        description: "Parks, waste management, sustainability",
        default_allocation: 10.0,
    },
    BudgetCategory {
        id: category_ids::HOUSING,
        name: "Housing",
        description: "Affordable housing, homeless services",
        default_allocation: 8.0,
    },
    BudgetCategory {
        id: category_ids::ARTS_CULTURE,
        name: "Arts & Culture",
        description: "Museums, libraries, cultural programs",
        default_allocation: 5.0,
    },
    BudgetCategory {
        id: category_ids::ECONOMIC_DEVELOPMENT,
        name: "Economic Development",
        description: "Business support, job training, tourism",
        default_allocation: 5.0,
    },
];

/// Look up a category by id.
pub fn find_category(id: &str) -> Option<&'static BudgetCategory> {
    BUDGET_CATEGORIES.iter().find(|c| c.id == id)
}

/// Whether `id` names one of the fixed categories.
pub fn is_known_category(id: &str) -> bool {
    find_category(id).is_some()
}

/// Allocation vector: category id → amount in millions.
///
/// Keys are kept sorted so serialized snapshots are deterministic. Missing
/// keys read as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Allocations(BTreeMap<String, f64>);

impl Allocations {
    /// Empty vector (every category reads as zero).
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Every category at its default allocation.
    pub fn defaults() -> Self {
        BUDGET_CATEGORIES
            .iter()
            .map(|c| (c.id, c.default_allocation))
            .collect()
    }

    /// Amount allocated to `category_id`, zero if absent.
    pub fn get(&self, category_id: &str) -> f64 {
        self.0.get(category_id).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, category_id: impl Into<String>, amount: f64) {
        self.0.insert(category_id.into(), amount);
    }

    /// Copy with every entry made safe to evaluate and serialize.
    ///
    /// Negative and NaN amounts become 0 and `+inf` becomes `f64::MAX`, which
    /// evaluates to the same metric values as the raw vector.
    pub fn sanitized(&self) -> Self {
        Self(
            self.0
                .iter()
                .map(|(k, &v)| {
                    let v = if v.is_nan() || v < 0.0 {
                        0.0
                    } else if v.is_infinite() {
                        f64::MAX
                    } else {
                        v
                    };
                    (k.clone(), v)
                })
                .collect(),
        )
    }

    /// Sum of all entries as stored (no sanitisation).
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for Allocations {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Parse a `category=amount` override as typed on a command line.
///
/// Returns the category id and amount, or a message describing the problem.
pub fn parse_allocation_override(input: &str) -> Result<(String, f64), String> {
    let (id, amount) = input
        .split_once('=')
        .ok_or_else(|| format!("expected CATEGORY=AMOUNT, got '{}'", input))?;
    let id = id.trim();
    if !is_known_category(id) {
        let valid: Vec<&str> = BUDGET_CATEGORIES.iter().map(|c| c.id).collect();
        return Err(format!(
            "unknown category '{}' (valid: {})",
            id,
            valid.join(", ")
        ));
    }
    let amount: f64 = amount
        .trim()
        .parse()
        .map_err(|_| format!("invalid amount '{}' for {}", amount.trim(), id))?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(format!(
            "amount for {} must be a non-negative number, got '{}'",
            id, amount
        ));
    }
    Ok((id.to_string(), amount))
}
