//! Budget summary - how much of the total budget a plan uses.
//!
//! Over-allocation is never rejected; the summary only classifies it.

use crate::budget::Allocations;

/// Remaining amounts within this distance of zero count as fully allocated.
pub const COMPLETE_TOLERANCE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStatus {
    UnderBudget,
    Complete,
    OverBudget,
}

/// Totals for one allocation vector against a budget.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetSummary {
    pub total_budget: f64,
    pub total_allocated: f64,
    /// Negative when over budget.
    pub remaining: f64,
    /// Allocated as a percentage of the budget (may exceed 100).
    pub usage_percent: f64,
    pub status: BudgetStatus,
}

impl BudgetSummary {
    /// Entries are sanitised first, so negative and NaN amounts count as
    /// zero the same way the metrics engine counts them.
    pub fn from_allocations(allocations: &Allocations, total_budget: f64) -> Self {
        let total_allocated = allocations.sanitized().total();
        let remaining = total_budget - total_allocated;
        let usage_percent = if total_budget > 0.0 {
            total_allocated / total_budget * 100.0
        } else {
            0.0
        };
        let status = if total_allocated > total_budget {
            BudgetStatus::OverBudget
        } else if remaining.abs() < COMPLETE_TOLERANCE {
            BudgetStatus::Complete
        } else {
            BudgetStatus::UnderBudget
        };
        Self {
            total_budget,
            total_allocated,
            remaining,
            usage_percent,
            status,
        }
    }

    /// Usage capped at 100%, for progress bars.
    pub fn usage_bar_percent(&self) -> f64 {
        self.usage_percent.min(100.0)
    }

    /// One-line guidance for the player.
    pub fn message(&self) -> String {
        match self.status {
            BudgetStatus::OverBudget => format!(
                "You're over budget! Reduce allocations to stay within {}.",
                format_millions(self.total_budget)
            ),
            BudgetStatus::Complete => {
                "Perfect! You've allocated the full budget efficiently.".to_string()
            }
            BudgetStatus::UnderBudget => format!(
                "You have {} left to allocate.",
                format_millions(self.remaining)
            ),
        }
    }
}

/// Format an amount in millions as `$12.5M` (sign dropped).
pub fn format_millions(amount: f64) -> String {
    format!("${:.1}M", amount.abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::TOTAL_BUDGET;

    #[test]
    fn test_defaults_are_complete() {
        let summary = BudgetSummary::from_allocations(&Allocations::defaults(), TOTAL_BUDGET);
        assert_eq!(summary.status, BudgetStatus::Complete);
        assert_eq!(summary.total_allocated, 100.0);
        assert_eq!(summary.remaining, 0.0);
        assert_eq!(summary.usage_percent, 100.0);
    }

    #[test]
    fn test_over_budget() {
        let mut alloc = Allocations::defaults();
        alloc.set("education", 40.0);
        let summary = BudgetSummary::from_allocations(&alloc, TOTAL_BUDGET);
        assert_eq!(summary.status, BudgetStatus::OverBudget);
        assert_eq!(summary.remaining, -15.0);
        assert_eq!(summary.usage_bar_percent(), 100.0);
        assert!(summary.message().contains("$100.0M"));
    }

    #[test]
    fn test_under_budget() {
        let mut alloc = Allocations::defaults();
        alloc.set("housing", 0.0);
        let summary = BudgetSummary::from_allocations(&alloc, TOTAL_BUDGET);
        assert_eq!(summary.status, BudgetStatus::UnderBudget);
        assert_eq!(summary.message(), "You have $8.0M left to allocate.");
    }

    #[test]
    fn test_within_tolerance_is_complete() {
        let mut alloc = Allocations::defaults();
        alloc.set("housing", 7.95);
        let summary = BudgetSummary::from_allocations(&alloc, TOTAL_BUDGET);
        assert_eq!(summary.status, BudgetStatus::Complete);
    }

    #[test]
    fn test_negative_and_nan_entries_count_as_zero() {
        let mut alloc = Allocations::defaults();
        alloc.set("education", -50.0);
        let summary = BudgetSummary::from_allocations(&alloc, TOTAL_BUDGET);
        assert_eq!(summary.total_allocated, 75.0);
        assert_eq!(summary.remaining, 25.0);
        assert_eq!(summary.message(), "You have $25.0M left to allocate.");

        alloc.set("education", f64::NAN);
        let summary = BudgetSummary::from_allocations(&alloc, TOTAL_BUDGET);
        assert_eq!(summary.remaining, 25.0);
        assert!(!summary.message().contains("NaN"));
    }

    #[test]
    fn test_zero_budget() {
        let summary = BudgetSummary::from_allocations(&Allocations::new(), 0.0);
        assert_eq!(summary.usage_percent, 0.0);
        assert_eq!(summary.status, BudgetStatus::Complete);
    }

    #[test]
    fn test_format_millions() {
        assert_eq!(format_millions(12.34), "$12.3M");
        assert_eq!(format_millions(-3.0), "$3.0M");
    }
}
