//! Aggregate statistics over a player's saved simulations.

/// Dashboard totals for a collection of simulation scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CollectionStats {
    pub total_simulations: usize,
    /// Rounded mean score, 0 when there are no simulations.
    pub average_score: u32,
    /// Highest score, 0 when there are no simulations.
    pub best_score: u32,
}

impl CollectionStats {
    pub fn from_scores<I: IntoIterator<Item = u32>>(scores: I) -> Self {
        let mut total_simulations = 0usize;
        let mut sum = 0u64;
        let mut best_score = 0u32;
        for score in scores {
            total_simulations += 1;
            sum += score as u64;
            best_score = best_score.max(score);
        }
        let average_score = if total_simulations == 0 {
            0
        } else {
            (sum as f64 / total_simulations as f64).round() as u32
        };
        Self {
            total_simulations,
            average_score,
            best_score,
        }
    }

    pub fn performance(&self) -> PerformanceLevel {
        PerformanceLevel::from_score(self.average_score)
    }
}

/// Player skill tier derived from an average score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PerformanceLevel {
    Novice,
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl PerformanceLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            90.. => PerformanceLevel::Expert,
            80..=89 => PerformanceLevel::Advanced,
            70..=79 => PerformanceLevel::Intermediate,
            60..=69 => PerformanceLevel::Beginner,
            _ => PerformanceLevel::Novice,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PerformanceLevel::Novice => "Novice",
            PerformanceLevel::Beginner => "Beginner",
            PerformanceLevel::Intermediate => "Intermediate",
            PerformanceLevel::Advanced => "Advanced",
            PerformanceLevel::Expert => "Expert",
        }
    }
}
