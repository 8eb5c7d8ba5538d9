//! Budget advisor - canned answers to free-text questions.
//!
//! There is no model behind this. A [`ResponseStrategy`] turns a question
//! plus the current plan into text; [`KeywordAdvisor`] does it by matching
//! topic keywords and falling back to a randomly chosen general answer.
//!
//! ```
//! use civicsim_logic::advisor::{AdvisorContext, KeywordAdvisor, ResponseStrategy};
//! use civicsim_logic::budget::Allocations;
//! use rand::SeedableRng;
//!
//! let allocations = Allocations::defaults();
//! let ctx = AdvisorContext { allocations: &allocations, metrics: &[] };
//! let mut advisor = KeywordAdvisor::new(rand::rngs::StdRng::seed_from_u64(7));
//! let answer = advisor.respond("How are my schools doing?", &ctx);
//! assert!(answer.contains("$25M"));
//! ```

use rand::Rng;

use crate::budget::{category_ids, Allocations};
use crate::metrics::CityMetric;

/// Opening message shown before the player asks anything.
pub const GREETING: &str = "Hi! I'm your budget advisor. I can help explain the impact of your \
budget decisions, suggest improvements, and answer questions about municipal budgeting. \
What would you like to know?";

/// Read-only view of the plan the question is about.
#[derive(Debug, Clone, Copy)]
pub struct AdvisorContext<'a> {
    pub allocations: &'a Allocations,
    pub metrics: &'a [CityMetric],
}

/// Anything that can answer a budgeting question.
pub trait ResponseStrategy {
    fn respond(&mut self, question: &str, ctx: &AdvisorContext<'_>) -> String;
}

/// Topic an incoming question was routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Education,
    Healthcare,
    Infrastructure,
    Improvement,
    Score,
    General,
}

/// Keyword rules, checked in order. First match wins.
const TOPIC_RULES: [(Topic, &[&str]); 5] = [
    (Topic::Education, &["education", "school"]),
    (Topic::Healthcare, &["healthcare", "health"]),
    (Topic::Infrastructure, &["infrastructure", "road"]),
    (Topic::Improvement, &["improve", "better", "optimize"]),
    (Topic::Score, &["score", "rating"]),
];

/// Route a question to a topic by case-insensitive keyword match.
pub fn classify(question: &str) -> Topic {
    let lower = question.to_lowercase();
    TOPIC_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(topic, _)| *topic)
        .unwrap_or(Topic::General)
}

static GENERAL_RESPONSES: &[&str] = &[
    "That's an interesting question about municipal budgeting. Budget decisions involve complex \
trade-offs between immediate needs and long-term investments. What specific aspect would you \
like to explore further?",
    "Municipal budgeting requires balancing competing priorities with limited resources. Each \
dollar spent in one area means less available for others. Consider how your allocations align \
with your city's most pressing needs.",
    "Great question! Budget allocation is both an art and a science. Data-driven decisions \
combined with community input typically yield the best outcomes. What challenges is your city \
facing that we should address?",
    "Budget planning involves understanding both direct and indirect effects. For instance, \
investing in education can reduce future crime rates, while infrastructure spending can \
attract businesses. How can I help you think through these connections?",
];

/// Keyword-routed advisor with a random fallback bucket.
pub struct KeywordAdvisor<R: Rng> {
    rng: R,
}

impl<R: Rng> KeywordAdvisor<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> ResponseStrategy for KeywordAdvisor<R> {
    fn respond(&mut self, question: &str, ctx: &AdvisorContext<'_>) -> String {
        let alloc = ctx.allocations;
        match classify(question) {
            Topic::Education => format!(
                "Your education budget is currently ${}M. Education funding directly impacts \
graduation rates, teacher quality, and student outcomes. Consider that the national average for \
education spending is around 25-30% of municipal budgets. Would you like suggestions on \
optimizing your education allocation?",
                alloc.get(category_ids::EDUCATION)
            ),
            Topic::Healthcare => format!(
                "You've allocated ${}M to healthcare. This affects public health programs, \
hospital capacity, and emergency services. Healthcare spending typically ranges from 15-25% of \
city budgets. Higher allocations can improve health outcomes and reduce long-term costs.",
                alloc.get(category_ids::HEALTHCARE)
            ),
            Topic::Infrastructure => format!(
                "Infrastructure receives ${}M in your budget. This covers roads, bridges, public \
transit, and utilities. Well-maintained infrastructure attracts businesses and improves quality \
of life. The American Society of Civil Engineers recommends significant infrastructure \
investment to address aging systems.",
                alloc.get(category_ids::INFRASTRUCTURE)
            ),
            Topic::Improvement => "To improve your city's performance, consider these \
strategies: 1) Balance is key - avoid over-investing in one area, 2) Education and healthcare \
often provide long-term returns, 3) Infrastructure enables economic growth, 4) Public safety \
creates foundation for other improvements. What specific metric would you like to focus on?"
                .to_string(),
            Topic::Score => "Your city's overall score reflects the balance and effectiveness \
of your budget allocation. Higher scores come from strategic investments that create positive \
feedback loops. For example, good education leads to economic development, which generates more \
tax revenue for future budgets."
                .to_string(),
            Topic::General => {
                GENERAL_RESPONSES[self.rng.gen_range(0..GENERAL_RESPONSES.len())].to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn advisor(seed: u64) -> KeywordAdvisor<StdRng> {
        KeywordAdvisor::new(StdRng::seed_from_u64(seed))
    }

    #[test]
    fn test_classify_keywords() {
        assert_eq!(classify("What about SCHOOLS?"), Topic::Education);
        assert_eq!(classify("public health"), Topic::Healthcare);
        assert_eq!(classify("fix the roads"), Topic::Infrastructure);
        assert_eq!(classify("how do I do better"), Topic::Improvement);
        assert_eq!(classify("explain my rating"), Topic::Score);
        assert_eq!(classify("hello there"), Topic::General);
    }

    #[test]
    fn test_rule_order_first_match_wins() {
        // "education" outranks "score" when both appear.
        assert_eq!(classify("education score"), Topic::Education);
    }

    #[test]
    fn test_answers_quote_allocation() {
        let mut alloc = Allocations::new();
        alloc.set("healthcare", 22.5);
        let ctx = AdvisorContext {
            allocations: &alloc,
            metrics: &[],
        };
        let answer = advisor(1).respond("healthcare?", &ctx);
        assert!(answer.starts_with("You've allocated $22.5M to healthcare."));

        let answer = advisor(1).respond("roads", &ctx);
        assert!(answer.contains("$0M"));
    }

    #[test]
    fn test_fallback_from_bucket_and_seeded() {
        let alloc = Allocations::defaults();
        let ctx = AdvisorContext {
            allocations: &alloc,
            metrics: &[],
        };
        let a = advisor(42).respond("tell me something", &ctx);
        let b = advisor(42).respond("tell me something", &ctx);
        assert_eq!(a, b);
        assert!(GENERAL_RESPONSES.contains(&a.as_str()));
    }
}
