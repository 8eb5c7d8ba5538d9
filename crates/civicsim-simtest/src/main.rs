//! CivicSim Headless Harness
//!
//! Validates the metrics engine and the simulation store in-process.
//! The store runs over the in-memory backend, so nothing touches disk.
//!
//! Usage:
//!   cargo run -p civicsim-simtest
//!   cargo run -p civicsim-simtest -- --verbose

use civicsim_core::prelude::*;
use civicsim_logic::advisor::{classify, AdvisorContext, KeywordAdvisor, ResponseStrategy, Topic};
use civicsim_logic::budget::{category_ids, Allocations, BUDGET_CATEGORIES, TOTAL_BUDGET};
use civicsim_logic::metrics::{
    compute_metrics, compute_score, CityMetric, METRIC_DEFINITIONS, MAX_METRIC_VALUE,
};
use civicsim_logic::stats::PerformanceLevel;
use civicsim_logic::summary::{BudgetStatus, BudgetSummary};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== CivicSim Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Static data
    results.extend(validate_static_data(verbose));

    // 2. Metrics engine scenarios
    results.extend(validate_engine_scenarios(verbose));

    // 3. Randomized engine sweep
    results.extend(validate_engine_sweep(verbose));

    // 4. Summaries and bands
    results.extend(validate_summaries(verbose));

    // 5. Store lifecycle
    results.extend(validate_store_lifecycle(verbose));

    // 6. Export / import
    results.extend(validate_export_import(verbose));

    // 7. Advisor routing
    results.extend(validate_advisor(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

fn values(metrics: &[CityMetric]) -> Vec<u32> {
    metrics.iter().map(|m| m.value).collect()
}

fn scenario_plan() -> Allocations {
    [
        (category_ids::EDUCATION, 25.0),
        (category_ids::HEALTHCARE, 20.0),
        (category_ids::INFRASTRUCTURE, 15.0),
        (category_ids::PUBLIC_SAFETY, 12.0),
        (category_ids::ENVIRONMENT, 10.0),
        (category_ids::HOUSING, 8.0),
    ]
    .into_iter()
    .collect()
}

// ── 1. Static data ──────────────────────────────────────────────────────

fn validate_static_data(verbose: bool) -> Vec<TestResult> {
    println!("--- Static Data ---");
    let mut results = Vec::new();

    let default_total: f64 = BUDGET_CATEGORIES.iter().map(|c| c.default_allocation).sum();
    results.push(TestResult {
        name: "defaults_fill_budget".into(),
        passed: (default_total - TOTAL_BUDGET).abs() < f64::EPSILON,
        detail: format!("{} categories sum to {}", BUDGET_CATEGORIES.len(), default_total),
    });

    let unmapped: Vec<&str> = METRIC_DEFINITIONS
        .iter()
        .map(|d| d.source_category)
        .filter(|id| !BUDGET_CATEGORIES.iter().any(|c| c.id == *id))
        .collect();
    results.push(TestResult {
        name: "metric_sources_known".into(),
        passed: unmapped.is_empty(),
        detail: if unmapped.is_empty() {
            "every metric reads a known category".into()
        } else {
            format!("unknown sources: {:?}", unmapped)
        },
    });

    if verbose {
        for def in METRIC_DEFINITIONS.iter() {
            println!(
                "  {:<24} <- {:<16} {} + a*{}",
                def.id, def.source_category, def.intercept, def.rate
            );
        }
    }

    results
}

// ── 2. Engine scenarios ─────────────────────────────────────────────────

fn validate_engine_scenarios(_verbose: bool) -> Vec<TestResult> {
    println!("--- Metrics Engine ---");
    let mut results = Vec::new();

    let metrics = compute_metrics(&scenario_plan());
    let got = values(&metrics);
    let score = compute_score(&metrics);
    results.push(TestResult {
        name: "engine_default_scenario".into(),
        passed: got == vec![93, 84, 80, 89, 90, 84] && score == 87,
        detail: format!("values {:?}, score {}", got, score),
    });

    let zero = compute_metrics(&Allocations::new());
    let zero_score = compute_score(&zero);
    results.push(TestResult {
        name: "engine_all_zero".into(),
        passed: values(&zero) == vec![30, 40, 20, 35, 50, 20] && zero_score == 33,
        detail: format!("values {:?}, score {}", values(&zero), zero_score),
    });

    let mut heavy = Allocations::new();
    heavy.set(category_ids::EDUCATION, 1000.0);
    let heavy_value = compute_metrics(&heavy)[0].value;
    results.push(TestResult {
        name: "engine_clamps_at_max".into(),
        passed: heavy_value == MAX_METRIC_VALUE,
        detail: format!("education 1000 -> {}", heavy_value),
    });

    let mut hostile = Allocations::new();
    hostile.set(category_ids::HEALTHCARE, -50.0);
    hostile.set(category_ids::HOUSING, f64::NAN);
    let hostile_values = values(&compute_metrics(&hostile));
    results.push(TestResult {
        name: "engine_negative_and_nan_as_zero".into(),
        passed: hostile_values == values(&zero),
        detail: format!("values {:?}", hostile_values),
    });

    let mut reversed = metrics.clone();
    reversed.reverse();
    results.push(TestResult {
        name: "score_order_independent".into(),
        passed: compute_score(&reversed) == score,
        detail: format!("reversed score {}", compute_score(&reversed)),
    });

    results
}

// ── 3. Randomized sweep ─────────────────────────────────────────────────

fn validate_engine_sweep(verbose: bool) -> Vec<TestResult> {
    println!("--- Engine Sweep ---");
    let mut results = Vec::new();
    let mut rng = StdRng::seed_from_u64(2024);

    let mut out_of_range = 0;
    let mut non_deterministic = 0;
    let mut formula_mismatch = 0;
    let runs = 500;
    for _ in 0..runs {
        let plan: Allocations = BUDGET_CATEGORIES
            .iter()
            .map(|c| (c.id, rng.gen_range(0.0..60.0)))
            .collect();
        let metrics = compute_metrics(&plan);
        if metrics.iter().any(|m| m.value > MAX_METRIC_VALUE) {
            out_of_range += 1;
        }
        if compute_metrics(&plan) != metrics {
            non_deterministic += 1;
        }
        for (def, metric) in METRIC_DEFINITIONS.iter().zip(metrics.iter()) {
            let expected = (def.intercept + plan.get(def.source_category) * def.rate)
                .min(MAX_METRIC_VALUE as f64)
                .round() as u32;
            if metric.value != expected {
                formula_mismatch += 1;
            }
        }
    }

    results.push(TestResult {
        name: "sweep_values_in_range".into(),
        passed: out_of_range == 0,
        detail: format!("{} of {} plans out of range", out_of_range, runs),
    });
    results.push(TestResult {
        name: "sweep_deterministic".into(),
        passed: non_deterministic == 0,
        detail: format!("{} of {} plans differed on re-evaluation", non_deterministic, runs),
    });
    results.push(TestResult {
        name: "sweep_matches_formula".into(),
        passed: formula_mismatch == 0,
        detail: format!("{} metric mismatches", formula_mismatch),
    });

    if verbose {
        println!("  evaluated {} random plans", runs);
    }

    results
}

// ── 4. Summaries ────────────────────────────────────────────────────────

fn validate_summaries(_verbose: bool) -> Vec<TestResult> {
    println!("--- Summaries ---");
    let mut results = Vec::new();

    let cases = [
        (Allocations::defaults(), BudgetStatus::Complete),
        (Allocations::new(), BudgetStatus::UnderBudget),
        (
            [(category_ids::EDUCATION, 150.0)].into_iter().collect(),
            BudgetStatus::OverBudget,
        ),
    ];
    let wrong: Vec<String> = cases
        .iter()
        .filter_map(|(plan, expected)| {
            let summary = BudgetSummary::from_allocations(plan, TOTAL_BUDGET);
            (summary.status != *expected)
                .then(|| format!("{} -> {:?}", summary.total_allocated, summary.status))
        })
        .collect();
    results.push(TestResult {
        name: "budget_status_thresholds".into(),
        passed: wrong.is_empty(),
        detail: if wrong.is_empty() {
            "complete / under / over classified".into()
        } else {
            wrong.join(", ")
        },
    });

    let levels = [
        (95, PerformanceLevel::Expert),
        (85, PerformanceLevel::Advanced),
        (75, PerformanceLevel::Intermediate),
        (65, PerformanceLevel::Beginner),
        (10, PerformanceLevel::Novice),
    ];
    results.push(TestResult {
        name: "performance_levels".into(),
        passed: levels
            .iter()
            .all(|(score, level)| PerformanceLevel::from_score(*score) == *level),
        detail: "expert / advanced / intermediate / beginner / novice".into(),
    });

    results
}

// ── 5. Store lifecycle ──────────────────────────────────────────────────

fn validate_store_lifecycle(_verbose: bool) -> Vec<TestResult> {
    println!("--- Store Lifecycle ---");
    let mut results = Vec::new();
    let mut store = SimulationStore::new(MemoryStorage::new());

    results.push(TestResult {
        name: "store_starts_empty".into(),
        passed: store.is_empty() && store.stats().total_simulations == 0,
        detail: format!("{} records", store.len()),
    });

    let first = SimulationRecord::new(&Allocations::defaults());
    let second = SimulationRecord::new(&Allocations::new());
    let appended = store.append(first.clone()).is_ok() && store.append(second.clone()).is_ok();
    results.push(TestResult {
        name: "store_append_preserves_order".into(),
        passed: appended && store.list() == vec![first.clone(), second.clone()],
        detail: format!("{} records after two appends", store.len()),
    });

    let duplicate = store.append(first.clone());
    results.push(TestResult {
        name: "store_rejects_duplicate_id".into(),
        passed: matches!(duplicate, Err(StoreError::DuplicateId(_))) && store.len() == 2,
        detail: format!("{} records after duplicate append", store.len()),
    });

    let stats = store.stats();
    results.push(TestResult {
        name: "store_stats".into(),
        passed: stats.total_simulations == 2 && stats.best_score == 87 && stats.average_score == 60,
        detail: format!(
            "total {}, average {}, best {}",
            stats.total_simulations, stats.average_score, stats.best_score
        ),
    });

    let removed = matches!(store.remove(&first.id), Ok(true));
    let absent = matches!(store.remove(&first.id), Ok(false));
    results.push(TestResult {
        name: "store_remove".into(),
        passed: removed && absent && store.list() == vec![second.clone()],
        detail: format!("{} records after remove", store.len()),
    });

    let mut corrupt = MemoryStorage::new();
    let seeded = corrupt.write(DEFAULT_STORAGE_KEY, "not json at all").is_ok();
    let mut recovered = SimulationStore::new(corrupt);
    let empty_on_corrupt = recovered.list().is_empty();
    let refreshed = recovered.append(second.clone()).is_ok() && recovered.len() == 1;
    results.push(TestResult {
        name: "store_recovers_from_corrupt_payload".into(),
        passed: seeded && empty_on_corrupt && refreshed,
        detail: "corrupt payload reads empty, next append persists".into(),
    });

    results
}

// ── 6. Export / import ──────────────────────────────────────────────────

fn validate_export_import(_verbose: bool) -> Vec<TestResult> {
    println!("--- Export / Import ---");
    let mut results = Vec::new();

    let mut source = SimulationStore::new(MemoryStorage::new());
    for education in [0.0, 10.0, 25.0, 40.0] {
        let mut plan = Allocations::defaults();
        plan.set(category_ids::EDUCATION, education);
        if let Err(e) = source.append(SimulationRecord::new(&plan)) {
            results.push(TestResult {
                name: "export_seed".into(),
                passed: false,
                detail: e.to_string(),
            });
            return results;
        }
    }

    let blob = match source.export_all() {
        Ok(blob) => blob,
        Err(e) => {
            results.push(TestResult {
                name: "export_all".into(),
                passed: false,
                detail: e.to_string(),
            });
            return results;
        }
    };

    let is_array = serde_json::from_slice::<serde_json::Value>(&blob)
        .map(|v| v.as_array().map(Vec::len) == Some(4))
        .unwrap_or(false);
    results.push(TestResult {
        name: "export_is_json_array".into(),
        passed: is_array,
        detail: format!("{} bytes", blob.len()),
    });

    let mut target = SimulationStore::new(MemoryStorage::new());
    let report = target.import_merge(&blob);
    results.push(TestResult {
        name: "import_into_empty_reproduces".into(),
        passed: matches!(report, Ok(r) if r.imported == 4) && target.list() == source.list(),
        detail: format!("{} records imported", target.len()),
    });

    let again = target.import_merge(&blob);
    results.push(TestResult {
        name: "import_keep_existing_skips".into(),
        passed: matches!(again, Ok(r) if r.skipped == 4 && !r.changed()) && target.len() == 4,
        detail: format!("{} records after re-import", target.len()),
    });

    let mut renamed: Vec<SimulationRecord> = source.list();
    for record in renamed.iter_mut() {
        record.name = format!("{} (edited)", record.name);
    }
    let renamed_blob = serde_json::to_vec(&renamed).unwrap_or_default();
    let mut replacing = SimulationStore::new(MemoryStorage::new())
        .with_merge_policy(MergePolicy::ReplaceExisting);
    let seeded = replacing.import_merge(&blob).is_ok();
    let replaced = replacing.import_merge(&renamed_blob);
    results.push(TestResult {
        name: "import_replace_existing_overwrites".into(),
        passed: seeded
            && matches!(replaced, Ok(r) if r.replaced == 4)
            && replacing.list() == renamed,
        detail: format!("{} records, order kept", replacing.len()),
    });

    let before = target.list();
    let malformed: [&[u8]; 4] = [b"{}", b"42", b"not json", br#"[{"id": 1}]"#];
    let all_rejected = malformed
        .iter()
        .all(|m| matches!(target.import_merge(m), Ok(r) if r.rejected));
    results.push(TestResult {
        name: "malformed_import_ignored".into(),
        passed: all_rejected && target.list() == before,
        detail: format!("{} malformed payloads rejected", malformed.len()),
    });

    results.push(TestResult {
        name: "imported_records_consistent".into(),
        passed: target.list().iter().all(SimulationRecord::is_consistent),
        detail: "stored metrics match re-evaluation".into(),
    });

    results
}

// ── 7. Advisor ──────────────────────────────────────────────────────────

fn validate_advisor(_verbose: bool) -> Vec<TestResult> {
    println!("--- Advisor ---");
    let mut results = Vec::new();

    let routes = [
        ("How are the SCHOOLS?", Topic::Education),
        ("public health plans", Topic::Healthcare),
        ("fix the roads", Topic::Infrastructure),
        ("how do I do better", Topic::Improvement),
        ("what is my rating", Topic::Score),
        ("hello there", Topic::General),
    ];
    let misrouted: Vec<&str> = routes
        .iter()
        .filter(|(q, topic)| classify(q) != *topic)
        .map(|(q, _)| *q)
        .collect();
    results.push(TestResult {
        name: "advisor_keyword_routing".into(),
        passed: misrouted.is_empty(),
        detail: if misrouted.is_empty() {
            format!("{} questions routed", routes.len())
        } else {
            format!("misrouted: {:?}", misrouted)
        },
    });

    let allocations = Allocations::defaults();
    let metrics = compute_metrics(&allocations);
    let ctx = AdvisorContext {
        allocations: &allocations,
        metrics: &metrics,
    };
    let mut a = KeywordAdvisor::new(StdRng::seed_from_u64(11));
    let mut b = KeywordAdvisor::new(StdRng::seed_from_u64(11));
    let same = (0..5).all(|_| a.respond("hello", &ctx) == b.respond("hello", &ctx));
    results.push(TestResult {
        name: "advisor_seeded_fallback_deterministic".into(),
        passed: same,
        detail: "same seed, same answers".into(),
    });

    results
}
