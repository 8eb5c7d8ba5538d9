//! Command handlers
//!
//! Each handler takes the store it operates on and a writer for its report,
//! so tests can run them against an in-memory backend and a byte buffer.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Utc;

use civicsim_core::export;
use civicsim_core::prelude::*;
use civicsim_logic::advisor::{AdvisorContext, ResponseStrategy, GREETING};
use civicsim_logic::budget::{Allocations, BUDGET_CATEGORIES, TOTAL_BUDGET};
use civicsim_logic::metrics::{
    baseline_metrics, compute_metrics, compute_score, metric_changes, ScoreBand,
};
use civicsim_logic::summary::{format_millions, BudgetSummary};

/// Default plan with command-line overrides applied in order.
pub fn build_allocations(overrides: &[(String, f64)]) -> Allocations {
    let mut allocations = Allocations::defaults();
    for (id, amount) in overrides {
        allocations.set(id.as_str(), *amount);
    }
    allocations
}

pub fn categories(out: &mut impl Write) -> Result<()> {
    writeln!(out, "{:<22} {:>8}  {}", "CATEGORY", "DEFAULT", "DESCRIPTION")?;
    for category in BUDGET_CATEGORIES.iter() {
        writeln!(
            out,
            "{:<22} {:>8}  {}",
            category.id,
            format_millions(category.default_allocation),
            category.description
        )?;
    }
    writeln!(out, "Total budget: {}", format_millions(TOTAL_BUDGET))?;
    Ok(())
}

/// Evaluate a plan and print the report. With `save`, the snapshot is
/// appended to the store and its id returned.
pub fn simulate<S: Storage>(
    store: &mut SimulationStore<S>,
    overrides: &[(String, f64)],
    save: bool,
    name: Option<&str>,
    out: &mut impl Write,
) -> Result<Option<RecordId>> {
    let allocations = build_allocations(overrides);
    let metrics = compute_metrics(&allocations);
    let changes = metric_changes(&metrics, &baseline_metrics());
    let score = compute_score(&metrics);

    writeln!(out, "{:<24} {:>6} {:>8}", "METRIC", "VALUE", "CHANGE")?;
    for (metric, change) in metrics.iter().zip(changes.iter()) {
        writeln!(
            out,
            "{:<24} {:>5}{} {:>+8}",
            metric.name, metric.value, metric.unit, change.change
        )?;
    }
    writeln!(out)?;
    writeln!(out, "Overall score: {}/100", score)?;
    writeln!(out, "{}", ScoreBand::from_score(score).verdict())?;

    let summary = BudgetSummary::from_allocations(&allocations, TOTAL_BUDGET);
    writeln!(
        out,
        "Allocated {} of {} ({:.1}%)",
        format_millions(summary.total_allocated),
        format_millions(summary.total_budget),
        summary.usage_percent
    )?;
    writeln!(out, "{}", summary.message())?;

    if !save {
        return Ok(None);
    }

    let mut record = SimulationRecord::new(&allocations);
    if let Some(name) = name {
        record = record.with_name(name);
    }
    let id = record.id.clone();
    store.append(record).context("failed to save simulation")?;
    tracing::info!(id = %id, score, "Saved simulation");
    writeln!(out, "Saved simulation {}", id)?;
    Ok(Some(id))
}

pub fn list<S: Storage>(store: &SimulationStore<S>, out: &mut impl Write) -> Result<()> {
    let records = store.list();
    if records.is_empty() {
        writeln!(out, "No saved simulations.")?;
        return Ok(());
    }
    writeln!(out, "{:<36}  {:<24} {:>5}  {}", "ID", "NAME", "SCORE", "CREATED")?;
    for record in &records {
        writeln!(
            out,
            "{:<36}  {:<24} {:>5}  {}",
            record.id,
            record.name,
            record.total_score,
            record.created_at.format("%Y-%m-%d %H:%M")
        )?;
    }
    Ok(())
}

pub fn show<S: Storage>(store: &SimulationStore<S>, id: &str, out: &mut impl Write) -> Result<()> {
    let Some(record) = store.get(&RecordId::from(id)) else {
        bail!("no saved simulation with id '{}'", id);
    };

    writeln!(out, "{} ({})", record.name, record.id)?;
    writeln!(out, "Created: {}", record.created_at.to_rfc3339())?;
    writeln!(out, "Score:   {}/100", record.total_score)?;
    writeln!(out)?;
    writeln!(out, "Allocations:")?;
    for (category, amount) in record.allocations.iter() {
        writeln!(out, "  {:<22} {:>8}", category, format_millions(amount))?;
    }
    writeln!(out, "Metrics:")?;
    for metric in &record.city_metrics {
        writeln!(out, "  {:<22} {:>5}{}", metric.name, metric.value, metric.unit)?;
    }
    if !record.is_consistent() {
        tracing::warn!(id = %record.id, "Stored metrics do not match a fresh evaluation");
    }
    Ok(())
}

/// Returns whether a record was removed. A missing id is reported, not an error.
pub fn delete<S: Storage>(
    store: &mut SimulationStore<S>,
    id: &str,
    out: &mut impl Write,
) -> Result<bool> {
    let removed = store
        .remove(&RecordId::from(id))
        .context("failed to delete simulation")?;
    if removed {
        writeln!(out, "Deleted simulation {}", id)?;
    } else {
        writeln!(out, "No saved simulation with id '{}'", id)?;
    }
    Ok(removed)
}

/// Where an export lands: `out` itself, a generated name inside `out` when it
/// is a directory, or a generated name in the working directory.
pub fn resolve_export_path(out: Option<&Path>, file_name: String) -> PathBuf {
    match out {
        Some(path) if path.is_dir() => path.join(file_name),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(".").join(file_name),
    }
}

pub fn export_all<S: Storage>(
    store: &SimulationStore<S>,
    out_path: Option<&Path>,
    out: &mut impl Write,
) -> Result<PathBuf> {
    let path = resolve_export_path(out_path, export::collection_file_name(Utc::now()));
    export::write_file(&path, &store.export_all()?)
        .with_context(|| format!("failed to write {}", path.display()))?;
    writeln!(out, "Exported {} simulations to {}", store.len(), path.display())?;
    Ok(path)
}

pub fn export_one<S: Storage>(
    store: &SimulationStore<S>,
    id: &str,
    out_path: Option<&Path>,
    out: &mut impl Write,
) -> Result<PathBuf> {
    let Some(record) = store.get(&RecordId::from(id)) else {
        bail!("no saved simulation with id '{}'", id);
    };
    let path = resolve_export_path(out_path, export::record_file_name(Utc::now()));
    export::write_file(&path, &export::record_to_json(&record)?)
        .with_context(|| format!("failed to write {}", path.display()))?;
    writeln!(out, "Exported '{}' to {}", record.name, path.display())?;
    Ok(path)
}

/// Merge an exported collection file into the store under the store's policy.
pub fn import<S: Storage>(
    store: &mut SimulationStore<S>,
    file: &Path,
    out: &mut impl Write,
) -> Result<ImportReport> {
    let blob = fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let report = store.import_merge(&blob)?;
    if report.rejected {
        bail!(
            "{} is not a simulation collection export; nothing was imported",
            file.display()
        );
    }
    writeln!(
        out,
        "Imported {} new, replaced {}, skipped {} duplicate(s)",
        report.imported, report.replaced, report.skipped
    )?;
    Ok(report)
}

pub fn stats<S: Storage>(store: &SimulationStore<S>, out: &mut impl Write) -> Result<()> {
    let stats = store.stats();
    writeln!(out, "Total simulations: {}", stats.total_simulations)?;
    writeln!(out, "Average score:     {}", stats.average_score)?;
    writeln!(out, "Best score:        {}", stats.best_score)?;
    writeln!(out, "Performance:       {}", stats.performance().label())?;
    Ok(())
}

/// Answer `question` for the plan built from `overrides`. A blank question
/// gets the advisor's greeting.
pub fn ask(
    advisor: &mut impl ResponseStrategy,
    question: &str,
    overrides: &[(String, f64)],
    out: &mut impl Write,
) -> Result<()> {
    if question.trim().is_empty() {
        writeln!(out, "{}", GREETING)?;
        return Ok(());
    }
    let allocations = build_allocations(overrides);
    let metrics = compute_metrics(&allocations);
    let ctx = AdvisorContext {
        allocations: &allocations,
        metrics: &metrics,
    };
    writeln!(out, "{}", advisor.respond(question, &ctx))?;
    Ok(())
}
