//! Pure budget simulation logic for CivicSim.
//!
//! This crate contains all simulation logic that is independent of any
//! storage, UI, or runtime. Functions take plain data and return results,
//! making them unit-testable and usable from the CLI, the headless harness,
//! and any future front end.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`advisor`] | Keyword-routed canned advisor behind a pluggable strategy trait |
//! | [`budget`] | The eight budget categories, allocation vectors, override parsing |
//! | [`metrics`] | Metrics engine: allocations → six city metrics → overall score |
//! | [`stats`] | Collection statistics and performance levels |
//! | [`summary`] | Budget usage summary (under / complete / over budget) |

pub mod advisor;
pub mod budget;
pub mod metrics;
pub mod stats;
pub mod summary;
