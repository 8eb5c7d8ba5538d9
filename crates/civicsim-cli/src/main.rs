//! civicsim - municipal budget simulator
//!
//! Evaluates budget plans and manages the saved simulation collection in a
//! local data directory.

mod commands;
mod logging;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use civicsim_core::prelude::*;
use civicsim_logic::advisor::KeywordAdvisor;
use civicsim_logic::budget::parse_allocation_override;

#[derive(Parser)]
#[command(name = "civicsim")]
#[command(about = "Allocate a city budget, see the impact, and keep your simulations")]
#[command(version)]
struct Cli {
    /// Directory holding saved simulations
    #[arg(long, global = true, env = "CIVICSIM_DATA_DIR", default_value = "./civicsim-data")]
    data_dir: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show budget categories and their default allocations
    Categories,

    /// Evaluate a budget plan, starting from the defaults
    Simulate {
        /// Override one category, e.g. --alloc education=30 (repeatable)
        #[arg(long = "alloc", value_name = "ID=AMOUNT", value_parser = parse_allocation_override)]
        allocations: Vec<(String, f64)>,

        /// Save the result to the collection
        #[arg(long)]
        save: bool,

        /// Name for the saved simulation (defaults to a dated label)
        #[arg(long, requires = "save")]
        name: Option<String>,
    },

    /// List saved simulations
    List,

    /// Show one saved simulation
    Show {
        /// Simulation id
        id: String,
    },

    /// Delete a saved simulation
    Delete {
        /// Simulation id
        id: String,
    },

    /// Export every saved simulation to one JSON file
    Export {
        /// Output file or directory
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Export a single saved simulation
    ExportOne {
        /// Simulation id
        id: String,

        /// Output file or directory
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Merge a previously exported collection into this one
    Import {
        /// Exported collection file
        file: PathBuf,

        /// Overwrite existing simulations that share an id
        #[arg(long)]
        replace: bool,
    },

    /// Collection statistics
    Stats,

    /// Ask the budget advisor a question (no question prints a greeting)
    Ask {
        /// Your question
        question: Option<String>,

        /// Override one category for context, e.g. --alloc housing=15 (repeatable)
        #[arg(long = "alloc", value_name = "ID=AMOUNT", value_parser = parse_allocation_override)]
        allocations: Vec<(String, f64)>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(&cli.log_level);

    tracing::debug!(data_dir = %cli.data_dir.display(), "Opening simulation store");
    let merge_policy = match &cli.command {
        Commands::Import { replace: true, .. } => MergePolicy::ReplaceExisting,
        _ => MergePolicy::KeepExisting,
    };
    let mut store =
        SimulationStore::new(DirStorage::new(&cli.data_dir)).with_merge_policy(merge_policy);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Categories => commands::categories(&mut out)?,
        Commands::Simulate {
            allocations,
            save,
            name,
        } => {
            commands::simulate(&mut store, &allocations, save, name.as_deref(), &mut out)?;
        }
        Commands::List => commands::list(&store, &mut out)?,
        Commands::Show { id } => commands::show(&store, &id, &mut out)?,
        Commands::Delete { id } => {
            commands::delete(&mut store, &id, &mut out)?;
        }
        Commands::Export { out: path } => {
            commands::export_all(&store, path.as_deref(), &mut out)?;
        }
        Commands::ExportOne { id, out: path } => {
            commands::export_one(&store, &id, path.as_deref(), &mut out)?;
        }
        Commands::Import { file, .. } => {
            commands::import(&mut store, &file, &mut out)?;
        }
        Commands::Stats => commands::stats(&store, &mut out)?,
        Commands::Ask {
            question,
            allocations,
        } => {
            let mut advisor = KeywordAdvisor::new(rand::thread_rng());
            let question = question.unwrap_or_default();
            commands::ask(&mut advisor, &question, &allocations, &mut out)?;
        }
    }

    out.flush()?;
    Ok(())
}
