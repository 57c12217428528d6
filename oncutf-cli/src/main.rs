use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use oncutf_core::ConflictDecision;
use std::path::PathBuf;
use std::process;

mod spec;
mod table;

use spec::BatchSpec;

#[derive(Parser)]
#[command(
    name = "oncutf",
    version,
    about = "Batch file renaming with preview, validation and safe execution"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate and validate a rename preview from a JSON batch spec
    Preview {
        /// Path to the batch spec (JSON)
        spec: PathBuf,

        /// Render a table instead of JSON
        #[arg(long)]
        table: bool,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Execute the renames described by a JSON batch spec
    Rename {
        /// Path to the batch spec (JSON)
        spec: PathBuf,

        /// What to do when a target already exists
        #[arg(long, value_enum, default_value = "skip")]
        on_conflict: OnConflict,

        /// Stop after preflight validation; change nothing
        #[arg(long)]
        dry_run: bool,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OnConflict {
    Skip,
    Overwrite,
}

impl From<OnConflict> for ConflictDecision {
    fn from(value: OnConflict) -> Self {
        match value {
            OnConflict::Skip => Self::Skip,
            OnConflict::Overwrite => Self::Overwrite,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            2
        },
    };
    process::exit(code);
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Preview {
            spec,
            table,
            pretty,
        } => preview_command(&spec, table, pretty),
        Commands::Rename {
            spec,
            on_conflict,
            dry_run,
            pretty,
        } => rename_command(&spec, on_conflict, dry_run, pretty),
    }
}

fn preview_command(spec_path: &PathBuf, table: bool, pretty: bool) -> Result<i32> {
    let spec = BatchSpec::load(spec_path)?;
    let files = spec.file_items();
    let mut engine = spec.build_engine()?;

    let preview = engine.generate_preview(&files, &spec.modules, &spec.post_transform);
    let validation = engine.validate_preview(&preview.name_pairs);

    if table {
        println!("{}", table::render_preview(&preview, &validation));
    } else {
        let report = spec::PreviewReport {
            preview,
            validation,
        };
        print_json(&report, pretty)?;
    }

    Ok(0)
}

fn rename_command(
    spec_path: &PathBuf,
    on_conflict: OnConflict,
    dry_run: bool,
    pretty: bool,
) -> Result<i32> {
    let spec = BatchSpec::load(spec_path)?;
    let files = spec.file_items();
    let mut engine = spec.build_engine()?;

    let preview = engine.generate_preview(&files, &spec.modules, &spec.post_transform);
    let validation = engine.validate_preview(&preview.name_pairs);
    let preflight = engine.preflight(&files);

    if dry_run {
        let report = spec::DryRunReport {
            preview,
            validation,
            preflight_summary: preflight.summary(),
            preflight_ok: !preflight.has_critical_issues(),
        };
        print_json(&report, pretty)?;
        return Ok(if preflight.has_critical_issues() { 1 } else { 0 });
    }

    if preflight.has_critical_issues() {
        eprintln!("{}", preflight.summary());
        return Ok(1);
    }

    let new_names: Vec<String> = preview
        .name_pairs
        .iter()
        .map(|(_, new)| new.clone())
        .collect();

    let decision = ConflictDecision::from(on_conflict);
    let mut callback = move |_target: &str| decision;
    let result = engine.execute_rename(&files, &new_names, Some(&mut callback), None);

    let failed = result.failed_count() > 0;
    print_json(&result, pretty)?;

    eprintln!(
        "Renamed {} of {}; {} skipped, {} errors",
        result.renamed_count(),
        result.items.len(),
        result.skipped_count,
        result.error_count
    );

    Ok(i32::from(failed))
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<()> {
    let output = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("Failed to serialize output")?;
    println!("{output}");
    Ok(())
}
