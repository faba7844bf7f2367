//! takeoff CLI - materials estimating from formula groups

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use takeoff::prelude::*;
use takeoff::{diff, merge, parse_import_document, to_document};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "takeoff")]
#[command(author, version, about = "Materials estimating from formula groups")]
struct Cli {
    /// Log resolution and import details (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the built-in groups as a formula set document
    Defaults {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Resolve one group and print its items
    Calc {
        /// Formula set document (default: built-in groups)
        #[arg(short, long)]
        groups: Option<PathBuf>,

        /// Group name, case-insensitive
        #[arg(long)]
        group: String,

        /// Input value as CODE=VALUE; may be repeated
        #[arg(short, long = "input", value_parser = parse_input)]
        inputs: Vec<(String, String)>,

        /// Formula ordering strategy
        #[arg(long, value_enum, default_value_t = StrategyArg::Topological)]
        strategy: StrategyArg,

        /// Also list formulas that could not be resolved
        #[arg(long)]
        show_unresolved: bool,
    },

    /// List what an incoming formula set would add or change
    Diff {
        /// Current formula set document
        #[arg(long)]
        active: PathBuf,

        /// Incoming formula set document
        incoming: PathBuf,
    },

    /// Merge an incoming formula set into the current one
    Import {
        /// Current formula set document
        #[arg(long)]
        active: PathBuf,

        /// Incoming formula set document
        incoming: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Formula to import as GROUP_ID:FORMULA_ID; may be repeated
        /// (default: everything new or changed)
        #[arg(long = "select", value_parser = parse_selection)]
        selections: Vec<(String, String)>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Topological,
    FixedPoint,
}

impl From<StrategyArg> for ResolutionStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Topological => ResolutionStrategy::Topological,
            StrategyArg::FixedPoint => ResolutionStrategy::FixedPoint,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Defaults { output } => write_defaults(output.as_deref()),
        Commands::Calc {
            groups,
            group,
            inputs,
            strategy,
            show_unresolved,
        } => calc(
            groups.as_deref(),
            &group,
            &inputs,
            strategy.into(),
            show_unresolved,
        ),
        Commands::Diff { active, incoming } => show_diff(&active, &incoming),
        Commands::Import {
            active,
            incoming,
            output,
            selections,
        } => import(&active, &incoming, output.as_deref(), &selections),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(io::stderr)
        .init();
}

/// Parse `CODE=VALUE`
fn parse_input(arg: &str) -> std::result::Result<(String, String), String> {
    let (code, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected CODE=VALUE, got '{}'", arg))?;
    let code = code.trim();
    if code.is_empty() {
        return Err(format!("missing code in '{}'", arg));
    }
    Ok((code.to_string(), value.to_string()))
}

/// Parse `GROUP_ID:FORMULA_ID`
fn parse_selection(arg: &str) -> std::result::Result<(String, String), String> {
    match arg.split_once(':') {
        Some((group, formula)) if !group.is_empty() && !formula.is_empty() => {
            Ok((group.to_string(), formula.to_string()))
        }
        _ => Err(format!("expected GROUP_ID:FORMULA_ID, got '{}'", arg)),
    }
}

fn read_document(path: &Path) -> Result<Vec<CalculationGroup>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    parse_import_document(&text).with_context(|| format!("Invalid formula set '{}'", path.display()))
}

fn write_output(output: Option<&Path>, text: &str) -> Result<()> {
    if let Some(path) = output {
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write '{}'", path.display()))?;
    } else {
        let mut stdout = io::stdout();
        stdout
            .write_all(text.as_bytes())
            .and_then(|_| stdout.write_all(b"\n"))
            .context("Failed to write to stdout")?;
    }
    Ok(())
}

fn write_defaults(output: Option<&Path>) -> Result<()> {
    let groups = builtin_groups();
    let document = to_document(groups.as_slice()).context("Failed to serialize groups")?;
    write_output(output, &document)
}

fn calc(
    groups_path: Option<&Path>,
    name: &str,
    raw_inputs: &[(String, String)],
    strategy: ResolutionStrategy,
    show_unresolved: bool,
) -> Result<()> {
    let groups = match groups_path {
        Some(path) => GroupCollection::new(read_document(path)?)
            .with_context(|| format!("No groups in '{}'", path.display()))?,
        None => builtin_groups(),
    };
    let group = groups
        .find_by_name(name)
        .with_context(|| format!("Group '{}' not found", name))?;

    let mut inputs = group.initial_inputs();
    for (code, value) in raw_inputs {
        if group.variable_by_code(code).is_none() {
            tracing::warn!(%code, group = %group.name, "input does not match any variable");
        }
        match value.trim().parse::<f64>() {
            Ok(number) => inputs.set_number(code.clone(), number),
            Err(_) => inputs.set_text(code.clone(), value.clone()),
        }
    }

    let options = ResolveOptions {
        strategy,
        ..Default::default()
    };
    let resolution = group.resolve_with_options(&inputs, &options);

    for item in &resolution.items {
        println!("{}\t{}\t{}", item.name, item.quantity, item.unit);
    }

    if show_unresolved {
        for (report, reason) in resolution.unresolved() {
            eprintln!("Unresolved: {} ({})", report.name, reason);
        }
    }

    Ok(())
}

fn show_diff(active_path: &Path, incoming_path: &Path) -> Result<()> {
    let active = read_document(active_path)?;
    let incoming = read_document(incoming_path)?;

    let candidates = diff(&incoming, &active);
    if candidates.is_empty() {
        eprintln!("Nothing to import");
        return Ok(());
    }

    for candidate in &candidates {
        println!(
            "{}\t{}\t{}",
            status_label(candidate.status),
            candidate.group.name,
            candidate.group.id
        );
        for formula_diff in &candidate.formulas {
            println!(
                "  {}\t{}\t{}",
                status_label(formula_diff.status),
                formula_diff.formula.name,
                formula_diff.formula.id
            );
        }
    }

    Ok(())
}

fn import(
    active_path: &Path,
    incoming_path: &Path,
    output: Option<&Path>,
    selections: &[(String, String)],
) -> Result<()> {
    let active = read_document(active_path)?;
    let incoming = read_document(incoming_path)?;

    let candidates = diff(&incoming, &active);
    let selection = if selections.is_empty() {
        ImportSelection::all(&candidates)
    } else {
        let mut selection = ImportSelection::new();
        for (group_id, formula_id) in selections {
            selection.select(group_id, formula_id);
        }
        selection
    };
    if selection.is_empty() && !candidates.is_empty() {
        bail!("No formulas selected");
    }

    let merged = merge(&selection, &candidates, &active);
    let (formulas, groups) = import_counts(&selection, &candidates);
    eprintln!("Imported {} formulas from {} groups", formulas, groups);

    let document = to_document(&merged).context("Failed to serialize groups")?;
    write_output(output, &document)
}

/// Formulas and groups a merge actually takes from the candidates
fn import_counts(selection: &ImportSelection, candidates: &[ImportCandidate]) -> (usize, usize) {
    candidates
        .iter()
        .map(|candidate| {
            candidate
                .group
                .formulas
                .iter()
                .filter(|f| selection.is_selected(&candidate.group.id, &f.id))
                .count()
        })
        .filter(|&count| count > 0)
        .fold((0, 0), |(formulas, groups), count| (formulas + count, groups + 1))
}

fn status_label(status: CandidateStatus) -> &'static str {
    match status {
        CandidateStatus::New => "new",
        CandidateStatus::Updated => "updated",
    }
}
