//! stitchrl CLI - XBRL statement assembly, validation and stitching

use anyhow::{bail, Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use stitchrl::diagnostics::Diagnostics;
use stitchrl::instance::parse_instance;
use stitchrl::{stitch, EngineConfig, Filing, FilingFiles, FilingParser, Statement, StatementType};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// XBRL linkbase resolution and multi-period statement assembly
#[derive(ClapParser)]
#[command(name = "stitchrl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON engine configuration; flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an instance document
    Parse {
        /// Instance file
        input: PathBuf,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,

        /// Show statistics
        #[arg(short, long)]
        stats: bool,
    },

    /// Check calculation consistency of a filing directory
    Validate {
        /// Filing directory
        dir: PathBuf,

        /// Validation profile (generic, sec-edgar)
        #[arg(short, long, default_value = "generic")]
        profile: String,

        /// Exit non-zero on any inconsistency
        #[arg(long)]
        strict: bool,

        /// Calculation tolerance
        #[arg(long)]
        tolerance: Option<f64>,
    },

    /// Assemble one statement of a filing directory
    Statement {
        /// Filing directory
        dir: PathBuf,

        /// balance-sheet, income-statement, comprehensive-income, cash-flow, equity
        #[arg(short = 't', long = "type")]
        statement_type: StatementType,

        /// Maximum number of period columns
        #[arg(long)]
        periods: Option<usize>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Stitch one statement across several filing directories
    Stitch {
        /// Filing directories
        #[arg(required = true)]
        dirs: Vec<PathBuf>,

        #[arg(short = 't', long = "type")]
        statement_type: StatementType,

        /// Maximum number of period columns
        #[arg(long)]
        periods: Option<usize>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Parse { input, json, stats } => {
            let start = Instant::now();
            let data = std::fs::read(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let mut diagnostics = Diagnostics::new();
            let instance = parse_instance(&data, &mut diagnostics)
                .with_context(|| format!("Failed to parse {}", input.display()))?;
            let elapsed = start.elapsed();

            if json {
                println!("{}", serde_json::to_string_pretty(&instance)?);
                return Ok(());
            }

            println!("{} {}", "✓".green().bold(), input.display());
            if let Some(name) = &instance.entity_info.registrant_name {
                println!("  Entity: {}", name);
            }
            println!("  Facts: {}", instance.facts.len());
            println!("  Contexts: {}", instance.contexts.len());
            println!("  Units: {}", instance.units.len());
            println!("  Footnotes: {}", instance.footnotes.len());
            print_diagnostics(&diagnostics);

            if stats {
                println!("  Time: {:.2}ms", elapsed.as_secs_f64() * 1000.0);
                println!(
                    "  Throughput: {:.0} facts/sec",
                    instance.facts.len() as f64 / elapsed.as_secs_f64()
                );
            }
        }

        Commands::Validate {
            dir,
            profile,
            strict,
            tolerance,
        } => {
            if profile == "sec-edgar" {
                config = EngineConfig {
                    concept_overrides: config.concept_overrides,
                    ..EngineConfig::sec_edgar()
                };
            }
            if strict {
                config = config.strict();
            }
            if let Some(tolerance) = tolerance {
                config = config.with_tolerance(tolerance);
            }
            // Strict only decides the exit code; the report is always printed in full
            let strict = std::mem::take(&mut config.strict);

            let filing = load_filing(&FilingParser::with_config(config), &dir)?;
            let report = filing.validate()?;

            if report.is_valid {
                println!(
                    "{} {} - Calculations are consistent ({} trees, {} contexts)",
                    "✓".green().bold(),
                    dir.display(),
                    report.stats.trees_checked,
                    report.stats.contexts_checked
                );
            } else {
                println!("{} {} - Calculation inconsistencies", "✗".red().bold(), dir.display());
                println!("  Inconsistencies: {}", report.inconsistencies.len());
                for inconsistency in report.inconsistencies.iter().take(5) {
                    println!(
                        "  {} {} [{}] reported {} calculated {} (difference {})",
                        "ERROR:".red(),
                        inconsistency.parent,
                        inconsistency.context_id,
                        inconsistency.reported,
                        inconsistency.calculated,
                        inconsistency.difference
                    );
                }
                if report.inconsistencies.len() > 5 {
                    println!("  ... and {} more inconsistencies", report.inconsistencies.len() - 5);
                }
            }
            for mismatch in report.weight_mismatches.iter().take(5) {
                println!(
                    "  {} {} -> {} weight {} ({:?}/{:?})",
                    "WARNING:".yellow(),
                    mismatch.parent,
                    mismatch.child,
                    mismatch.weight,
                    mismatch.parent_balance,
                    mismatch.child_balance
                );
            }

            if strict && !report.is_valid {
                std::process::exit(1);
            }
        }

        Commands::Statement {
            dir,
            statement_type,
            periods,
            json,
        } => {
            if let Some(periods) = periods {
                config = config.with_max_periods(periods);
            }
            let filing = load_filing(&FilingParser::with_config(config), &dir)?;
            let Some(statement) = filing.statement(statement_type) else {
                bail!("{} has no {} statement", dir.display(), statement_type);
            };
            output(&statement, json)?;
        }

        Commands::Stitch {
            dirs,
            statement_type,
            periods,
            json,
        } => {
            if let Some(periods) = periods {
                config = config.with_max_periods(periods);
            }
            let max_periods = config.max_periods;
            let parser = FilingParser::with_config(config);

            let files = dirs
                .iter()
                .map(|dir| {
                    FilingFiles::from_dir(dir)
                        .with_context(|| format!("Failed to load {}", dir.display()))
                })
                .collect::<Result<Vec<_>>>()?;
            let sources: Vec<_> = files.iter().map(FilingFiles::sources).collect();

            let mut statements = Vec::with_capacity(dirs.len());
            for (dir, filing) in dirs.iter().zip(parser.parse_many(&sources)) {
                let filing = filing.with_context(|| format!("Failed to parse {}", dir.display()))?;
                statements.extend(filing.statement(statement_type));
            }
            let stitched = stitch(&statements, statement_type, max_periods)?;
            output(&stitched, json)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_filing(parser: &FilingParser, dir: &Path) -> Result<Filing> {
    let files = FilingFiles::from_dir(dir)
        .with_context(|| format!("Failed to load {}", dir.display()))?;
    parser
        .parse(&files.sources())
        .with_context(|| format!("Failed to parse {}", dir.display()))
}

fn output(statement: &Statement, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(statement)?);
    } else {
        render(statement);
    }
    Ok(())
}

fn render(statement: &Statement) {
    let title = match &statement.entity {
        Some(entity) => format!("{} - {}", entity, statement.statement_type),
        None => statement.statement_type.to_string(),
    };
    println!("{}", title.bold());

    let header: Vec<String> = statement
        .periods
        .iter()
        .map(|p| {
            p.period()
                .end_date()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| p.to_string())
        })
        .collect();
    println!("{:<60}{}", "", header.iter().map(|h| format!("{:>18}", h)).collect::<String>());

    for row in statement.rows.iter().filter(|row| !row.elidable) {
        let label = format!("{}{}", "  ".repeat(row.depth), row.display_label());
        let cells: String = statement
            .periods
            .iter()
            .map(|period| match row.values.get(period) {
                Some(cell) => match cell.value {
                    Some(value) => format!("{:>18}", format_value(value)),
                    None => format!("{:>18}", cell.raw.chars().take(16).collect::<String>()),
                },
                None => format!("{:>18}", "-"),
            })
            .collect();
        let label = if row.is_abstract {
            format!("{:<60}", label).bold().to_string()
        } else {
            format!("{:<60}", label)
        };
        let marker = if row.prior_values.is_empty() { "" } else { " *" };
        println!("{}{}{}", label, cells, marker.yellow());
    }

    if !statement.diagnostics.restatements.is_empty() {
        println!(
            "\n{} {} restated values (marked *)",
            "NOTE:".yellow(),
            statement.diagnostics.restatements.len()
        );
    }
}

fn format_value(value: f64) -> String {
    if value.fract() != 0.0 {
        return format!("{:.2}", value);
    }
    let digits = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if value < 0.0 {
        format!("({})", grouped)
    } else {
        grouped
    }
}

fn print_diagnostics(diagnostics: &Diagnostics) {
    if diagnostics.is_empty() {
        return;
    }
    println!("  Diagnostics: {}", diagnostics.len());
    for failure in diagnostics.numeric_coercion_failures.iter().take(5) {
        println!(
            "  {} {} [{}] could not read {:?}",
            "WARNING:".yellow(),
            failure.concept,
            failure.context_id,
            failure.raw_value
        );
    }
    for duplicate in diagnostics.duplicate_facts.iter().take(5) {
        println!(
            "  {} {} [{}] duplicate value {:?} ignored",
            "WARNING:".yellow(),
            duplicate.concept,
            duplicate.context_id,
            duplicate.ignored
        );
    }
}
