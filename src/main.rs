//! cloudaudit - structural auditor for the Cloud SmartChest storage
//!
//! Reads exported chunk snapshots and reports the state of every storage
//! unit listed in the installation layout.

mod config;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use cloudaudit_assets::{catalog_from_file, layout_from_file, schematic_from_file, Schematic};
use cloudaudit_audit::{AuditConfig, CloudAuditor, Environment, Severity, UnitReport};
use cloudaudit_core::ItemStub;
use cloudaudit_testkit::{AuditSummaryBuilder, JsonlSink, SummarySink};
use cloudaudit_world::{ChunkCache, DirectorySource};

#[derive(Parser, Debug)]
#[command(author, version, about = "Audit the Cloud SmartChest storage", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Preset the configuration file is layered over
    #[arg(long, value_enum)]
    env: Option<EnvArg>,
    /// Neither read nor update the result cache
    #[arg(long)]
    no_cache: bool,
    /// Write every reported unit as one JSON line
    #[arg(long)]
    report_jsonl: Option<PathBuf>,
    /// Write a run summary as JSON
    #[arg(long)]
    summary: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Status of the unit storing one item
    Status {
        /// Namespaced item id, e.g. minecraft:stone
        item: String,
        /// Damage value variant
        #[arg(long, conflicts_with = "effect")]
        damage: Option<i16>,
        /// Potion effect variant
        #[arg(long)]
        effect: Option<String>,
    },
    /// Units needing work, most urgent first
    Todo,
    /// Every unit, one grid per floor
    Overview,
    /// Installation-wide checks
    Globals,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EnvArg {
    Dev,
    Prod,
}

impl From<EnvArg> for Environment {
    fn from(value: EnvArg) -> Self {
        match value {
            EnvArg::Dev => Environment::Dev,
            EnvArg::Prod => Environment::Prod,
        }
    }
}

fn main() -> Result<()> {
    // WARN by default, RUST_LOG overrides
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let started = Instant::now();
    let config = config::load_from_path(&args.config, args.env.map(Environment::from));
    info!(
        environment = ?config.environment,
        "Starting cloudaudit v{}",
        env!("CARGO_PKG_VERSION")
    );

    let catalog = catalog_from_file(&config.items_path())
        .with_context(|| format!("failed to load item catalog for {}", config.host))?;
    let layout = layout_from_file(&config.layout_path())
        .with_context(|| format!("failed to load installation layout for {}", config.host))?;
    let schematic = load_schematic(&config)?;
    let oracle = ChunkCache::new(
        DirectorySource::new(&config.world_dir),
        config.chunk_cache_capacity,
    );

    let mut auditor = CloudAuditor::new(&oracle, &catalog, &schematic, &layout, &config);
    if args.no_cache {
        auditor = auditor.with_cache(None);
    }

    let mut reports = Vec::new();
    let mut global_error = None;
    match &args.command {
        Command::Status {
            item,
            damage,
            effect,
        } => {
            let stub = ItemStub::from_parts(item, *damage, effect.clone(), None)
                .with_context(|| format!("invalid item {item}"))?;
            let Some(report) = auditor.status_of_item(&stub)? else {
                bail!("{stub} is not stored in the Cloud");
            };
            print_report(&report);
            if let Some(level) = &report.status.fill_level {
                println!("    {level}");
            }
            reports.push(report);
        }
        Command::Todo => {
            reports = auditor.todo()?;
            for report in &reports {
                print_report(report);
            }
            println!("{} units need work.", reports.len());
        }
        Command::Overview => {
            reports = auditor.all_statuses()?;
            print_overview(&reports);
        }
        Command::Globals => match auditor.global_status()? {
            Some(message) => {
                println!("{message}");
                global_error = Some(message);
            }
            None => println!("Input hopper chain is connected."),
        },
    }
    info!(chunks = oracle.loads(), "Audit finished");

    if let Some(path) = &args.report_jsonl {
        let mut sink = JsonlSink::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        for report in &reports {
            sink.write(report)?;
        }
        sink.flush()?;
    }
    if let Some(path) = &args.summary {
        let mut builder = AuditSummaryBuilder::new(command_name(&args.command))
            .host(&config.host)
            .units(reports.iter().map(|report| report.status.severity.label()))
            .duration(started.elapsed().as_secs_f64());
        if let Some(message) = global_error {
            builder = builder.global_error(message);
        }
        SummarySink::create(path)
            .and_then(|sink| sink.write(&builder.build()))
            .with_context(|| format!("failed to write summary to {}", path.display()))?;
    }
    Ok(())
}

/// The configured schematic, or the bundled copy when it cannot be read.
fn load_schematic(config: &AuditConfig) -> Result<Schematic> {
    match schematic_from_file(&config.schematic_path()) {
        Ok(schematic) => Ok(schematic),
        Err(err) => {
            warn!("{err}. Using the bundled SmartChest schematic");
            Schematic::smart_chest().context("bundled schematic is invalid")
        }
    }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Status { .. } => "status",
        Command::Todo => "todo",
        Command::Overview => "overview",
        Command::Globals => "globals",
    }
}

fn print_report(report: &UnitReport) {
    println!(
        "[{:<6}] {} ({}): {} {}",
        report.status.severity.label(),
        report.position,
        report.item,
        report.name,
        report.status.message
    );
}

fn glyph(severity: Severity) -> char {
    match severity {
        Severity::Ok => '.',
        Severity::Cyan => 'c',
        Severity::Yellow => 'y',
        Severity::Orange => 'o',
        Severity::Gray => '_',
        Severity::Red => 'X',
    }
}

/// One block per floor, one line per corridor, one glyph per slot.
fn print_overview(reports: &[UnitReport]) {
    let mut floor = None;
    let mut corridor = None;
    for report in reports {
        let position = report.position;
        if floor != Some(position.floor) {
            if floor.is_some() {
                println!();
            }
            println!("Floor {}", position.floor);
            floor = Some(position.floor);
            corridor = None;
        }
        if corridor != Some(position.corridor) {
            if corridor.is_some() {
                println!();
            }
            print!("  {:>3} ", position.corridor);
            corridor = Some(position.corridor);
        }
        print!("{}", glyph(report.status.severity));
    }
    if floor.is_some() {
        println!();
    }
    for severity in Severity::ALL {
        let count = reports
            .iter()
            .filter(|report| report.status.severity == severity)
            .count();
        println!("{} {severity}: {count}", glyph(severity));
    }
}
