mod error;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use error::{AppError, AppResult};
use sb_protocol::Message;
use sb_sim::{Scenario, ScenarioReport, run_scenario};
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser)]
#[command(name = "sb-cli")]
#[command(about = "Steam boiler controller - scenario runner and message tools", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario against the simulated boiler
    Run {
        /// Path to the scenario YAML file
        scenario_path: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
        /// Record and print every message exchange
        #[arg(long)]
        transcript: bool,
    },
    /// Print a scenario template to stdout
    Template,
    /// Parse wire messages and print their canonical form
    Decode {
        /// Messages such as `LEVEL(250.0)` or `PUMP_STATE(1,true)`
        #[arg(required = true)]
        messages: Vec<String>,
    },
}

fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            scenario_path,
            json,
            transcript,
        } => cmd_run(&scenario_path, json, transcript),
        Commands::Template => cmd_template(),
        Commands::Decode { messages } => cmd_decode(&messages),
    }
}

fn load_scenario(path: &Path) -> AppResult<Scenario> {
    tracing::debug!(target: "steamboiler.cli", path = %path.display(), "loading scenario");
    let text = std::fs::read_to_string(path).map_err(|source| AppError::ScenarioRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Scenario::from_yaml(&text)?)
}

fn cmd_run(scenario_path: &Path, json: bool, transcript: bool) -> AppResult<()> {
    let mut scenario = load_scenario(scenario_path)?;
    if transcript {
        scenario.harness.record_transcript = true;
    }
    let report = run_scenario(&scenario)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        serde_json::to_writer_pretty(&mut out, &report)?;
        writeln!(out)?;
    } else {
        print_report(&mut out, &report)?;
    }
    Ok(())
}

fn print_report(out: &mut impl Write, report: &ScenarioReport) -> AppResult<()> {
    let name = if report.name.is_empty() {
        "(unnamed)"
    } else {
        report.name.as_str()
    };
    writeln!(out, "Scenario: {name}")?;
    writeln!(
        out,
        "  Simulated: {:.1}s ({} exchanges)",
        report.simulated_s, report.exchanges
    )?;
    match report.final_mode {
        Some(mode) => writeln!(out, "  Final mode: {mode}")?,
        None => writeln!(out, "  Final mode: -")?,
    }
    if let Some(t) = report.program_ready_at_s {
        writeln!(out, "  Program ready at: {t:.1}s")?;
    }
    if let Some(t) = report.emergency_stop_at_s {
        writeln!(out, "  Emergency stop at: {t:.1}s")?;
    }
    writeln!(
        out,
        "  Level: final {:.1} L, min {:.1} L, max {:.1} L",
        report.final_level, report.min_level, report.max_level
    )?;
    if let Some((lo, hi)) = report.operational_level_range {
        writeln!(out, "  Level while operational: {lo:.1}..{hi:.1} L")?;
    }

    if !report.mode_changes.is_empty() {
        writeln!(out, "\nMode changes:")?;
        for change in &report.mode_changes {
            writeln!(out, "  {:>8.1}s  {}", change.at_s, change.mode)?;
        }
    }
    if !report.detections.is_empty() {
        writeln!(out, "\nFailures detected:")?;
        for d in &report.detections {
            writeln!(out, "  {:>8.1}s  {}", d.at_s, d.unit)?;
        }
    }
    if !report.transcript.is_empty() {
        writeln!(out, "\nTranscript:")?;
        for line in &report.transcript {
            writeln!(out, "  {:>8.1}s  <- {}", line.at_s, line.received.join(" "))?;
            writeln!(out, "  {:>8}   -> {}", "", line.sent.join(" "))?;
        }
    }
    Ok(())
}

fn cmd_template() -> AppResult<()> {
    print!("{}", Scenario::template().to_yaml()?);
    Ok(())
}

fn cmd_decode(messages: &[String]) -> AppResult<()> {
    for text in messages {
        let message: Message = text.parse()?;
        println!(
            "{message}  kind={} parameter={:?}",
            message.kind(),
            message.kind().parameter()
        );
    }
    Ok(())
}
