// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::Result;
use clap::{Parser, Subcommand};
use lcr_simulator::logging::{self, Sink};
use lcr_simulator::{AppConfig, BaselineStore, RowFailure, SimulationEngine, SimulationRecord};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "lcr-simulator", version, about = "What-if simulation of transactions on the Liquidity Coverage Ratio")]
struct Cli {
    /// JSON config file
    #[arg(long, global = true, env = "LCR_SIM_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive dashboard (default)
    Ui,
    /// Print the baseline balance sheet and LCR metrics
    Baseline,
    /// Replay a CSV script (Counterparty,Product,Direction,Amount) and print the log
    Run {
        script: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::resolve(cli.config.as_deref())?;

    match cli.command.unwrap_or(Command::Ui) {
        Command::Ui => {
            logging::init(&config.logging, Sink::Discard)?;
            run_ui_mode(&config)?;
        }
        Command::Baseline => {
            logging::init(&config.logging, Sink::Stdout)?;
            run_baseline(&config)?;
        }
        Command::Run { script } => {
            logging::init(&config.logging, Sink::Stdout)?;
            run_script(&config, &script)?;
        }
    }

    Ok(())
}

fn run_baseline(config: &AppConfig) -> Result<()> {
    let store = BaselineStore::load(&config.baseline)?;

    println!("🏦 Baseline Balance Sheet");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("{:<16} {:<24} {:>12}", "Counterparty", "Product", "Amount");
    for entry in store.balance_sheet() {
        println!("{:<16} {:<24} {:>12}", entry.counterparty, entry.product.as_str(), entry.amount);
    }

    println!("\n📊 LCR Metrics");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for (label, value) in store.baseline_metrics().rows() {
        println!("{:<34} {:>10}", label, value);
    }

    Ok(())
}

fn run_script(config: &AppConfig, script: &std::path::Path) -> Result<()> {
    println!("📦 Replaying {:?}", script);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let store = Arc::new(BaselineStore::load(&config.baseline)?);
    let mut engine = SimulationEngine::new(store);
    let baseline = engine.metrics().lcr_percent;

    let report = lcr_simulator::replay_file(&mut engine, script)?;

    println!(
        "{:>3}  {:<12} {:<22} {:>10} {:<7} {:>10}  {}",
        "#", "Counterparty", "Product", "Amount", "D/C", "New LCR %", "Affected Category"
    );
    for record in engine.log() {
        print_record(record);
    }

    if !report.rejected.is_empty() {
        println!("\n⚠️  Rejected rows");
        for row in &report.rejected {
            let reason = match &row.failure {
                RowFailure::Invalid(err) => err.to_string(),
                RowFailure::Unparseable(text) => format!("amount is not a number: {:?}", text),
            };
            println!("   line {}: {}", row.line, reason);
        }
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✓ Applied {} of {} rows", report.applied, report.total());
    println!("✓ LCR: {}% → {}%", baseline, engine.metrics().lcr_percent);

    Ok(())
}

fn print_record(record: &SimulationRecord) {
    println!(
        "{:>3}  {:<12} {:<22} {:>10} {:<7} {:>10}  {}",
        record.sequence,
        record.counterparty,
        record.product.as_str(),
        record.amount,
        record.direction.as_str(),
        record.resulting_lcr_percent,
        record.affected_category
    );
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &AppConfig) -> Result<()> {
    println!("🖥️  Loading LCR Simulator...\n");

    let store = Arc::new(BaselineStore::load(&config.baseline)?);
    let engine = SimulationEngine::new(store);

    let mut app = ui::App::new(engine);
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &AppConfig) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the web UI: cargo run --bin lcr-server --features server");
    std::process::exit(1);
}
