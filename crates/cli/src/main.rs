use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

mod config;
mod export;

use config::Config;
use kassenwart_statement::{classify_statement, EventDirectory, Transaction};

#[derive(Parser)]
#[command(
    name = "kassenwart",
    about = "Classify club bank statements and match fees to members and events."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a statement export and write annotated transactions.
    Classify {
        /// Semicolon-delimited statement CSV, as exported by the bank.
        #[arg(long)]
        statement: PathBuf,
        /// TOML file with the event directory and member roster.
        #[arg(long)]
        config: PathBuf,
        /// Output format: table, csv or json.
        #[arg(long, default_value = "table")]
        format: String,
        /// Write to a file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the search patterns generated for each configured event.
    Patterns {
        /// TOML file with the event directory.
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Classify {
            statement,
            config,
            format,
            output,
        } => classify(&statement, &config, &format, output.as_deref()),
        Commands::Patterns { config } => patterns(&config),
    }
}

fn classify(
    statement: &Path,
    config_path: &Path,
    format: &str,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let config = Config::load(config_path)?;
    let events = EventDirectory::new(config.event_records()?)?;
    let roster = config.roster();

    let file = File::open(statement)
        .with_context(|| format!("Failed to open {}", statement.display()))?;
    let transactions = classify_statement(file, &events, &roster)?;

    for tx in &transactions {
        for problem in &tx.problems {
            warn!("transaction {}: {problem}", tx.t_id);
        }
    }
    let flagged = transactions.iter().filter(|tx| !tx.problems.is_empty()).count();
    info!(
        "{} transactions classified against {} events and {} members, {} flagged for review",
        transactions.len(),
        events.len(),
        roster.len(),
        flagged
    );

    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_output(file, format, &transactions)
        }
        None => write_output(io::stdout().lock(), format, &transactions),
    }
}

fn write_output<W: io::Write>(
    out: W,
    format: &str,
    transactions: &[Transaction],
) -> anyhow::Result<()> {
    match format {
        "table" => export::write_table(out, transactions)?,
        "csv" => export::write_csv(out, transactions)?,
        "json" => export::write_json(out, transactions)?,
        other => anyhow::bail!("Unknown format: '{other}' (use table, csv or json)"),
    }
    Ok(())
}

fn patterns(config_path: &Path) -> anyhow::Result<()> {
    let config = Config::load(config_path)?;
    let events = EventDirectory::new(config.event_records()?)?;

    for (title, exact, fuzzy) in events.pattern_sources() {
        println!("{title}");
        println!("  exact: {exact}");
        println!("  fuzzy: {fuzzy}");
    }
    Ok(())
}
