use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use form4kit::{ArchiveSink, HarvestConfig, Harvester};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "form4kit")]
#[command(about = "Harvest Form 4 filings from a date back to an earlier one")]
struct Args {
    /// Most recent filing date to crawl (defaults to today, UTC).
    #[arg(long)]
    begin: Option<NaiveDate>,

    /// Oldest filing date to crawl, inclusive.
    #[arg(long)]
    end: NaiveDate,

    /// Directory the filings are written to.
    #[arg(long, default_value = "filings")]
    out: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let begin = args.begin.unwrap_or_else(|| Utc::now().date_naive());

    let config = HarvestConfig::from_env().context("failed to load configuration")?;
    let harvester = Harvester::with_config(config).context("failed to create harvester")?;
    let mut sink = ArchiveSink::new(&args.out);

    let summary = harvester
        .run_crawl(begin, args.end, &mut sink)
        .await
        .with_context(|| format!("crawl from {} to {} failed", begin, args.end))?;

    println!(
        "Stored {} filings from {} days in {}",
        summary.documents_dispatched,
        summary.days_completed,
        sink.root().display()
    );
    Ok(())
}
