use std::{io, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use market_data_ingestor::{models::timeframe::TimeFrame, providers::alpaca_rest::AlpacaProvider};
use setup_scanner::{
    Scanner, ScannerConfig,
    config::load_config_path,
    render::{render_json, render_table},
};
use tracing::info;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Parser)]
#[command(version, about = "Real-Time Trade Setup Scanner")]
struct Cli {
    /// TOML config; every key is optional.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Comma-separated tickers, replacing the configured watch list.
    #[arg(long, value_delimiter = ',')]
    tickers: Option<Vec<String>>,
    /// Bar size, e.g. 1Min, 5Min, 15Min, 1Hour.
    #[arg(long)]
    interval: Option<TimeFrame>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config_path(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ScannerConfig::default(),
    };
    if let Some(tickers) = cli.tickers {
        config.tickers = tickers;
    }
    if let Some(interval) = cli.interval {
        config.interval = interval;
    }

    let provider = AlpacaProvider::new().context("configuring the Alpaca data provider")?;
    let scanner = Scanner::new(provider, config).context("invalid scanner configuration")?;

    info!(
        tickers = scanner.config().tickers.len(),
        interval = %scanner.config().interval,
        "Scanning tickers..."
    );
    let report = scanner.scan().await;

    let mut stdout = io::stdout().lock();
    match cli.format {
        OutputFormat::Table => render_table(&report, &mut stdout)?,
        OutputFormat::Json => render_json(&report, &mut stdout)?,
    }
    Ok(())
}
