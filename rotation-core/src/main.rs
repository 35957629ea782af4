use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rotation_common::data::write_returns_csv;
use rotation_core::{
    config::Settings,
    model::DmdModel,
    provider::{AlphaVantageProvider, CsvReturnsSource, MarketDataProvider},
    report, BacktestEngine,
};

#[derive(Parser)]
#[command(name = "rotation")]
#[command(about = "Sector rotation backtest driven by dynamic mode decomposition forecasts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the sliding-window backtest
    Backtest {
        /// Read returns from a CSV file instead of Alpha Vantage
        #[arg(short, long)]
        input: Option<PathBuf>,
        #[arg(short, long, value_delimiter = ',')]
        symbols: Vec<String>,
        #[arg(short, long)]
        rank: Option<usize>,
        #[arg(short, long)]
        lookback: Option<usize>,
        #[arg(long)]
        periods_back: Option<usize>,
        /// Write the full result as JSON
        #[arg(long)]
        json: Option<PathBuf>,
        /// Write per-period and cumulative returns as CSV
        #[arg(long)]
        curve: Option<PathBuf>,
    },
    /// Download monthly returns and store them as CSV
    Fetch {
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long, value_delimiter = ',')]
        symbols: Vec<String>,
        #[arg(long)]
        periods_back: Option<usize>,
    },
}

fn alpha_vantage(settings: &Settings) -> anyhow::Result<AlphaVantageProvider> {
    let Some(api_key) = settings.provider.api_key.clone() else {
        bail!("No API key configured; set ALPHAVANTAGE_API_KEY or pass --input");
    };

    let mut provider = AlphaVantageProvider::new(api_key)
        .with_rate_limit(
            settings.provider.calls_per_minute,
            Duration::from_secs(settings.provider.throttle_secs),
        )
        .with_max_retries(settings.provider.max_retries);
    if let Some(api_url) = &settings.provider.api_url {
        provider = provider.with_api_url(api_url.clone());
    }
    Ok(provider)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut settings = Settings::new().context("Failed to load configuration")?;

    match cli.command {
        Commands::Backtest {
            input,
            symbols,
            rank,
            lookback,
            periods_back,
            json,
            curve,
        } => {
            if !symbols.is_empty() {
                settings.provider.symbols = symbols;
            }
            if let Some(rank) = rank {
                settings.backtest.rank = rank;
            }
            if let Some(lookback) = lookback {
                settings.backtest.lookback = lookback;
            }
            if let Some(periods_back) = periods_back {
                settings.provider.periods_back = periods_back;
            }
            settings.validate()?;

            let provider: Box<dyn MarketDataProvider> = match input {
                Some(path) => Box::new(CsvReturnsSource::new(path)),
                None => Box::new(alpha_vantage(&settings)?),
            };
            let data = provider
                .get_periodic_returns(&settings.provider.symbols, settings.provider.periods_back)
                .await?;
            info!(
                "Loaded {} periods for {} symbols ({} to {})",
                data.dates.len(),
                data.symbols.len(),
                data.dates.first().map(|d| d.to_string()).unwrap_or_default(),
                data.dates.last().map(|d| d.to_string()).unwrap_or_default()
            );

            let engine = BacktestEngine::new(DmdModel::new(), settings.backtest_config());
            let returns = data.returns.clone();
            let result = tokio::task::spawn_blocking(move || engine.run(&returns)).await??;

            if result.invalid_count > 0 {
                warn!("{} forecasts were carried forward", result.invalid_count);
            }
            report::print_summary(&result, &data.symbols);

            if let Some(path) = json {
                report::write_json(&path, &result)?;
            }
            if let Some(path) = curve {
                report::write_cumulative_csv(&path, &data.dates, &result)?;
            }
        }
        Commands::Fetch {
            output,
            symbols,
            periods_back,
        } => {
            if !symbols.is_empty() {
                settings.provider.symbols = symbols;
            }
            if let Some(periods_back) = periods_back {
                settings.provider.periods_back = periods_back;
            }
            settings.validate()?;

            let provider = alpha_vantage(&settings)?;
            let data = provider
                .get_periodic_returns(&settings.provider.symbols, settings.provider.periods_back)
                .await?;
            write_returns_csv(&output, &data)?;
            info!(
                "Saved {} periods for {} symbols to {}",
                data.dates.len(),
                data.symbols.len(),
                output.display()
            );
        }
    }

    Ok(())
}
