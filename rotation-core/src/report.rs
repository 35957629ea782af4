// =================================================================
// report.rs: console summary and file exports of a backtest run
// =================================================================
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;

use crate::backtest::{BacktestResult, PerformanceSummary, Position};

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Expected {expected} dates, got {found}")]
    DateMismatch { expected: usize, found: usize },
}

/// Human-readable summary of a run, as printed by the CLI
pub fn format_summary(result: &BacktestResult, symbols: &[String]) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "\nBacktest Results ({}):", result.model);
    let _ = writeln!(
        out,
        "Rank: {}  Lookback: {}  Periods/Year: {}",
        result.config.rank, result.config.lookback, result.config.periods_per_year
    );
    let _ = writeln!(out, "Periods: {}", result.strategy_series.len());
    let _ = writeln!(out, "Bad Predictions: {}", result.invalid_count);

    let _ = writeln!(out, "\nStrategy:");
    write_series_block(
        &mut out,
        result.strategy_sharpe,
        result.strategy_series.final_cumulative(),
        &result.strategy_metrics,
    );

    let _ = writeln!(out, "\nBenchmark (equal-weight long):");
    write_series_block(
        &mut out,
        result.benchmark_sharpe,
        result.benchmark_series.final_cumulative(),
        &result.benchmark_metrics,
    );

    if let Some(last) = result.signals.rows().last() {
        let _ = writeln!(out, "\nLatest Signals:");
        for (index, position) in last.iter().enumerate() {
            let label = symbols
                .get(index)
                .cloned()
                .unwrap_or_else(|| format!("asset{}", index));
            let side = match position {
                Position::Long => "LONG",
                Position::Short => "SHORT",
            };
            let _ = writeln!(out, "  {:<6} {}", label, side);
        }
    }

    out
}

fn write_series_block(
    out: &mut String,
    sharpe: f64,
    final_cumulative: Option<f64>,
    metrics: &PerformanceSummary,
) {
    let _ = writeln!(out, "  Sharpe Ratio: {:.4}", sharpe);
    match final_cumulative {
        Some(value) => {
            let _ = writeln!(out, "  Final Cumulative: {:.4}", value);
        }
        None => {
            let _ = writeln!(out, "  Final Cumulative: n/a");
        }
    }
    let _ = writeln!(out, "  Total Return: {:.2}%", metrics.total_return * 100.0);
    let _ = writeln!(out, "  Sortino Ratio: {:.4}", metrics.sortino_ratio);
    let _ = writeln!(out, "  Max Drawdown: {:.2}%", metrics.max_drawdown * 100.0);
}

pub fn print_summary(result: &BacktestResult, symbols: &[String]) {
    println!("{}", format_summary(result, symbols));
}

/// Serialize the full result as pretty JSON
pub fn write_json<P: AsRef<Path>>(path: P, result: &BacktestResult) -> Result<(), ReportError> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    serde_json::to_writer_pretty(&mut writer, result)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    info!("Wrote backtest result to {}", path.as_ref().display());
    Ok(())
}

/// Per-period returns and cumulative growth of both portfolios.
///
/// `dates` labels the rows of the returns matrix the result came from.
pub fn write_cumulative<W: Write>(
    writer: W,
    dates: &[NaiveDate],
    result: &BacktestResult,
) -> Result<(), ReportError> {
    let n_periods = result.strategy_series.len();
    if dates.len() != n_periods {
        return Err(ReportError::DateMismatch {
            expected: n_periods,
            found: dates.len(),
        });
    }

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([
        "date",
        "strategy_return",
        "strategy_cumulative",
        "benchmark_return",
        "benchmark_cumulative",
    ])?;

    let strategy = &result.strategy_series;
    let benchmark = &result.benchmark_series;
    for (index, date) in dates.iter().enumerate() {
        csv_writer.write_record([
            date.format("%Y-%m-%d").to_string(),
            strategy.returns[index].to_string(),
            strategy.cumulative[index].to_string(),
            benchmark.returns[index].to_string(),
            benchmark.cumulative[index].to_string(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_cumulative_csv<P: AsRef<Path>>(
    path: P,
    dates: &[NaiveDate],
    result: &BacktestResult,
) -> Result<(), ReportError> {
    let file = File::create(path.as_ref())?;
    write_cumulative(file, dates, result)?;
    info!("Wrote cumulative returns to {}", path.as_ref().display());
    Ok(())
}
