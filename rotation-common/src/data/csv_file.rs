// =================================================================
// data/csv_file.rs - Returns File Format
// =================================================================
//
// Layout: a `date` column (YYYY-MM-DD) followed by one column of simple
// returns per symbol, oldest period first.

use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim, WriterBuilder};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, info};

use super::{DataError, PeriodicReturns, ReturnsMatrix};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Load a returns file from disk
pub fn read_returns_csv(path: impl AsRef<Path>) -> Result<PeriodicReturns, DataError> {
    let path = path.as_ref();
    info!("Loading returns from: {}", path.display());
    read_returns(File::open(path)?)
}

/// Parse returns from any reader. Rows with a missing value are dropped.
pub fn read_returns<R: Read>(source: R) -> Result<PeriodicReturns, DataError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(source);

    let headers = reader.headers()?.clone();
    if headers.len() < 2 {
        return Err(DataError::ParseError(
            "Expected a date column followed by at least one symbol".to_string(),
        ));
    }
    let symbols: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut dates = Vec::new();
    let mut rows = Vec::new();
    let mut dropped = 0usize;

    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let line = index + 2;

        let raw_date = record.get(0).unwrap_or_default();
        let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT).map_err(|e| {
            DataError::ParseError(format!("Line {}: invalid date '{}': {}", line, raw_date, e))
        })?;

        if record.len() > symbols.len() + 1 {
            return Err(DataError::ParseError(format!(
                "Line {}: {} fields, header has {}",
                line,
                record.len(),
                symbols.len() + 1
            )));
        }

        let mut cells = Vec::with_capacity(symbols.len());
        for field in record.iter().skip(1) {
            if field.is_empty() || field.eq_ignore_ascii_case("nan") {
                break;
            }
            let value = field.parse::<f64>().map_err(|e| {
                DataError::ParseError(format!("Line {}: invalid return '{}': {}", line, field, e))
            })?;
            cells.push(value);
        }

        if cells.len() != symbols.len() {
            debug!("Dropping line {} ({}) with missing data", line, raw_date);
            dropped += 1;
            continue;
        }

        dates.push(date);
        rows.push(cells);
    }

    if dropped > 0 {
        info!("Dropped {} rows with missing data", dropped);
    }

    PeriodicReturns::new(dates, symbols, ReturnsMatrix::new(rows)?)
}

/// Write a returns file to disk
pub fn write_returns_csv(path: impl AsRef<Path>, data: &PeriodicReturns) -> Result<(), DataError> {
    let path = path.as_ref();
    write_returns(File::create(path)?, data)?;
    info!(
        "Wrote {} periods x {} symbols to {}",
        data.returns.n_periods(),
        data.returns.n_assets(),
        path.display()
    );
    Ok(())
}

pub fn write_returns<W: Write>(sink: W, data: &PeriodicReturns) -> Result<(), DataError> {
    let mut writer = WriterBuilder::new().from_writer(sink);

    let mut header = Vec::with_capacity(data.symbols.len() + 1);
    header.push("date".to_string());
    header.extend(data.symbols.iter().cloned());
    writer.write_record(&header)?;

    for (date, row) in data.dates.iter().zip(data.returns.rows()) {
        let mut record = Vec::with_capacity(row.len() + 1);
        record.push(date.format(DATE_FORMAT).to_string());
        record.extend(row.iter().map(f64::to_string));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "date,XLK,XLE\n\
                          2020-01-31,0.01,-0.02\n\
                          2020-02-29,,0.03\n\
                          2020-03-31,0.04,0.05\n";

    #[test]
    fn test_read_drops_missing_rows() {
        let data = read_returns(SAMPLE.as_bytes()).unwrap();

        assert_eq!(data.symbols, vec!["XLK", "XLE"]);
        assert_eq!(data.returns.n_periods(), 2);
        assert_eq!(data.returns.row(1), &[0.04, 0.05]);
        assert_eq!(data.dates[1], NaiveDate::from_ymd_opt(2020, 3, 31).unwrap());
    }

    #[test]
    fn test_read_rejects_bad_date() {
        let result = read_returns("date,XLK\n31/01/2020,0.01\n".as_bytes());
        assert!(matches!(result, Err(DataError::ParseError(_))));
    }

    #[test]
    fn test_read_rejects_extra_fields() {
        let result = read_returns("date,XLK,XLE\n2020-01-31,0.01,-0.02,0.07\n".as_bytes());
        assert!(matches!(result, Err(DataError::ParseError(_))));

        // a short row is missing data, not malformed
        let data = read_returns("date,XLK,XLE\n2020-01-31,0.01\n2020-02-29,0.02,0.03\n".as_bytes()).unwrap();
        assert_eq!(data.returns.n_periods(), 1);
    }

    #[test]
    fn test_write_then_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("returns.csv");

        let data = read_returns(SAMPLE.as_bytes()).unwrap();
        write_returns_csv(&path, &data).unwrap();
        let loaded = read_returns_csv(&path).unwrap();

        assert_eq!(loaded, data);
    }
}
