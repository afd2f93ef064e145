use std::fs::File;
use std::path::Path;

use polars::prelude::*;
use time::format_description::{self, BorrowedFormatItem};
use time::Date;
use tracing::debug;

use crate::backtester::{DecisionRecord, PricePoint};
use crate::error::DataError;

pub const DATE_COLUMN: &str = "Date";
pub const CLOSE_COLUMN: &str = "Adj Close";
pub const CUMULATIVE_COLUMN: &str = "Cumulative";
pub const INVEST_COLUMN: &str = "Invest";

fn iso_date_format() -> Result<Vec<BorrowedFormatItem<'static>>, PolarsError> {
    format_description::parse("[year]-[month]-[day]").map_err(|e| {
        PolarsError::ComputeError(format!("Error creating date format: {:?}", e).into())
    })
}

/// Parses a price DataFrame into a vector of `PricePoint`.
///
/// The input DF must include a "Date" column (UTF8) in ISO format (e.g., "2023-01-15")
/// and an "Adj Close" column of any numeric type.
///
/// # Errors
/// Returns an error if either column is missing, a date cannot be parsed, or a close is null.
/// Ordering and positivity are checked by the simulators, not here.
pub fn parse_price_df(df: &DataFrame) -> Result<Vec<PricePoint>, DataError> {
    let dates = df.column(DATE_COLUMN)?.str()?;
    let closes = df.column(CLOSE_COLUMN)?.cast(&DataType::Float64)?;
    let closes = closes.f64()?;
    let date_format = iso_date_format()?;

    let mut prices = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let raw = dates.get(row).ok_or(DataError::MissingValue {
            column: DATE_COLUMN,
            row,
        })?;
        let date = Date::parse(raw.trim(), &date_format).map_err(|e| DataError::Date {
            row,
            value: raw.to_string(),
            message: e.to_string(),
        })?;
        let close = closes.get(row).ok_or(DataError::MissingValue {
            column: CLOSE_COLUMN,
            row,
        })?;
        prices.push(PricePoint { date, close });
    }
    Ok(prices)
}

/// Reads a CSV file with "Date" and "Adj Close" columns.
pub fn load_prices_csv(path: impl AsRef<Path>) -> Result<Vec<PricePoint>, DataError> {
    let path = path.as_ref();
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    debug!(path = %path.display(), rows = df.height(), "loaded price csv");
    parse_price_df(&df)
}

/// Builds a DataFrame with "Date", "Cumulative" and "Invest" columns, one row per decision.
pub fn decisions_to_df(decisions: &[DecisionRecord]) -> Result<DataFrame, DataError> {
    let date_format = iso_date_format()?;
    let dates = decisions
        .iter()
        .map(|d| d.date.format(&date_format))
        .collect::<Result<Vec<String>, _>>()
        .map_err(|e| PolarsError::ComputeError(format!("Error formatting date: {:?}", e).into()))?;
    let cumulative: Vec<f64> = decisions.iter().map(|d| d.cumulative_value).collect();
    let invested: Vec<bool> = decisions.iter().map(|d| d.invested).collect();

    let df = df!(
        DATE_COLUMN => dates,
        CUMULATIVE_COLUMN => cumulative,
        INVEST_COLUMN => invested
    )?;
    Ok(df)
}

/// Writes decisions as CSV, overwriting `path`.
pub fn write_decisions_csv(
    path: impl AsRef<Path>,
    decisions: &[DecisionRecord],
) -> Result<(), DataError> {
    let mut df = decisions_to_df(decisions)?;
    let mut file = File::create(path.as_ref())?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)?;
    debug!(path = %path.as_ref().display(), rows = df.height(), "wrote decisions csv");
    Ok(())
}
