use polars::prelude::PolarsError;
use thiserror::Error;
use time::Date;

/// Precondition violations on a price series or simulation parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("price series is empty")]
    EmptySeries,

    #[error("dates must be strictly increasing: row {index} is {current}, previous row is {previous}")]
    NonIncreasingDate {
        index: usize,
        previous: Date,
        current: Date,
    },

    #[error("close on {date} must be a positive finite number, got {close}")]
    NonPositiveClose { date: Date, close: f64 },

    #[error("initial investment must be a positive finite number, got {0}")]
    InitialInvestment(f64),

    #[error("monthly contribution must be a non-negative finite number, got {0}")]
    MonthlyContribution(f64),

    #[error("cutoff day must lie within 0..=31, got {0}")]
    CutoffDay(u8),
}

/// Errors returned by the simulators.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),
}

/// Errors raised while moving price or decision data in and out of DataFrames.
#[derive(Debug, Error)]
pub enum DataError {
    #[error(transparent)]
    Polars(#[from] PolarsError),

    #[error("missing value in column '{column}' at row {row}")]
    MissingValue { column: &'static str, row: usize },

    #[error("unparseable date '{value}' at row {row}: {message}")]
    Date {
        row: usize,
        value: String,
        message: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
