//! Monthly dollar-cost-averaging backtests over a daily close series.
//!
//! Two strategies replay the same prices: one contributes on the last business
//! day of every month, the other waits past a cutoff day and contributes on the
//! first new month-to-date low, falling back to month end.

pub mod backtester;
pub mod calendar;
pub mod error;
pub mod input_handler;
pub mod metrics;

#[cfg(feature = "python")]
mod python;

pub use backtester::{
    simulate_cutoff, simulate_first, Backtester, DecisionRecord, PricePoint, SimulationConfig,
    SimulationResult, Strategy, DEFAULT_CUTOFF_DAY,
};
pub use calendar::{
    is_last_business_day, next_business_day, CalendarKind, FixedHolidays, HolidayCalendar,
    UsFederalHolidays, WeekendsOnly,
};
pub use error::{DataError, InputError, SimulationError};
pub use metrics::{Comparison, StrategySummary};
