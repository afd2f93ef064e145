use clap::ValueEnum;
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use pyo3_polars::PyDataFrame;

use crate::backtester::{Backtester, SimulationConfig, Strategy};
use crate::calendar::CalendarKind;
use crate::input_handler::{decisions_to_df, parse_price_df};

/// Python wrapper for the Rust Backtester
#[pyclass]
struct PyBacktester {
    config: SimulationConfig,
    calendar: CalendarKind,
}

#[pymethods]
impl PyBacktester {
    /// Create a new backtester with the given starting wealth, monthly contribution
    /// and holiday calendar ("us" or "weekends")
    #[new]
    #[pyo3(signature = (initial_investment=1.0, monthly_contribution=1.0, calendar="us"))]
    fn new(initial_investment: f64, monthly_contribution: f64, calendar: &str) -> PyResult<Self> {
        let calendar = CalendarKind::from_str(calendar, true).map_err(PyValueError::new_err)?;
        let config = SimulationConfig {
            initial_investment,
            monthly_contribution,
            ..SimulationConfig::default()
        };
        config
            .validate()
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        Ok(PyBacktester { config, calendar })
    }

    /// Run one strategy over a price DataFrame
    ///
    /// Args:
    ///     prices_df: Polars DataFrame with "Date" (YYYY-MM-DD) and "Adj Close" columns
    ///     strategy: "first" (month end) or "cutoff" (worst day after the 11th)
    ///
    /// Returns:
    ///     Tuple containing:
    ///     - Polars DataFrame with Date, Cumulative and Invest columns
    ///     - Dictionary with summary metrics
    #[pyo3(signature = (prices_df, strategy="cutoff"))]
    fn run<'py>(
        &self,
        py: Python<'py>,
        prices_df: PyDataFrame,
        strategy: &str,
    ) -> PyResult<(PyDataFrame, Py<PyDict>)> {
        let strategy = Strategy::from_str(strategy, true).map_err(PyValueError::new_err)?;

        let prices = parse_price_df(&prices_df.0).map_err(|e| {
            PyValueError::new_err(format!("Error parsing price data: {}", e))
        })?;

        let backtester = Backtester::new(prices, self.config, self.calendar);
        let (result, summary) = backtester.run(strategy).map_err(|e| {
            PyValueError::new_err(format!("Error running backtest: {}", e))
        })?;

        let results_df = decisions_to_df(&result.decisions).map_err(|e| {
            PyRuntimeError::new_err(format!("Error building results: {}", e))
        })?;

        let metrics_dict = PyDict::new(py);
        metrics_dict.set_item("strategy", summary.strategy.name())?;
        metrics_dict.set_item("final_value", summary.final_value)?;
        metrics_dict.set_item("total_contributed", summary.total_contributed)?;
        metrics_dict.set_item("contributions", summary.contributions)?;
        metrics_dict.set_item("growth_multiple", summary.growth_multiple)?;

        Ok((PyDataFrame(results_df), metrics_dict.unbind()))
    }
}

/// A Python module implemented in Rust using PyO3.
#[pymodule]
fn dca_backtester(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyBacktester>()?;
    Ok(())
}
