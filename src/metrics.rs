use crate::backtester::{SimulationConfig, SimulationResult, Strategy};

/// Headline numbers for one strategy run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategySummary {
    pub strategy: Strategy,
    /// Cumulative value after the last price point.
    pub final_value: f64,
    /// Initial investment plus every monthly contribution made.
    pub total_contributed: f64,
    /// Number of monthly contributions made.
    pub contributions: usize,
    /// `final_value / total_contributed`.
    pub growth_multiple: f64,
}

impl StrategySummary {
    pub fn new(strategy: Strategy, result: &SimulationResult, config: &SimulationConfig) -> Self {
        let contributions = result.contributions();
        let total_contributed =
            config.initial_investment + contributions as f64 * config.monthly_contribution;
        Self {
            strategy,
            final_value: result.final_cumulative,
            total_contributed,
            contributions,
            growth_multiple: result.final_cumulative / total_contributed,
        }
    }
}

/// Both strategies replayed over the same series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    pub first: StrategySummary,
    pub cutoff: StrategySummary,
}

impl Comparison {
    /// Relative advantage of the cutoff strategy, e.g. 0.01 means 1% more final wealth.
    pub fn cutoff_edge(&self) -> f64 {
        self.cutoff.final_value / self.first.final_value - 1.0
    }
}
