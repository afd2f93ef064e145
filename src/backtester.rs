use std::fmt;

use time::Date;
use tracing::{debug, info, warn};

use crate::calendar::{is_last_business_day, HolidayCalendar};
use crate::error::{InputError, SimulationError};
use crate::metrics::{Comparison, StrategySummary};

/// Day of month up to which the cutoff strategy never invests.
pub const DEFAULT_CUTOFF_DAY: u8 = 11;

/// A single daily close.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: Date,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: Date, close: f64) -> Self {
        Self { date, close }
    }
}

/// The simulated wealth after processing one price point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionRecord {
    pub date: Date,
    /// Total wealth including every contribution made so far.
    pub cumulative_value: f64,
    /// Whether the monthly contribution was made on this day.
    pub invested: bool,
}

/// Output of one simulation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    /// One record per input point, in input order.
    pub decisions: Vec<DecisionRecord>,
    pub final_cumulative: f64,
}

impl SimulationResult {
    /// Number of days on which a contribution was made.
    pub fn contributions(&self) -> usize {
        self.decisions.iter().filter(|d| d.invested).count()
    }
}

/// Amounts and thresholds shared by both strategies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    /// Wealth at the first price point. Must be positive.
    pub initial_investment: f64,
    /// Amount added once per month.
    pub monthly_contribution: f64,
    /// The cutoff strategy only looks for new lows strictly after this day of month.
    pub cutoff_day: u8,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_investment: 1.0,
            monthly_contribution: 1.0,
            cutoff_day: DEFAULT_CUTOFF_DAY,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), InputError> {
        if !(self.initial_investment.is_finite() && self.initial_investment > 0.0) {
            return Err(InputError::InitialInvestment(self.initial_investment));
        }
        if !(self.monthly_contribution.is_finite() && self.monthly_contribution >= 0.0) {
            return Err(InputError::MonthlyContribution(self.monthly_contribution));
        }
        if self.cutoff_day > 31 {
            return Err(InputError::CutoffDay(self.cutoff_day));
        }
        Ok(())
    }
}

/// Checks that a series is non-empty, strictly increasing in date and priced positively.
pub fn validate_prices(prices: &[PricePoint]) -> Result<(), InputError> {
    let first = prices.first().ok_or(InputError::EmptySeries)?;
    check_close(first)?;
    for (index, pair) in prices.windows(2).enumerate() {
        let (previous, current) = (pair[0], pair[1]);
        if current.date <= previous.date {
            return Err(InputError::NonIncreasingDate {
                index: index + 1,
                previous: previous.date,
                current: current.date,
            });
        }
        check_close(&current)?;
    }
    Ok(())
}

fn check_close(point: &PricePoint) -> Result<(), InputError> {
    if point.close.is_finite() && point.close > 0.0 {
        Ok(())
    } else {
        Err(InputError::NonPositiveClose {
            date: point.date,
            close: point.close,
        })
    }
}

/// Which day of the month receives the contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Strategy {
    /// Contribute on the last business day of every month
    First,
    /// Contribute on the first new month-to-date low after the cutoff day,
    /// falling back to the last business day
    Cutoff,
}

impl Strategy {
    pub const ALL: [Strategy; 2] = [Strategy::First, Strategy::Cutoff];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::First => "first",
            Strategy::Cutoff => "cutoff",
        }
    }

    pub fn simulate<C: HolidayCalendar + ?Sized>(
        self,
        prices: &[PricePoint],
        config: &SimulationConfig,
        calendar: &C,
    ) -> Result<SimulationResult, SimulationError> {
        match self {
            Strategy::First => simulate_first(prices, config, calendar),
            Strategy::Cutoff => simulate_cutoff(prices, config, calendar),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Running wealth and month-to-date bookkeeping for one pass.
#[derive(Debug)]
struct SimulationState {
    cumulative: f64,
    previous_close: f64,
    /// Lowest close recorded since the last month end, `None` right after a reset.
    month_low: Option<f64>,
    invested_this_month: bool,
    decisions: Vec<DecisionRecord>,
}

impl SimulationState {
    fn new(initial_investment: f64, first_close: f64, capacity: usize) -> Self {
        Self {
            cumulative: initial_investment,
            previous_close: first_close,
            month_low: None,
            invested_this_month: false,
            decisions: Vec::with_capacity(capacity),
        }
    }

    /// Grows the running wealth by the day's price ratio.
    fn compound(&mut self, close: f64) {
        self.cumulative *= close / self.previous_close;
    }

    fn is_new_low(&self, close: f64) -> bool {
        self.month_low.is_some_and(|low| close < low)
    }

    fn contribute(&mut self, date: Date, amount: f64) {
        self.cumulative += amount;
        self.invested_this_month = true;
        debug!(%date, cumulative = self.cumulative, "monthly contribution");
    }

    fn reset_month(&mut self) {
        self.month_low = None;
        self.invested_this_month = false;
    }

    /// Records today's close and appends the decision for the day.
    fn close_day(&mut self, point: &PricePoint, invested: bool) {
        self.month_low = Some(self.month_low.map_or(point.close, |low| low.min(point.close)));
        self.previous_close = point.close;
        self.decisions.push(DecisionRecord {
            date: point.date,
            cumulative_value: self.cumulative,
            invested,
        });
    }

    fn finish(self, strategy: Strategy, trailing_month_open: bool) -> SimulationResult {
        let result = SimulationResult {
            final_cumulative: self.cumulative,
            decisions: self.decisions,
        };
        if trailing_month_open {
            warn!(%strategy, "series ends before a month-end business day; trailing month has no month-end row");
        }
        info!(
            %strategy,
            days = result.decisions.len(),
            contributions = result.contributions(),
            final_cumulative = result.final_cumulative,
            "simulation complete"
        );
        result
    }
}

fn start(prices: &[PricePoint], config: &SimulationConfig) -> Result<SimulationState, SimulationError> {
    config.validate()?;
    validate_prices(prices)?;
    let first = prices.first().ok_or(InputError::EmptySeries)?;
    Ok(SimulationState::new(
        config.initial_investment,
        first.close,
        prices.len(),
    ))
}

fn trailing_month_open<C: HolidayCalendar + ?Sized>(prices: &[PricePoint], calendar: &C) -> bool {
    prices
        .last()
        .is_some_and(|last| !is_last_business_day(last.date, calendar))
}

/// Contributes on the last business day of every month.
///
/// A series that starts mid-month still contributes at the end of that first
/// partial month. A trailing partial month without its month-end row gets no
/// contribution.
pub fn simulate_first<C: HolidayCalendar + ?Sized>(
    prices: &[PricePoint],
    config: &SimulationConfig,
    calendar: &C,
) -> Result<SimulationResult, SimulationError> {
    let mut state = start(prices, config)?;

    for point in prices {
        state.compound(point.close);

        let month_end = is_last_business_day(point.date, calendar);
        if month_end {
            state.contribute(point.date, config.monthly_contribution);
            state.reset_month();
        }

        state.close_day(point, month_end);
    }

    Ok(state.finish(Strategy::First, trailing_month_open(prices, calendar)))
}

/// Contributes on the first day after `cutoff_day` whose close is strictly
/// below every close recorded so far this month, or on the month's last
/// business day if no such day came. At most one contribution per month.
///
/// The month-end row is judged against the month's lows before they are
/// cleared, and its close then seeds the next month's minimum.
pub fn simulate_cutoff<C: HolidayCalendar + ?Sized>(
    prices: &[PricePoint],
    config: &SimulationConfig,
    calendar: &C,
) -> Result<SimulationResult, SimulationError> {
    let mut state = start(prices, config)?;

    for point in prices {
        state.compound(point.close);

        let month_end = is_last_business_day(point.date, calendar);
        let past_cutoff = point.date.day() > config.cutoff_day;
        let invest = !state.invested_this_month
            && ((past_cutoff && state.is_new_low(point.close)) || month_end);

        if invest {
            state.contribute(point.date, config.monthly_contribution);
        }
        if month_end {
            state.reset_month();
        }

        state.close_day(point, invest);
    }

    Ok(state.finish(Strategy::Cutoff, trailing_month_open(prices, calendar)))
}

/// A price series paired with the parameters and calendar to replay it against.
pub struct Backtester<C: HolidayCalendar> {
    /// Sorted in ascending order by date.
    pub prices: Vec<PricePoint>,
    pub config: SimulationConfig,
    pub calendar: C,
}

impl<C: HolidayCalendar> Backtester<C> {
    pub fn new(prices: Vec<PricePoint>, config: SimulationConfig, calendar: C) -> Self {
        Self {
            prices,
            config,
            calendar,
        }
    }

    /// Runs one strategy and summarises it.
    pub fn run(
        &self,
        strategy: Strategy,
    ) -> Result<(SimulationResult, StrategySummary), SimulationError> {
        let result = strategy.simulate(&self.prices, &self.config, &self.calendar)?;
        let summary = StrategySummary::new(strategy, &result, &self.config);
        Ok((result, summary))
    }

    /// Runs both strategies over the same series.
    pub fn compare(&self) -> Result<Comparison, SimulationError> {
        let (_, first) = self.run(Strategy::First)?;
        let (_, cutoff) = self.run(Strategy::Cutoff)?;
        Ok(Comparison { first, cutoff })
    }
}
