use std::collections::BTreeMap;

use dca_backtester::{
    is_last_business_day, HolidayCalendar, PricePoint, SimulationConfig, SimulationResult,
    Strategy as DcaStrategy, UsFederalHolidays,
};
use proptest::prelude::*;
use time::macros::date;
use time::{Date, Duration};

/// Consecutive US business days starting somewhere in 2000-2009.
fn business_day_series() -> impl Strategy<Value = Vec<PricePoint>> {
    (0i64..3650, prop::collection::vec(1.0f64..1000.0, 1..300)).prop_map(|(offset, closes)| {
        let mut day = date!(2000 - 01 - 03) + Duration::days(offset);
        let mut points = Vec::with_capacity(closes.len());
        for close in closes {
            while !UsFederalHolidays.is_business_day(day) {
                day = day.next_day().unwrap();
            }
            points.push(PricePoint::new(day, close));
            day = day.next_day().unwrap();
        }
        points
    })
}

fn run(strategy: DcaStrategy, prices: &[PricePoint]) -> SimulationResult {
    strategy
        .simulate(prices, &SimulationConfig::default(), &UsFederalHolidays)
        .unwrap()
}

/// Contributions per (year, month), in series order.
fn contributions_by_month(result: &SimulationResult) -> BTreeMap<(i32, u8), usize> {
    let mut months = BTreeMap::new();
    for decision in &result.decisions {
        let key = (decision.date.year(), decision.date.month() as u8);
        *months.entry(key).or_insert(0) += usize::from(decision.invested);
    }
    months
}

proptest! {
    #[test]
    fn final_value_is_positive(prices in business_day_series()) {
        for strategy in DcaStrategy::ALL {
            let result = run(strategy, &prices);
            prop_assert!(result.final_cumulative > 0.0);
            prop_assert!(result.decisions.iter().all(|d| d.cumulative_value > 0.0));
        }
    }

    #[test]
    fn one_decision_per_price_point(prices in business_day_series()) {
        for strategy in DcaStrategy::ALL {
            let result = run(strategy, &prices);
            let dates: Vec<Date> = result.decisions.iter().map(|d| d.date).collect();
            let expected: Vec<Date> = prices.iter().map(|p| p.date).collect();
            prop_assert_eq!(dates, expected);
        }
    }

    #[test]
    fn one_contribution_per_contained_month(prices in business_day_series()) {
        for strategy in DcaStrategy::ALL {
            let months = contributions_by_month(&run(strategy, &prices));
            let last = months.len() - 1;
            for (i, count) in months.values().enumerate() {
                if i == 0 || i == last {
                    prop_assert!(*count <= 1);
                } else {
                    prop_assert_eq!(*count, 1);
                }
            }
        }
    }

    #[test]
    fn simulations_are_idempotent(prices in business_day_series()) {
        for strategy in DcaStrategy::ALL {
            prop_assert_eq!(run(strategy, &prices), run(strategy, &prices));
        }
    }

    #[test]
    fn early_cutoff_contributions_are_new_lows(prices in business_day_series()) {
        let result = run(DcaStrategy::Cutoff, &prices);
        for (i, decision) in result.decisions.iter().enumerate() {
            if !decision.invested || is_last_business_day(decision.date, &UsFederalHolidays) {
                continue;
            }
            prop_assert!(decision.date.day() > 11);
            let close = prices[i].close;
            let same_month_before = prices[..i]
                .iter()
                .filter(|p| p.date.year() == decision.date.year() && p.date.month() == decision.date.month());
            for prior in same_month_before {
                prop_assert!(close < prior.close);
            }
        }
    }
}
