use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::clock::clock::Clock;
use crate::clock::time_of_day::TimeOfDay;
use crate::forecast::rng::{SeriesRng, Sha256Rng};
use crate::types::market_calendar::TradingCalendar;
use crate::types::price::{Price, round_to_cents};
use crate::types::symbol::Symbol;

/// Number of 5-minute bars in the final trading hour.
pub const LAST_HOUR_BARS: usize = 12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalBar {
    pub date: NaiveDate,
    pub time: TimeOfDay,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

#[async_trait]
pub trait HistoricalDataSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn fetch(&self, symbol: &Symbol) -> Result<Vec<HistoricalBar>>;
}

/// The final hour of the most recent session before `today`, oldest first. Empty when no earlier
/// session is present.
pub fn yesterday_last_hour(bars: &[HistoricalBar], today: NaiveDate) -> Vec<HistoricalBar> {
    let Some(yesterday) = bars
        .iter()
        .map(|bar| bar.date)
        .filter(|date| *date < today)
        .max()
    else {
        return Vec::new();
    };

    let mut session: Vec<HistoricalBar> = bars
        .iter()
        .filter(|bar| bar.date == yesterday)
        .cloned()
        .collect();
    session.sort_by_key(|bar| bar.time);

    let skip = session.len().saturating_sub(LAST_HOUR_BARS);
    session.split_off(skip)
}

/// Deterministic stand-in 5-minute bars for the previous trading day, used when no real history
/// is wired in.
pub struct SyntheticHistory {
    clock: Arc<dyn Clock>,
    calendar: TradingCalendar,
    reference: Price,
}

impl SyntheticHistory {
    pub fn new(clock: Arc<dyn Clock>, calendar: TradingCalendar, reference: Price) -> Self {
        Self {
            clock,
            calendar,
            reference,
        }
    }

    pub fn session_bars(&self, symbol: &Symbol, date: NaiveDate) -> Vec<HistoricalBar> {
        let hours = self.calendar.trading_hours();
        let mut rng = Sha256Rng::seeded(&format!("history_{date}_{symbol}"));
        let mut close = self.reference.as_f64();

        std::iter::successors(Some(hours.open), |time| time.plus_minutes(5))
            .take_while(|time| *time <= hours.close)
            .map(|time| {
                let open = close;
                close = open * (1.0 + rng.uniform(-0.004, 0.004));
                let wick = rng.uniform(0.0, 0.002);

                HistoricalBar {
                    date,
                    time,
                    open: round_to_cents(open),
                    high: round_to_cents(open.max(close) * (1.0 + wick)),
                    low: round_to_cents(open.min(close) * (1.0 - wick)),
                    close: round_to_cents(close),
                    volume: rng.uniform(100_000.0, 500_000.0) as u64,
                }
            })
            .collect()
    }
}

#[async_trait]
impl HistoricalDataSource for SyntheticHistory {
    fn name(&self) -> &'static str {
        "synthetic-history"
    }

    async fn fetch(&self, symbol: &Symbol) -> Result<Vec<HistoricalBar>> {
        let today = self.clock.now().date_naive();
        let previous = self.calendar.previous_trading_day(today);

        Ok(self.session_bars(symbol, previous))
    }
}
