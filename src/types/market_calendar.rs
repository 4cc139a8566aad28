use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::{env, fs, path::Path};

use anyhow::{Context, Result, anyhow, bail};
use chrono::{Datelike, Days, NaiveDate, Weekday};
use once_cell::sync::OnceCell;
use serde::Deserialize;
use tracing::info;

use crate::clock::time_of_day::TimeOfDay;
use crate::types::{price::Price, symbol::Symbol, trading_hours::TradingHours};

const MAX_LOOKAHEAD_DAYS: u64 = 366;

/// Weekends plus the configured public holidays. Both session classification and forecast date
/// redirection go through this one calendar.
#[derive(Debug, Clone)]
pub struct TradingCalendar {
    trading_hours: TradingHours,
    recurring_holidays: HashSet<MonthDay>,
    holidays: HashSet<NaiveDate>,
}

impl TradingCalendar {
    /// Weekends only, no holidays.
    pub fn weekdays() -> Self {
        Self {
            trading_hours: TradingHours::default(),
            recurring_holidays: HashSet::new(),
            holidays: HashSet::new(),
        }
    }

    pub fn with_trading_hours(mut self, trading_hours: TradingHours) -> Self {
        self.trading_hours = trading_hours;
        self
    }

    /// Adds fixed-date holidays that recur every year and one-off closures.
    pub fn with_holidays(
        mut self,
        recurring: impl IntoIterator<Item = MonthDay>,
        dates: impl IntoIterator<Item = NaiveDate>,
    ) -> Self {
        self.recurring_holidays.extend(recurring);
        self.holidays.extend(dates);
        self
    }

    pub fn trading_hours(&self) -> TradingHours {
        self.trading_hours
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date) || self.recurring_holidays.contains(&MonthDay::of(date))
    }

    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.is_holiday(date)
    }

    pub fn is_market_open(&self, date: NaiveDate, time: TimeOfDay) -> bool {
        self.is_trading_day(date) && self.trading_hours.contains(time)
    }

    /// First trading day strictly after `after`.
    pub fn next_trading_day(&self, after: NaiveDate) -> NaiveDate {
        (1..=MAX_LOOKAHEAD_DAYS)
            .filter_map(|offset| after.checked_add_days(Days::new(offset)))
            .find(|date| self.is_trading_day(*date))
            .or_else(|| after.succ_opt())
            .unwrap_or(after)
    }

    /// Last trading day strictly before `before`.
    pub fn previous_trading_day(&self, before: NaiveDate) -> NaiveDate {
        (1..=MAX_LOOKAHEAD_DAYS)
            .filter_map(|offset| before.checked_sub_days(Days::new(offset)))
            .find(|date| self.is_trading_day(*date))
            .or_else(|| before.pred_opt())
            .unwrap_or(before)
    }

    /// Date a forecast requested on `today` should target: today on trading days, otherwise the
    /// next trading day.
    pub fn forecast_date(&self, today: NaiveDate) -> NaiveDate {
        if self.is_trading_day(today) {
            today
        } else {
            self.next_trading_day(today)
        }
    }
}

impl Default for TradingCalendar {
    fn default() -> Self {
        CalendarConfig::default().calendar()
    }
}

/// Month and day of a holiday that falls on the same date every year.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct MonthDay {
    month: u32,
    day: u32,
}

impl MonthDay {
    pub fn new(month: u32, day: u32) -> Result<Self> {
        if NaiveDate::from_ymd_opt(2024, month, day).is_none() {
            bail!("invalid month-day {month:02}-{day:02}");
        }

        Ok(Self { month, day })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            day: date.day(),
        }
    }
}

impl FromStr for MonthDay {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        let (month, day) = raw
            .trim()
            .split_once('-')
            .ok_or_else(|| anyhow!("expected MM-DD, got {raw:?}"))?;

        Self::new(month.parse()?, day.parse()?)
    }
}

impl TryFrom<String> for MonthDay {
    type Error = anyhow::Error;

    fn try_from(raw: String) -> Result<Self> {
        raw.parse()
    }
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub trading_hours: TradingHours,

    /// Fixed-date public holidays, `MM-DD`.
    pub recurring_holidays: Vec<MonthDay>,

    /// One-off closures such as Eid, `YYYY-MM-DD`.
    pub holidays: Vec<NaiveDate>,

    /// Base prices used when no live or last-known quote exists, keyed by symbol.
    pub fallback_prices: HashMap<String, f64>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        let recurring_holidays = [(2, 5), (3, 23), (5, 1), (8, 14), (11, 9), (12, 25)]
            .into_iter()
            .map(|(month, day)| MonthDay { month, day })
            .collect();

        Self {
            trading_hours: TradingHours::default(),
            recurring_holidays,
            holidays: Vec::new(),
            fallback_prices: HashMap::from([(String::from(Symbol::kse_100()), 132_920.0)]),
        }
    }
}

static CONFIG: OnceCell<CalendarConfig> = OnceCell::new();

impl CalendarConfig {
    const FILE_NAME: &'static str = "psx_calendar.yml";
    const FILE_ENV: &'static str = "PSX_CALENDAR_FILE";

    /// Loads the calendar once per process. A missing file falls back to the built-in defaults.
    pub fn load() -> Result<&'static CalendarConfig> {
        CONFIG.get_or_try_init(|| {
            let path = env::var(Self::FILE_ENV).unwrap_or_else(|_| Self::FILE_NAME.to_string());
            Self::from_path(Path::new(&path))
        })
    }

    pub fn from_path(path: &Path) -> Result<CalendarConfig> {
        if !path.exists() {
            info!(path = %path.display(), "no market calendar file; using built-in defaults");

            return Ok(CalendarConfig::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read market calendar {}", path.display()))?;

        Self::from_yaml(&raw)
            .with_context(|| format!("failed to load market calendar {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> Result<CalendarConfig> {
        let config: CalendarConfig =
            serde_yaml::from_str(raw).context("failed to parse market calendar")?;

        config
            .validate()
            .context("market calendar config validation failed")?;

        Ok(config)
    }

    pub fn calendar(&self) -> TradingCalendar {
        TradingCalendar::weekdays()
            .with_trading_hours(self.trading_hours)
            .with_holidays(
                self.recurring_holidays.iter().copied(),
                self.holidays.iter().copied(),
            )
    }

    pub fn fallback_price(&self, symbol: &Symbol) -> Option<Price> {
        self.fallback_prices
            .get(symbol.as_str())
            .and_then(|value| Price::try_from(*value).ok())
    }

    fn validate(&self) -> Result<()> {
        if self.trading_hours.open >= self.trading_hours.close {
            bail!(
                "trading_hours.open ({}) must be before trading_hours.close ({})",
                self.trading_hours.open,
                self.trading_hours.close
            );
        }
        for (symbol, price) in &self.fallback_prices {
            Symbol::new(symbol).with_context(|| format!("invalid fallback symbol {symbol:?}"))?;
            Price::try_from(*price)
                .with_context(|| format!("invalid fallback price for {symbol}"))?;
        }
        Ok(())
    }
}
