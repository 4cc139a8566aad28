use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow, bail};
use chrono::Timelike;
use serde::{Deserialize, Serialize};

pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Wall-clock minute of the trading day, `00:00` to `23:59`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay::hm(0, 0);

    /// Compile-time constructor for table entries. Out-of-range values fail const evaluation.
    pub const fn hm(hour: u8, minute: u8) -> Self {
        assert!(hour < 24, "hour out of range");
        assert!(minute < 60, "minute out of range");

        Self { hour, minute }
    }

    pub fn new(hour: u32, minute: u32) -> Result<Self> {
        if hour >= 24 || minute >= 60 {
            bail!("invalid time of day {hour:02}:{minute:02}");
        }

        Ok(Self {
            hour: hour as u8,
            minute: minute as u8,
        })
    }

    pub fn of<T: Timelike>(time: &T) -> Self {
        Self {
            hour: time.hour() as u8,
            minute: time.minute() as u8,
        }
    }

    pub fn from_minute_of_day(minutes: u16) -> Option<Self> {
        (minutes < MINUTES_PER_DAY).then(|| Self {
            hour: (minutes / 60) as u8,
            minute: (minutes % 60) as u8,
        })
    }

    pub fn minute_of_day(self) -> u16 {
        self.hour as u16 * 60 + self.minute as u16
    }

    pub fn plus_minutes(self, minutes: u16) -> Option<Self> {
        Self::from_minute_of_day(self.minute_of_day().checked_add(minutes)?)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        let (hour, minute) = raw
            .trim()
            .split_once(':')
            .ok_or_else(|| anyhow!("expected HH:MM, got {raw:?}"))?;

        Self::new(hour.parse()?, minute.parse()?)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = anyhow::Error;

    fn try_from(raw: String) -> Result<Self> {
        raw.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(time: TimeOfDay) -> Self {
        time.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_minute_of_day() {
        assert!(TimeOfDay::hm(9, 45) < TimeOfDay::hm(10, 0));
        assert_eq!(TimeOfDay::hm(15, 30).minute_of_day(), 930);
        assert_eq!(TimeOfDay::from_minute_of_day(930), Some(TimeOfDay::hm(15, 30)));
        assert_eq!(TimeOfDay::from_minute_of_day(MINUTES_PER_DAY), None);
    }

    #[test]
    fn parses_and_displays_hh_mm() {
        let time: TimeOfDay = "9:05".parse().unwrap();

        assert_eq!(time, TimeOfDay::hm(9, 5));
        assert_eq!(time.to_string(), "09:05");
        assert!("24:00".parse::<TimeOfDay>().is_err());
        assert!("0930".parse::<TimeOfDay>().is_err());
    }

    #[test]
    fn stepping_past_midnight_is_none() {
        assert_eq!(TimeOfDay::hm(23, 55).plus_minutes(5), None);
        assert_eq!(TimeOfDay::hm(9, 30).plus_minutes(5), Some(TimeOfDay::hm(9, 35)));
    }
}
