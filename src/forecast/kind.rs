use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow};
use clap::ValueEnum;
use serde::Serialize;

use crate::clock::time_of_day::TimeOfDay;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ForecastKind {
    #[clap(name = "morning")]
    Morning,
    #[clap(name = "full-day")]
    FullDay,
    #[clap(name = "afternoon")]
    Afternoon,
    #[clap(name = "next-day")]
    NextDay,
    #[clap(name = "remaining-session")]
    RemainingSession,
    #[clap(name = "opening-minutes")]
    OpeningMinutes,
}

/// Time window and randomness envelope of one forecast kind.
#[derive(Debug, Clone, Copy)]
pub struct KindProfile {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    pub step_minutes: u16,
    pub opening_jitter: (f64, f64),
    /// `(before, volatility)` buckets checked in order; `late_volatility` applies after the last.
    pub volatility_buckets: &'static [(TimeOfDay, f64)],
    pub late_volatility: f64,
    pub confidence: (f64, f64),
    pub label: &'static str,
}

const MORNING_BUCKETS: &[(TimeOfDay, f64)] = &[(TimeOfDay::hm(10, 30), 0.009)];
const FULL_DAY_BUCKETS: &[(TimeOfDay, f64)] =
    &[(TimeOfDay::hm(11, 0), 0.009), (TimeOfDay::hm(14, 0), 0.005)];
const AFTERNOON_BUCKETS: &[(TimeOfDay, f64)] = &[(TimeOfDay::hm(14, 30), 0.0065)];
const REMAINING_BUCKETS: &[(TimeOfDay, f64)] = &[(TimeOfDay::hm(11, 0), 0.0075)];
const OPENING_BUCKETS: &[(TimeOfDay, f64)] = &[(TimeOfDay::hm(9, 32), 0.0025)];

impl ForecastKind {
    pub const ALL: [ForecastKind; 6] = [
        ForecastKind::Morning,
        ForecastKind::FullDay,
        ForecastKind::Afternoon,
        ForecastKind::NextDay,
        ForecastKind::RemainingSession,
        ForecastKind::OpeningMinutes,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::FullDay => "full_day",
            Self::Afternoon => "afternoon",
            Self::NextDay => "next_day",
            Self::RemainingSession => "remaining_session",
            Self::OpeningMinutes => "opening_minutes",
        }
    }

    /// Kinds whose walk is nudged by an open bias.
    pub fn is_biased(self) -> bool {
        matches!(self, Self::NextDay | Self::RemainingSession)
    }

    pub fn profile(self) -> KindProfile {
        match self {
            Self::Morning => KindProfile {
                start: TimeOfDay::hm(9, 45),
                end: TimeOfDay::hm(12, 0),
                step_minutes: 5,
                opening_jitter: (0.995, 1.005),
                volatility_buckets: MORNING_BUCKETS,
                late_volatility: 0.006,
                confidence: (0.75, 0.95),
                label: "Morning Session (09:45-12:00)",
            },
            Self::FullDay => KindProfile {
                start: TimeOfDay::hm(9, 30),
                end: TimeOfDay::hm(15, 30),
                step_minutes: 5,
                opening_jitter: (0.995, 1.005),
                volatility_buckets: FULL_DAY_BUCKETS,
                late_volatility: 0.0075,
                confidence: (0.65, 0.95),
                label: "Full Day (09:30-15:30)",
            },
            Self::Afternoon => KindProfile {
                start: TimeOfDay::hm(12, 0),
                end: TimeOfDay::hm(15, 30),
                step_minutes: 5,
                opening_jitter: (0.997, 1.003),
                volatility_buckets: AFTERNOON_BUCKETS,
                late_volatility: 0.007,
                confidence: (0.70, 0.90),
                label: "Afternoon Session (12:00-15:30)",
            },
            Self::NextDay => KindProfile {
                start: TimeOfDay::hm(9, 30),
                end: TimeOfDay::hm(15, 30),
                step_minutes: 5,
                opening_jitter: (0.995, 1.005),
                volatility_buckets: FULL_DAY_BUCKETS,
                late_volatility: 0.0075,
                confidence: (0.60, 0.85),
                label: "Next Day (09:30-15:30)",
            },
            Self::RemainingSession => KindProfile {
                start: TimeOfDay::hm(9, 36),
                end: TimeOfDay::hm(15, 30),
                step_minutes: 5,
                opening_jitter: (0.998, 1.002),
                volatility_buckets: REMAINING_BUCKETS,
                late_volatility: 0.005,
                confidence: (0.70, 0.90),
                label: "Remaining Session (09:36-15:30)",
            },
            Self::OpeningMinutes => KindProfile {
                start: TimeOfDay::hm(9, 30),
                end: TimeOfDay::hm(9, 35),
                step_minutes: 1,
                opening_jitter: (0.99, 1.01),
                volatility_buckets: OPENING_BUCKETS,
                late_volatility: 0.002,
                confidence: (0.80, 0.95),
                label: "Opening 5 Min Special (09:30-09:35)",
            },
        }
    }
}

impl KindProfile {
    /// Grid points from `start` through `end`, both inclusive when on the grid.
    pub fn times(&self) -> Vec<TimeOfDay> {
        let step = self.step_minutes.max(1);

        std::iter::successors(Some(self.start), |time| time.plus_minutes(step))
            .take_while(|time| *time <= self.end)
            .collect()
    }

    pub fn volatility_at(&self, time: TimeOfDay) -> f64 {
        self.volatility_buckets
            .iter()
            .find(|(before, _)| time < *before)
            .map(|(_, volatility)| *volatility)
            .unwrap_or(self.late_volatility)
    }
}

impl fmt::Display for ForecastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ForecastKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "morning" | "morning_session" => Ok(Self::Morning),
            "full_day" | "full-day" => Ok(Self::FullDay),
            "afternoon" | "afternoon_session" => Ok(Self::Afternoon),
            "next_day" | "next-day" => Ok(Self::NextDay),
            "remaining_session" | "remaining-session" => Ok(Self::RemainingSession),
            "opening_minutes" | "opening-minutes" => Ok(Self::OpeningMinutes),
            other => Err(anyhow!("unknown forecast kind: {other}")),
        }
    }
}
