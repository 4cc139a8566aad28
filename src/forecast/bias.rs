use std::fmt;

use serde::Serialize;

use crate::forecast::series::ForecastSeries;
use crate::market::history::HistoricalBar;
use crate::types::price::round_to_cents;

pub const YESTERDAY_WEIGHT: f64 = 0.4;
pub const TODAY_WEIGHT: f64 = 0.6;
pub const DIRECTION_THRESHOLD: f64 = 0.002;

/// `(last - first) / first`; 0 when there are fewer than two points or the first is not positive.
pub fn change_ratio(prices: &[f64]) -> f64 {
    match (prices.first(), prices.last()) {
        (Some(first), Some(last)) if prices.len() >= 2 && *first > 0.0 => (last - first) / first,
        _ => 0.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BiasDirection {
    Up,
    Down,
    Neutral,
}

impl fmt::Display for BiasDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => f.write_str("UP"),
            Self::Down => f.write_str("DOWN"),
            Self::Neutral => f.write_str("NEUTRAL"),
        }
    }
}

/// Expected opening direction for the next session, blended from recent moves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OpenBias {
    pub score: f64,
    pub direction: BiasDirection,
    pub confidence: f64,
}

impl OpenBias {
    pub fn from_trends(yesterday_change: f64, today_change: f64) -> Self {
        let score = YESTERDAY_WEIGHT * yesterday_change + TODAY_WEIGHT * today_change;

        let direction = if score > DIRECTION_THRESHOLD {
            BiasDirection::Up
        } else if score < -DIRECTION_THRESHOLD {
            BiasDirection::Down
        } else {
            BiasDirection::Neutral
        };

        let confidence = match direction {
            BiasDirection::Neutral => 0.5,
            BiasDirection::Up | BiasDirection::Down => (0.5 + score.abs() * 50.0).min(0.9),
        };

        Self {
            score,
            direction,
            confidence: round_to_cents(confidence),
        }
    }

    /// Yesterday's final trading hour against the full session generated for today. Missing
    /// history contributes no trend.
    pub fn compute(yesterday_last_hour: &[HistoricalBar], today_full_session: &ForecastSeries) -> Self {
        let closes: Vec<f64> = yesterday_last_hour.iter().map(|bar| bar.close).collect();

        Self::from_trends(change_ratio(&closes), today_full_session.change_ratio())
    }
}
