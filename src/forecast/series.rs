use chrono::NaiveDate;
use serde::Serialize;

use crate::clock::time_of_day::TimeOfDay;
use crate::forecast::bias::change_ratio;
use crate::forecast::kind::ForecastKind;
use crate::types::symbol::Symbol;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub time: TimeOfDay,
    pub predicted_price: f64,
    /// In `[0, 1]`.
    pub confidence: f64,
    pub session_label: &'static str,
}

/// Generated once per (symbol, date, kind) and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSeries {
    pub symbol: Symbol,
    pub date: NaiveDate,
    pub kind: ForecastKind,
    pub points: Vec<ForecastPoint>,
}

impl ForecastSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn first_price(&self) -> Option<f64> {
        self.points.first().map(|point| point.predicted_price)
    }

    pub fn last_price(&self) -> Option<f64> {
        self.points.last().map(|point| point.predicted_price)
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|point| point.predicted_price).collect()
    }

    /// First-to-last fractional move; 0 for fewer than two points.
    pub fn change_ratio(&self) -> f64 {
        change_ratio(&self.prices())
    }

    pub fn high(&self) -> Option<f64> {
        self.points
            .iter()
            .map(|point| point.predicted_price)
            .reduce(f64::max)
    }

    pub fn low(&self) -> Option<f64> {
        self.points
            .iter()
            .map(|point| point.predicted_price)
            .reduce(f64::min)
    }

    pub fn mean_confidence(&self) -> Option<f64> {
        if self.points.is_empty() {
            return None;
        }

        let total: f64 = self.points.iter().map(|point| point.confidence).sum();
        Some(total / self.points.len() as f64)
    }
}
