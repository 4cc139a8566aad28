use std::marker::PhantomData;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use tracing::debug;

use crate::forecast::bias::OpenBias;
use crate::forecast::kind::ForecastKind;
use crate::forecast::rng::{SeriesRng, Sha256Rng};
use crate::forecast::series::{ForecastPoint, ForecastSeries};
use crate::types::price::{Price, round_to_cents};
use crate::types::symbol::Symbol;

/// Bias influence at the last point relative to the first.
const BIAS_END_STRENGTH: f64 = 0.5;

/// Bounded random walk seeded from `(date, symbol, kind)`, so every call with the same inputs
/// yields the same series for the whole day.
#[derive(Debug, Clone, Copy)]
pub struct SeriesGenerator<R: SeriesRng = Sha256Rng> {
    rng: PhantomData<fn() -> R>,
}

impl Default for SeriesGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: SeriesRng> SeriesGenerator<R> {
    pub fn new() -> Self {
        Self { rng: PhantomData }
    }

    pub fn seed(kind: ForecastKind, symbol: &Symbol, as_of_date: NaiveDate) -> String {
        format!("{as_of_date}_{symbol}_{kind}")
    }

    pub fn generate(
        &self,
        kind: ForecastKind,
        symbol: &Symbol,
        base_price: f64,
        as_of_date: NaiveDate,
    ) -> Result<ForecastSeries> {
        self.generate_with_bias(kind, symbol, base_price, as_of_date, None)
    }

    /// `bias` only affects kinds where [`ForecastKind::is_biased`] holds; those fall back to a
    /// neutral bias when none is given.
    pub fn generate_with_bias(
        &self,
        kind: ForecastKind,
        symbol: &Symbol,
        base_price: f64,
        as_of_date: NaiveDate,
        bias: Option<&OpenBias>,
    ) -> Result<ForecastSeries> {
        let base = Price::try_from(base_price)
            .with_context(|| format!("invalid base price for {kind} forecast of {symbol}"))?;

        let profile = kind.profile();
        let times = profile.times();
        if times.is_empty() {
            bail!("{kind} window {}-{} has no points", profile.start, profile.end);
        }

        let bias_score = match (kind.is_biased(), bias) {
            (true, Some(bias)) => bias.score,
            _ => 0.0,
        };
        let steps = times.len().saturating_sub(1).max(1) as f64;
        let seed = Self::seed(kind, symbol, as_of_date);
        let mut rng = R::seeded(&seed);

        let mut points = Vec::with_capacity(times.len());
        let mut previous: Option<f64> = None;

        for (index, time) in times.into_iter().enumerate() {
            let price = match previous {
                None => {
                    let (low, high) = profile.opening_jitter;
                    base * (1.0 + bias_score) * rng.uniform(low, high)
                }
                Some(previous) => {
                    let volatility = profile.volatility_at(time);
                    let decay = 1.0 - (1.0 - BIAS_END_STRENGTH) * (index as f64 / steps);
                    let drift = bias_score / steps * decay;

                    previous * (1.0 + rng.uniform(-volatility, volatility) + drift)
                }
            };

            if !price.is_finite() || price <= 0.0 {
                bail!("{kind} walk for {symbol} left the positive range at {time}");
            }

            let (low, high) = profile.confidence;
            let confidence = rng.uniform(low, high);

            points.push(ForecastPoint {
                time,
                predicted_price: round_to_cents(price),
                confidence: round_to_cents(confidence),
                session_label: profile.label,
            });
            previous = Some(price);
        }

        debug!(%seed, points = points.len(), "generated forecast series");

        Ok(ForecastSeries {
            symbol: symbol.clone(),
            date: as_of_date,
            kind,
            points,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::clock::time_of_day::TimeOfDay;

    use super::*;

    const BASE: f64 = 132_920.0;

    fn june_3() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    /// Always returns the middle of the range.
    struct MidpointRng;

    impl SeriesRng for MidpointRng {
        fn seeded(_seed: &str) -> Self {
            MidpointRng
        }

        fn uniform(&mut self, low: f64, high: f64) -> f64 {
            (low + high) / 2.0
        }
    }

    #[test]
    fn full_day_example_has_73_points_near_the_base() {
        let series = SeriesGenerator::<Sha256Rng>::new()
            .generate(ForecastKind::FullDay, &Symbol::kse_100(), BASE, june_3())
            .unwrap();

        assert_eq!(series.len(), 73);
        assert_eq!(series.points[0].time, TimeOfDay::hm(9, 30));
        assert_eq!(series.points[72].time, TimeOfDay::hm(15, 30));

        let first = series.first_price().unwrap();
        assert!((first - BASE).abs() <= BASE * 0.005 + 0.01, "first price {first}");
    }

    #[test]
    fn same_inputs_reproduce_bit_identical_series() {
        let generator = SeriesGenerator::<Sha256Rng>::new();
        let first = generator
            .generate(ForecastKind::FullDay, &Symbol::kse_100(), BASE, june_3())
            .unwrap();
        let second = SeriesGenerator::<Sha256Rng>::new()
            .generate(ForecastKind::FullDay, &Symbol::kse_100(), BASE, june_3())
            .unwrap();

        assert_eq!(first, second);
        for (a, b) in first.points.iter().zip(&second.points) {
            assert_eq!(a.time, b.time);
            assert_eq!(a.predicted_price.to_bits(), b.predicted_price.to_bits());
            assert_eq!(a.confidence.to_bits(), b.confidence.to_bits());
        }
    }

    #[test]
    fn seed_changes_with_date_symbol_and_kind() {
        let generator = SeriesGenerator::<Sha256Rng>::new();
        let kse = Symbol::kse_100();
        let monday = generator
            .generate(ForecastKind::FullDay, &kse, BASE, june_3())
            .unwrap();
        let tuesday = generator
            .generate(ForecastKind::FullDay, &kse, BASE, june_3().succ_opt().unwrap())
            .unwrap();
        let ogdc = generator
            .generate(ForecastKind::FullDay, &Symbol::new("OGDC").unwrap(), BASE, june_3())
            .unwrap();

        assert_ne!(monday.prices(), tuesday.prices());
        assert_ne!(monday.prices(), ogdc.prices());
        assert_eq!(
            SeriesGenerator::<Sha256Rng>::seed(ForecastKind::FullDay, &kse, june_3()),
            "2024-06-03_KSE-100_full_day"
        );
    }

    #[test]
    fn prices_and_confidences_stay_in_their_envelopes() {
        let generator = SeriesGenerator::<Sha256Rng>::new();

        for kind in ForecastKind::ALL {
            let series = generator
                .generate(kind, &Symbol::kse_100(), BASE, june_3())
                .unwrap();
            let (low, high) = kind.profile().confidence;

            assert_eq!(series.len(), kind.profile().times().len());
            for pair in series.points.windows(2) {
                let step = pair[1].predicted_price / pair[0].predicted_price - 1.0;
                assert!(step.abs() < 0.01 + 1e-6, "{kind} step {step}");
            }
            for point in &series.points {
                assert!(point.confidence >= low - 0.005 && point.confidence <= high + 0.005);
                assert!((0.0..=1.0).contains(&point.confidence));
            }
        }
    }

    #[test]
    fn rejects_invalid_base_prices() {
        let generator = SeriesGenerator::<Sha256Rng>::new();

        for base in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            assert!(
                generator
                    .generate(ForecastKind::Morning, &Symbol::kse_100(), base, june_3())
                    .is_err()
            );
        }
    }

    #[test]
    fn rng_is_swappable_behind_the_trait() {
        let series = SeriesGenerator::<MidpointRng>::new()
            .generate(ForecastKind::Afternoon, &Symbol::kse_100(), 100.0, june_3())
            .unwrap();

        assert!(series.points.iter().all(|point| point.predicted_price == 100.0));
        assert!(series.points.iter().all(|point| point.confidence == 0.8));
    }

    #[test]
    fn bias_shifts_the_open_and_decays_to_half_strength() {
        let generator = SeriesGenerator::<MidpointRng>::new();
        let bias = OpenBias::from_trends(0.05, 0.05);
        let series = generator
            .generate_with_bias(
                ForecastKind::NextDay,
                &Symbol::kse_100(),
                100_000.0,
                june_3(),
                Some(&bias),
            )
            .unwrap();

        assert_eq!(series.first_price(), Some(105_000.0));

        let prices = series.prices();
        let early_step = prices[1] / prices[0] - 1.0;
        let late_step = prices[72] / prices[71] - 1.0;
        assert!(early_step > 0.0 && late_step > 0.0);
        assert!(late_step < early_step);
        assert!((late_step / early_step - 0.5).abs() < 0.05);
    }

    #[test]
    fn unbiased_kinds_ignore_bias() {
        let generator = SeriesGenerator::<Sha256Rng>::new();
        let bias = OpenBias::from_trends(0.05, 0.05);
        let plain = generator
            .generate(ForecastKind::FullDay, &Symbol::kse_100(), BASE, june_3())
            .unwrap();
        let nudged = generator
            .generate_with_bias(ForecastKind::FullDay, &Symbol::kse_100(), BASE, june_3(), Some(&bias))
            .unwrap();

        assert_eq!(plain, nudged);
    }

    #[test]
    fn runaway_bias_is_an_error() {
        let bias = OpenBias::from_trends(-5.0, -5.0);

        assert!(
            SeriesGenerator::<Sha256Rng>::new()
                .generate_with_bias(
                    ForecastKind::NextDay,
                    &Symbol::kse_100(),
                    BASE,
                    june_3(),
                    Some(&bias)
                )
                .is_err()
        );
    }
}
