use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::forecast_cache::DailyCacheKey;
use crate::clock::clock::{PktDateTime, TIMEZONE_LABEL};
use crate::clock::time_of_day::TimeOfDay;
use crate::forecast::bias::OpenBias;
use crate::forecast::generator::SeriesGenerator;
use crate::forecast::kind::ForecastKind;
use crate::forecast::rng::{SeriesRng, Sha256Rng};
use crate::forecast::series::ForecastSeries;
use crate::market::history::HistoricalBar;
use crate::scheduler::action::{ActionOutcome, ActionReport};
use crate::scheduler::state::{ActionFlags, SchedulerState};
use crate::scheduler::status::SessionStatus;
use crate::scheduling::day_plan::DayPlan;
use crate::scheduling::session_classifier::SessionClassifier;
use crate::scheduling::types::{ActionKind, ScheduleEntry};
use crate::types::market_calendar::TradingCalendar;
use crate::types::symbol::Symbol;

#[derive(Debug, Clone, Serialize)]
pub struct BiasedForecast {
    pub bias: OpenBias,
    pub series: ForecastSeries,
}

/// Fires the day plan's actions against a caller-owned [`SchedulerState`]. Time always comes in
/// as an argument; nothing here reads the system clock.
#[derive(Debug, Clone)]
pub struct ScheduledActionExecutor<R: SeriesRng = Sha256Rng> {
    classifier: SessionClassifier,
    generator: SeriesGenerator<R>,
    symbol: Symbol,
}

impl ScheduledActionExecutor {
    /// PSX day plan over `calendar`, seeded with SHA-256.
    pub fn psx(calendar: TradingCalendar, symbol: Symbol) -> Result<Self> {
        let plan = DayPlan::psx().context("invalid PSX day plan")?;

        Ok(Self::new(SessionClassifier::new(plan, calendar), symbol))
    }
}

impl<R: SeriesRng> ScheduledActionExecutor<R> {
    /// Scheduled generate actions produce series for `symbol`.
    pub fn new(classifier: SessionClassifier, symbol: Symbol) -> Self {
        Self {
            classifier,
            generator: SeriesGenerator::new(),
            symbol,
        }
    }

    pub fn classifier(&self) -> &SessionClassifier {
        &self.classifier
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Runs the action scheduled for `now`'s minute, at most once per day. Safe to call on every
    /// render; a minute without a trigger is a no-op.
    pub fn tick(
        &self,
        state: &mut SchedulerState,
        now: &PktDateTime,
        base_price: f64,
    ) -> Vec<ActionReport> {
        let Some(entry) = self.classifier.trigger_at(now) else {
            return Vec::new();
        };

        if Self::already_executed(state, entry, now) {
            debug!(action = %entry.action, time = %entry.time, "action already executed this minute");
            return Vec::new();
        }

        let outcome = self.execute(state, entry.action, now, base_price);
        if matches!(outcome, ActionOutcome::Succeeded { .. }) {
            state.last_action_time = Some(*now);
            state.current_session = entry.session;
        }

        vec![Self::report(entry, outcome)]
    }

    /// Executes `action` immediately, outside the trigger table. Does not count as the scheduled
    /// run of that action.
    pub fn run_action(
        &self,
        state: &mut SchedulerState,
        action: ActionKind,
        now: &PktDateTime,
        base_price: f64,
    ) -> ActionReport {
        let outcome = self.execute(state, action, now, base_price);

        match self.classifier.plan().entry_for(action) {
            Some(entry) => Self::report(entry, outcome),
            None => ActionReport {
                action,
                time: TimeOfDay::of(now),
                description: "manual action",
                outcome,
            },
        }
    }

    /// Cached series for `(symbol, forecast date, kind)`, generating and caching it on a miss. On
    /// weekends and holidays the forecast date is the next trading day.
    pub fn get_or_generate(
        &self,
        state: &mut SchedulerState,
        symbol: &Symbol,
        kind: ForecastKind,
        base_price: f64,
        now: &PktDateTime,
    ) -> Result<ForecastSeries> {
        let key = DailyCacheKey::new(symbol.clone(), self.target_date(kind, now), kind);

        if let Some(series) = state.cache.get(&key) {
            return Ok(series.clone());
        }

        let bias = match kind {
            ForecastKind::NextDay => state.next_day_bias.as_ref(),
            _ => None,
        };
        let series = self
            .generator
            .generate_with_bias(kind, symbol, base_price, key.date, bias)?;
        debug!(%symbol, %kind, date = %key.date, "cached new forecast series");
        state.cache.put(key, series.clone());

        Ok(series)
    }

    /// Blends yesterday's final hour with today's full-day series into an open bias, then
    /// generates and caches the biased series for the next trading day.
    pub fn generate_next_day(
        &self,
        state: &mut SchedulerState,
        symbol: &Symbol,
        base_price: f64,
        yesterday_last_hour: &[HistoricalBar],
        now: &PktDateTime,
    ) -> Result<BiasedForecast> {
        let forecast = self.generate_biased(
            state,
            symbol,
            ForecastKind::NextDay,
            ForecastKind::FullDay,
            base_price,
            yesterday_last_hour,
            now,
        )?;
        state.next_day_bias = Some(forecast.bias);

        Ok(forecast)
    }

    /// Same blend against today's opening minutes, for the rest of today's session.
    pub fn generate_remaining_session(
        &self,
        state: &mut SchedulerState,
        symbol: &Symbol,
        base_price: f64,
        yesterday_last_hour: &[HistoricalBar],
        now: &PktDateTime,
    ) -> Result<BiasedForecast> {
        self.generate_biased(
            state,
            symbol,
            ForecastKind::RemainingSession,
            ForecastKind::OpeningMinutes,
            base_price,
            yesterday_last_hour,
            now,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn generate_biased(
        &self,
        state: &mut SchedulerState,
        symbol: &Symbol,
        kind: ForecastKind,
        reference_kind: ForecastKind,
        base_price: f64,
        yesterday_last_hour: &[HistoricalBar],
        now: &PktDateTime,
    ) -> Result<BiasedForecast> {
        let reference = self
            .get_or_generate(state, symbol, reference_kind, base_price, now)
            .with_context(|| format!("failed to build the {reference_kind} series behind the {kind} bias"))?;

        if yesterday_last_hour.len() < 2 {
            info!(%symbol, %kind, "no usable history for yesterday's last hour; trend defaults to zero");
        }
        let bias = OpenBias::compute(yesterday_last_hour, &reference);

        let date = self.target_date(kind, now);
        let series = self
            .generator
            .generate_with_bias(kind, symbol, base_price, date, Some(&bias))?;

        state.cache.put(
            DailyCacheKey::new(symbol.clone(), date, kind),
            series.clone(),
        );

        info!(
            %symbol,
            %kind,
            %date,
            direction = %bias.direction,
            score = bias.score,
            confidence = bias.confidence,
            "biased forecast generated"
        );

        Ok(BiasedForecast { bias, series })
    }

    pub fn session_status(&self, state: &SchedulerState, now: &PktDateTime) -> SessionStatus {
        let today = now.date_naive();
        let calendar = self.classifier.calendar();
        let current_session = self.classifier.classify(now);
        let forecast_date = calendar.forecast_date(today);
        let next_day_date = self.target_date(ForecastKind::NextDay, now);

        let mut cached_series: Vec<ForecastSeries> = state
            .cache
            .series_for_date(forecast_date)
            .into_iter()
            .filter(|series| series.kind != ForecastKind::NextDay)
            .cloned()
            .collect();
        cached_series.extend(
            state
                .cache
                .series_for_date(next_day_date)
                .into_iter()
                .filter(|series| series.kind == ForecastKind::NextDay)
                .cloned(),
        );

        SessionStatus {
            current_time: now.format("%H:%M:%S").to_string(),
            current_session,
            session_display: current_session.title(),
            timezone: TIMEZONE_LABEL,
            trading_day: calendar.is_trading_day(today),
            market_open: calendar.is_market_open(today, TimeOfDay::of(now)),
            forecast_date,
            next_day_date,
            last_triggered_session: state.current_session,
            last_action_time: state.last_action_time,
            last_reset_time: state.last_reset_time,
            next_action: self.classifier.next_trigger(now).cloned(),
            flags: state.flags,
            visible: ForecastKind::ALL
                .into_iter()
                .filter(|kind| state.flags.is_visible(*kind))
                .collect(),
            next_day_bias: state.next_day_bias,
            cached_series,
        }
    }

    /// Trading day a `kind` series requested at `now` belongs to. On closed days every kind,
    /// next day included, targets the next trading day.
    fn target_date(&self, kind: ForecastKind, now: &PktDateTime) -> NaiveDate {
        let calendar = self.classifier.calendar();
        let today = now.date_naive();

        match kind {
            ForecastKind::NextDay if calendar.is_trading_day(today) => {
                calendar.next_trading_day(today)
            }
            _ => calendar.forecast_date(today),
        }
    }

    fn already_executed(state: &SchedulerState, entry: &ScheduleEntry, now: &PktDateTime) -> bool {
        state.last_action_time.is_some_and(|last| {
            last.date_naive() == now.date_naive() && TimeOfDay::of(&last) == entry.time
        })
    }

    fn execute(
        &self,
        state: &mut SchedulerState,
        action: ActionKind,
        now: &PktDateTime,
        base_price: f64,
    ) -> ActionOutcome {
        match self.apply(state, action, now, base_price) {
            Ok((detail, points)) => {
                info!(%action, time = %TimeOfDay::of(now), %detail, "scheduled action executed");
                ActionOutcome::Succeeded { detail, points }
            }
            Err(error) => {
                warn!(%action, time = %TimeOfDay::of(now), "scheduled action failed: {error:#}");
                ActionOutcome::Failed {
                    error: format!("{error:#}"),
                }
            }
        }
    }

    fn apply(
        &self,
        state: &mut SchedulerState,
        action: ActionKind,
        now: &PktDateTime,
        base_price: f64,
    ) -> Result<(String, Option<usize>)> {
        match action {
            ActionKind::ChartsReset => {
                let today = now.date_naive();
                let next_day = self.target_date(ForecastKind::NextDay, now);
                let mut dropped = state.cache.clear_for_date(today);
                if next_day != today {
                    dropped += state.cache.clear_for_date(next_day);
                }
                state.flags = ActionFlags::after_reset();
                state.next_day_bias = None;
                state.last_reset_time = Some(*now);

                Ok((format!("charts reset, {dropped} cached series dropped"), None))
            }
            ActionKind::MorningGenerate
            | ActionKind::FullDayGenerate
            | ActionKind::AfternoonGenerate => {
                let kind = action
                    .generates()
                    .ok_or_else(|| anyhow!("{action} does not generate a series"))?;
                let date = self.target_date(kind, now);
                let series = self
                    .generator
                    .generate(kind, &self.symbol, base_price, date)?;
                let points = series.len();

                state.cache.put(
                    DailyCacheKey::new(self.symbol.clone(), date, kind),
                    series,
                );
                state.flags.mark_generated(kind);

                Ok((format!("{kind} prediction generated for {date}"), Some(points)))
            }
            ActionKind::NextDayPendingMark => {
                state.flags.next_day_pending = true;

                Ok(("next day prediction pending".to_string(), None))
            }
            ActionKind::SessionsHide => {
                state.flags.sessions_hidden = true;

                Ok(("morning and afternoon sessions hidden".to_string(), None))
            }
        }
    }

    fn report(entry: &ScheduleEntry, outcome: ActionOutcome) -> ActionReport {
        ActionReport {
            action: entry.action,
            time: entry.time,
            description: entry.description,
            outcome,
        }
    }
}
