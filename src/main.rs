mod cache;
mod clock;
mod forecast;
mod market;
mod scenario;
mod scheduler;
mod scheduling;
mod types;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Timelike};
use clap::Parser;
use dotenvy::dotenv;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::cache::forecast_cache::DailyCacheKey;
use crate::clock::clock::{Clock, FixedClock, KarachiClock, PktDateTime, pkt_at};
use crate::clock::time_of_day::TimeOfDay;
use crate::forecast::kind::ForecastKind;
use crate::forecast::series::ForecastSeries;
use crate::market::history::{HistoricalBar, HistoricalDataSource, yesterday_last_hour};
use crate::market::price_book::PriceBook;
use crate::market::price_source::PriceSource;
use crate::scenario::scenario::Scenario;
use crate::scenario::sources::SourceKind;
use crate::scheduler::action::ActionOutcome;
use crate::scheduler::executor::ScheduledActionExecutor;
use crate::scheduling::types::ActionKind;
use crate::scheduler::state::{ActionFlags, SchedulerState};
use crate::types::market_calendar::CalendarConfig;
use crate::types::price::Price;
use crate::types::session::Session;
use crate::types::symbol::Symbol;

const AT_FORMAT: &str = "%Y-%m-%d %H:%M";
const QUOTE_MAX_AGE_MINUTES: i64 = 5;

#[derive(Debug, Clone, Parser)]
struct Args {
    #[arg(long, default_value = Symbol::KSE_100)]
    pub symbol: String,

    #[arg(long, value_enum, default_value = "synthetic")]
    pub source: SourceKind,

    /// Price the synthetic and fixed sources quote around.
    #[arg(long, default_value_t = 132_920.0)]
    pub reference_price: f64,

    #[arg(long, default_value_t = 15)]
    pub poll_secs: u64,

    /// Pin the clock to a Karachi wall time, "YYYY-MM-DD HH:MM".
    #[arg(long)]
    pub at: Option<String>,

    /// Run one action now, outside its trigger minute, before polling starts.
    #[arg(long, value_enum)]
    pub action: Option<ActionKind>,

    /// Run a single pass and print the session status as JSON.
    #[arg(long)]
    pub once: bool,
}

/// Everything one polling pass needs. Stands in for the dashboard's render cycle.
struct Runner {
    executor: ScheduledActionExecutor,
    state: SchedulerState,
    price_book: PriceBook,
    price_source: Box<dyn PriceSource>,
    history: Box<dyn HistoricalDataSource>,
    fallback: Price,
    clock: Arc<dyn Clock>,
}

impl Runner {
    async fn base_price(&mut self, symbol: &Symbol, now: &PktDateTime) -> f64 {
        let resolved = self
            .price_book
            .refresh(self.price_source.as_ref(), symbol, self.fallback, now)
            .await;
        debug!(%symbol, price = %resolved.price, origin = ?resolved.origin, "base price resolved");

        let max_age = chrono::Duration::minutes(QUOTE_MAX_AGE_MINUTES);
        if self.price_book.is_stale(symbol, max_age, now) {
            warn!(%symbol, max_age_minutes = QUOTE_MAX_AGE_MINUTES, "no fresh live quote");
        }

        resolved.price.as_f64()
    }

    async fn run_action(&mut self, action: ActionKind) {
        let now = self.clock.now();
        let symbol = self.executor.symbol().clone();
        let base_price = self.base_price(&symbol, &now).await;

        let report = self
            .executor
            .run_action(&mut self.state, action, &now, base_price);
        if report.succeeded() {
            info!(action = %report.action, scheduled = %report.time, "manual action done");
        } else {
            warn!(?report, "manual action failed");
        }
    }

    async fn poll(&mut self) {
        let now = self.clock.now();
        let symbol = self.executor.symbol().clone();
        let base_price = self.base_price(&symbol, &now).await;

        for report in self.executor.tick(&mut self.state, &now, base_price) {
            match &report.outcome {
                ActionOutcome::Succeeded { .. } => debug!(?report),
                ActionOutcome::Failed { error } => {
                    warn!(action = %report.action, time = %report.time, %error, "action will be retried");
                }
            }
        }
        debug!(
            session = %self.state.current_session(),
            last_action = ?self.state.last_action_time(),
            last_reset = ?self.state.last_reset_time(),
            cached = self.state.cache().len(),
            "scheduler state"
        );

        let session = self.executor.classifier().classify(&now);
        for kind in charted_kinds(session, self.state.flags()) {
            if let Err(error) =
                self.executor
                    .get_or_generate(&mut self.state, &symbol, kind, base_price, &now)
            {
                warn!(%kind, "chart series unavailable: {error:#}");
            }
        }

        if self.needs_remaining_session(&symbol, &now) {
            let last_hour = self.last_hour(&symbol, &now).await;
            match self.executor.generate_remaining_session(
                &mut self.state,
                &symbol,
                base_price,
                &last_hour,
                &now,
            ) {
                Ok(forecast) => {
                    log_summary(&forecast.series);
                    debug!(direction = %forecast.bias.direction, "remaining session ready");
                }
                Err(error) => warn!("remaining session forecast failed: {error:#}"),
            }
        }

        if self.state.flags().next_day_pending && self.state.next_day_bias().is_none() {
            let last_hour = self.last_hour(&symbol, &now).await;
            match self.executor.generate_next_day(
                &mut self.state,
                &symbol,
                base_price,
                &last_hour,
                &now,
            ) {
                Ok(forecast) => {
                    log_summary(&forecast.series);
                    info!(
                        date = %forecast.series.date,
                        direction = %forecast.bias.direction,
                        "next day forecast ready"
                    );
                }
                Err(error) => warn!("next day forecast failed: {error:#}"),
            }
        }
    }

    fn needs_remaining_session(&self, symbol: &Symbol, now: &PktDateTime) -> bool {
        let today = now.date_naive();
        let calendar = self.executor.classifier().calendar();
        let start = ForecastKind::RemainingSession.profile().start;
        let time = TimeOfDay::of(now);

        calendar.is_market_open(today, time)
            && time >= start
            && self
                .state
                .cache()
                .get(&DailyCacheKey::new(symbol.clone(), today, ForecastKind::RemainingSession))
                .is_none()
    }

    async fn last_hour(&self, symbol: &Symbol, now: &PktDateTime) -> Vec<HistoricalBar> {
        match self.history.fetch(symbol).await {
            Ok(bars) => yesterday_last_hour(&bars, now.date_naive()),
            Err(error) => {
                warn!(%symbol, source = self.history.name(), "history unavailable: {error:#}");
                Vec::new()
            }
        }
    }
}

fn log_summary(series: &ForecastSeries) {
    debug!(
        kind = %series.kind,
        points = series.len(),
        open = ?series.first_price(),
        close = ?series.last_price(),
        high = ?series.high(),
        low = ?series.low(),
        confidence = ?series.mean_confidence(),
        "forecast summary"
    );
}

/// Series the dashboard would draw right now. On closed days that is the next session's full day.
fn charted_kinds(session: Session, flags: ActionFlags) -> Vec<ForecastKind> {
    if session == Session::PostMarket {
        return vec![ForecastKind::FullDay];
    }

    [ForecastKind::Morning, ForecastKind::FullDay, ForecastKind::Afternoon]
        .into_iter()
        .filter(|kind| flags.is_visible(*kind))
        .collect()
}

fn parse_at(raw: &str) -> Result<PktDateTime> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), AT_FORMAT)
        .with_context(|| format!("--at must look like \"2024-06-03 09:45\", got {raw:?}"))?;

    pkt_at(naive.date(), naive.hour(), naive.minute())
        .with_context(|| format!("--at {raw:?} is not a valid wall time"))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("psx_sessions=debug".parse()?)
                .add_directive("psx_sessions::market=info".parse()?),
        )
        .with_target(false)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();
    let symbol = Symbol::new(&args.symbol)?;
    let config = CalendarConfig::load()?;
    let calendar = config.calendar();

    let clock: Arc<dyn Clock> = match &args.at {
        Some(raw) => Arc::new(FixedClock::new(parse_at(raw)?)),
        None => Arc::new(KarachiClock),
    };
    let reference =
        Price::try_from(args.reference_price).context("invalid --reference-price")?;
    let fallback = config.fallback_price(&symbol).unwrap_or(reference);

    let mut runner = Runner {
        executor: ScheduledActionExecutor::psx(calendar.clone(), symbol.clone())?,
        state: SchedulerState::new(),
        price_book: PriceBook::new(),
        price_source: Scenario::price_source(args.source, clock.clone(), reference),
        history: Scenario::history(clock.clone(), calendar, reference),
        fallback,
        clock: clock.clone(),
    };

    info!(%symbol, source = %args.source, %fallback, now = %clock.now(), "session scheduler started");

    if let Some(action) = args.action {
        runner.run_action(action).await;
    }

    if args.once {
        runner.poll().await;
        let status = runner.executor.session_status(&runner.state, &clock.now());
        println!("{}", serde_json::to_string_pretty(&status)?);

        return Ok(());
    }

    let mut interval = tokio::time::interval(Duration::from_secs(args.poll_secs.max(1)));

    loop {
        tokio::select! {
            _ = interval.tick() => runner.poll().await,

            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pinned_wall_time_in_karachi() {
        let at = parse_at("2024-06-03 09:45").unwrap();

        assert_eq!(at.to_rfc3339(), "2024-06-03T09:45:00+05:00");
        assert!(parse_at("09:45").is_err());
    }

    #[test]
    fn manual_action_names_match_the_trigger_table() {
        let args =
            Args::try_parse_from(["psx_sessions", "--action", "sessions_hide", "--once"]).unwrap();

        assert_eq!(args.action, Some(ActionKind::SessionsHide));
        assert!(args.once);
        assert!(Args::try_parse_from(["psx_sessions", "--action", "hide"]).is_err());
        assert_eq!(Args::try_parse_from(["psx_sessions"]).unwrap().action, None);
    }

    #[test]
    fn closed_days_chart_the_next_full_day() {
        assert_eq!(
            charted_kinds(Session::PostMarket, ActionFlags::default()),
            vec![ForecastKind::FullDay]
        );
    }

    #[test]
    fn charts_follow_visibility_flags() {
        let mut flags = ActionFlags::after_reset();
        assert!(charted_kinds(Session::PreMarket, flags).is_empty());

        flags.mark_generated(ForecastKind::Morning);
        flags.mark_generated(ForecastKind::Afternoon);
        assert_eq!(
            charted_kinds(Session::AfternoonSession, flags),
            vec![ForecastKind::Morning, ForecastKind::Afternoon]
        );

        flags.sessions_hidden = true;
        assert!(charted_kinds(Session::SessionsHidden, flags).is_empty());
    }
}
