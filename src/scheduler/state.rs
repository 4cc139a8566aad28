use serde::Serialize;

use crate::cache::forecast_cache::ForecastCache;
use crate::clock::clock::PktDateTime;
use crate::forecast::bias::OpenBias;
use crate::forecast::kind::ForecastKind;
use crate::types::session::Session;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActionFlags {
    pub charts_reset_done: bool,
    pub morning_generated: bool,
    pub full_day_generated: bool,
    pub afternoon_generated: bool,
    pub next_day_pending: bool,
    pub sessions_hidden: bool,
}

impl ActionFlags {
    /// State right after the daily reset.
    pub fn after_reset() -> Self {
        Self {
            charts_reset_done: true,
            ..Self::default()
        }
    }

    pub fn mark_generated(&mut self, kind: ForecastKind) {
        match kind {
            ForecastKind::Morning => self.morning_generated = true,
            ForecastKind::FullDay => self.full_day_generated = true,
            ForecastKind::Afternoon => self.afternoon_generated = true,
            ForecastKind::NextDay | ForecastKind::RemainingSession | ForecastKind::OpeningMinutes => {}
        }
    }

    pub fn should_show_morning(&self) -> bool {
        self.morning_generated && !self.sessions_hidden
    }

    pub fn should_show_full_day(&self) -> bool {
        self.full_day_generated
    }

    pub fn should_show_afternoon(&self) -> bool {
        self.afternoon_generated && !self.sessions_hidden
    }

    pub fn should_show_next_day(&self) -> bool {
        self.sessions_hidden
    }

    pub fn is_visible(&self, kind: ForecastKind) -> bool {
        match kind {
            ForecastKind::Morning => self.should_show_morning(),
            ForecastKind::FullDay => self.should_show_full_day(),
            ForecastKind::Afternoon => self.should_show_afternoon(),
            ForecastKind::NextDay => self.should_show_next_day(),
            ForecastKind::RemainingSession | ForecastKind::OpeningMinutes => true,
        }
    }
}

/// Per-user scheduler state for one trading day. Owned by the caller and passed to the executor;
/// only the executor mutates it.
#[derive(Debug, Clone)]
pub struct SchedulerState {
    pub(super) current_session: Session,
    pub(super) last_action_time: Option<PktDateTime>,
    pub(super) last_reset_time: Option<PktDateTime>,
    pub(super) flags: ActionFlags,
    pub(super) cache: ForecastCache,
    pub(super) next_day_bias: Option<OpenBias>,
}

impl Default for SchedulerState {
    fn default() -> Self {
        Self {
            current_session: Session::PreMarket,
            last_action_time: None,
            last_reset_time: None,
            flags: ActionFlags::default(),
            cache: ForecastCache::new(),
            next_day_bias: None,
        }
    }
}

impl SchedulerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session entered by the most recent trigger.
    pub fn current_session(&self) -> Session {
        self.current_session
    }

    pub fn last_action_time(&self) -> Option<PktDateTime> {
        self.last_action_time
    }

    pub fn last_reset_time(&self) -> Option<PktDateTime> {
        self.last_reset_time
    }

    pub fn flags(&self) -> ActionFlags {
        self.flags
    }

    pub fn cache(&self) -> &ForecastCache {
        &self.cache
    }

    pub fn next_day_bias(&self) -> Option<&OpenBias> {
        self.next_day_bias.as_ref()
    }
}
