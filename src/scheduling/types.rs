use std::fmt;

use clap::ValueEnum;
use serde::Serialize;

use crate::clock::time_of_day::TimeOfDay;
use crate::forecast::kind::ForecastKind;
use crate::types::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    #[clap(name = "charts_reset")]
    ChartsReset,
    #[clap(name = "morning_session_generate")]
    MorningGenerate,
    #[clap(name = "full_day_generate")]
    FullDayGenerate,
    #[clap(name = "afternoon_session_generate")]
    AfternoonGenerate,
    #[clap(name = "next_day_generate_pending")]
    NextDayPendingMark,
    #[clap(name = "sessions_hide")]
    SessionsHide,
}

impl ActionKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::ChartsReset => "charts_reset",
            Self::MorningGenerate => "morning_session_generate",
            Self::FullDayGenerate => "full_day_generate",
            Self::AfternoonGenerate => "afternoon_session_generate",
            Self::NextDayPendingMark => "next_day_generate_pending",
            Self::SessionsHide => "sessions_hide",
        }
    }

    /// Series produced by the action, if it generates one.
    pub fn generates(self) -> Option<ForecastKind> {
        match self {
            Self::MorningGenerate => Some(ForecastKind::Morning),
            Self::FullDayGenerate => Some(ForecastKind::FullDay),
            Self::AfternoonGenerate => Some(ForecastKind::Afternoon),
            Self::ChartsReset | Self::NextDayPendingMark | Self::SessionsHide => None,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Trigger point derived from the day plan: at `time`, fire `action` and enter `session`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleEntry {
    pub time: TimeOfDay,
    pub action: ActionKind,
    pub session: Session,
    pub description: &'static str,
}
