use chrono::NaiveDate;
use serde::Serialize;

use crate::clock::clock::PktDateTime;
use crate::forecast::bias::OpenBias;
use crate::forecast::kind::ForecastKind;
use crate::forecast::series::ForecastSeries;
use crate::scheduler::state::ActionFlags;
use crate::scheduling::types::ScheduleEntry;
use crate::types::session::Session;

/// Read-only snapshot for the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub current_time: String,
    pub current_session: Session,
    pub session_display: String,
    pub timezone: &'static str,
    pub trading_day: bool,
    pub market_open: bool,
    pub forecast_date: NaiveDate,
    pub next_day_date: NaiveDate,
    pub last_triggered_session: Session,
    pub last_action_time: Option<PktDateTime>,
    pub last_reset_time: Option<PktDateTime>,
    pub next_action: Option<ScheduleEntry>,
    pub flags: ActionFlags,
    pub visible: Vec<ForecastKind>,
    pub next_day_bias: Option<OpenBias>,
    pub cached_series: Vec<ForecastSeries>,
}

impl SessionStatus {
    pub fn series(&self, kind: ForecastKind) -> Option<&ForecastSeries> {
        self.cached_series.iter().find(|series| series.kind == kind)
    }
}
