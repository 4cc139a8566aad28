use std::fmt;

use serde::Serialize;

/// Named segment of the trading day that gates which forecast series is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Session {
    PreMarket,
    ChartsReset,
    MorningSession,
    FullDay,
    AfternoonSession,
    TradingHours,
    NextDayPending,
    SessionsHidden,
    /// Weekends and holidays.
    PostMarket,
}

impl Session {
    pub fn name(self) -> &'static str {
        match self {
            Self::PreMarket => "pre_market",
            Self::ChartsReset => "charts_reset",
            Self::MorningSession => "morning_session",
            Self::FullDay => "full_day",
            Self::AfternoonSession => "afternoon_session",
            Self::TradingHours => "trading_hours",
            Self::NextDayPending => "next_day_pending",
            Self::SessionsHidden => "sessions_hidden",
            Self::PostMarket => "post_market",
        }
    }

    /// Human title, e.g. "Morning Session".
    pub fn title(self) -> String {
        self.name()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
