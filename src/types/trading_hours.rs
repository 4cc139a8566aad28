use serde::Deserialize;

use crate::clock::time_of_day::TimeOfDay;

/// PSX continuous trading window in Karachi time.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
pub struct TradingHours {
    /// Market open (inclusive)
    pub open: TimeOfDay,

    /// Market close (inclusive)
    pub close: TimeOfDay,
}

impl TradingHours {
    pub fn contains(&self, time: TimeOfDay) -> bool {
        self.open <= time && time <= self.close
    }
}

impl Default for TradingHours {
    fn default() -> Self {
        Self {
            open: TimeOfDay::hm(9, 30),
            close: TimeOfDay::hm(15, 30),
        }
    }
}
