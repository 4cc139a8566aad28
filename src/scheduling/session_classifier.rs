use crate::clock::clock::PktDateTime;
use crate::clock::time_of_day::TimeOfDay;
use crate::scheduling::day_plan::DayPlan;
use crate::scheduling::types::ScheduleEntry;
use crate::types::market_calendar::TradingCalendar;
use crate::types::session::Session;

/// Maps Karachi wall-clock time to the active session.
#[derive(Debug, Clone)]
pub struct SessionClassifier {
    plan: DayPlan,
    calendar: TradingCalendar,
}

impl SessionClassifier {
    pub fn new(plan: DayPlan, calendar: TradingCalendar) -> Self {
        Self { plan, calendar }
    }

    pub fn plan(&self) -> &DayPlan {
        &self.plan
    }

    pub fn calendar(&self) -> &TradingCalendar {
        &self.calendar
    }

    pub fn is_trading_day(&self, now: &PktDateTime) -> bool {
        self.calendar.is_trading_day(now.date_naive())
    }

    pub fn classify(&self, now: &PktDateTime) -> Session {
        if !self.is_trading_day(now) {
            return Session::PostMarket;
        }

        self.plan.session_at(TimeOfDay::of(now))
    }

    /// Schedule entry whose trigger minute is `now`, if any. Nothing triggers on closed days.
    pub fn trigger_at(&self, now: &PktDateTime) -> Option<&ScheduleEntry> {
        if !self.is_trading_day(now) {
            return None;
        }

        self.plan.entry_at(TimeOfDay::of(now))
    }

    /// First trigger later today than `now`. None after the last trigger and on closed days.
    pub fn next_trigger(&self, now: &PktDateTime) -> Option<&ScheduleEntry> {
        if !self.is_trading_day(now) {
            return None;
        }

        let time = TimeOfDay::of(now);
        self.plan.entries().iter().find(|entry| entry.time > time)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::clock::clock::pkt_at;
    use crate::clock::time_of_day::MINUTES_PER_DAY;
    use crate::scheduling::types::ActionKind;

    use super::*;

    fn classifier() -> SessionClassifier {
        SessionClassifier::new(DayPlan::psx().unwrap(), TradingCalendar::weekdays())
    }

    fn monday(hour: u32, minute: u32) -> PktDateTime {
        pkt_at(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(), hour, minute).unwrap()
    }

    #[test]
    fn classification_is_total_over_a_trading_day() {
        let classifier = classifier();
        let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();

        for minute in 0..MINUTES_PER_DAY as u32 {
            let now = pkt_at(date, minute / 60, minute % 60).unwrap();
            let session = classifier.classify(&now);

            assert_ne!(session, Session::PostMarket, "minute {minute}");
        }
    }

    #[test]
    fn trigger_minutes_report_the_trigger_session() {
        let classifier = classifier();

        assert_eq!(classifier.classify(&monday(9, 0)), Session::ChartsReset);
        assert_eq!(classifier.classify(&monday(9, 30)), Session::PreMarket);
        assert_eq!(classifier.classify(&monday(9, 45)), Session::MorningSession);
        assert_eq!(classifier.classify(&monday(13, 15)), Session::TradingHours);
        assert_eq!(classifier.classify(&monday(16, 0)), Session::SessionsHidden);

        assert_eq!(
            classifier.trigger_at(&monday(9, 0)).map(|e| e.action),
            Some(ActionKind::ChartsReset)
        );
        assert!(classifier.trigger_at(&monday(9, 1)).is_none());
    }

    #[test]
    fn next_trigger_is_strictly_after_now() {
        let classifier = classifier();
        let next = |hour, minute| classifier.next_trigger(&monday(hour, minute)).map(|e| e.action);

        assert_eq!(next(0, 0), Some(ActionKind::ChartsReset));
        assert_eq!(next(9, 0), Some(ActionKind::MorningGenerate));
        assert_eq!(next(11, 30), Some(ActionKind::NextDayPendingMark));
        assert_eq!(next(15, 30), None);

        let saturday = pkt_at(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), 8, 0).unwrap();
        assert!(classifier.next_trigger(&saturday).is_none());
    }

    #[test]
    fn weekends_are_market_closed_without_triggers() {
        let classifier = classifier();
        let saturday = pkt_at(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), 9, 45).unwrap();
        let sunday = pkt_at(NaiveDate::from_ymd_opt(2024, 6, 2).unwrap(), 15, 0).unwrap();

        assert_eq!(classifier.classify(&saturday), Session::PostMarket);
        assert_eq!(classifier.classify(&sunday), Session::PostMarket);
        assert!(classifier.trigger_at(&saturday).is_none());
        assert!(classifier.trigger_at(&sunday).is_none());
    }
}
