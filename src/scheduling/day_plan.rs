use anyhow::{Result, bail};

use crate::clock::time_of_day::TimeOfDay;
use crate::scheduling::types::{ActionKind, ScheduleEntry};
use crate::types::session::Session;

/// A session that starts at `start` and lasts until the next segment starts. A segment with a
/// trigger fires its action at exactly `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: TimeOfDay,
    pub session: Session,
    pub trigger: Option<(ActionKind, &'static str)>,
}

impl Segment {
    pub const fn new(start: TimeOfDay, session: Session) -> Self {
        Self {
            start,
            session,
            trigger: None,
        }
    }

    pub const fn triggered(
        start: TimeOfDay,
        session: Session,
        action: ActionKind,
        description: &'static str,
    ) -> Self {
        Self {
            start,
            session,
            trigger: Some((action, description)),
        }
    }
}

/// Trigger minutes report the trigger's session for that minute only; 09:01 and 11:01 fall back to
/// the surrounding interval, and the afternoon interval opens at 11:30.
pub const PSX_DAY: [Segment; 11] = [
    Segment::new(TimeOfDay::MIDNIGHT, Session::PreMarket),
    Segment::triggered(
        TimeOfDay::hm(9, 0),
        Session::ChartsReset,
        ActionKind::ChartsReset,
        "Charts reset + activate next day",
    ),
    Segment::new(TimeOfDay::hm(9, 1), Session::PreMarket),
    Segment::triggered(
        TimeOfDay::hm(9, 45),
        Session::MorningSession,
        ActionKind::MorningGenerate,
        "Morning session prediction",
    ),
    Segment::triggered(
        TimeOfDay::hm(10, 30),
        Session::FullDay,
        ActionKind::FullDayGenerate,
        "Full day prediction",
    ),
    Segment::triggered(
        TimeOfDay::hm(11, 0),
        Session::AfternoonSession,
        ActionKind::AfternoonGenerate,
        "Afternoon session prediction",
    ),
    Segment::new(TimeOfDay::hm(11, 1), Session::FullDay),
    Segment::new(TimeOfDay::hm(11, 30), Session::AfternoonSession),
    Segment::new(TimeOfDay::hm(12, 0), Session::TradingHours),
    Segment::triggered(
        TimeOfDay::hm(15, 0),
        Session::NextDayPending,
        ActionKind::NextDayPendingMark,
        "Next day pending",
    ),
    Segment::triggered(
        TimeOfDay::hm(15, 30),
        Session::SessionsHidden,
        ActionKind::SessionsHide,
        "Morning and afternoon sessions hidden",
    ),
];

/// Ordered partition of the day into sessions. Both the trigger table and the interval
/// classification come from the same segments.
#[derive(Debug, Clone)]
pub struct DayPlan {
    segments: Vec<Segment>,
    entries: Vec<ScheduleEntry>,
}

impl DayPlan {
    pub fn new(segments: Vec<Segment>) -> Result<Self> {
        let Some(first) = segments.first() else {
            bail!("day plan must contain at least one segment");
        };
        if first.start != TimeOfDay::MIDNIGHT {
            bail!("day plan must start at 00:00, first segment starts at {}", first.start);
        }
        for pair in segments.windows(2) {
            if pair[0].start >= pair[1].start {
                bail!(
                    "day plan segments must be strictly increasing: {} is followed by {}",
                    pair[0].start,
                    pair[1].start
                );
            }
        }

        let entries = segments
            .iter()
            .filter_map(|segment| {
                segment.trigger.map(|(action, description)| ScheduleEntry {
                    time: segment.start,
                    action,
                    session: segment.session,
                    description,
                })
            })
            .collect();

        Ok(Self { segments, entries })
    }

    pub fn psx() -> Result<Self> {
        Self::new(PSX_DAY.to_vec())
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    pub fn entry_at(&self, time: TimeOfDay) -> Option<&ScheduleEntry> {
        self.entries.iter().find(|entry| entry.time == time)
    }

    pub fn entry_for(&self, action: ActionKind) -> Option<&ScheduleEntry> {
        self.entries.iter().find(|entry| entry.action == action)
    }

    pub fn session_at(&self, time: TimeOfDay) -> Session {
        let index = self
            .segments
            .partition_point(|segment| segment.start <= time);

        // index >= 1 because the first segment starts at midnight.
        self.segments[index.saturating_sub(1)].session
    }
}

#[cfg(test)]
mod tests {
    use crate::clock::time_of_day::MINUTES_PER_DAY;

    use super::*;

    fn at(hour: u8, minute: u8) -> TimeOfDay {
        TimeOfDay::hm(hour, minute)
    }

    #[test]
    fn psx_plan_is_valid() {
        let plan = DayPlan::psx().unwrap();

        assert_eq!(plan.entries().len(), 6);
        assert_eq!(
            plan.entries().iter().map(|e| e.time).collect::<Vec<_>>(),
            vec![at(9, 0), at(9, 45), at(10, 30), at(11, 0), at(15, 0), at(15, 30)]
        );
    }

    #[test]
    fn interval_boundaries_follow_the_segments() {
        let plan = DayPlan::psx().unwrap();

        assert_eq!(plan.session_at(at(0, 0)), Session::PreMarket);
        assert_eq!(plan.session_at(at(8, 59)), Session::PreMarket);
        assert_eq!(plan.session_at(at(9, 0)), Session::ChartsReset);
        assert_eq!(plan.session_at(at(9, 1)), Session::PreMarket);
        assert_eq!(plan.session_at(at(9, 44)), Session::PreMarket);
        assert_eq!(plan.session_at(at(9, 45)), Session::MorningSession);
        assert_eq!(plan.session_at(at(10, 29)), Session::MorningSession);
        assert_eq!(plan.session_at(at(10, 30)), Session::FullDay);
        assert_eq!(plan.session_at(at(10, 59)), Session::FullDay);
        assert_eq!(plan.session_at(at(11, 0)), Session::AfternoonSession);
        assert_eq!(plan.session_at(at(11, 1)), Session::FullDay);
        assert_eq!(plan.session_at(at(11, 29)), Session::FullDay);
        assert_eq!(plan.session_at(at(11, 30)), Session::AfternoonSession);
        assert_eq!(plan.session_at(at(11, 59)), Session::AfternoonSession);
        assert_eq!(plan.session_at(at(12, 0)), Session::TradingHours);
        assert_eq!(plan.session_at(at(14, 59)), Session::TradingHours);
        assert_eq!(plan.session_at(at(15, 0)), Session::NextDayPending);
        assert_eq!(plan.session_at(at(15, 29)), Session::NextDayPending);
        assert_eq!(plan.session_at(at(15, 30)), Session::SessionsHidden);
        assert_eq!(plan.session_at(at(23, 59)), Session::SessionsHidden);
    }

    #[test]
    fn every_trigger_enters_its_own_session() {
        let plan = DayPlan::psx().unwrap();

        for entry in plan.entries() {
            assert_eq!(plan.session_at(entry.time), entry.session, "{}", entry.action);
        }
    }

    #[test]
    fn every_minute_belongs_to_exactly_one_segment() {
        let plan = DayPlan::psx().unwrap();

        for minute in 0..MINUTES_PER_DAY {
            let time = TimeOfDay::from_minute_of_day(minute).unwrap();
            let covering = plan
                .segments
                .iter()
                .enumerate()
                .filter(|(index, segment)| {
                    let end = plan
                        .segments
                        .get(index + 1)
                        .map(|next| next.start.minute_of_day())
                        .unwrap_or(MINUTES_PER_DAY);
                    segment.start.minute_of_day() <= minute && minute < end
                })
                .count();

            assert_eq!(covering, 1, "minute {time}");
        }
    }

    #[test]
    fn rejects_plans_with_gaps_or_overlaps() {
        assert!(DayPlan::new(Vec::new()).is_err());

        let late_start = vec![Segment::new(at(1, 0), Session::PreMarket)];
        assert!(DayPlan::new(late_start).is_err());

        let duplicate = vec![
            Segment::new(TimeOfDay::MIDNIGHT, Session::PreMarket),
            Segment::new(at(9, 45), Session::MorningSession),
            Segment::new(at(9, 45), Session::FullDay),
        ];
        assert!(DayPlan::new(duplicate).is_err());

        let unordered = vec![
            Segment::new(TimeOfDay::MIDNIGHT, Session::PreMarket),
            Segment::new(at(11, 0), Session::AfternoonSession),
            Segment::new(at(10, 30), Session::FullDay),
        ];
        assert!(DayPlan::new(unordered).is_err());
    }

    #[test]
    fn looks_up_entries_by_time_and_action() {
        let plan = DayPlan::psx().unwrap();

        assert_eq!(
            plan.entry_at(at(10, 30)).map(|e| e.action),
            Some(ActionKind::FullDayGenerate)
        );
        assert!(plan.entry_at(at(10, 31)).is_none());
        assert_eq!(
            plan.entry_for(ActionKind::SessionsHide).map(|e| e.time),
            Some(at(15, 30))
        );
    }
}
