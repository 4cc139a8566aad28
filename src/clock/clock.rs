use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Pakistan Standard Time, UTC+05:00 with no daylight saving.
pub const PKT_OFFSET_SECONDS: i32 = 5 * 3600;
pub const TIMEZONE_LABEL: &str = "Asia/Karachi (UTC+5)";

pub type PktDateTime = DateTime<FixedOffset>;

pub fn pkt_offset() -> FixedOffset {
    FixedOffset::east_opt(PKT_OFFSET_SECONDS).expect("UTC+5 is a valid offset")
}

/// Interprets a naive wall-clock reading as Karachi local time.
pub fn pkt_from_naive(naive: NaiveDateTime) -> PktDateTime {
    pkt_offset().from_utc_datetime(&(naive - chrono::Duration::seconds(PKT_OFFSET_SECONDS as i64)))
}

pub fn pkt_at(date: NaiveDate, hour: u32, minute: u32) -> Option<PktDateTime> {
    date.and_hms_opt(hour, minute, 0).map(pkt_from_naive)
}

pub trait Clock: Send + Sync {
    fn now(&self) -> PktDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct KarachiClock;

impl Clock for KarachiClock {
    fn now(&self) -> PktDateTime {
        Utc::now().with_timezone(&pkt_offset())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    instant: PktDateTime,
}

impl FixedClock {
    pub fn new(instant: PktDateTime) -> Self {
        Self { instant }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> PktDateTime {
        self.instant
    }
}
