use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Timelike, Utc};

pub const DEFAULT_RESET_HOUR: u32 = 4;

/// When the activity day rolls over: a local hour in a fixed-offset zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetSchedule {
    hour: u32,
    offset: FixedOffset,
}

impl ResetSchedule {
    pub fn new(hour: u32, offset: FixedOffset) -> Option<Self> {
        (hour < 24).then_some(Self { hour, offset })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn current_day(&self, now: DateTime<Utc>) -> NaiveDate {
        current_day(now, self.hour, self.offset)
    }
}

impl Default for ResetSchedule {
    fn default() -> Self {
        Self {
            hour: DEFAULT_RESET_HOUR,
            offset: Utc.fix(),
        }
    }
}

/// Before the reset hour the previous calendar day is still in progress.
pub fn current_day(now: DateTime<Utc>, reset_hour: u32, zone: FixedOffset) -> NaiveDate {
    let local = now.with_timezone(&zone);
    let date = local.date_naive();
    if local.hour() < reset_hour {
        date.pred_opt().unwrap_or(date)
    } else {
        date
    }
}
