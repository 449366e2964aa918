use chrono::{Local, NaiveDate, NaiveDateTime};

/// Wall-clock seam. The noon gate, quiet hours, and hour-proportional
/// targets all read the clock through this trait so tests can pin the hour.
pub trait Clock: Send + Sync {
    /// Portal wall-clock time (local, naive)
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Production clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Test clock pinned to a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: NaiveDateTime,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now }
    }

    /// Pin to `date` at `hour:minute:00`
    pub fn at(date: NaiveDate, hour: u32, minute: u32) -> Self {
        let now = date
            .and_hms_opt(hour, minute, 0)
            .unwrap_or_else(|| date.and_hms_opt(0, 0, 0).unwrap());
        Self { now }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.now
    }
}
