use chrono::{NaiveDate, Utc};

/// Source of "today" for attendance writes and lookups.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Calendar day in UTC.
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
