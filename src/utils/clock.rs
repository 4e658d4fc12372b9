use chrono::{Local, NaiveDateTime};

#[cfg(test)]
use mockall::automock;

/// Represents an entity responsible for providing dates across application. This can allow it to
/// be used for testing.
///
/// Timers only deal with local wall-clock time, so the clock hands out naive local timestamps.
#[cfg_attr(test, automock)]
pub trait Clock: 'static {
    fn time(&self) -> NaiveDateTime;
}

pub struct DefaultClock;

impl Clock for DefaultClock {
    fn time(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}
