use std::fmt::Display;

use chrono::NaiveDateTime;

use crate::utils::time::{format_duration, format_local_time, is_valid_time_format};

use super::{
    entities::{Elapsed, Timer},
    error::TimerError,
};

pub const DEFAULT_TIME_FORMAT: &str = "%H:%M:%S";
pub const DEFAULT_DURATION_FORMAT: &str = "%H:%M:%S";

const NOT_STARTED: &str = "not started";
const ONGOING: &str = "ongoing";

/// Formats used when showing timers. `time` is a strftime format for start and end,
/// `duration` is understood by [format_duration].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewFormat {
    time: String,
    duration: String,
}

impl Default for ViewFormat {
    fn default() -> Self {
        Self {
            time: DEFAULT_TIME_FORMAT.into(),
            duration: DEFAULT_DURATION_FORMAT.into(),
        }
    }
}

impl ViewFormat {
    pub fn new(time: impl Into<String>, duration: impl Into<String>) -> Result<Self, TimerError> {
        let time = time.into();
        if !is_valid_time_format(&time) {
            return Err(TimerError::InvalidFormat { format: time });
        }
        Ok(Self {
            time,
            duration: duration.into(),
        })
    }

    fn time(&self, timestamp: NaiveDateTime) -> Result<String, TimerError> {
        format_local_time(timestamp, &self.time).ok_or_else(|| TimerError::InvalidFormat {
            format: self.time.clone(),
        })
    }
}

/// One rendered row of a label listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerLine {
    /// 1-based position inside the label. This is what delete selection refers to.
    pub position: usize,
    pub start: String,
    pub end: String,
    /// [None] for timers which haven't started yet.
    pub elapsed: Option<String>,
}

impl TimerLine {
    pub fn new(
        position: usize,
        timer: &Timer,
        now: NaiveDateTime,
        format: &ViewFormat,
    ) -> Result<Self, TimerError> {
        let start = match timer.start {
            Some(v) => format.time(v)?,
            None => NOT_STARTED.into(),
        };
        let end = match timer.end {
            Some(v) => format.time(v)?,
            None if timer.start.is_some() => ONGOING.into(),
            None => NOT_STARTED.into(),
        };
        let elapsed = match timer.elapsed(now) {
            Elapsed::NotStarted => None,
            Elapsed::Ongoing(v) | Elapsed::Finished(v) => {
                Some(format_duration(v, &format.duration))
            }
        };
        Ok(Self {
            position,
            start,
            end,
            elapsed,
        })
    }
}

impl Display for TimerLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}. {} - {}", self.position, self.start, self.end)?;
        if let Some(elapsed) = &self.elapsed {
            write!(f, " ({elapsed})")?;
        }
        Ok(())
    }
}

/// All timers of a label ready to be shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelView {
    pub label: String,
    pub lines: Vec<TimerLine>,
}

impl LabelView {
    pub fn new(
        label: &str,
        timers: &[Timer],
        now: NaiveDateTime,
        format: &ViewFormat,
    ) -> Result<Self, TimerError> {
        let lines = timers
            .iter()
            .enumerate()
            .map(|(index, timer)| TimerLine::new(index + 1, timer, now, format))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            label: label.into(),
            lines,
        })
    }
}

impl Display for LabelView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.lines.is_empty() {
            return write!(f, "No timers for label {}", self.label);
        }
        write!(f, "{}", self.label)?;
        for line in &self.lines {
            write!(f, "\n{line}")?;
        }
        Ok(())
    }
}
