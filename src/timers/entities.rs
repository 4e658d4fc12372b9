use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Column names of the timers file, in the order they are written.
pub const TIMER_COLUMNS: [&str; 5] = ["id", "label", "created_at", "start", "end"];

/// A single tracked interval. Field order matches [TIMER_COLUMNS].
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct Timer {
    /// Position of the timer among all timers ever created for its label, starting from 1.
    pub id: u32,
    pub label: String,
    #[serde(with = "timestamp_ser")]
    pub created_at: NaiveDateTime,
    #[serde(with = "optional_timestamp_ser")]
    pub start: Option<NaiveDateTime>,
    #[serde(with = "optional_timestamp_ser")]
    pub end: Option<NaiveDateTime>,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum TimerState {
    Pending,
    Running,
    Finished,
}

/// How long a timer has been going for.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Elapsed {
    NotStarted,
    Ongoing(Duration),
    Finished(Duration),
}

impl Timer {
    pub fn new(id: u32, label: impl Into<String>, created_at: NaiveDateTime) -> Self {
        Self {
            id,
            label: label.into(),
            created_at,
            start: None,
            end: None,
        }
    }

    pub fn with_start(self, start: NaiveDateTime) -> Self {
        Self {
            start: Some(start),
            ..self
        }
    }

    pub fn with_end(self, end: NaiveDateTime) -> Self {
        Self {
            end: Some(end),
            ..self
        }
    }

    /// A timer with `end` but no `start` can't be produced by the engine. It is reported as
    /// finished.
    pub fn state(&self) -> TimerState {
        match (self.start, self.end) {
            (_, Some(_)) => TimerState::Finished,
            (Some(_), None) => TimerState::Running,
            (None, None) => TimerState::Pending,
        }
    }

    pub fn elapsed(&self, now: NaiveDateTime) -> Elapsed {
        match (self.start, self.end) {
            (None, _) => Elapsed::NotStarted,
            (Some(start), None) => Elapsed::Ongoing(now - start),
            (Some(start), Some(end)) => Elapsed::Finished(end - start),
        }
    }
}

mod timestamp_ser {
    use chrono::NaiveDateTime;
    use serde::{self, de::Error, Deserialize, Deserializer, Serializer};

    use crate::utils::time::{parse_timestamp, timestamp_to_string};

    pub fn serialize<S>(timestamp: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&timestamp_to_string(*timestamp))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_timestamp(&s).ok_or_else(|| D::Error::custom(format!("invalid timestamp {s:?}")))
    }
}

/// Absent timestamps are stored as empty strings.
mod optional_timestamp_ser {
    use chrono::NaiveDateTime;
    use serde::{self, de::Error, Deserialize, Deserializer, Serializer};

    use crate::utils::time::{parse_timestamp, timestamp_to_string};

    pub fn serialize<S>(timestamp: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match timestamp {
            Some(v) => serializer.serialize_str(&timestamp_to_string(*v)),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s.is_empty() {
            return Ok(None);
        }
        parse_timestamp(&s)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid timestamp {s:?}")))
    }
}
