use std::fmt;

use chrono::{NaiveDate, NaiveTime};

pub const ALL_DAY_LABEL: &str = "Ganztägig";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeLabel {
    AllDay,
    At(NaiveTime),
}

impl fmt::Display for TimeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeLabel::AllDay => f.write_str(ALL_DAY_LABEL),
            TimeLabel::At(time) => write!(f, "{}", time.format("%H:%M")),
        }
    }
}

/// One display line of the agenda.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgendaEntry {
    pub time: TimeLabel,
    pub title: String,
}

impl fmt::Display for AgendaEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "• {}: {}", self.time, self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgendaOutcome {
    /// Deduplicated entries, ordered by their formatted line.
    Events {
        day: NaiveDate,
        entries: Vec<AgendaEntry>,
    },
    NoCalendars,
    NothingFound {
        day: NaiveDate,
    },
}

impl AgendaOutcome {
    pub fn lines(&self) -> Vec<String> {
        match self {
            AgendaOutcome::Events { entries, .. } => {
                entries.iter().map(ToString::to_string).collect()
            }
            _ => Vec::new(),
        }
    }
}
