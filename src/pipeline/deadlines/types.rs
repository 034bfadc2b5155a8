use serde::Serialize;

use crate::models::CalendarEvent;

/// One `(title, date text)` pair read from a reply line. Not yet validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeadlineCandidate {
    pub raw_title: String,
    pub raw_date_text: String,
    /// The reply line it came from (trimmed).
    pub line: String,
}

/// Why a reply line produced no event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoDelimiter,
    EmptyTitle,
    EmptyDate,
    UnrecognizedMonth,
    MissingDay,
    InvalidDay,
    InvalidCalendarDate,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoDelimiter => "no_delimiter",
            Self::EmptyTitle => "empty_title",
            Self::EmptyDate => "empty_date",
            Self::UnrecognizedMonth => "unrecognized_month",
            Self::MissingDay => "missing_day",
            Self::InvalidDay => "invalid_day",
            Self::InvalidCalendarDate => "invalid_calendar_date",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::NoDelimiter => "no title/date separator",
            Self::EmptyTitle => "empty event name",
            Self::EmptyDate => "empty date",
            Self::UnrecognizedMonth => "month not recognized",
            Self::MissingDay => "no day of month",
            Self::InvalidDay => "day is not a number",
            Self::InvalidCalendarDate => "date does not exist",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLine {
    pub line: String,
    pub reason: SkipReason,
}

/// Result of materializing one candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Created(CalendarEvent),
    Skipped(SkippedLine),
}
