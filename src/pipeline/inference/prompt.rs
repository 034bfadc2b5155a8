use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::InferenceError;

/// Grammar the model is instructed to answer in, and that the deadline
/// parser expects back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplyFormat {
    /// `<event name>, <month> <day>`, split on the last comma.
    #[default]
    CommaV1,
    /// `<event name> | <month> <day>`, split on the last pipe. Titles may
    /// then contain commas.
    PipeV2,
}

impl ReplyFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CommaV1 => "comma-v1",
            Self::PipeV2 => "pipe-v2",
        }
    }

    /// Separator between title and date text.
    pub fn delimiter(&self) -> char {
        match self {
            Self::CommaV1 => ',',
            Self::PipeV2 => '|',
        }
    }

    /// System instruction fixing the reply grammar. Sent once, first in the
    /// conversation.
    pub fn system_prompt(&self) -> String {
        let (layout, example) = match self {
            Self::CommaV1 => ("event name, month day", "Assignment 5, January 15"),
            Self::PipeV2 => ("event name | month day", "Assignment 5 | January 15"),
        };
        format!(
            "Write every date with its corresponding events and absolutely no other text. \
             Put one event per line. Format each line as: '{layout}'. \
             For example: '{example}'"
        )
    }
}

impl fmt::Display for ReplyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReplyFormat {
    type Err = InferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "comma-v1" | "comma" | "v1" => Ok(Self::CommaV1),
            "pipe-v2" | "pipe" | "v2" => Ok(Self::PipeV2),
            _ => Err(InferenceError::UnknownReplyFormat(s.to_string())),
        }
    }
}
