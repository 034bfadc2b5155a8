use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Priority;

/// Category stamped on every event created from an uploaded document.
pub const DOCUMENT_IMPORT_CATEGORY: &str = "Document Import";

/// Event fields as submitted to the record store (no id, owner or timestamp yet).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub category: String,
    pub course: String,
    pub priority: Priority,
    pub description: Option<String>,
}

/// A persisted calendar event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: Uuid,
    pub owner_id: String,
    pub title: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub category: String,
    pub course: String,
    pub priority: Priority,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
}

impl CalendarEvent {
    pub fn from_new(id: Uuid, owner_id: &str, fields: NewEvent, created_at: NaiveDateTime) -> Self {
        Self {
            id,
            owner_id: owner_id.to_string(),
            title: fields.title,
            date: fields.date,
            time: fields.time,
            category: fields.category,
            course: fields.course,
            priority: fields.priority,
            description: fields.description,
            created_at,
        }
    }

    /// `HH:MM`, the wall-clock form the calendar screens use.
    pub fn time_label(&self) -> String {
        self.time.format("%H:%M").to_string()
    }
}
