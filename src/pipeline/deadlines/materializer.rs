use std::sync::LazyLock;

use chrono::NaiveTime;
use regex::Regex;

use super::dates::normalize_date;
use super::types::{DeadlineCandidate, ItemOutcome, SkippedLine};
use crate::db::{DatabaseError, EventStore};
use crate::models::enums::Priority;
use crate::models::{NewEvent, DOCUMENT_IMPORT_CATEGORY};

static FINAL_EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.[^/.]+$").expect("static regex"));

/// File name minus its final extension: "CS 101.v2.pdf" → "CS 101.v2".
pub fn course_from_file_name(name: &str) -> String {
    FINAL_EXTENSION.replace(name, "").into_owned()
}

/// Turns candidates from one document into stored events.
pub struct EventMaterializer<'a> {
    store: &'a dyn EventStore,
    owner_id: &'a str,
    course: String,
    description: String,
    year: i32,
}

impl<'a> EventMaterializer<'a> {
    pub fn new(store: &'a dyn EventStore, owner_id: &'a str, document_name: &str, year: i32) -> Self {
        Self {
            store,
            owner_id,
            course: course_from_file_name(document_name),
            description: format!("Imported from document: {document_name}"),
            year,
        }
    }

    pub fn course(&self) -> &str {
        &self.course
    }

    /// Event fields for a candidate, or why it has none.
    pub fn build(&self, candidate: &DeadlineCandidate) -> Result<NewEvent, SkippedLine> {
        let date = normalize_date(&candidate.raw_date_text, self.year).map_err(|reason| {
            SkippedLine {
                line: candidate.line.clone(),
                reason,
            }
        })?;

        Ok(NewEvent {
            title: candidate.raw_title.clone(),
            date,
            time: NaiveTime::MIN,
            category: DOCUMENT_IMPORT_CATEGORY.to_string(),
            course: self.course.clone(),
            priority: Priority::Medium,
            description: Some(self.description.clone()),
        })
    }

    /// Build and persist one event. Date problems are a `Skipped` outcome;
    /// only a store failure is an error.
    pub fn materialize(&self, candidate: &DeadlineCandidate) -> Result<ItemOutcome, DatabaseError> {
        let fields = match self.build(candidate) {
            Ok(fields) => fields,
            Err(skipped) => {
                tracing::warn!(
                    line = %skipped.line,
                    reason = skipped.reason.as_str(),
                    "Deadline skipped"
                );
                return Ok(ItemOutcome::Skipped(skipped));
            }
        };

        let event = self.store.create_event(self.owner_id, fields)?;
        tracing::debug!(event_id = %event.id, date = %event.date, "Deadline materialized");
        Ok(ItemOutcome::Created(event))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::db::MemoryEventStore;
    use crate::pipeline::deadlines::SkipReason;

    fn candidate(title: &str, date: &str) -> DeadlineCandidate {
        DeadlineCandidate {
            raw_title: title.into(),
            raw_date_text: date.into(),
            line: format!("{title}, {date}"),
        }
    }

    #[test]
    fn course_strips_only_final_extension() {
        assert_eq!(course_from_file_name("MATH 221 Syllabus.pdf"), "MATH 221 Syllabus");
        assert_eq!(course_from_file_name("CS 101.v2.final.docx"), "CS 101.v2.final");
        assert_eq!(course_from_file_name("README"), "README");
        assert_eq!(course_from_file_name("notes."), "notes.");
        assert_eq!(course_from_file_name("dir.d/plan"), "dir.d/plan");
    }

    #[test]
    fn builds_document_import_event() {
        let store = MemoryEventStore::new();
        let m = EventMaterializer::new(&store, "owner-1", "BIO 110.pdf", 2026);

        let fields = m.build(&candidate("Assignment 5", "January 15")).unwrap();
        assert_eq!(fields.title, "Assignment 5");
        assert_eq!(fields.date, NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());
        assert_eq!(fields.time, NaiveTime::MIN);
        assert_eq!(fields.category, "Document Import");
        assert_eq!(fields.course, "BIO 110");
        assert_eq!(fields.priority, Priority::Medium);
        assert_eq!(
            fields.description.as_deref(),
            Some("Imported from document: BIO 110.pdf")
        );
    }

    #[test]
    fn materialize_stores_event_for_owner() {
        let store = MemoryEventStore::new();
        let m = EventMaterializer::new(&store, "owner-1", "BIO 110.pdf", 2026);

        let outcome = m.materialize(&candidate("Lab report", "March 3rd")).unwrap();
        let ItemOutcome::Created(event) = outcome else {
            panic!("expected Created");
        };
        assert_eq!(event.owner_id, "owner-1");
        assert_eq!(event.time_label(), "00:00");
        assert_eq!(store.events(), vec![event]);
    }

    #[test]
    fn bad_date_skipped_without_store_call() {
        let store = MemoryEventStore::new();
        let m = EventMaterializer::new(&store, "owner-1", "BIO 110.pdf", 2026);

        let outcome = m.materialize(&candidate("Office hours", "Whenever")).unwrap();
        assert_eq!(
            outcome,
            ItemOutcome::Skipped(SkippedLine {
                line: "Office hours, Whenever".into(),
                reason: SkipReason::UnrecognizedMonth,
            })
        );
        assert!(store.is_empty());
    }
}
