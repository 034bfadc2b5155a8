//! Record store seam used by the import pipeline.
//!
//! The pipeline only ever creates events; reading and bulk deletion are
//! repository functions used by the CLI.

use std::sync::Mutex;

use chrono::{Local, NaiveDateTime, Timelike};
use rusqlite::Connection;
use uuid::Uuid;

use super::repository;
use super::DatabaseError;
use crate::models::{CalendarEvent, NewEvent};

/// Persists calendar events on behalf of an owner.
pub trait EventStore {
    /// Create one event and return it with its assigned id.
    fn create_event(&self, owner_id: &str, fields: NewEvent) -> Result<CalendarEvent, DatabaseError>;
}

/// Second-resolution local timestamp (matches the stored format).
fn now_timestamp() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

// ---------------------------------------------------------------------------
// SQLite
// ---------------------------------------------------------------------------

/// SQLite-backed store.
pub struct SqliteEventStore {
    conn: Mutex<Connection>,
}

impl SqliteEventStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Run a read-side closure against the underlying connection.
    pub fn with_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, DatabaseError>,
    ) -> Result<T, DatabaseError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| DatabaseError::Unavailable("connection lock poisoned".into()))?;
        f(&conn)
    }
}

impl EventStore for SqliteEventStore {
    fn create_event(&self, owner_id: &str, fields: NewEvent) -> Result<CalendarEvent, DatabaseError> {
        let event = CalendarEvent::from_new(Uuid::new_v4(), owner_id, fields, now_timestamp());
        self.with_connection(|conn| repository::insert_event(conn, &event))?;
        tracing::debug!(event_id = %event.id, owner = owner_id, "Event stored");
        Ok(event)
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Keeps events in memory. Used for dry runs and tests.
#[derive(Default)]
pub struct MemoryEventStore {
    events: Mutex<Vec<CalendarEvent>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything created so far, in creation order.
    pub fn events(&self) -> Vec<CalendarEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventStore for MemoryEventStore {
    fn create_event(&self, owner_id: &str, fields: NewEvent) -> Result<CalendarEvent, DatabaseError> {
        let event = CalendarEvent::from_new(Uuid::new_v4(), owner_id, fields, now_timestamp());
        self.events
            .lock()
            .map_err(|_| DatabaseError::Unavailable("event list lock poisoned".into()))?
            .push(event.clone());
        Ok(event)
    }
}
