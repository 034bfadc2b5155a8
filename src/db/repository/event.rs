use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::Priority;
use crate::models::CalendarEvent;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const EVENT_COLUMNS: &str = "id, owner_id, title, event_date, event_time, category, course,
     priority, description, created_at";

pub fn insert_event(conn: &Connection, event: &CalendarEvent) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO events (id, owner_id, title, event_date, event_time, category, course,
         priority, description, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            event.id.to_string(),
            event.owner_id,
            event.title,
            event.date.format(DATE_FORMAT).to_string(),
            event.time.format(TIME_FORMAT).to_string(),
            event.category,
            event.course,
            event.priority.as_str(),
            event.description,
            event.created_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_event(conn: &Connection, id: &Uuid) -> Result<Option<CalendarEvent>, DatabaseError> {
    let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1");
    let result = conn.query_row(&sql, params![id.to_string()], read_row);

    match result {
        Ok(row) => Ok(Some(event_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All events owned by `owner_id`, ordered by date then time.
pub fn get_events_for_owner(
    conn: &Connection,
    owner_id: &str,
) -> Result<Vec<CalendarEvent>, DatabaseError> {
    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE owner_id = ?1
         ORDER BY event_date, event_time, created_at"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![owner_id], read_row)?;
    collect_events(rows)
}

/// Events owned by `owner_id` on a single day, ordered by time.
pub fn get_events_on_date(
    conn: &Connection,
    owner_id: &str,
    date: NaiveDate,
) -> Result<Vec<CalendarEvent>, DatabaseError> {
    let sql = format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE owner_id = ?1 AND event_date = ?2
         ORDER BY event_time, created_at"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![owner_id, date.format(DATE_FORMAT).to_string()],
        read_row,
    )?;
    collect_events(rows)
}

/// Delete every event of `owner_id` tagged with `course`. Returns rows removed.
pub fn delete_events_by_course(
    conn: &Connection,
    owner_id: &str,
    course: &str,
) -> Result<usize, DatabaseError> {
    let removed = conn.execute(
        "DELETE FROM events WHERE owner_id = ?1 AND course = ?2",
        params![owner_id, course],
    )?;
    Ok(removed)
}

pub fn count_events(conn: &Connection, owner_id: &str) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM events WHERE owner_id = ?1",
        params![owner_id],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(count)
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

struct EventRow {
    id: String,
    owner_id: String,
    title: String,
    date: String,
    time: String,
    category: String,
    course: String,
    priority: String,
    description: Option<String>,
    created_at: String,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<EventRow> {
    Ok(EventRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        date: row.get(3)?,
        time: row.get(4)?,
        category: row.get(5)?,
        course: row.get(6)?,
        priority: row.get(7)?,
        description: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn collect_events<I>(rows: I) -> Result<Vec<CalendarEvent>, DatabaseError>
where
    I: Iterator<Item = rusqlite::Result<EventRow>>,
{
    let mut events = Vec::new();
    for row in rows {
        events.push(event_from_row(row?)?);
    }
    Ok(events)
}

fn event_from_row(row: EventRow) -> Result<CalendarEvent, DatabaseError> {
    let invalid = |field: &str, value: &str| DatabaseError::InvalidValue {
        field: field.into(),
        value: value.into(),
    };

    Ok(CalendarEvent {
        id: Uuid::parse_str(&row.id).map_err(|_| invalid("id", &row.id))?,
        owner_id: row.owner_id,
        title: row.title,
        date: NaiveDate::parse_from_str(&row.date, DATE_FORMAT)
            .map_err(|_| invalid("event_date", &row.date))?,
        time: NaiveTime::parse_from_str(&row.time, TIME_FORMAT)
            .map_err(|_| invalid("event_time", &row.time))?,
        category: row.category,
        course: row.course,
        priority: Priority::from_str(&row.priority)?,
        description: row.description,
        created_at: NaiveDateTime::parse_from_str(&row.created_at, TIMESTAMP_FORMAT)
            .map_err(|_| invalid("created_at", &row.created_at))?,
    })
}
