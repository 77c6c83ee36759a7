//! Event repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Define the narrow store adapter the core depends on.
//! - Provide the indexed SQLite backend (`events` + `settings` tables).
//!
//! # Invariants
//! - Write paths validate records before touching storage.
//! - Read paths reject invalid persisted state instead of masking it.
//! - `load_all` returns events in insertion order.
//! - Deleting an absent id succeeds.

use crate::db::DbError;
use crate::model::event::{Event, EventId, EventPatch, ValidationError};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Store adapter failure.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    Io(std::io::Error),
    Serialization(serde_json::Error),
    NotFound(EventId),
    DuplicateId(EventId),
    InvalidData(String),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "store I/O failed: {err}"),
            Self::Serialization(err) => write!(f, "store serialization failed: {err}"),
            Self::NotFound(id) => write!(f, "event not found: {id}"),
            Self::DuplicateId(id) => write!(f, "event id already exists: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted event data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::NotFound(_)
            | Self::DuplicateId(_)
            | Self::InvalidData(_)
            | Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<std::io::Error> for RepoError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Store adapter consumed by the event service.
///
/// Every method is one atomic operation: it either fully applies or leaves
/// storage untouched.
pub trait EventRepository {
    /// Loads every stored event in insertion order.
    fn load_all(&self) -> RepoResult<Vec<Event>>;
    /// Persists a fully formed event. Fails with `DuplicateId` on id clash.
    fn insert_event(&mut self, event: &Event) -> RepoResult<()>;
    /// Applies `patch` and returns the stored result.
    fn update_event(&mut self, id: &EventId, patch: &EventPatch) -> RepoResult<Event>;
    /// Removes one event; absent ids are not an error.
    fn delete_event(&mut self, id: &EventId) -> RepoResult<()>;
    /// Removes every event. Settings are kept.
    fn clear_events(&mut self) -> RepoResult<()>;
    fn contains_event(&self, id: &EventId) -> RepoResult<bool>;
    fn get_setting(&self, name: &str) -> RepoResult<Option<String>>;
    fn put_setting(&mut self, name: &str, value: &str) -> RepoResult<()>;
}

impl<R: EventRepository + ?Sized> EventRepository for Box<R> {
    fn load_all(&self) -> RepoResult<Vec<Event>> {
        (**self).load_all()
    }

    fn insert_event(&mut self, event: &Event) -> RepoResult<()> {
        (**self).insert_event(event)
    }

    fn update_event(&mut self, id: &EventId, patch: &EventPatch) -> RepoResult<Event> {
        (**self).update_event(id, patch)
    }

    fn delete_event(&mut self, id: &EventId) -> RepoResult<()> {
        (**self).delete_event(id)
    }

    fn clear_events(&mut self) -> RepoResult<()> {
        (**self).clear_events()
    }

    fn contains_event(&self, id: &EventId) -> RepoResult<bool> {
        (**self).contains_event(id)
    }

    fn get_setting(&self, name: &str) -> RepoResult<Option<String>> {
        (**self).get_setting(name)
    }

    fn put_setting(&mut self, name: &str, value: &str) -> RepoResult<()> {
        (**self).put_setting(name, value)
    }
}

const EVENT_SELECT_SQL: &str = "SELECT id, title, date, created_at FROM events";

/// SQLite-backed repository with `date` and `created_at` indexes.
pub struct SqliteEventRepository {
    conn: Connection,
}

impl SqliteEventRepository {
    /// Wraps a migrated connection (see [`crate::db::open_db`]).
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        for table in ["events", "settings"] {
            if !table_exists(&conn, table)? {
                return Err(RepoError::MissingRequiredTable(table));
            }
        }
        Ok(Self { conn })
    }
}

impl EventRepository for SqliteEventRepository {
    fn load_all(&self) -> RepoResult<Vec<Event>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{EVENT_SELECT_SQL} ORDER BY rowid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            events.push(parse_event_row(row)?);
        }
        Ok(events)
    }

    fn insert_event(&mut self, event: &Event) -> RepoResult<()> {
        event.validate()?;

        let result = self.conn.execute(
            "INSERT INTO events (id, title, date, created_at) VALUES (?1, ?2, ?3, ?4);",
            params![
                event.id.as_str(),
                event.title.as_str(),
                event.date,
                event.created_at
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(RepoError::DuplicateId(event.id.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn update_event(&mut self, id: &EventId, patch: &EventPatch) -> RepoResult<Event> {
        let tx = self.conn.transaction()?;
        let current = tx
            .query_row(
                &format!("{EVENT_SELECT_SQL} WHERE id = ?1;"),
                [id.as_str()],
                |row| Ok(parse_event_row(row)),
            )
            .optional()?;
        let Some(current) = current else {
            return Err(RepoError::NotFound(id.clone()));
        };

        let mut updated = current?;
        patch.apply_to(&mut updated);
        updated.validate()?;

        tx.execute(
            "UPDATE events SET title = ?2, date = ?3 WHERE id = ?1;",
            params![id.as_str(), updated.title.as_str(), updated.date],
        )?;
        tx.commit()?;
        Ok(updated)
    }

    fn delete_event(&mut self, id: &EventId) -> RepoResult<()> {
        self.conn
            .execute("DELETE FROM events WHERE id = ?1;", [id.as_str()])?;
        Ok(())
    }

    fn clear_events(&mut self) -> RepoResult<()> {
        self.conn.execute("DELETE FROM events;", [])?;
        Ok(())
    }

    fn contains_event(&self, id: &EventId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM events WHERE id = ?1);",
            [id.as_str()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn get_setting(&self, name: &str) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE name = ?1;",
                [name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put_setting(&mut self, name: &str, value: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO settings (name, value) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET value = excluded.value;",
            params![name, value],
        )?;
        Ok(())
    }
}

fn parse_event_row(row: &Row<'_>) -> RepoResult<Event> {
    let id_text: String = row.get("id")?;
    let id = EventId::parse(id_text.as_str()).ok_or_else(|| {
        RepoError::InvalidData(format!("blank id value `{id_text}` in events.id"))
    })?;

    let event = Event {
        id,
        title: row.get("title")?,
        date: row.get("date")?,
        created_at: row.get("created_at")?,
    };
    event
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("event {}: {err}", event.id)))?;
    Ok(event)
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
