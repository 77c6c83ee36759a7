//! Flat string-keyed event store.
//!
//! Keeps every value as a string under a fixed key, the way a browser
//! local-storage backend would: the whole event list is one JSON string and
//! each setting is its own key. The map lives in memory and is optionally
//! mirrored to a JSON file after every write.
//!
//! # Invariants
//! - A write is applied to a copy first; memory and file only change on success.
//! - File writes go through a temp file + rename.

use crate::model::event::{Event, EventId, EventPatch};
use crate::repo::event_repo::{EventRepository, RepoError, RepoResult};
use log::debug;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const EVENTS_KEY: &str = "eternalflow.events";
const SETTING_KEY_PREFIX: &str = "eternalflow.setting.";

/// Local-storage style repository.
#[derive(Debug, Default)]
pub struct FlatEventRepository {
    entries: BTreeMap<String, String>,
    path: Option<PathBuf>,
}

impl FlatEventRepository {
    /// Creates an empty, purely in-memory store.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens (or prepares) a file-backed store.
    ///
    /// A missing file is treated as an empty store and created on first write.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        let repo = Self {
            entries,
            path: Some(path),
        };
        // Fail early on a corrupt event list rather than on first use.
        repo.load_all()?;
        Ok(repo)
    }

    fn read_events(entries: &BTreeMap<String, String>) -> RepoResult<Vec<Event>> {
        let Some(raw) = entries.get(EVENTS_KEY) else {
            return Ok(Vec::new());
        };
        let events: Vec<Event> = serde_json::from_str(raw)?;
        for event in &events {
            event
                .validate()
                .map_err(|err| RepoError::InvalidData(format!("event {}: {err}", event.id)))?;
        }
        Ok(events)
    }

    fn write_events(
        entries: &mut BTreeMap<String, String>,
        events: &[Event],
    ) -> RepoResult<()> {
        entries.insert(EVENTS_KEY.to_string(), serde_json::to_string(events)?);
        Ok(())
    }

    /// Commits a modified copy of the map.
    fn commit(&mut self, next: BTreeMap<String, String>) -> RepoResult<()> {
        if let Some(path) = &self.path {
            persist(path, &next)?;
            debug!(
                "event=flat_store_persist module=repo status=ok keys={}",
                next.len()
            );
        }
        self.entries = next;
        Ok(())
    }

    fn mutate_events(
        &mut self,
        change: impl FnOnce(&mut Vec<Event>) -> RepoResult<()>,
    ) -> RepoResult<()> {
        let mut next = self.entries.clone();
        let mut events = Self::read_events(&next)?;
        change(&mut events)?;
        Self::write_events(&mut next, &events)?;
        self.commit(next)
    }
}

impl EventRepository for FlatEventRepository {
    fn load_all(&self) -> RepoResult<Vec<Event>> {
        Self::read_events(&self.entries)
    }

    fn insert_event(&mut self, event: &Event) -> RepoResult<()> {
        event.validate()?;
        self.mutate_events(|events| {
            if events.iter().any(|existing| existing.id == event.id) {
                return Err(RepoError::DuplicateId(event.id.clone()));
            }
            events.push(event.clone());
            Ok(())
        })
    }

    fn update_event(&mut self, id: &EventId, patch: &EventPatch) -> RepoResult<Event> {
        let mut updated = None;
        self.mutate_events(|events| {
            let event = events
                .iter_mut()
                .find(|event| &event.id == id)
                .ok_or_else(|| RepoError::NotFound(id.clone()))?;
            let mut candidate = event.clone();
            patch.apply_to(&mut candidate);
            candidate.validate()?;
            *event = candidate.clone();
            updated = Some(candidate);
            Ok(())
        })?;
        updated.ok_or_else(|| RepoError::NotFound(id.clone()))
    }

    fn delete_event(&mut self, id: &EventId) -> RepoResult<()> {
        if !self.contains_event(id)? {
            return Ok(());
        }
        self.mutate_events(|events| {
            events.retain(|event| &event.id != id);
            Ok(())
        })
    }

    fn clear_events(&mut self) -> RepoResult<()> {
        let mut next = self.entries.clone();
        next.remove(EVENTS_KEY);
        self.commit(next)
    }

    fn contains_event(&self, id: &EventId) -> RepoResult<bool> {
        Ok(self.load_all()?.iter().any(|event| &event.id == id))
    }

    fn get_setting(&self, name: &str) -> RepoResult<Option<String>> {
        Ok(self.entries.get(&setting_key(name)).cloned())
    }

    fn put_setting(&mut self, name: &str, value: &str) -> RepoResult<()> {
        let mut next = self.entries.clone();
        next.insert(setting_key(name), value.to_string());
        self.commit(next)
    }
}

fn setting_key(name: &str) -> String {
    format!("{SETTING_KEY_PREFIX}{name}")
}

fn persist(path: &Path, entries: &BTreeMap<String, String>) -> RepoResult<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    fs::write(&tmp_path, serde_json::to_vec_pretty(entries)?)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}
