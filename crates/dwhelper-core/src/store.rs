//! Durable key-value store and the answer accessors built on it.
//!
//! Every accessor owns its default: toggles read `Yes`, identifiers read
//! empty, and a remembered symptom only counts if the knowledge base still
//! has it. Missing or malformed values are never errors.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::{data_dir, write_atomic, Answer, AnswerState, IdentifierField, Identifiers, KnowledgeBase};

pub const LAST_SYMPTOM_KEY: &str = "lastSymptom";
pub const TOGGLE_PREFIX: &str = "toggle_";

pub fn toggle_key(question_key: &str) -> String {
    format!("{TOGGLE_PREFIX}{question_key}")
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("could not open state store at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Synchronous string-keyed store of structured values.
///
/// `set` is visible to the next `get` immediately. It has no failure path:
/// implementations that persist log write errors and keep going.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: Value);
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Option<Value> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: Value) {
        (**self).set(key, value)
    }
}

/// Non-persistent store, used when no durable store is available.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Value>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
    }
}

/// All entries in one JSON object file, rewritten on every `set`.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl FileStore {
    /// Open the store at `path`. A missing file starts empty, and so does an
    /// unreadable or corrupt one (logged). Fails only if the directory
    /// cannot be created.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| StoreError::Open {
                path: path.clone(),
                source,
            })?;
        }
        let entries = read_entries(&path);
        Ok(Self { path, entries })
    }

    /// Store at ~/.dwhelper/state.json.
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(data_dir().join("state.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_entries(path: &Path) -> Map<String, Value> {
    if !path.exists() {
        return Map::new();
    }
    let parsed = fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|raw| serde_json::from_str::<Map<String, Value>>(&raw).map_err(|e| e.to_string()));
    match parsed {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "state file unreadable, starting empty");
            Map::new()
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
        let written = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| e.to_string())
            .and_then(|json| write_atomic(&self.path, &json).map_err(|e| e.to_string()));
        if let Err(e) = written {
            warn!(key, path = %self.path.display(), error = %e, "could not persist state");
        }
    }
}

/// Typed answer accessors over a `KeyValueStore`.
#[derive(Debug)]
pub struct AnswerStore<S> {
    store: S,
}

impl<S: KeyValueStore> AnswerStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    pub fn restore_toggle(&self, question_key: &str) -> Answer {
        self.store
            .get(&toggle_key(question_key))
            .and_then(|v| Answer::from_value(&v))
            .unwrap_or_default()
    }

    pub fn restore_identifier(&self, field: IdentifierField) -> String {
        self.store
            .get(field.key())
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default()
    }

    pub fn restore_last_symptom(&self) -> Option<String> {
        self.store
            .get(LAST_SYMPTOM_KEY)
            .and_then(|v| v.as_str().map(str::to_string))
            .filter(|s| !s.is_empty())
    }

    /// The remembered symptom, only if `kb` still has it.
    pub fn restore_last_symptom_in(&self, kb: &KnowledgeBase) -> Option<String> {
        self.restore_last_symptom()
            .filter(|name| kb.symptoms.contains(name))
    }

    /// Everything persisted for `kb`, with defaults filled in.
    pub fn restore_state(&self, kb: &KnowledgeBase) -> AnswerState {
        let toggles = kb
            .questions
            .iter()
            .map(|q| (q.key.clone(), self.restore_toggle(&q.key)))
            .collect();
        AnswerState {
            toggles,
            identifiers: Identifiers {
                make: self.restore_identifier(IdentifierField::Make),
                model: self.restore_identifier(IdentifierField::Model),
            },
            last_symptom: self.restore_last_symptom_in(kb),
        }
    }

    pub fn record_toggle(&mut self, question_key: &str, answer: Answer) {
        self.store
            .set(&toggle_key(question_key), Value::String(answer.as_str().to_string()));
    }

    /// Persist an identifier, trimmed. Returns the stored value.
    pub fn record_identifier(&mut self, field: IdentifierField, value: &str) -> String {
        let trimmed = value.trim().to_string();
        self.store.set(field.key(), Value::String(trimmed.clone()));
        trimmed
    }

    pub fn record_last_symptom(&mut self, name: &str) {
        self.store
            .set(LAST_SYMPTOM_KEY, Value::String(name.to_string()));
    }
}
