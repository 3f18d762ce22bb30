//! Persistence: the document as one JSON record in a key-value store.
//!
//! The record carries every page plus a copy of the current page's
//! components under `components`, the collaborator records, the settings, and
//! a `lastSaved` timestamp. Keys this build does not model are kept and
//! written back untouched.

use crate::error::PersistenceError;
use crate::id::PageId;
use crate::model::{ApiEndpoint, AppSettings, ComponentInstance, Datasource, Document, Page, SqlQuery};
use crate::props::PropMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Key of the project record.
pub const STORAGE_KEY: &str = "appsmith_builder_data";

pub type PersistenceResult<T> = Result<T, PersistenceError>;

// ─── Stores ──────────────────────────────────────────────────────────────

/// A durable string-to-string store.
pub trait KvStore {
    fn get(&self, key: &str) -> PersistenceResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> PersistenceResult<()>;
    fn remove(&mut self, key: &str) -> PersistenceResult<()>;
}

/// In-process store, for tests and throwaway sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> PersistenceResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> PersistenceResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> PersistenceResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> PersistenceResult<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes to a sibling temp file, then renames over the record.
    fn set(&mut self, key: &str, value: &str) -> PersistenceResult<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> PersistenceResult<()> {
        match fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

// ─── Record shape ────────────────────────────────────────────────────────

/// The stored JSON record. Absent fields take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedDocument {
    #[serde(default)]
    pub pages: Vec<Page>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_page_id: Option<PageId>,
    /// The current page's components.
    #[serde(default)]
    pub components: Vec<ComponentInstance>,
    #[serde(default)]
    pub apis: Vec<ApiEndpoint>,
    #[serde(default)]
    pub sql_queries: Vec<SqlQuery>,
    #[serde(default)]
    pub datasources: Vec<Datasource>,
    #[serde(default)]
    pub settings: AppSettings,
    #[serde(default, skip_serializing_if = "PropMap::is_empty")]
    pub global_state: PropMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_saved: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extras: PropMap,
}

impl PersistedDocument {
    pub fn from_document(doc: &Document, saved_at: DateTime<Utc>) -> Self {
        Self {
            pages: doc.pages.clone(),
            current_page_id: Some(doc.current_page_id),
            components: doc.components().to_vec(),
            apis: doc.apis.clone(),
            sql_queries: doc.sql_queries.clone(),
            datasources: doc.datasources.clone(),
            settings: doc.settings.clone(),
            global_state: doc.global_state.clone(),
            last_saved: Some(saved_at),
            extras: doc.extras.clone(),
        }
    }

    /// Rebuild a normalized document. The current page's own component list
    /// wins over the top-level copy; with no pages at all, the copy seeds the
    /// default page.
    pub fn into_document(self) -> Document {
        let mut pages = self.pages;
        if pages.is_empty() {
            let mut home = Page::home();
            home.components = self.components;
            pages.push(home);
        }
        let current_page_id = self
            .current_page_id
            .filter(|id| pages.iter().any(|p| p.id == *id))
            .unwrap_or(pages[0].id);
        let mut doc = Document {
            pages,
            current_page_id,
            apis: self.apis,
            sql_queries: self.sql_queries,
            datasources: self.datasources,
            settings: self.settings,
            global_state: self.global_state,
            extras: self.extras,
        };
        doc.normalize();
        doc
    }
}

// ─── Operations ──────────────────────────────────────────────────────────

/// Serialize a document as its stored record.
pub fn encode(doc: &Document, saved_at: DateTime<Utc>) -> PersistenceResult<String> {
    Ok(serde_json::to_string(&PersistedDocument::from_document(doc, saved_at))?)
}

/// Parse a stored record into a normalized document.
pub fn decode(json: &str) -> PersistenceResult<Document> {
    let record: PersistedDocument = serde_json::from_str(json)?;
    Ok(record.into_document())
}

/// Write the whole document. Returns the `lastSaved` stamp.
pub fn save<S: KvStore + ?Sized>(store: &mut S, doc: &Document) -> PersistenceResult<DateTime<Utc>> {
    let now = Utc::now();
    store.set(STORAGE_KEY, &encode(doc, now)?)?;
    log::trace!("saved project ({} pages)", doc.pages.len());
    Ok(now)
}

/// Read the stored document. Missing or unreadable records yield `None`.
pub fn load<S: KvStore + ?Sized>(store: &S) -> Option<Document> {
    let raw = match store.get(STORAGE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            log::warn!("could not read stored project: {e}");
            return None;
        }
    };
    match decode(&raw) {
        Ok(doc) => Some(doc),
        Err(e) => {
            log::warn!("stored project is corrupt, starting fresh: {e}");
            None
        }
    }
}

/// Load the stored document, or a fresh default one.
pub fn load_or_default<S: KvStore + ?Sized>(store: &S) -> Document {
    load(store).unwrap_or_default()
}

/// Drop the stored record.
pub fn clear<S: KvStore + ?Sized>(store: &mut S) -> PersistenceResult<()> {
    store.remove(STORAGE_KEY)
}

/// A project file ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectExport {
    pub file_name: String,
    pub contents: String,
}

/// Pretty-printed record named `appsmith-project-<epoch-ms>.json`.
pub fn export_project(doc: &Document, at: DateTime<Utc>) -> PersistenceResult<ProjectExport> {
    let record = PersistedDocument::from_document(doc, at);
    Ok(ProjectExport {
        file_name: format!("appsmith-project-{}.json", at.timestamp_millis()),
        contents: serde_json::to_string_pretty(&record)?,
    })
}

/// Parse a project file and replace the stored record with it. Nothing is
/// written unless parsing succeeds.
pub fn import_project<S: KvStore + ?Sized>(store: &mut S, contents: &str) -> PersistenceResult<Document> {
    let record: PersistedDocument = serde_json::from_str(contents)?;
    let encoded = serde_json::to_string(&record)?;
    let doc = record.into_document();
    store.set(STORAGE_KEY, &encoded)?;
    Ok(doc)
}
