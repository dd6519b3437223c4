//! One edit-save cycle over the roadmap document: load the document and its
//! version token, mutate a draft of a single week's task list, then submit
//! the whole document as a conditional write and refresh the token.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::model::{week_key, RoadmapDocument};
use crate::progress::tasks_for_week;
use crate::store::{RemoteFileStore, StoreError};

pub const SAVE_MESSAGE: &str = "Update tasks via web dashboard";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no document loaded; call open first")]
    NotLoaded,
    #[error("task index {0} is out of range")]
    IndexOutOfRange(usize),
    #[error("a save is already in flight")]
    SaveInProgress,
    #[error("version token lost after save; reopen the session")]
    StaleSession,
    #[error("document is not a valid roadmap: {0}")]
    BadDocument(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Loading,
    Ready,
    Saving,
}

struct LoadedDocument {
    doc: RoadmapDocument,
    /// Cleared when a post-save refresh fails; saving again then requires a
    /// reopen, since the store will no longer accept the old token.
    version: Option<String>,
    draft: Vec<String>,
    seeded_from_fallback: bool,
}

pub struct TaskEditingSession {
    store: Arc<dyn RemoteFileStore>,
    path: String,
    week: u32,
    phase: SessionPhase,
    loaded: Option<LoadedDocument>,
    saved: bool,
    last_error: Option<String>,
}

impl TaskEditingSession {
    pub fn new(store: Arc<dyn RemoteFileStore>, path: impl Into<String>) -> Self {
        Self {
            store,
            path: path.into(),
            week: 0,
            phase: SessionPhase::Idle,
            loaded: None,
            saved: false,
            last_error: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn week(&self) -> u32 {
        self.week
    }

    pub fn draft(&self) -> Option<&[String]> {
        self.loaded.as_ref().map(|l| l.draft.as_slice())
    }

    pub fn is_saved(&self) -> bool {
        self.saved
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// True when the draft was seeded from the maintenance list because the
    /// week had no entry of its own. Saving will then create a new explicit
    /// `weekly_tasks` entry; the shared fallback list is never written back.
    pub fn seeded_from_fallback(&self) -> bool {
        self.loaded
            .as_ref()
            .is_some_and(|l| l.seeded_from_fallback)
    }

    /// Loads the roadmap and seeds the draft for `week`. On failure the
    /// session holds no draft and retains the error message.
    ///
    /// Allowed from any phase: a save future dropped mid-flight leaves the
    /// phase at `Saving`, and reloading is the recovery for an abandoned
    /// save (its write either landed or it didn't; the fresh read tells).
    pub async fn open(&mut self, week: u32) -> Result<(), SessionError> {
        self.phase = SessionPhase::Loading;
        self.week = week;
        self.saved = false;

        let file = match self.store.read(&self.path).await {
            Ok(file) => file,
            Err(e) => {
                self.phase = SessionPhase::Ready;
                self.loaded = None;
                self.last_error = Some(e.to_string());
                return Err(e.into());
            }
        };
        let doc: RoadmapDocument = match serde_json::from_str(&file.content) {
            Ok(doc) => doc,
            Err(e) => {
                self.phase = SessionPhase::Ready;
                self.loaded = None;
                self.last_error = Some(e.to_string());
                return Err(SessionError::BadDocument(e.to_string()));
            }
        };

        let tasks = tasks_for_week(&doc, week);
        let seeded_from_fallback = tasks.is_fallback();
        self.loaded = Some(LoadedDocument {
            doc,
            version: Some(file.version),
            draft: tasks.into_vec(),
            seeded_from_fallback,
        });
        self.last_error = None;
        self.phase = SessionPhase::Ready;
        Ok(())
    }

    fn loaded_mut(&mut self) -> Result<&mut LoadedDocument, SessionError> {
        if self.phase == SessionPhase::Saving {
            return Err(SessionError::SaveInProgress);
        }
        self.loaded.as_mut().ok_or(SessionError::NotLoaded)
    }

    pub fn edit_task(&mut self, index: usize, text: impl Into<String>) -> Result<(), SessionError> {
        let loaded = self.loaded_mut()?;
        let slot = loaded
            .draft
            .get_mut(index)
            .ok_or(SessionError::IndexOutOfRange(index))?;
        *slot = text.into();
        self.saved = false;
        Ok(())
    }

    pub fn add_task(&mut self) -> Result<(), SessionError> {
        let loaded = self.loaded_mut()?;
        loaded.draft.push(String::new());
        self.saved = false;
        Ok(())
    }

    /// Removes a draft entry, shifting later indices down. Completion records
    /// for this week are index-keyed, so entries recorded against the old
    /// positions go stale once this is saved.
    pub fn remove_task(&mut self, index: usize) -> Result<(), SessionError> {
        let loaded = self.loaded_mut()?;
        if index >= loaded.draft.len() {
            return Err(SessionError::IndexOutOfRange(index));
        }
        loaded.draft.remove(index);
        self.saved = false;
        Ok(())
    }

    /// Conditional write of the full document with the week's list replaced
    /// by the draft, blanks filtered out. On rejection (including a version
    /// conflict) the token and draft are left untouched so a retry after a
    /// reload is non-destructive. On success the document is re-read for the
    /// fresh token; if that re-read fails the session keeps its saved state
    /// but cannot save again until reopened.
    pub async fn save(&mut self) -> Result<(), SessionError> {
        if self.phase == SessionPhase::Saving {
            return Err(SessionError::SaveInProgress);
        }
        let loaded = self.loaded.as_ref().ok_or(SessionError::NotLoaded)?;
        let Some(version) = loaded.version.clone() else {
            return Err(SessionError::StaleSession);
        };

        let filtered: Vec<String> = loaded
            .draft
            .iter()
            .filter(|t| !t.trim().is_empty())
            .cloned()
            .collect();
        let mut doc = loaded.doc.clone();
        doc.weekly_tasks.insert(week_key(self.week), filtered);
        let content = render_document(&doc)?;

        self.phase = SessionPhase::Saving;
        let write = self
            .store
            .write(&self.path, &content, &version, SAVE_MESSAGE)
            .await;
        self.phase = SessionPhase::Ready;

        if let Err(e) = write {
            warn!(path = %self.path, week = self.week, error = %e, "save rejected");
            self.last_error = Some(e.to_string());
            return Err(e.into());
        }

        info!(path = %self.path, week = self.week, "saved task list");
        self.saved = true;
        self.last_error = None;

        // The store mints a new token per write; re-read to pick it up.
        let loaded = self.loaded.as_mut().ok_or(SessionError::NotLoaded)?;
        loaded.doc = doc;
        match self.store.read(&self.path).await {
            Ok(file) => {
                if let Ok(fresh) = serde_json::from_str::<RoadmapDocument>(&file.content) {
                    loaded.doc = fresh;
                }
                loaded.version = Some(file.version);
                loaded.seeded_from_fallback = false;
            }
            Err(e) => {
                warn!(path = %self.path, error = %e, "token refresh failed after save");
                loaded.version = None;
                self.last_error = Some(e.to_string());
            }
        }
        Ok(())
    }
}

/// Documents are persisted pretty-printed with a trailing newline.
pub fn render_document(doc: &RoadmapDocument) -> Result<String, SessionError> {
    let mut content = serde_json::to_string_pretty(doc)
        .map_err(|e| SessionError::BadDocument(e.to_string()))?;
    content.push('\n');
    Ok(content)
}
