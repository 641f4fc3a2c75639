//! Long-lived editing context.
//!
//! # Responsibility
//! - Own the document, the host-level undo facility and the configuration
//!   for one open task graph.
//! - Provide the explicit save/discard boundary to the persistence layer.
//!
//! # Invariants
//! - Created on launch, kept for the lifetime of the editing surface and
//!   dropped on shutdown; never a process-wide singleton.
//! - Saving and discarding happen only when the caller asks.
//! - `discard` clears both undo stacks together.

use crate::config::{ConfigError, CoreConfig};
use crate::graph::{Document, Store};
use crate::repo::document_repo::{DocumentRepoError, DocumentRepoResult, DocumentRepository};
use crate::undo::{UndoFacility, UndoStack};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Host-level undo facility type.
pub type HostUndo = Box<dyn UndoFacility<Document>>;

/// Errors from opening a session.
#[derive(Debug)]
pub enum SessionError {
    /// Configuration failed validation.
    Config(ConfigError),
    /// Saved snapshot could not be loaded.
    Repo(DocumentRepoError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<ConfigError> for SessionError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DocumentRepoError> for SessionError {
    fn from(value: DocumentRepoError) -> Self {
        Self::Repo(value)
    }
}

/// Editing context passed to every task operation.
pub struct Session {
    document: Document,
    host_undo: Option<HostUndo>,
    config: CoreConfig,
}

impl Session {
    /// Creates a session over `document` with an explicit host facility.
    ///
    /// # Errors
    /// Returns the validation error when `config` is invalid.
    pub fn new(
        document: Document,
        host_undo: Option<HostUndo>,
        config: CoreConfig,
    ) -> Result<Self, ConfigError> {
        config.validate().map_err(|err| {
            error!("event=session_open module=session status=error error_code=invalid_config error={err}");
            err
        })?;
        Ok(Self {
            document,
            host_undo,
            config,
        })
    }

    /// Creates an empty session with linear undo stacks on both tiers.
    pub fn in_memory(config: CoreConfig) -> Result<Self, ConfigError> {
        Self::new(
            Document::new(),
            Some(Box::new(UndoStack::new())),
            config,
        )
    }

    /// Loads the last saved snapshot and wraps it in a tracked session.
    pub fn from_repository(
        repo: &impl DocumentRepository,
        config: CoreConfig,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let store = repo.load()?;
        let document = Document::with_store(store, Some(Box::new(UndoStack::<Store>::new())));
        Ok(Self::new(
            document,
            Some(Box::new(UndoStack::new())),
            config,
        )?)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn host_undo(&self) -> Option<&dyn UndoFacility<Document>> {
        self.host_undo.as_deref()
    }

    /// Split borrow used by commands that run through `run_undoable`.
    pub(crate) fn parts_mut(
        &mut self,
    ) -> (&mut Document, Option<&mut dyn UndoFacility<Document>>) {
        let host = match self.host_undo.as_deref_mut() {
            Some(host) => Some(host as &mut dyn UndoFacility<Document>),
            None => None,
        };
        (&mut self.document, host)
    }

    /// Undoes the most recent host-level transaction.
    pub fn undo(&mut self) {
        if let Some(host) = self.host_undo.as_deref_mut() {
            host.undo(&mut self.document);
        }
    }

    /// Redoes the most recently undone host-level transaction.
    pub fn redo(&mut self) {
        if let Some(host) = self.host_undo.as_deref_mut() {
            host.redo(&mut self.document);
        }
    }

    pub fn can_undo(&self) -> bool {
        self.host_undo
            .as_deref()
            .is_some_and(|host| host.undo_depth() > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.host_undo
            .as_deref()
            .is_some_and(|host| host.redo_depth() > 0)
    }

    pub fn undo_label(&self) -> Option<&str> {
        self.host_undo.as_deref().and_then(|host| host.undo_label())
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.host_undo.as_deref().and_then(|host| host.redo_label())
    }

    /// Whether the document has unsaved changes.
    pub fn has_changes(&self) -> bool {
        self.document.has_changes()
    }

    /// Writes the document snapshot and clears the pending-changes flag.
    ///
    /// Undo history is kept, so a saved change can still be undone (which
    /// marks the document as changed again).
    pub fn save(&mut self, repo: &impl DocumentRepository) -> DocumentRepoResult<()> {
        repo.save(self.document.store())?;
        self.document.mark_saved();
        info!("event=session_save module=session status=ok");
        Ok(())
    }

    /// Reverts to the last saved snapshot and forgets undo history on both
    /// tiers.
    pub fn discard(&mut self, repo: &impl DocumentRepository) -> DocumentRepoResult<()> {
        let store = repo.load()?;
        self.document.replace_store(store);
        if let Some(host) = self.host_undo.as_deref_mut() {
            host.clear();
        }
        info!("event=session_discard module=session status=ok");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Session;
    use crate::config::{ConfigError, CoreConfig};

    #[test]
    fn invalid_spacing_is_rejected_at_construction() {
        for spacing in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = CoreConfig {
                priority_spacing: spacing,
                ..CoreConfig::default()
            };
            let err = Session::in_memory(config).err().unwrap();
            assert!(matches!(err, ConfigError::InvalidSpacing(_)));
        }
    }

    #[test]
    fn default_config_opens_tracked_session() {
        let session = Session::in_memory(CoreConfig::default()).unwrap();
        assert!(session.document().is_tracked());
        assert!(!session.can_undo());
    }
}
