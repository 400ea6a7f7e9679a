use std::io;

use thiserror::Error;

use crate::config_profiles::ProfileFileError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] diary_core::Error),
    /// Controller action whose failure was already shown as a notification.
    #[error(transparent)]
    Notified(diary_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Profile config: {0}")]
    Profiles(#[from] ProfileFileError),
    #[error("Entry ID cannot be empty")]
    EmptyEntryId,
    #[error("Search term cannot be empty")]
    EmptySearchTerm,
    #[error("Entry not found for id/prefix: {0}")]
    EntryNotFound(String),
    #[error("{0}")]
    AmbiguousEntryId(String),
    #[error("Nothing to change: pass --title and/or --description")]
    NothingToEdit,
    #[error("Not signed in. Run `diary auth login` first.")]
    NotSignedIn,
    /// The entry list failed to load; the notifier already said why.
    #[error("Entries could not be loaded")]
    EntriesUnavailable,
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CliError {
    /// True when the user has already seen this failure.
    pub const fn is_reported(&self) -> bool {
        matches!(self, Self::Notified(_) | Self::EntriesUnavailable)
    }
}
