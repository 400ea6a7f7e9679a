//! Diary entry model

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Server-assigned entry identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntryId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A diary entry as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireEntry")]
pub struct DiaryEntry {
    /// Unique identifier, assigned by the server
    #[serde(rename = "_id")]
    pub id: EntryId,
    pub title: String,
    pub description: String,
    /// Asset URLs in upload order
    #[serde(default)]
    pub media: Vec<String>,
    /// Creation timestamp, assigned by the server
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Entry as it arrives on the wire. Documents may carry `_id`, `id` or both;
/// `_id` wins.
#[derive(Deserialize)]
struct WireEntry {
    #[serde(rename = "_id")]
    document_id: Option<EntryId>,
    id: Option<EntryId>,
    title: String,
    description: String,
    #[serde(default)]
    media: Vec<String>,
    #[serde(rename = "createdAt")]
    created_at: DateTime<Utc>,
}

impl TryFrom<WireEntry> for DiaryEntry {
    type Error = String;

    fn try_from(wire: WireEntry) -> std::result::Result<Self, Self::Error> {
        let id = wire
            .document_id
            .or(wire.id)
            .ok_or_else(|| "entry is missing its id".to_string())?;
        Ok(Self {
            id,
            title: wire.title,
            description: wire.description,
            media: wire.media,
            created_at: wire.created_at,
        })
    }
}

impl DiaryEntry {
    /// Check the invariants the client relies on for server-provided entries.
    pub fn validate(&self) -> Result<()> {
        if self.id.as_str().trim().is_empty() {
            return Err(Error::MalformedResponse(
                "entry is missing its id".to_string(),
            ));
        }
        Ok(())
    }

    /// Creation date in the `dd/MM/yyyy` form used by the entry list.
    #[must_use]
    pub fn created_label(&self) -> String {
        self.created_at.format("%d/%m/%Y").to_string()
    }
}

/// User-editable fields of an entry, validated before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryFields {
    pub title: String,
    pub description: String,
}

impl EntryFields {
    /// Build fields, rejecting an empty title or description.
    pub fn new(title: &str, description: &str) -> Result<Self> {
        if title.trim().is_empty() || description.trim().is_empty() {
            return Err(Error::InvalidInput(
                "Title and Description are required.".to_string(),
            ));
        }
        Ok(Self {
            title: title.to_string(),
            description: description.to_string(),
        })
    }
}
