//! Durable homes for the session token.

use std::sync::{Arc, Mutex, PoisonError};

pub type StorageResult<T> = Result<T, String>;

/// Single-key durable storage for the raw token string.
pub trait TokenStorage: Send + Sync + 'static {
    fn load_token(&self) -> StorageResult<Option<String>>;
    fn save_token(&self, token: &str) -> StorageResult<()>;
    fn clear_token(&self) -> StorageResult<()>;
}

/// In-process storage; clones share one slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStorage {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryTokenStorage {
    #[must_use]
    pub fn with_token(token: &str) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(token.to_string()))),
        }
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn load_token(&self) -> StorageResult<Option<String>> {
        let guard = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(guard
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(ToString::to_string))
    }

    fn save_token(&self, token: &str) -> StorageResult<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn clear_token(&self) -> StorageResult<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
