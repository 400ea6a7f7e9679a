//! Session token persistence in the OS keychain, one entry per profile.

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Mutex, OnceLock, PoisonError};

#[cfg(not(test))]
use keyring::Entry;

use diary_core::session::{StorageResult, TokenStorage};

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "diary-cli";

#[derive(Debug, Clone)]
pub struct KeyringTokenStorage {
    username: String,
}

impl KeyringTokenStorage {
    pub fn for_profile(profile_name: &str) -> Self {
        Self {
            username: format!("token:{profile_name}"),
        }
    }

    #[cfg(test)]
    fn test_store() -> &'static Mutex<HashMap<String, String>> {
        static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
        STORE.get_or_init(|| Mutex::new(HashMap::new()))
    }

    #[cfg(not(test))]
    fn entry(&self) -> StorageResult<Entry> {
        Entry::new(KEYRING_SERVICE_NAME, &self.username).map_err(|error| error.to_string())
    }
}

impl TokenStorage for KeyringTokenStorage {
    #[cfg(not(test))]
    fn load_token(&self) -> StorageResult<Option<String>> {
        match self.entry()?.get_password() {
            Ok(raw) => Ok(Some(raw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(error.to_string()),
        }
    }

    #[cfg(test)]
    fn load_token(&self) -> StorageResult<Option<String>> {
        let guard = Self::test_store()
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(guard.get(&self.username).cloned())
    }

    #[cfg(not(test))]
    fn save_token(&self, token: &str) -> StorageResult<()> {
        self.entry()?
            .set_password(token)
            .map_err(|error| error.to_string())
    }

    #[cfg(test)]
    fn save_token(&self, token: &str) -> StorageResult<()> {
        Self::test_store()
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(self.username.clone(), token.to_string());
        Ok(())
    }

    #[cfg(not(test))]
    fn clear_token(&self) -> StorageResult<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(error.to_string()),
        }
    }

    #[cfg(test)]
    fn clear_token(&self) -> StorageResult<()> {
        Self::test_store()
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.username);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use diary_core::session::SessionManager;

    use super::*;

    #[test]
    fn profiles_get_separate_tokens() {
        let work = KeyringTokenStorage::for_profile("token-store-work");
        let home = KeyringTokenStorage::for_profile("token-store-home");

        work.save_token("work-token").unwrap();
        assert_eq!(work.load_token().unwrap().as_deref(), Some("work-token"));
        assert_eq!(home.load_token().unwrap(), None);

        work.clear_token().unwrap();
        assert_eq!(work.load_token().unwrap(), None);
    }

    #[test]
    fn session_manager_reads_stored_token() {
        let storage = KeyringTokenStorage::for_profile("token-store-session");
        storage.save_token("abc").unwrap();

        let session = SessionManager::new(storage.clone());
        assert!(session.is_authenticated());

        session.clear();
        assert_eq!(storage.load_token().unwrap(), None);
    }
}
