//! Signed-in user profile

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireProfile")]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// Profile as the backend sends it, with either or both id keys.
#[derive(Deserialize)]
struct WireProfile {
    #[serde(rename = "_id")]
    document_id: Option<String>,
    id: Option<String>,
    #[serde(default)]
    username: Option<String>,
}

impl TryFrom<WireProfile> for UserProfile {
    type Error = String;

    fn try_from(wire: WireProfile) -> Result<Self, Self::Error> {
        let id = wire
            .document_id
            .or(wire.id)
            .ok_or_else(|| "user profile is missing its id".to_string())?;
        Ok(Self {
            id,
            username: wire.username,
        })
    }
}

impl UserProfile {
    /// Name shown next to the logout action.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or("Unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_mongo_style_id() {
        let profile: UserProfile =
            serde_json::from_str(r#"{"_id":"u1","username":"ana"}"#).unwrap();
        assert_eq!(profile.id, "u1");
        assert_eq!(profile.display_name(), "ana");
    }

    #[test]
    fn payload_with_both_id_keys_parses() {
        let profile: UserProfile =
            serde_json::from_str(r#"{"_id":"u1","id":"u1","username":"ana"}"#).unwrap();
        assert_eq!(profile.id, "u1");
    }

    #[test]
    fn profile_without_id_is_rejected() {
        assert!(serde_json::from_str::<UserProfile>(r#"{"username":"ana"}"#).is_err());
    }

    #[test]
    fn missing_username_displays_unknown() {
        let profile: UserProfile = serde_json::from_str(r#"{"id":"u1"}"#).unwrap();
        assert_eq!(profile.display_name(), "Unknown");
    }
}
