//! User profile model for storage and API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Coarse authorization tag. Only `Admin` may mutate events.
///
/// Anything other than `"admin"` (including a missing field) reads as `User`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Option<String>")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl From<Option<String>> for Role {
    fn from(value: Option<String>) -> Self {
        match value.as_deref() {
            Some("admin") => Role::Admin,
            _ => Role::User,
        }
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

/// User profile stored in Firestore (`users/{uid}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    /// Cached mirror of the provider's verification flag
    pub is_verified: bool,
    /// Event ids; may reference deleted events
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub favorite_events: Vec<String>,
}

impl UserProfile {
    /// Initial profile written at sign-up.
    pub fn new_signup(first_name: &str, last_name: &str, email: &str) -> Self {
        Self {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            role: Role::User,
            is_verified: false,
            favorite_events: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_defaults_to_user() {
        let profile: UserProfile =
            serde_json::from_value(serde_json::json!({ "firstName": "Ada" })).unwrap();
        assert_eq!(profile.role, Role::User);
        assert!(!profile.is_verified);
        assert!(profile.favorite_events.is_empty());

        let profile: UserProfile =
            serde_json::from_value(serde_json::json!({ "role": "superuser" })).unwrap();
        assert_eq!(profile.role, Role::User);
    }

    #[test]
    fn test_admin_role_and_camel_case_fields() {
        let profile: UserProfile = serde_json::from_value(serde_json::json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.com",
            "role": "admin",
            "isVerified": true,
            "favoriteEvents": ["e1", "e2"],
        }))
        .unwrap();

        assert_eq!(profile.role, Role::Admin);
        assert!(profile.is_verified);
        assert_eq!(profile.favorite_events, vec!["e1", "e2"]);
        assert!(Role::Admin > Role::User);
    }

    #[test]
    fn test_signup_profile_serialization() {
        let value =
            serde_json::to_value(UserProfile::new_signup("Ada", "Lovelace", "a@b.com")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "firstName": "Ada",
                "lastName": "Lovelace",
                "email": "a@b.com",
                "role": "user",
                "isVerified": false,
            })
        );
    }
}
