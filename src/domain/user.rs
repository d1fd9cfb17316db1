use super::{Snapshot, IDENTIFIER_LENGTH};
use crate::library::helpers::short_identifier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const IDENTIFIER_PREFIX: &str = "u";

/// Unique identifier of a user, e.g. `u_x8Fq2a`
pub type UserIdentifier = String;

/// Registered user, owned by the users service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier
    pub id: UserIdentifier,
    /// Display name
    pub name: String,
    /// Email address, unique across all users
    pub email: String,
    /// Point in time at which the user has been registered
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a new user with a freshly generated identifier
    pub fn new(details: UserDetails) -> Self {
        Self {
            id: short_identifier(IDENTIFIER_PREFIX, IDENTIFIER_LENGTH),
            name: details.name,
            email: details.email,
            created_at: Utc::now(),
        }
    }
}

impl Snapshot for User {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Mutable properties of a [`User`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDetails {
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
}

#[cfg(test)]
mod does {
    use super::*;

    #[test]
    fn serialize_with_camel_case_fields() {
        let user = User::new(UserDetails {
            name: "Ada".into(),
            email: "ada@example.com".into(),
        });

        let value = serde_json::to_value(&user).unwrap();

        assert!(user.id.starts_with("u_"));
        assert_eq!(user.id.len(), 8);
        assert!(value.get("createdAt").is_some());
        assert!(value.get("created_at").is_none());
    }
}
