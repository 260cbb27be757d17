//! User models
//!
//! Staff and clients share a common identity but carry different data, so
//! they are modeled as a tagged union rather than one loosely-typed record
//! with a discriminator column.

use serde::{Deserialize, Serialize};

/// Client billing category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientCategory {
    #[default]
    Individual,
    /// Billed by invoice; never eligible for online payment
    Corporate,
}

/// Staff role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StaffRole {
    #[default]
    Coordinator,
    Admin,
}

/// Staff user acting on orders and applications
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StaffUser {
    pub id: String,
    pub name: String,
    pub role: StaffRole,
}

/// Client account as persisted in the client registry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientAccount {
    pub id: String,
    pub name: String,
    /// Unique lookup key in the registry
    pub email: String,
    pub phone: Option<String>,
    pub category: ClientCategory,
    /// Argon2 hash; never the plaintext credential
    pub password_hash: String,
    /// Set when the account was auto-created with a temporary credential
    pub temporary_password: bool,
    pub created_at: i64,
}

/// Any user known to the system
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum User {
    Staff(StaffUser),
    Client(ClientAccount),
}

impl User {
    /// Common identity shared by both variants
    pub fn id(&self) -> &str {
        match self {
            Self::Staff(s) => &s.id,
            Self::Client(c) => &c.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Staff(s) => &s.name,
            Self::Client(c) => &c.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_tagged_serialization() {
        let user = User::Staff(StaffUser {
            id: "staff-1".to_string(),
            name: "Ana".to_string(),
            role: StaffRole::Coordinator,
        });
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("\"kind\":\"STAFF\""));

        let back: User = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id(), "staff-1");
    }

    #[test]
    fn test_corporate_category_roundtrip() {
        let json = serde_json::to_string(&ClientCategory::Corporate).unwrap();
        assert_eq!(json, "\"CORPORATE\"");
    }
}
