//! Backend platform abstraction.
//!
//! The onboarding flow talks to an Appwrite-style backend-as-a-service
//! through the [`Platform`] trait: a document database, an account
//! service, and the recovery mail flow. [`AppwriteClient`] speaks the REST
//! API; [`InMemoryPlatform`] keeps everything in process.

pub mod appwrite;
pub mod memory;

pub use appwrite::AppwriteClient;
pub use memory::InMemoryPlatform;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PlatformError;

/// Generate a platform-compatible unique ID (32 lowercase hex chars).
pub fn unique_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// A single filter for `list_documents`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub method: String,
    pub attribute: String,
    pub values: Vec<serde_json::Value>,
}

impl Query {
    /// Exact-match filter on `attribute`.
    pub fn equal(attribute: &str, value: impl Into<serde_json::Value>) -> Self {
        Self {
            method: "equal".to_string(),
            attribute: attribute.to_string(),
            values: vec![value.into()],
        }
    }

    /// Whether a document field satisfies this filter.
    pub fn matches(&self, data: &serde_json::Map<String, serde_json::Value>) -> bool {
        match self.method.as_str() {
            "equal" => data
                .get(&self.attribute)
                .is_some_and(|field| self.values.iter().any(|v| v == field)),
            _ => false,
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// Principal a permission is granted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    User(String),
    Team(String),
}

impl Role {
    pub fn user(id: impl Into<String>) -> Self {
        Self::User(id.into())
    }

    pub fn team(name: impl Into<String>) -> Self {
        Self::Team(name.into())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user:{id}"),
            Self::Team(name) => write!(f, "team:{name}"),
        }
    }
}

/// Access grant attached to a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Permission {
    Read(Role),
    Update(Role),
    Delete(Role),
}

impl Permission {
    pub fn read(role: Role) -> Self {
        Self::Read(role)
    }

    pub fn update(role: Role) -> Self {
        Self::Update(role)
    }

    pub fn delete(role: Role) -> Self {
        Self::Delete(role)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(role) => write!(f, "read(\"{role}\")"),
            Self::Update(role) => write!(f, "update(\"{role}\")"),
            Self::Delete(role) => write!(f, "delete(\"{role}\")"),
        }
    }
}

/// A stored document as returned by the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$permissions", default)]
    pub permissions: Vec<String>,
    #[serde(flatten)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

/// Result page of a document listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentList {
    pub total: u64,
    pub documents: Vec<Document>,
}

/// An authentication identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "$id")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
}

/// Operations the onboarding flow needs from the backend platform.
#[async_trait]
pub trait Platform: Send + Sync {
    /// List documents in a collection matching every query.
    async fn list_documents(
        &self,
        database_id: &str,
        collection_id: &str,
        queries: &[Query],
    ) -> Result<DocumentList, PlatformError>;

    /// Create a document with an explicit ID and permission list.
    async fn create_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
        data: serde_json::Value,
        permissions: &[Permission],
    ) -> Result<Document, PlatformError>;

    async fn delete_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
    ) -> Result<(), PlatformError>;

    /// Register a new authentication identity.
    async fn create_account(
        &self,
        user_id: &str,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Account, PlatformError>;

    /// Remove an authentication identity.
    async fn delete_user(&self, user_id: &str) -> Result<(), PlatformError>;

    /// Ask the platform to mail a password-recovery link to `email`.
    ///
    /// Success only means the message was accepted for delivery.
    async fn create_recovery(&self, email: &str, url: &str) -> Result<(), PlatformError>;
}
