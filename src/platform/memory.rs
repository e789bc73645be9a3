//! In-process platform.
//!
//! Mirrors the subset of platform behavior onboarding relies on: unique
//! account emails, unique document IDs, and optional unique attributes per
//! collection (the equivalent of a unique index). Recovery requests are
//! recorded instead of mailed.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{Account, Document, DocumentList, Permission, Platform, Query};
use crate::error::PlatformError;

type CollectionKey = (String, String);

/// A recovery email the platform accepted for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryRequest {
    pub email: String,
    pub url: String,
}

#[derive(Default)]
struct MemoryState {
    collections: HashMap<CollectionKey, Vec<Document>>,
    accounts: Vec<Account>,
    recoveries: Vec<RecoveryRequest>,
}

/// Platform kept entirely in memory.
#[derive(Default)]
pub struct InMemoryPlatform {
    state: RwLock<MemoryState>,
    unique_attributes: HashMap<CollectionKey, HashSet<String>>,
}

fn api_error(status: u16, kind: &str, message: &str) -> PlatformError {
    PlatformError::Api {
        status,
        kind: kind.to_string(),
        message: message.to_string(),
    }
}

impl InMemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject documents in the collection whose `attribute` equals that of
    /// an existing document.
    pub fn with_unique_attribute(
        mut self,
        database_id: &str,
        collection_id: &str,
        attribute: &str,
    ) -> Self {
        self.unique_attributes
            .entry((database_id.to_string(), collection_id.to_string()))
            .or_default()
            .insert(attribute.to_string());
        self
    }

    pub async fn documents(&self, database_id: &str, collection_id: &str) -> Vec<Document> {
        let state = self.state.read().await;
        state
            .collections
            .get(&(database_id.to_string(), collection_id.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    pub async fn accounts(&self) -> Vec<Account> {
        self.state.read().await.accounts.clone()
    }

    pub async fn recoveries(&self) -> Vec<RecoveryRequest> {
        self.state.read().await.recoveries.clone()
    }
}

#[async_trait]
impl Platform for InMemoryPlatform {
    async fn list_documents(
        &self,
        database_id: &str,
        collection_id: &str,
        queries: &[Query],
    ) -> Result<DocumentList, PlatformError> {
        let state = self.state.read().await;
        let documents: Vec<Document> = state
            .collections
            .get(&(database_id.to_string(), collection_id.to_string()))
            .map(|docs| {
                docs.iter()
                    .filter(|doc| queries.iter().all(|q| q.matches(&doc.data)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        Ok(DocumentList {
            total: documents.len() as u64,
            documents,
        })
    }

    async fn create_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
        data: serde_json::Value,
        permissions: &[Permission],
    ) -> Result<Document, PlatformError> {
        let serde_json::Value::Object(mut data) = data else {
            return Err(api_error(
                400,
                "document_invalid_structure",
                "Invalid document structure: document data must be an object.",
            ));
        };

        let key = (database_id.to_string(), collection_id.to_string());
        let mut state = self.state.write().await;
        let docs = state.collections.entry(key.clone()).or_default();

        if docs.iter().any(|d| d.id == document_id) {
            return Err(api_error(
                409,
                "document_already_exists",
                "Document with the requested ID already exists.",
            ));
        }

        if let Some(unique) = self.unique_attributes.get(&key) {
            let collides = docs.iter().any(|existing| {
                unique.iter().any(|attr| {
                    data.get(attr)
                        .filter(|v| !v.is_null())
                        .is_some_and(|v| existing.data.get(attr) == Some(v))
                })
            });
            if collides {
                return Err(api_error(
                    409,
                    "document_already_exists",
                    "Document with the requested unique attributes already exists.",
                ));
            }
        }

        data.insert(
            "$createdAt".to_string(),
            serde_json::Value::String(Utc::now().to_rfc3339()),
        );

        let doc = Document {
            id: document_id.to_string(),
            permissions: permissions.iter().map(ToString::to_string).collect(),
            data,
        };
        docs.push(doc.clone());
        Ok(doc)
    }

    async fn delete_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
    ) -> Result<(), PlatformError> {
        let mut state = self.state.write().await;
        let docs = state
            .collections
            .get_mut(&(database_id.to_string(), collection_id.to_string()));

        match docs.and_then(|docs| {
            docs.iter()
                .position(|d| d.id == document_id)
                .map(|idx| docs.remove(idx))
        }) {
            Some(_) => Ok(()),
            None => Err(api_error(
                404,
                "document_not_found",
                "Document with the requested ID could not be found.",
            )),
        }
    }

    async fn create_account(
        &self,
        user_id: &str,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Account, PlatformError> {
        if !email.contains('@') {
            return Err(api_error(
                400,
                "general_argument_invalid",
                "Invalid `email` param: Value must be a valid email address",
            ));
        }
        if password.len() < 8 {
            return Err(api_error(
                400,
                "general_argument_invalid",
                "Invalid `password` param: Password must be at least 8 characters",
            ));
        }

        let mut state = self.state.write().await;
        if state
            .accounts
            .iter()
            .any(|a| a.id == user_id || a.email.eq_ignore_ascii_case(email))
        {
            return Err(api_error(
                409,
                "user_already_exists",
                "A user with the same id, email, or phone already exists in this project.",
            ));
        }

        let account = Account {
            id: user_id.to_string(),
            email: email.to_string(),
            name: name.to_string(),
        };
        state.accounts.push(account.clone());
        Ok(account)
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), PlatformError> {
        let mut state = self.state.write().await;
        let before = state.accounts.len();
        state.accounts.retain(|a| a.id != user_id);
        if state.accounts.len() == before {
            return Err(api_error(
                404,
                "user_not_found",
                "User with the requested ID could not be found.",
            ));
        }
        Ok(())
    }

    async fn create_recovery(&self, email: &str, url: &str) -> Result<(), PlatformError> {
        let mut state = self.state.write().await;
        if !state
            .accounts
            .iter()
            .any(|a| a.email.eq_ignore_ascii_case(email))
        {
            return Err(api_error(
                404,
                "user_not_found",
                "User with the requested ID could not be found.",
            ));
        }

        tracing::info!(email, url, "Recovery email queued (in-memory platform)");
        state.recoveries.push(RecoveryRequest {
            email: email.to_string(),
            url: url.to_string(),
        });
        Ok(())
    }
}
