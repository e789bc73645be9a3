//! Appwrite REST client.
//!
//! Talks to the server-side REST API with the project ID and an API key in
//! the request headers. Only the handful of endpoints onboarding needs are
//! covered.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::{Account, Document, DocumentList, Permission, Platform, Query};
use crate::config::OnboardConfig;
use crate::error::PlatformError;

/// Error body returned by the platform on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    #[serde(rename = "type", default)]
    kind: String,
}

/// Appwrite REST client.
pub struct AppwriteClient {
    endpoint: String,
    project_id: String,
    api_key: SecretString,
    client: reqwest::Client,
}

impl AppwriteClient {
    pub fn new(endpoint: &str, project_id: &str, api_key: SecretString) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            project_id: project_id.to_string(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &OnboardConfig) -> Self {
        Self::new(
            &config.endpoint,
            &config.project_id,
            config.api_key.clone(),
        )
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{path}", self.endpoint)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.api_url(path))
            .header("X-Appwrite-Project", &self.project_id)
            .header("X-Appwrite-Key", self.api_key.expose_secret())
    }

    fn documents_path(database_id: &str, collection_id: &str) -> String {
        format!("/databases/{database_id}/collections/{collection_id}/documents")
    }

    /// Send a request and return the raw response if it succeeded.
    async fn execute(
        &self,
        operation: &str,
        builder: RequestBuilder,
    ) -> Result<reqwest::Response, PlatformError> {
        let resp = builder.send().await.map_err(|e| PlatformError::Request {
            operation: operation.to_string(),
            reason: e.to_string(),
        })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let text = resp.text().await.unwrap_or_default();
        let (kind, message) = match serde_json::from_str::<ApiErrorBody>(&text) {
            Ok(body) => (body.kind, body.message),
            Err(_) if text.trim().is_empty() => (
                String::new(),
                format!("{operation} failed with status {status}"),
            ),
            Err(_) => (String::new(), text),
        };

        tracing::debug!(
            operation,
            status = status.as_u16(),
            kind = %kind,
            "Platform call rejected"
        );

        Err(PlatformError::Api {
            status: status.as_u16(),
            kind,
            message,
        })
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        builder: RequestBuilder,
    ) -> Result<T, PlatformError> {
        let resp = self.execute(operation, builder).await?;
        resp.json::<T>()
            .await
            .map_err(|e| PlatformError::InvalidResponse {
                operation: operation.to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl Platform for AppwriteClient {
    async fn list_documents(
        &self,
        database_id: &str,
        collection_id: &str,
        queries: &[Query],
    ) -> Result<DocumentList, PlatformError> {
        let params: Vec<(&str, String)> = queries
            .iter()
            .map(|q| ("queries[]", q.to_string()))
            .collect();

        let builder = self
            .request(
                Method::GET,
                &Self::documents_path(database_id, collection_id),
            )
            .query(&params);

        self.execute_json("list_documents", builder).await
    }

    async fn create_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
        data: serde_json::Value,
        permissions: &[Permission],
    ) -> Result<Document, PlatformError> {
        let body = serde_json::json!({
            "documentId": document_id,
            "data": data,
            "permissions": permissions.iter().map(ToString::to_string).collect::<Vec<_>>(),
        });

        let builder = self
            .request(
                Method::POST,
                &Self::documents_path(database_id, collection_id),
            )
            .json(&body);

        self.execute_json("create_document", builder).await
    }

    async fn delete_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
    ) -> Result<(), PlatformError> {
        let path = format!(
            "{}/{document_id}",
            Self::documents_path(database_id, collection_id)
        );
        self.execute("delete_document", self.request(Method::DELETE, &path))
            .await?;
        Ok(())
    }

    async fn create_account(
        &self,
        user_id: &str,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Account, PlatformError> {
        let body = serde_json::json!({
            "userId": user_id,
            "email": email,
            "password": password,
            "name": name,
        });

        let builder = self.request(Method::POST, "/account").json(&body);
        self.execute_json("create_account", builder).await
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), PlatformError> {
        let path = format!("/users/{user_id}");
        self.execute("delete_user", self.request(Method::DELETE, &path))
            .await?;
        Ok(())
    }

    async fn create_recovery(&self, email: &str, url: &str) -> Result<(), PlatformError> {
        let body = serde_json::json!({
            "email": email,
            "url": url,
        });

        let builder = self.request(Method::POST, "/account/recovery").json(&body);
        self.execute("create_recovery", builder).await?;
        Ok(())
    }
}
