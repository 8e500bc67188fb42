//! HTTP client for the managed document database REST API

use super::{Direction, DocumentStore, OrderBy, RawDocument, StoreError};
use crate::config::DocumentStoreConfig;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

/// REST-backed document store client
///
/// Collections live under `{base_url}/collections/{name}/documents`.
/// The store assigns document ids on create and supports optional
/// server-side ordering via `order_by`/`direction` query parameters;
/// ordering on an unindexed field is rejected with 412, which this
/// client maps to `StoreError::PreconditionFailed`.
#[derive(Clone)]
pub struct HttpDocumentStore {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct ListResponse {
    documents: Vec<RawDocument>,
}

#[derive(Deserialize)]
struct CreateResponse {
    id: String,
}

impl HttpDocumentStore {
    /// Create a client from configuration
    pub fn new(config: &DocumentStoreConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Unavailable {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/collections/{}/documents", self.base_url, collection)
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}", self.collection_url(collection), id)
    }

    fn with_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }

    fn map_status(status: StatusCode, body: String) -> StoreError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::PermissionDenied {
                message: body,
            },
            StatusCode::PRECONDITION_FAILED => StoreError::PreconditionFailed { message: body },
            _ => StoreError::Unavailable {
                message: format!("{}: {}", status, body),
            },
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Self::map_status(status, body))
    }

    fn transport(err: reqwest::Error) -> StoreError {
        StoreError::Unavailable {
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn list(
        &self,
        collection: &str,
        order: Option<OrderBy>,
    ) -> Result<Vec<RawDocument>, StoreError> {
        let mut req = self.client.get(self.collection_url(collection));

        if let Some(order) = order {
            let direction = match order.direction {
                Direction::Ascending => "asc",
                Direction::Descending => "desc",
            };
            req = req.query(&[("order_by", order.field.as_str()), ("direction", direction)]);
        }

        let response = self
            .with_auth(req)
            .send()
            .await
            .map_err(Self::transport)?;

        let body: ListResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Malformed {
                message: e.to_string(),
            })?;

        Ok(body.documents)
    }

    async fn create(
        &self,
        collection: &str,
        fields: serde_json::Value,
    ) -> Result<String, StoreError> {
        let response = self
            .with_auth(self.client.post(self.collection_url(collection)))
            .json(&fields)
            .send()
            .await
            .map_err(Self::transport)?;

        let body: CreateResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Malformed {
                message: e.to_string(),
            })?;

        Ok(body.id)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: serde_json::Value,
    ) -> Result<(), StoreError> {
        let response = self
            .with_auth(self.client.patch(self.document_url(collection, id)))
            .json(&fields)
            .send()
            .await
            .map_err(Self::transport)?;

        Self::check(response).await.map(|_| ())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let response = self
            .with_auth(self.client.delete(self.document_url(collection, id)))
            .send()
            .await
            .map_err(Self::transport)?;

        Self::check(response).await.map(|_| ())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(Self::transport)?;

        Self::check(response).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            HttpDocumentStore::map_status(StatusCode::FORBIDDEN, "nope".into()),
            StoreError::PermissionDenied { .. }
        ));
        assert!(matches!(
            HttpDocumentStore::map_status(StatusCode::PRECONDITION_FAILED, "no index".into()),
            StoreError::PreconditionFailed { .. }
        ));
        assert!(matches!(
            HttpDocumentStore::map_status(StatusCode::INTERNAL_SERVER_ERROR, "boom".into()),
            StoreError::Unavailable { .. }
        ));
    }

    #[test]
    fn test_url_construction() {
        let store = HttpDocumentStore::new(&DocumentStoreConfig {
            base_url: "http://docs.example/".to_string(),
            api_key: None,
            timeout_secs: 5,
        })
        .unwrap();

        assert_eq!(
            store.collection_url("award_prize"),
            "http://docs.example/collections/award_prize/documents"
        );
        assert_eq!(
            store.document_url("council", "doc-7"),
            "http://docs.example/collections/council/documents/doc-7"
        );
    }
}
