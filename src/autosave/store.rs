use crate::api::ApiError;
use thiserror::Error;

/// A persisted prose document as the editor sees it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Document {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub body: String,
    /// Writer allowed to edit alongside the project owner.
    pub assigned_to: Option<String>,
    pub updated_at: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct DocumentUpdate {
    pub body: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub(crate) enum StoreError {
    #[error("You don't have permission to change this document")]
    AuthorizationDenied,
    #[error("Document not found")]
    NotFound,
    #[error("Could not save: {0}")]
    TransientWriteFailure(String),
}

impl From<ApiError> for StoreError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Unauthorized | ApiError::Forbidden(_) => Self::AuthorizationDenied,
            ApiError::NotFound(_) => Self::NotFound,
            other => Self::TransientWriteFailure(other.to_string()),
        }
    }
}

/// Remote home of a document body. Each `update` is an unconditional overwrite.
pub(crate) trait ContentStore {
    async fn fetch(&self, document_id: &str) -> Result<Document, StoreError>;

    async fn update(&self, document_id: &str, update: DocumentUpdate) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_maps_to_store_taxonomy() {
        assert_eq!(
            StoreError::from(ApiError::Unauthorized),
            StoreError::AuthorizationDenied
        );
        assert_eq!(
            StoreError::from(ApiError::Forbidden("rls".into())),
            StoreError::AuthorizationDenied
        );
        assert_eq!(
            StoreError::from(ApiError::NotFound("phases".into())),
            StoreError::NotFound
        );
        assert!(matches!(
            StoreError::from(ApiError::Network("offline".into())),
            StoreError::TransientWriteFailure(_)
        ));
        assert!(matches!(
            StoreError::from(ApiError::Http {
                status: 500,
                body: "boom".into()
            }),
            StoreError::TransientWriteFailure(m) if m.contains("boom")
        ));
    }
}
