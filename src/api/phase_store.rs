use super::ApiClient;
use crate::autosave::{ContentStore, Document, DocumentUpdate, StoreError};
use crate::models::Phase;

impl From<Phase> for Document {
    fn from(p: Phase) -> Self {
        Self {
            id: p.id,
            title: p.title,
            description: p.description,
            body: p.content.unwrap_or_default(),
            assigned_to: p.assigned_to,
            updated_at: p.updated_at.unwrap_or_default(),
        }
    }
}

/// Phases table as the editor's content store.
#[derive(Clone)]
pub(crate) struct PhaseStore {
    client: ApiClient,
}

impl PhaseStore {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

impl ContentStore for PhaseStore {
    async fn fetch(&self, document_id: &str) -> Result<Document, StoreError> {
        Ok(self.client.get_phase(document_id).await?.into())
    }

    async fn update(&self, document_id: &str, update: DocumentUpdate) -> Result<(), StoreError> {
        let rows = self
            .client
            .update_phase_content(document_id, &update.body, &update.updated_at)
            .await?;
        if rows.is_empty() {
            // Row-level security hid the row from the write.
            return Err(StoreError::AuthorizationDenied);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_to_document_defaults_missing_content() {
        let phase = Phase {
            id: "ph1".into(),
            module_id: "m1".into(),
            title: "Prologue".into(),
            description: Some("Set the scene".into()),
            content: None,
            assigned_to: None,
            created_at: String::new(),
            updated_at: None,
            profiles: None,
        };
        let doc = Document::from(phase);
        assert_eq!(doc.body, "");
        assert_eq!(doc.title, "Prologue");
        assert_eq!(doc.description.as_deref(), Some("Set the scene"));
    }
}
