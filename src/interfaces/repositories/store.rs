use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::entities::FieldMap;
use crate::errors::StoreError;

/// One document of a sub-collection: the entity id rendered as decimal
/// text, plus the raw field map.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: FieldMap,
}

/// Change notification pushed by a store watch. Every event carries the
/// full recomputed slice, never a delta.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// Scalar fields of the profile document changed.
    Profile { fields: FieldMap },

    /// A sub-collection changed; `documents` is the complete new state.
    Collection {
        name: String,
        documents: Vec<Document>,
    },

    /// A transient watch failure. The subscription stays up.
    Error { message: String },
}

/// Contract of the remote document store: one profile document of scalar
/// fields per user, plus named sub-collections keyed by decimal entity id.
///
/// Implementations are free to back this with any document service; the
/// synchronization core only depends on these semantics.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetches the scalar profile document, `None` if it does not exist.
    async fn get_profile(&self, user_id: &str) -> Result<Option<FieldMap>, StoreError>;

    /// Writes the full scalar profile document, creating it if absent.
    async fn set_profile(&self, user_id: &str, fields: &FieldMap) -> Result<(), StoreError>;

    /// Partially patches the profile document; absent fields are untouched.
    async fn update_profile_fields(&self, user_id: &str, fields: &FieldMap)
        -> Result<(), StoreError>;

    /// Lists every document of a sub-collection.
    async fn list_documents(
        &self,
        user_id: &str,
        collection: &str,
    ) -> Result<Vec<Document>, StoreError>;

    /// Writes one sub-collection document in full, creating or replacing.
    async fn set_document(
        &self,
        user_id: &str,
        collection: &str,
        doc_id: &str,
        fields: &FieldMap,
    ) -> Result<(), StoreError>;

    /// Deletes one sub-collection document. Deleting a missing document
    /// is not an error.
    async fn delete_document(
        &self,
        user_id: &str,
        collection: &str,
        doc_id: &str,
    ) -> Result<(), StoreError>;

    /// Opens a standing watch on the profile document.
    async fn watch_profile(&self, user_id: &str)
        -> Result<mpsc::Receiver<StoreEvent>, StoreError>;

    /// Opens a standing watch on one sub-collection.
    async fn watch_collection(
        &self,
        user_id: &str,
        collection: &str,
    ) -> Result<mpsc::Receiver<StoreEvent>, StoreError>;
}
