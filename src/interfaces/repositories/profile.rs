use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use crate::constants::{
    APPRECIATIONS_COLLECTION, APPRECIATION_TEXT_FIELD, EDUCATION_COLLECTION,
    LANGUAGES_COLLECTION, SKILLS_COLLECTION, WORK_EXPERIENCES_COLLECTION,
};
use crate::entities::{new_entity_id, to_field_map, FieldMap, UserProfile};
use crate::errors::SyncError;
use crate::repositories::store::ProfileStore;

/// Bulk "save all" path used by the settings/bulk-edit flow, distinct
/// from the incremental operations of the synchronization core.
///
/// Each list-valued sub-resource is reconciled by deleting every remote
/// document and re-writing one per in-memory element. There is no
/// rollback: a failure partway through leaves that collection mixed, and
/// the report says so.
pub struct ProfileRepository<S: ProfileStore> {
    store: Arc<S>,
}

/// Outcome of one sub-collection during a bulk replace.
#[derive(Debug, Clone)]
pub struct CollectionOutcome {
    pub collection: &'static str,
    pub replaced: usize,
    pub error: Option<String>,
}

/// What actually landed during a bulk replace.
#[derive(Debug, Clone)]
pub struct BulkReplaceReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub collections: Vec<CollectionOutcome>,
}

impl BulkReplaceReport {
    /// True when every sub-resource collection replaced cleanly.
    pub fn is_complete(&self) -> bool {
        self.collections.iter().all(|c| c.error.is_none())
    }

    pub fn failed_collections(&self) -> Vec<&'static str> {
        self.collections
            .iter()
            .filter(|c| c.error.is_some())
            .map(|c| c.collection)
            .collect()
    }
}

impl<S: ProfileStore> ProfileRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        ProfileRepository { store }
    }

    /// Writes the scalar profile document, then replaces all five
    /// sub-collections. A profile-document failure aborts the save; a
    /// sub-collection failure is recorded and the remaining collections
    /// still run.
    pub async fn save_profile(
        &self,
        user_id: &str,
        profile: &UserProfile,
    ) -> Result<BulkReplaceReport, SyncError> {
        let started_at = Utc::now();

        self.store
            .set_profile(user_id, &profile.profile_fields())
            .await?;

        let appreciation_docs: Vec<(String, FieldMap)> = profile
            .appreciations
            .iter()
            .map(|text| {
                let mut fields = FieldMap::new();
                fields.insert(APPRECIATION_TEXT_FIELD.into(), json!(text));
                (new_entity_id().to_string(), fields)
            })
            .collect();

        let collections = vec![
            self.replace_collection(
                user_id,
                WORK_EXPERIENCES_COLLECTION,
                entity_docs(&profile.work_experience, |e| e.id)?,
            )
            .await,
            self.replace_collection(
                user_id,
                EDUCATION_COLLECTION,
                entity_docs(&profile.education, |e| e.id)?,
            )
            .await,
            self.replace_collection(
                user_id,
                SKILLS_COLLECTION,
                entity_docs(&profile.skills, |e| e.id)?,
            )
            .await,
            self.replace_collection(
                user_id,
                LANGUAGES_COLLECTION,
                entity_docs(&profile.languages, |e| e.id)?,
            )
            .await,
            self.replace_collection(user_id, APPRECIATIONS_COLLECTION, appreciation_docs)
                .await,
        ];

        let report = BulkReplaceReport {
            started_at,
            finished_at: Utc::now(),
            collections,
        };

        if !report.is_complete() {
            tracing::warn!(
                "Bulk profile save left collections in a mixed state: {:?}",
                report.failed_collections()
            );
        }

        Ok(report)
    }

    /// Delete-all-then-write-all for one collection. Sequential and
    /// unguarded; the first failure stops this collection and is
    /// reported in the outcome.
    async fn replace_collection(
        &self,
        user_id: &str,
        collection: &'static str,
        docs: Vec<(String, FieldMap)>,
    ) -> CollectionOutcome {
        let existing = match self.store.list_documents(user_id, collection).await {
            Ok(existing) => existing,
            Err(e) => {
                return CollectionOutcome {
                    collection,
                    replaced: 0,
                    error: Some(e.to_string()),
                };
            }
        };

        for doc in existing {
            if let Err(e) = self
                .store
                .delete_document(user_id, collection, &doc.id)
                .await
            {
                return CollectionOutcome {
                    collection,
                    replaced: 0,
                    error: Some(e.to_string()),
                };
            }
        }

        let mut replaced = 0;
        for (doc_id, fields) in &docs {
            if let Err(e) = self
                .store
                .set_document(user_id, collection, doc_id, fields)
                .await
            {
                return CollectionOutcome {
                    collection,
                    replaced,
                    error: Some(e.to_string()),
                };
            }
            replaced += 1;
        }

        CollectionOutcome {
            collection,
            replaced,
            error: None,
        }
    }
}

/// Serializes entities into `(doc_id, fields)` pairs, keyed by the
/// entity id rendered as decimal text.
fn entity_docs<T, F>(items: &[T], id_of: F) -> Result<Vec<(String, FieldMap)>, SyncError>
where
    T: Serialize,
    F: Fn(&T) -> i64,
{
    items
        .iter()
        .map(|item| {
            let fields =
                to_field_map(item).map_err(|e| SyncError::InternalError(e.to_string()))?;
            Ok((id_of(item).to_string(), fields))
        })
        .collect()
}
