use std::collections::BTreeMap;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::entities::FieldMap;
use crate::errors::StoreError;
use crate::repositories::store::{Document, ProfileStore, StoreEvent};

/// In-process store used by tests and local development. Watchers are
/// pushed the full recomputed slice on every mutation, like a real
/// change-notification channel.
#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: DashMap<String, FieldMap>,
    collections: DashMap<(String, String), BTreeMap<String, FieldMap>>,
    watchers: Mutex<Vec<Watcher>>,
}

#[derive(Debug, Clone, PartialEq)]
enum WatchKey {
    Profile(String),
    Collection(String, String),
}

struct Watcher {
    key: WatchKey,
    tx: mpsc::Sender<StoreEvent>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn collection_documents(&self, user_id: &str, collection: &str) -> Vec<Document> {
        self.collections
            .get(&(user_id.to_string(), collection.to_string()))
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document {
                        id: id.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn notify(&self, key: &WatchKey) {
        let event = match key {
            WatchKey::Profile(user_id) => {
                // No document, no event; watchers only ever observe an
                // existing profile.
                let Some(fields) = self.profiles.get(user_id).map(|f| f.value().clone()) else {
                    return;
                };
                StoreEvent::Profile { fields }
            }
            WatchKey::Collection(user_id, collection) => StoreEvent::Collection {
                name: collection.clone(),
                documents: self.collection_documents(user_id, collection),
            },
        };

        let mut watchers = self.watchers.lock();
        watchers.retain(|watcher| {
            if watcher.key != *key {
                return true;
            }
            // A full channel drops the event; the next mutation resends
            // the complete slice anyway.
            !matches!(
                watcher.tx.try_send(event.clone()),
                Err(mpsc::error::TrySendError::Closed(_))
            )
        });
    }

    fn register(&self, key: WatchKey) -> mpsc::Receiver<StoreEvent> {
        let (tx, rx) = mpsc::channel(64);
        self.watchers.lock().push(Watcher {
            key: key.clone(),
            tx,
        });
        // Watches observe the current state immediately.
        self.notify(&key);
        rx
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get_profile(&self, user_id: &str) -> Result<Option<FieldMap>, StoreError> {
        Ok(self.profiles.get(user_id).map(|f| f.value().clone()))
    }

    async fn set_profile(&self, user_id: &str, fields: &FieldMap) -> Result<(), StoreError> {
        self.profiles.insert(user_id.to_string(), fields.clone());
        self.notify(&WatchKey::Profile(user_id.to_string()));
        Ok(())
    }

    async fn update_profile_fields(
        &self,
        user_id: &str,
        fields: &FieldMap,
    ) -> Result<(), StoreError> {
        {
            let mut entry = self.profiles.entry(user_id.to_string()).or_default();
            for (key, value) in fields {
                entry.insert(key.clone(), value.clone());
            }
        }
        self.notify(&WatchKey::Profile(user_id.to_string()));
        Ok(())
    }

    async fn list_documents(
        &self,
        user_id: &str,
        collection: &str,
    ) -> Result<Vec<Document>, StoreError> {
        Ok(self.collection_documents(user_id, collection))
    }

    async fn set_document(
        &self,
        user_id: &str,
        collection: &str,
        doc_id: &str,
        fields: &FieldMap,
    ) -> Result<(), StoreError> {
        self.collections
            .entry((user_id.to_string(), collection.to_string()))
            .or_default()
            .insert(doc_id.to_string(), fields.clone());
        self.notify(&WatchKey::Collection(
            user_id.to_string(),
            collection.to_string(),
        ));
        Ok(())
    }

    async fn delete_document(
        &self,
        user_id: &str,
        collection: &str,
        doc_id: &str,
    ) -> Result<(), StoreError> {
        if let Some(mut docs) = self
            .collections
            .get_mut(&(user_id.to_string(), collection.to_string()))
        {
            docs.remove(doc_id);
        }
        self.notify(&WatchKey::Collection(
            user_id.to_string(),
            collection.to_string(),
        ));
        Ok(())
    }

    async fn watch_profile(
        &self,
        user_id: &str,
    ) -> Result<mpsc::Receiver<StoreEvent>, StoreError> {
        Ok(self.register(WatchKey::Profile(user_id.to_string())))
    }

    async fn watch_collection(
        &self,
        user_id: &str,
        collection: &str,
    ) -> Result<mpsc::Receiver<StoreEvent>, StoreError> {
        Ok(self.register(WatchKey::Collection(
            user_id.to_string(),
            collection.to_string(),
        )))
    }
}
