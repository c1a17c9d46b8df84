use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use tokio::sync::mpsc;
use url::Url;
use uuid::Uuid;

use crate::constants::PROFILES_COLLECTION;
use crate::entities::FieldMap;
use crate::errors::StoreError;
use crate::repositories::store::{Document, ProfileStore, StoreEvent};
use crate::settings::AppConfig;

/// Document-store client over a JSON REST API:
///
/// - `GET/PUT/PATCH  {base}/profiles/{uid}` for the scalar profile document
/// - `GET            {base}/profiles/{uid}/{collection}` to list documents
/// - `PUT/DELETE     {base}/profiles/{uid}/{collection}/{docId}`
///
/// Watches are driven by an interval diff loop: the remote slice is
/// re-read on a fixed cadence and an event is emitted only when the
/// payload actually changed. Request failures surface as
/// `StoreEvent::Error` and the loop keeps going.
#[derive(Clone)]
pub struct HttpProfileStore {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
    client_id: Uuid,
    poll_interval: Duration,
}

#[derive(Debug, Deserialize)]
struct DocumentDto {
    id: String,
    fields: FieldMap,
}

#[derive(Debug, Deserialize)]
struct CollectionDto {
    documents: Vec<DocumentDto>,
}

impl HttpProfileStore {
    pub fn new(config: &AppConfig) -> Result<Self, StoreError> {
        Ok(HttpProfileStore {
            client: Client::new(),
            base_url: Url::parse(&config.store_url)?,
            api_key: config.api_key.clone(),
            client_id: Uuid::new_v4(),
            poll_interval: config.poll_interval(),
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut path = self.base_url.as_str().trim_end_matches('/').to_string();
        for segment in segments {
            path.push('/');
            path.push_str(&urlencoding::encode(segment));
        }
        Ok(Url::parse(&path)?)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut request = self
            .client
            .request(method, url)
            .header("x-client-id", self.client_id.to_string());
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }
        request
    }

    async fn fetch_profile(&self, user_id: &str) -> Result<Option<FieldMap>, StoreError> {
        let url = self.url(&[PROFILES_COLLECTION, user_id])?;
        let response = self.request(Method::GET, url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response.error_for_status()?;
        Ok(Some(response.json().await?))
    }

    async fn fetch_collection(
        &self,
        user_id: &str,
        collection: &str,
    ) -> Result<Vec<Document>, StoreError> {
        let url = self.url(&[PROFILES_COLLECTION, user_id, collection])?;
        let response = self.request(Method::GET, url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let response = response.error_for_status()?;
        let body: CollectionDto = response.json().await?;

        Ok(body
            .documents
            .into_iter()
            .map(|doc| Document {
                id: doc.id,
                fields: doc.fields,
            })
            .collect())
    }

    /// Spawns the diff loop backing one watch. `read` re-reads the
    /// slice, `to_event` wraps a changed payload into a store event, or
    /// `None` when there is nothing to report (no document yet).
    fn spawn_poll_watch<T, F, Fut, E>(&self, read: F, to_event: E) -> mpsc::Receiver<StoreEvent>
    where
        T: PartialEq + Send + 'static,
        F: Fn() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<T, StoreError>> + Send,
        E: Fn(&T) -> Option<StoreEvent> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(16);
        let poll_interval = self.poll_interval;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            let mut last: Option<T> = None;

            loop {
                interval.tick().await;

                match read().await {
                    Ok(current) => {
                        if last.as_ref() != Some(&current) {
                            if let Some(event) = to_event(&current) {
                                if tx.send(event).await.is_err() {
                                    break;
                                }
                            }
                            last = Some(current);
                        }
                    }
                    Err(e) => {
                        if tx
                            .send(StoreEvent::Error {
                                message: e.to_string(),
                            })
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                }
            }
        });

        rx
    }
}

#[async_trait]
impl ProfileStore for HttpProfileStore {
    async fn get_profile(&self, user_id: &str) -> Result<Option<FieldMap>, StoreError> {
        self.fetch_profile(user_id).await
    }

    async fn set_profile(&self, user_id: &str, fields: &FieldMap) -> Result<(), StoreError> {
        let url = self.url(&[PROFILES_COLLECTION, user_id])?;
        self.request(Method::PUT, url)
            .json(fields)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn update_profile_fields(
        &self,
        user_id: &str,
        fields: &FieldMap,
    ) -> Result<(), StoreError> {
        let url = self.url(&[PROFILES_COLLECTION, user_id])?;
        self.request(Method::PATCH, url)
            .json(fields)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn list_documents(
        &self,
        user_id: &str,
        collection: &str,
    ) -> Result<Vec<Document>, StoreError> {
        self.fetch_collection(user_id, collection).await
    }

    async fn set_document(
        &self,
        user_id: &str,
        collection: &str,
        doc_id: &str,
        fields: &FieldMap,
    ) -> Result<(), StoreError> {
        let url = self.url(&[PROFILES_COLLECTION, user_id, collection, doc_id])?;
        self.request(Method::PUT, url)
            .json(fields)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn delete_document(
        &self,
        user_id: &str,
        collection: &str,
        doc_id: &str,
    ) -> Result<(), StoreError> {
        let url = self.url(&[PROFILES_COLLECTION, user_id, collection, doc_id])?;
        let response = self.request(Method::DELETE, url).send().await?;

        // A missing document is already deleted.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        response.error_for_status()?;
        Ok(())
    }

    async fn watch_profile(
        &self,
        user_id: &str,
    ) -> Result<mpsc::Receiver<StoreEvent>, StoreError> {
        let store = self.clone();
        let user_id = user_id.to_string();

        Ok(self.spawn_poll_watch(
            move || {
                let store = store.clone();
                let user_id = user_id.clone();
                async move { store.fetch_profile(&user_id).await }
            },
            // A profile document that does not exist yet is not a change.
            |fields: &Option<FieldMap>| {
                fields
                    .clone()
                    .map(|fields| StoreEvent::Profile { fields })
            },
        ))
    }

    async fn watch_collection(
        &self,
        user_id: &str,
        collection: &str,
    ) -> Result<mpsc::Receiver<StoreEvent>, StoreError> {
        let store = self.clone();
        let user_id = user_id.to_string();
        let collection_name = collection.to_string();
        let event_name = collection_name.clone();

        Ok(self.spawn_poll_watch(
            move || {
                let store = store.clone();
                let user_id = user_id.clone();
                let collection = collection_name.clone();
                async move { store.fetch_collection(&user_id, &collection).await }
            },
            move |documents: &Vec<Document>| {
                Some(StoreEvent::Collection {
                    name: event_name.clone(),
                    documents: documents.clone(),
                })
            },
        ))
    }
}
