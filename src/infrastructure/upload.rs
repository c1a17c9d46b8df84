use std::sync::Arc;

use serde_json::json;
use tokio::sync::watch;

use crate::constants::profile_image_key;
use crate::entities::FieldMap;
use crate::errors::SyncError;
use crate::repositories::{BlobStore, IdentityProvider, ProfileStore};

/// Standalone profile-image uploader for screens that do not hold the
/// full synchronization core. Explicitly constructed and injected; owns
/// its own loading/error cells and no profile snapshot; observers pick
/// up the new address through live sync.
pub struct ImageUploadHelper<S, I, B>
where
    S: ProfileStore,
    I: IdentityProvider,
    B: BlobStore,
{
    store: Arc<S>,
    identity: Arc<I>,
    blobs: Arc<B>,
    is_loading_tx: watch::Sender<bool>,
    error_tx: watch::Sender<Option<String>>,
}

impl<S, I, B> ImageUploadHelper<S, I, B>
where
    S: ProfileStore,
    I: IdentityProvider,
    B: BlobStore,
{
    pub fn new(store: Arc<S>, identity: Arc<I>, blobs: Arc<B>) -> Self {
        ImageUploadHelper {
            store,
            identity,
            blobs,
            is_loading_tx: watch::Sender::new(false),
            error_tx: watch::Sender::new(None),
        }
    }

    pub fn is_loading(&self) -> watch::Receiver<bool> {
        self.is_loading_tx.subscribe()
    }

    pub fn error(&self) -> watch::Receiver<Option<String>> {
        self.error_tx.subscribe()
    }

    /// Uploads the image under the fixed per-user key, writes the
    /// resulting address into the profile document, and hands it to the
    /// continuation. `is_loading` toggles around the round trip.
    pub async fn upload_profile_image<F>(
        &self,
        image: &[u8],
        on_success: F,
    ) -> Result<String, SyncError>
    where
        F: FnOnce(String),
    {
        self.is_loading_tx.send_replace(true);
        let result = self.run(image).await;
        self.is_loading_tx.send_replace(false);

        match result {
            Ok(url) => {
                on_success(url.clone());
                Ok(url)
            }
            Err(e) => Err(e),
        }
    }

    async fn run(&self, image: &[u8]) -> Result<String, SyncError> {
        let Some(user) = self.identity.current_user() else {
            self.report_error("User not logged in");
            return Err(SyncError::NotAuthenticated);
        };

        let kind = match infer::get(image) {
            Some(kind) if kind.matcher_type() == infer::MatcherType::Image => kind,
            _ => {
                let err = SyncError::InvalidImage("payload is not an image".to_string());
                self.report_error(format!("Error uploading image: {err}"));
                return Err(err);
            }
        };

        let key = profile_image_key(&user.uid);
        let url = match self.blobs.put(&key, image.to_vec(), kind.mime_type()).await {
            Ok(url) => url,
            Err(e) => {
                self.report_error(format!("Failed to upload image: {e}"));
                return Err(e.into());
            }
        };

        let mut fields = FieldMap::new();
        fields.insert("profileImageUrl".into(), json!(url));
        if let Err(e) = self.store.update_profile_fields(&user.uid, &fields).await {
            self.report_error(format!("Failed to update profile image: {e}"));
            return Err(e.into());
        }

        Ok(url)
    }

    fn report_error(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{message}");
        self.error_tx.send_replace(Some(message));
    }
}
