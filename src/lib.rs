use std::sync::Arc;

mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;

pub use domain::{entities, use_cases};
pub use interfaces::repositories;
pub use infrastructure::{auth, db, storage, upload};

use auth::identity::TokenIdentity;
use db::http::HttpProfileStore;
use errors::SyncError;
use settings::AppConfig;
use storage::HttpBlobStore;
use upload::ImageUploadHelper;
use use_cases::profile_sync::ProfileSync;

pub struct AppState {
    pub profile_sync: Arc<AppProfileSync>,
    pub image_upload: Arc<AppImageUploadHelper>,
}

pub type AppProfileSync = ProfileSync<HttpProfileStore, TokenIdentity, HttpBlobStore>;
pub type AppImageUploadHelper = ImageUploadHelper<HttpProfileStore, TokenIdentity, HttpBlobStore>;

impl AppState {
    pub fn new(config: &AppConfig, identity: TokenIdentity) -> Result<Self, SyncError> {
        let store = Arc::new(HttpProfileStore::new(config)?);
        let blobs = Arc::new(HttpBlobStore::new(config)?);
        let identity = Arc::new(identity);

        let profile_sync = Arc::new(ProfileSync::new(
            store.clone(),
            identity.clone(),
            blobs.clone(),
        ));
        let image_upload = Arc::new(ImageUploadHelper::new(store, identity, blobs));

        Ok(AppState {
            profile_sync,
            image_upload,
        })
    }
}
