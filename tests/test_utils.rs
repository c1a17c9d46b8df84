#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use mockall::mock;
use tokio::sync::{mpsc, watch};

use profile_sync::auth::identity::StaticIdentity;
use profile_sync::db::memory::MemoryProfileStore;
use profile_sync::entities::{FieldMap, UserProfile};
use profile_sync::errors::StoreError;
use profile_sync::repositories::store::{Document, ProfileStore, StoreEvent};
use profile_sync::repositories::AuthUser;
use profile_sync::storage::MemoryBlobStore;
use profile_sync::use_cases::profile_sync::ProfileSync;

pub type TestSync = ProfileSync<MemoryProfileStore, StaticIdentity, MemoryBlobStore>;
pub type MockedSync = ProfileSync<MockStore, StaticIdentity, MemoryBlobStore>;

pub const TEST_UID: &str = "user-abc-123";

/// Smallest payloads `infer` recognizes as images.
pub const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];
pub const NOT_AN_IMAGE: &[u8] = b"definitely plain text";

mock! {
    pub Store {}

    #[async_trait::async_trait]
    impl ProfileStore for Store {
        async fn get_profile(&self, user_id: &str) -> Result<Option<FieldMap>, StoreError>;
        async fn set_profile(&self, user_id: &str, fields: &FieldMap) -> Result<(), StoreError>;
        async fn update_profile_fields(
            &self,
            user_id: &str,
            fields: &FieldMap,
        ) -> Result<(), StoreError>;
        async fn list_documents(
            &self,
            user_id: &str,
            collection: &str,
        ) -> Result<Vec<Document>, StoreError>;
        async fn set_document(
            &self,
            user_id: &str,
            collection: &str,
            doc_id: &str,
            fields: &FieldMap,
        ) -> Result<(), StoreError>;
        async fn delete_document(
            &self,
            user_id: &str,
            collection: &str,
            doc_id: &str,
        ) -> Result<(), StoreError>;
        async fn watch_profile(
            &self,
            user_id: &str,
        ) -> Result<mpsc::Receiver<StoreEvent>, StoreError>;
        async fn watch_collection(
            &self,
            user_id: &str,
            collection: &str,
        ) -> Result<mpsc::Receiver<StoreEvent>, StoreError>;
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}

pub fn auth_user() -> AuthUser {
    AuthUser {
        uid: TEST_UID.to_string(),
        display_name: Some("Jane Doe".to_string()),
        email: Some("jane@example.com".to_string()),
        photo_url: None,
    }
}

/// Synchronization core over the in-memory store, signed in as the
/// test user.
pub fn test_sync() -> (Arc<MemoryProfileStore>, Arc<MemoryBlobStore>, TestSync) {
    init_tracing();

    let store = Arc::new(MemoryProfileStore::new());
    let blobs = Arc::new(MemoryBlobStore::new());
    let identity = Arc::new(StaticIdentity::new(auth_user()));
    let sync = ProfileSync::new(store.clone(), identity, blobs.clone());

    (store, blobs, sync)
}

pub fn mocked_sync(store: MockStore) -> MockedSync {
    init_tracing();

    ProfileSync::new(
        Arc::new(store),
        Arc::new(StaticIdentity::new(auth_user())),
        Arc::new(MemoryBlobStore::new()),
    )
}

/// Waits until the snapshot satisfies the predicate, panicking after
/// two seconds.
pub async fn wait_for_profile<F>(rx: &mut watch::Receiver<Option<UserProfile>>, pred: F)
where
    F: Fn(&Option<UserProfile>) -> bool,
{
    let result = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if pred(&rx.borrow()) {
                return;
            }
            rx.changed().await.expect("profile channel closed");
        }
    })
    .await;
    result.expect("timed out waiting for profile state");
}
