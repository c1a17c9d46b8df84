pub mod blob;
pub mod identity;
pub mod profile;
pub mod store;

pub use blob::BlobStore;
pub use identity::{AuthUser, IdentityProvider};
pub use profile::{BulkReplaceReport, CollectionOutcome, ProfileRepository};
pub use store::{Document, ProfileStore, StoreEvent};
