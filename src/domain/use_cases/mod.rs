pub mod live_sync;
pub mod profile_sync;

pub use live_sync::{apply_event, ProfileEvent};
pub use profile_sync::{LiveSyncHandle, ProfileSync};
