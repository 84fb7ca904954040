pub mod snapshot;

pub use snapshot::{PersistedRecord, SnapshotStore};
