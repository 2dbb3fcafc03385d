pub mod backend;
pub mod manager;
pub mod snapshot;

pub use backend::{open_backend, BackendKind, FileBackend, KeyValueBackend, LmdbBackend, MemoryBackend};
pub use manager::{CommitSummary, MindmapManager};
pub use snapshot::{Snapshot, SnapshotStore, SnapshotSummary, SnapshotUpdate, SNAPSHOTS_KEY};
