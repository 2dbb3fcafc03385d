//! # MindX
//!
//! A mind-map authoring service: a four-level concept graph that can be edited
//! by hand, generated from a topic by a chat-completions model, auto-laid-out
//! and saved as named snapshots.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! MINDX_API_KEY=... mindx --http-port 6340 --backend lmdb
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use mindx::prelude::*;
//! use std::sync::Arc;
//!
//! let manager = MindmapManager::new(Arc::new(MemoryBackend::new()));
//!
//! let raw = r#"{"title": "Motion", "nodes": [
//!     {"id": "1", "text": "Motion", "level": 0},
//!     {"id": "2", "text": "Kinematics", "parentId": "1", "level": 1}
//! ]}"#;
//! manager.import_text(raw, None, false).unwrap();
//!
//! let saved = manager.save_current("Physics").unwrap();
//! manager.clear();
//! manager.load(&saved.id, false).unwrap();
//! assert_eq!(manager.graph().node_count(), 2);
//! ```
//!
//! ## Crate Structure
//!
//! - [`mindx-core`](https://docs.rs/mindx-core) - Graph model, size estimation, import parsing, layout
//! - [`mindx-storage`](https://docs.rs/mindx-storage) - Snapshot persistence and the editing session
//! - [`mindx-api`](https://docs.rs/mindx-api) - REST API and the content-generator client

// Re-export core types
pub use mindx_core::{
    estimate_size, parse_import,
    Edge, EdgeStyle, Node, NodeStyle, Position, Size,
    GraphStore, LayoutConfig, LayoutEngine, LayoutResult,
    DraftNode, ImportDocument,
    IdGenerator, SequentialGenerator, UuidGenerator,
    Error, ImportError, Result,
};

// Re-export storage
pub use mindx_storage::{
    BackendKind, FileBackend, KeyValueBackend, LmdbBackend, MemoryBackend,
    MindmapManager, Snapshot, SnapshotStore, SnapshotSummary,
};

// Re-export API
pub use mindx_api::{ChatCompletionsGenerator, ContentGenerator, GeneratorConfig, RestApi};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Edge, Node, Position,
        GraphStore, LayoutEngine,
        Error, ImportError, Result,
        BackendKind, MemoryBackend, MindmapManager, Snapshot,
        ChatCompletionsGenerator, ContentGenerator, GeneratorConfig, RestApi,
    };
}
