//! # MindX Core
//!
//! Core library for the MindX mind-map service.
//!
//! This crate provides the graph model and the algorithms around it:
//!
//! - [`Node`] / [`Edge`] - four-level mind-map graph with per-level styling
//! - [`GraphStore`] - the live graph and its validated mutations
//! - [`estimate_size`] - pure label-to-box size estimation
//! - [`parse_import`] - tolerant parser for generator output
//! - [`LayoutEngine`] - deterministic level-based auto-layout
//!
//! ## Example
//!
//! ```rust
//! use mindx_core::{parse_import, GraphStore, LayoutEngine};
//!
//! let raw = r#"Sure! {"title": "Motion", "nodes": [
//!     {"id": "1", "text": "Motion", "level": 0},
//!     {"id": "2", "text": "Kinematics", "parentId": "1", "level": 1}
//! ]}"#;
//!
//! let document = parse_import(raw).unwrap();
//! let mut store = GraphStore::new();
//! let layout = LayoutEngine::new().layout_document(&document, store.id_generator().as_ref());
//! store.replace(layout.nodes, layout.edges);
//!
//! assert_eq!(store.node_count(), 2);
//! assert_eq!(store.edge_count(), 1);
//! ```

pub mod error;
pub mod graph;
pub mod id;
pub mod import;
pub mod layout;
pub mod size;
pub mod store;

pub use error::{Error, ImportError, Result};
pub use graph::{Edge, EdgeId, EdgeStyle, Node, NodeId, NodeStyle, Position, Size, MAX_LEVEL};
pub use id::{IdGenerator, SequentialGenerator, UuidGenerator};
pub use import::{parse_import, DraftNode, ImportDocument};
pub use layout::{LayoutConfig, LayoutEngine, LayoutResult};
pub use size::estimate_size;
pub use store::GraphStore;
