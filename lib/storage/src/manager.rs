use mindx_core::{
    parse_import, Error, GraphStore, IdGenerator, LayoutEngine, LayoutResult, Result, UuidGenerator,
};
use parking_lot::{RwLock, RwLockReadGuard};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::backend::{open_backend, BackendKind, KeyValueBackend};
use crate::snapshot::{copy_graph, Snapshot, SnapshotStore, SnapshotSummary, SnapshotUpdate};

/// Outcome of a committed import or load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
    pub title: Option<String>,
    pub node_count: usize,
    pub edge_count: usize,
}

/// The single editing session: live graph, its title and the saved snapshots.
///
/// The graph sits behind one lock so that an import or load swaps the whole
/// node/edge set at once. Edits racing an in-flight import are not queued: if
/// the import commits afterwards, it wins.
pub struct MindmapManager {
    graph: RwLock<GraphStore>,
    title: RwLock<Option<String>>,
    snapshots: SnapshotStore,
    layout: LayoutEngine,
    ids: Arc<dyn IdGenerator>,
}

impl MindmapManager {
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self::with_id_generator(backend, Arc::new(UuidGenerator))
    }

    pub fn with_id_generator(backend: Arc<dyn KeyValueBackend>, ids: Arc<dyn IdGenerator>) -> Self {
        let layout = LayoutEngine::new();
        let graph = GraphStore::with_id_generator(ids.clone()).with_layout_config(layout.config().clone());
        Self {
            graph: RwLock::new(graph),
            title: RwLock::new(None),
            snapshots: SnapshotStore::new(backend),
            layout,
            ids,
        }
    }

    /// Open a session whose snapshots live in `data_dir`.
    pub fn open<P: AsRef<Path>>(data_dir: P, kind: BackendKind) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)?;
        let backend = open_backend(kind, data_dir).map_err(|e| Error::Storage(e.to_string()))?;
        info!("Snapshot storage opened ({:?}) at {:?}", kind, data_dir);
        Ok(Self::new(backend))
    }

    #[inline]
    pub fn graph(&self) -> RwLockReadGuard<'_, GraphStore> {
        self.graph.read()
    }

    /// Run a manual edit against the live graph.
    pub fn with_graph_mut<R>(&self, f: impl FnOnce(&mut GraphStore) -> R) -> R {
        f(&mut self.graph.write())
    }

    pub fn title(&self) -> Option<String> {
        self.title.read().clone()
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    /// Clear the graph and forget its title.
    pub fn clear(&self) {
        self.graph.write().clear();
        *self.title.write() = None;
    }

    /// Refuse to overwrite a non-empty graph unless the caller confirmed.
    pub fn ensure_replace_allowed(&self, confirm: bool) -> Result<()> {
        if !confirm && !self.graph.read().is_empty() {
            return Err(Error::ConfirmationRequired(
                "this will replace the current mind map".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and lay out raw generator text, then swap it in.
    ///
    /// `fallback_title` names the map when the document has no title. On any
    /// failure the live graph is left untouched.
    pub fn import_text(&self, raw: &str, fallback_title: Option<&str>, confirm: bool) -> Result<CommitSummary> {
        self.ensure_replace_allowed(confirm)?;
        let document = parse_import(raw)?;
        let mut layout = self.layout.layout_document(&document, self.ids.as_ref());
        if layout.title.is_none() {
            layout.title = fallback_title
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string);
        }
        Ok(self.commit_layout(layout))
    }

    /// Atomically replace the live graph with a finished layout.
    pub fn commit_layout(&self, layout: LayoutResult) -> CommitSummary {
        let LayoutResult { title, nodes, edges, .. } = layout;
        let summary = {
            let mut graph = self.graph.write();
            graph.replace(nodes, edges);
            let mut current = self.title.write();
            *current = title;
            CommitSummary {
                title: current.clone(),
                node_count: graph.node_count(),
                edge_count: graph.edge_count(),
            }
        };
        info!(
            "Committed import: {} nodes, {} edges",
            summary.node_count, summary.edge_count
        );
        summary
    }

    /// Save the live graph as a new snapshot named `name`.
    pub fn save_current(&self, name: &str) -> Result<Snapshot> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("snapshot name must not be empty"));
        }
        let snapshot = {
            let graph = self.graph.read();
            if graph.is_empty() {
                return Err(Error::validation("cannot save an empty mind map"));
            }
            Snapshot::capture(name, &graph).with_title(self.title())
        };
        self.snapshots.save(snapshot.clone())?;
        Ok(snapshot)
    }

    /// Overwrite snapshot `id` with the live graph, optionally renaming it.
    pub fn resave(&self, id: &str, name: Option<&str>) -> Result<Snapshot> {
        let name = match name.map(str::trim) {
            Some("") => return Err(Error::validation("snapshot name must not be empty")),
            other => other.map(str::to_string),
        };
        let (nodes, edges) = copy_graph(&self.graph.read());
        self.snapshots.update(
            id,
            SnapshotUpdate {
                name,
                title: self.title(),
                nodes: Some(nodes),
                edges: Some(edges),
            },
        )
    }

    /// Replace the live graph with snapshot `id`.
    pub fn load(&self, id: &str, confirm: bool) -> Result<CommitSummary> {
        let snapshot = self.snapshots.load(id)?;
        self.ensure_replace_allowed(confirm)?;

        let mut graph = self.graph.write();
        graph.replace(snapshot.nodes, snapshot.edges);
        let title = snapshot.title.unwrap_or(snapshot.name);
        *self.title.write() = Some(title.clone());
        info!("Loaded snapshot '{}'", id);
        Ok(CommitSummary {
            title: Some(title),
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
        })
    }

    pub fn list(&self) -> Result<Vec<SnapshotSummary>> {
        self.snapshots.summaries()
    }

    pub fn delete_snapshot(&self, id: &str) -> Result<bool> {
        self.snapshots.delete(id)
    }
}
