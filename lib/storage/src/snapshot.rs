// Named mind-map snapshots kept as one JSON collection under a single key
use chrono::{DateTime, Utc};
use mindx_core::{Edge, Error, GraphStore, Node, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::backend::KeyValueBackend;

/// Storage key holding the whole snapshot collection.
pub const SNAPSHOTS_KEY: &str = "mindx_mindmaps";

/// A named, independent copy of a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Snapshot {
    /// Copy the nodes and edges of `store` under `name`.
    ///
    /// Edges pointing outside the copied node set are left behind.
    pub fn capture(name: impl Into<String>, store: &GraphStore) -> Self {
        let now = Utc::now();
        let (nodes, edges) = copy_graph(store);
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            title: None,
            created_at: now,
            updated_at: now,
            nodes,
            edges,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            node_count: self.nodes.len(),
            edge_count: self.edges.len(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Clone of the live graph, minus transient edit state and dangling edges.
pub(crate) fn copy_graph(store: &GraphStore) -> (Vec<Node>, Vec<Edge>) {
    let nodes: Vec<Node> = store
        .nodes()
        .iter()
        .cloned()
        .map(|mut n| {
            n.editing = false;
            n
        })
        .collect();
    let known: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let edges = store
        .edges()
        .iter()
        .filter(|e| known.contains(e.source.as_str()) && known.contains(e.target.as_str()))
        .cloned()
        .collect();
    (nodes, edges)
}

/// Listing entry for a stored snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub id: String,
    pub name: String,
    pub node_count: usize,
    pub edge_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields to overwrite on an existing snapshot.
#[derive(Debug, Clone, Default)]
pub struct SnapshotUpdate {
    pub name: Option<String>,
    pub title: Option<String>,
    pub nodes: Option<Vec<Node>>,
    pub edges: Option<Vec<Edge>>,
}

/// Persistence gateway for snapshots. Last write wins.
pub struct SnapshotStore {
    backend: Arc<dyn KeyValueBackend>,
}

impl SnapshotStore {
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self { backend }
    }

    fn read_all(&self) -> Result<Vec<Snapshot>> {
        let raw = self
            .backend
            .get(SNAPSHOTS_KEY)
            .map_err(|e| Error::Storage(e.to_string()))?;
        match raw {
            Some(data) => Ok(serde_json::from_str(&data)?),
            None => Ok(Vec::new()),
        }
    }

    fn write_all(&self, snapshots: &[Snapshot]) -> Result<()> {
        let data = serde_json::to_string(snapshots)?;
        self.backend
            .put(SNAPSHOTS_KEY, &data)
            .map_err(|e| Error::Storage(e.to_string()))
    }

    /// Store `snapshot` in front of the others. Names are not deduplicated.
    pub fn save(&self, snapshot: Snapshot) -> Result<()> {
        let mut snapshots = self.read_all()?;
        if snapshots.iter().any(|s| s.id == snapshot.id) {
            return Err(Error::Validation(format!("snapshot '{}' already exists", snapshot.id)));
        }
        info!("Saving snapshot '{}' ({} nodes)", snapshot.name, snapshot.nodes.len());
        snapshots.insert(0, snapshot);
        self.write_all(&snapshots)
    }

    /// Overwrite fields of snapshot `id` in place and stamp its update time.
    pub fn update(&self, id: &str, update: SnapshotUpdate) -> Result<Snapshot> {
        let mut snapshots = self.read_all()?;
        let snapshot = snapshots
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::NotFound(format!("snapshot '{}'", id)))?;

        if let Some(name) = update.name {
            snapshot.name = name;
        }
        if update.title.is_some() {
            snapshot.title = update.title;
        }
        if let Some(nodes) = update.nodes {
            snapshot.nodes = nodes;
        }
        if let Some(edges) = update.edges {
            snapshot.edges = edges;
        }
        snapshot.updated_at = Utc::now();

        let updated = snapshot.clone();
        self.write_all(&snapshots)?;
        debug!("Updated snapshot '{}'", id);
        Ok(updated)
    }

    /// All snapshots, most recently saved first.
    pub fn list(&self) -> Result<Vec<Snapshot>> {
        self.read_all()
    }

    pub fn summaries(&self) -> Result<Vec<SnapshotSummary>> {
        Ok(self.read_all()?.iter().map(Snapshot::summary).collect())
    }

    /// Remove snapshot `id`. Returns whether it existed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut snapshots = self.read_all()?;
        let before = snapshots.len();
        snapshots.retain(|s| s.id != id);
        if snapshots.len() == before {
            return Ok(false);
        }
        self.write_all(&snapshots)?;
        Ok(true)
    }

    pub fn load(&self, id: &str) -> Result<Snapshot> {
        self.read_all()?
            .into_iter()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::NotFound(format!("snapshot '{}'", id)))
    }
}
