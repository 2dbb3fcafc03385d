use crate::{Edge, EdgeId, Error, IdGenerator, LayoutConfig, Node, NodeId, Position, Result, UuidGenerator};
use crate::graph::{is_detail_label, MAX_LEVEL};
use ahash::AHashSet;
use std::sync::Arc;

/// The live mind map: nodes, edges and the advisory selection.
///
/// Every mutation validates first and only then touches the collections, so a
/// rejected call leaves the store exactly as it was.
pub struct GraphStore {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    selected: Option<NodeId>,
    ids: Arc<dyn IdGenerator>,
    config: LayoutConfig,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::with_id_generator(Arc::new(UuidGenerator))
    }

    pub fn with_id_generator(ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            selected: None,
            ids,
            config: LayoutConfig::default(),
        }
    }

    #[must_use]
    pub fn with_layout_config(mut self, config: LayoutConfig) -> Self {
        self.config = config;
        self
    }

    pub fn id_generator(&self) -> Arc<dyn IdGenerator> {
        self.ids.clone()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Add a node at `level`.
    ///
    /// Non-root levels need `anchor` to be the currently selected node, one
    /// level up. The child is connected to its anchor and placed in the row
    /// below it, to the right of the anchor's existing children.
    pub fn add_node(&mut self, level: u8, label: &str, anchor: Option<&str>) -> Result<NodeId> {
        let label = label.trim();
        if label.is_empty() {
            return Err(Error::validation("node label must not be empty"));
        }
        if level > MAX_LEVEL {
            return Err(Error::validation(format!("level {} is out of range 0..={}", level, MAX_LEVEL)));
        }

        if level == 0 {
            let id = self.ids.next_id();
            let node = Node::new(id.clone(), label, 0, None, self.config.root, false);
            self.nodes.push(node);
            return Ok(id);
        }

        let anchor_id = anchor.ok_or_else(|| Error::validation("select a parent node first"))?;
        if self.selected.as_deref() != Some(anchor_id) {
            return Err(Error::validation(format!("node '{}' is not selected", anchor_id)));
        }
        let parent = self
            .node(anchor_id)
            .ok_or_else(|| Error::validation(format!("node '{}' does not exist", anchor_id)))?;
        if parent.level + 1 != level {
            return Err(Error::validation(format!(
                "a level {} node needs a level {} parent, selected node is level {}",
                level,
                level - 1,
                parent.level
            )));
        }

        let existing = self
            .nodes
            .iter()
            .filter(|n| n.parent_id.as_deref() == Some(anchor_id))
            .count();
        let position = Position::new(
            parent.position.x + existing as f64 * self.config.spacing_for_level(level),
            parent.position.y + self.config.row_height,
        );
        let parent_id = parent.id.clone();
        let parent_level = parent.level;

        let id = self.ids.next_id();
        let node = Node::new(
            id.clone(),
            label,
            level,
            Some(parent_id.clone()),
            position,
            is_detail_label(level, label),
        );
        let edge = Edge::new(self.ids.next_id(), parent_id, id.clone(), parent_level);
        self.nodes.push(node);
        self.edges.push(edge);
        Ok(id)
    }

    /// Free-form connection between any two existing nodes.
    pub fn add_edge(&mut self, source: &str, target: &str) -> Result<EdgeId> {
        let source_level = self
            .node(source)
            .map(|n| n.level)
            .ok_or_else(|| Error::validation(format!("edge source '{}' does not exist", source)))?;
        if !self.contains(target) {
            return Err(Error::validation(format!("edge target '{}' does not exist", target)));
        }

        let id = self.ids.next_id();
        self.edges
            .push(Edge::new(id.clone(), source.to_string(), target.to_string(), source_level));
        Ok(id)
    }

    /// Replace a node's label and recompute its size. Position is kept.
    pub fn update_label(&mut self, id: &str, label: &str) -> Result<()> {
        let label = label.trim();
        if label.is_empty() {
            return Err(Error::validation("node label must not be empty"));
        }
        let node = self.node_mut(id)?;
        node.label = label.to_string();
        node.refresh_size();
        Ok(())
    }

    /// Drag gesture: move a node without touching anything else.
    pub fn move_node(&mut self, id: &str, position: Position) -> Result<()> {
        self.node_mut(id)?.position = position;
        Ok(())
    }

    pub fn begin_edit(&mut self, id: &str) -> Result<()> {
        self.node_mut(id)?.editing = true;
        Ok(())
    }

    pub fn end_edit(&mut self, id: &str) -> Result<()> {
        self.node_mut(id)?.editing = false;
        Ok(())
    }

    /// Remove a node and every edge touching it. Returns whether it existed.
    pub fn delete_node(&mut self, id: &str) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.id != id);
        if self.nodes.len() == before {
            return false;
        }
        self.edges.retain(|e| !e.touches(id));
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        true
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.selected = None;
    }

    /// Set or clear the selection used as anchor for the next add.
    pub fn select(&mut self, id: Option<&str>) -> Result<()> {
        match id {
            Some(id) if !self.contains(id) => {
                Err(Error::validation(format!("node '{}' does not exist", id)))
            }
            _ => {
                self.selected = id.map(str::to_string);
                Ok(())
            }
        }
    }

    /// Swap in a whole new graph at once. Edges whose endpoints are missing
    /// from `nodes` are dropped; the count of dropped edges is returned.
    pub fn replace(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) -> usize {
        let known: AHashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let total = edges.len();
        let edges: Vec<Edge> = edges
            .into_iter()
            .filter(|e| known.contains(e.source.as_str()) && known.contains(e.target.as_str()))
            .collect();
        let dropped = total - edges.len();
        if dropped > 0 {
            tracing::warn!("Dropped {} dangling edges while replacing graph", dropped);
        }

        self.nodes = nodes;
        self.edges = edges;
        self.selected = None;
        dropped
    }

    fn node_mut(&mut self, id: &str) -> Result<&mut Node> {
        self.nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| Error::validation(format!("node '{}' does not exist", id)))
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}
