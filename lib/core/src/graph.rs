// Mind-map graph model - nodes, edges and their per-level styling
use serde::{Deserialize, Serialize};

use crate::size::estimate_size;

pub type NodeId = String;
pub type EdgeId = String;

/// Deepest level a node may sit at. Level 0 is the root.
pub const MAX_LEVEL: u8 = 3;

/// Level-3 labels longer than this are treated as detail content.
pub const DETAIL_LABEL_THRESHOLD: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[inline]
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub level: u8,
    /// Layout/UI hint only; edges carry the real structure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    pub position: Position,
    pub size: Size,
    #[serde(default)]
    pub is_detail: bool,
    /// Transient inline-edit state, never persisted.
    #[serde(skip)]
    pub editing: bool,
}

impl Node {
    #[must_use]
    pub fn new(
        id: NodeId,
        label: impl Into<String>,
        level: u8,
        parent_id: Option<NodeId>,
        position: Position,
        is_detail: bool,
    ) -> Self {
        let label = label.into();
        let size = estimate_size(&label, is_detail);
        Self {
            id,
            label,
            level: level.min(MAX_LEVEL),
            parent_id,
            position,
            size,
            is_detail,
            editing: false,
        }
    }

    /// Recompute the derived size from the current label.
    pub fn refresh_size(&mut self) {
        self.size = estimate_size(&self.label, self.is_detail);
    }

    #[must_use]
    pub fn style(&self) -> NodeStyle {
        NodeStyle::for_node(self.level, self.is_detail)
    }
}

/// Whether a label at `level` reads as long-form detail content.
#[inline]
#[must_use]
pub fn is_detail_label(level: u8, label: &str) -> bool {
    level == MAX_LEVEL && label.chars().count() > DETAIL_LABEL_THRESHOLD
}

/// Rendering attributes handed to the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeStyle {
    pub background: &'static str,
    pub border: &'static str,
    pub color: &'static str,
    pub width: u32,
}

impl NodeStyle {
    #[must_use]
    pub fn for_node(level: u8, is_detail: bool) -> Self {
        match level {
            0 => Self { background: "#2563eb", border: "#1e40af", color: "white", width: 180 },
            1 => Self { background: "#10b981", border: "#059669", color: "white", width: 160 },
            _ if level >= MAX_LEVEL && is_detail => {
                Self { background: "#fef3c7", border: "#f59e0b", color: "#78350f", width: 280 }
            }
            _ => Self { background: "#f59e0b", border: "#d97706", color: "white", width: 150 },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeStyle {
    RootBranch,
    Branch,
    Leaf,
}

impl EdgeStyle {
    #[must_use]
    pub fn from_source_level(level: u8) -> Self {
        match level {
            0 => EdgeStyle::RootBranch,
            1 => EdgeStyle::Branch,
            _ => EdgeStyle::Leaf,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub style: EdgeStyle,
}

impl Edge {
    #[inline]
    #[must_use]
    pub fn new(id: EdgeId, source: NodeId, target: NodeId, source_level: u8) -> Self {
        Self {
            id,
            source,
            target,
            style: EdgeStyle::from_source_level(source_level),
        }
    }

    #[inline]
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_level_is_clamped() {
        let node = Node::new("n".to_string(), "Deep", 7, None, Position::default(), false);
        assert_eq!(node.level, MAX_LEVEL);
    }

    #[test]
    fn test_detail_heuristic() {
        assert!(!is_detail_label(3, "Short label"));
        assert!(is_detail_label(3, "Force is a push or pull that changes motion."));
        assert!(!is_detail_label(2, "Force is a push or pull that changes motion."));
    }

    #[test]
    fn test_styles_by_level() {
        assert_eq!(NodeStyle::for_node(0, false).background, "#2563eb");
        assert_eq!(NodeStyle::for_node(1, false).width, 160);
        assert_eq!(NodeStyle::for_node(3, true).width, 280);
        assert_eq!(NodeStyle::for_node(3, false), NodeStyle::for_node(2, false));
        assert_eq!(EdgeStyle::from_source_level(2), EdgeStyle::Leaf);
    }

    #[test]
    fn test_editing_is_not_serialized() {
        let mut node = Node::new("n".to_string(), "Root", 0, None, Position::default(), false);
        node.editing = true;
        let json = serde_json::to_value(&node).unwrap();
        assert!(json.get("editing").is_none());
        let back: Node = serde_json::from_value(json).unwrap();
        assert!(!back.editing);
    }
}
