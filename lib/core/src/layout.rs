//! Level-based auto-layout for imported mind maps.
//!
//! Drafts are grouped by level and each level is centred independently:
//! the root sits at a fixed anchor, level 1 forms one row centred under it,
//! and deeper nodes spread around an x *re-derived* from their parent's
//! position inside its own level group. The parent's final coordinate is
//! never read, so deep or unbalanced trees can drift slightly out of line.
//! Imports are 12-20 nodes, so a single linear pass is preferred over a
//! full tidy-tree layout.

use ahash::AHashMap;
use std::collections::HashMap;
use tracing::debug;

use crate::graph::{is_detail_label, Edge, Node, NodeId, Position, MAX_LEVEL};
use crate::id::IdGenerator;
use crate::import::{DraftNode, ImportDocument};

/// Layout constants, shared with manual node placement in the graph store.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    /// Where level-0 nodes go.
    pub root: Position,
    /// y of the level-1 row.
    pub first_row_y: f64,
    /// Vertical distance between rows; level `k >= 2` sits at `first_row_y + k * row_height`.
    pub row_height: f64,
    /// Horizontal gap between level-1 siblings.
    pub branch_spacing: f64,
    /// Horizontal gap between children of a level >= 1 parent.
    pub child_spacing: f64,
    /// Approximate x of the first level >= 2 parent when re-deriving parent positions.
    pub deep_parent_origin: f64,
    pub deep_parent_spacing: f64,
    /// Placement for drafts whose parent cannot be found.
    pub fallback_origin: f64,
    pub fallback_spacing: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            root: Position::new(500.0, 50.0),
            first_row_y: 200.0,
            row_height: 150.0,
            branch_spacing: 250.0,
            child_spacing: 180.0,
            deep_parent_origin: 300.0,
            deep_parent_spacing: 200.0,
            fallback_origin: 200.0,
            fallback_spacing: 200.0,
        }
    }
}

impl LayoutConfig {
    /// Row y for a level.
    #[must_use]
    pub fn row_y(&self, level: u8) -> f64 {
        match level {
            0 => self.root.y,
            1 => self.first_row_y,
            _ => self.first_row_y + f64::from(level) * self.row_height,
        }
    }

    /// Horizontal spacing between siblings at `level`.
    #[must_use]
    pub fn spacing_for_level(&self, level: u8) -> f64 {
        if level <= 1 {
            self.branch_spacing
        } else {
            self.child_spacing
        }
    }
}

/// x of item `index` out of `count` spread `spacing` apart and centred on `center`.
#[inline]
fn centered(center: f64, index: usize, count: usize, spacing: f64) -> f64 {
    let total = count.saturating_sub(1) as f64 * spacing;
    center - total / 2.0 + index as f64 * spacing
}

/// Positioned output of a layout pass.
#[derive(Debug, Clone, Default)]
pub struct LayoutResult {
    pub title: Option<String>,
    /// One node per draft, in draft order.
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    /// External draft id -> internal node id (first occurrence wins).
    pub id_map: HashMap<String, NodeId>,
}

pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    pub fn new() -> Self {
        Self {
            config: LayoutConfig::default(),
        }
    }

    pub fn with_config(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn layout_document(&self, document: &ImportDocument, ids: &dyn IdGenerator) -> LayoutResult {
        let mut result = self.layout(&document.nodes, ids);
        result.title = document.title.clone();
        result
    }

    /// Place `drafts` and connect each to its parent where the parent resolves.
    pub fn layout(&self, drafts: &[DraftNode], ids: &dyn IdGenerator) -> LayoutResult {
        let levels: Vec<u8> = drafts.iter().map(|d| d.level.min(MAX_LEVEL)).collect();

        // Index of each draft inside its level group, and each group's size.
        let mut level_index = Vec::with_capacity(drafts.len());
        let mut level_count: AHashMap<u8, usize> = AHashMap::new();
        for &level in &levels {
            let slot = level_count.entry(level).or_insert(0);
            level_index.push(*slot);
            *slot += 1;
        }

        // First draft carrying each external id.
        let mut by_external: AHashMap<&str, usize> = AHashMap::new();
        for (i, draft) in drafts.iter().enumerate() {
            if let Some(id) = draft.id.as_deref() {
                by_external.entry(id).or_insert(i);
            }
        }

        // Same-level siblings under the same declared parent.
        let mut sibling_index = Vec::with_capacity(drafts.len());
        let mut sibling_count: AHashMap<(&str, u8), usize> = AHashMap::new();
        for (draft, &level) in drafts.iter().zip(&levels) {
            match draft.parent_id.as_deref() {
                Some(parent) => {
                    let slot = sibling_count.entry((parent, level)).or_insert(0);
                    sibling_index.push(*slot);
                    *slot += 1;
                }
                None => sibling_index.push(0),
            }
        }

        let parent_of =
            |i: usize| -> Option<usize> { by_external.get(drafts[i].parent_id.as_deref()?).copied() };

        let level_one_count = level_count.get(&1).copied().unwrap_or(0);
        let mut result = LayoutResult::default();

        for (i, draft) in drafts.iter().enumerate() {
            let level = levels[i];
            let position = match level {
                0 => self.config.root,
                1 => Position::new(
                    centered(self.config.root.x, level_index[i], level_one_count, self.config.branch_spacing),
                    self.config.first_row_y,
                ),
                _ => {
                    let x = match parent_of(i) {
                        Some(p) => {
                            let parent_group = level_count.get(&levels[p]).copied().unwrap_or(1);
                            let parent_x = self.rederived_x(levels[p], level_index[p], parent_group);
                            let parent_key = draft.parent_id.as_deref().unwrap_or_default();
                            let count = sibling_count.get(&(parent_key, level)).copied().unwrap_or(1);
                            centered(parent_x, sibling_index[i], count, self.config.child_spacing)
                        }
                        None => {
                            self.config.fallback_origin + level_index[i] as f64 * self.config.fallback_spacing
                        }
                    };
                    Position::new(x, self.config.row_y(level))
                }
            };

            let is_detail = draft.is_detail || is_detail_label(level, &draft.label);
            let node_id = ids.next_id();
            if let Some(external) = draft.id.as_deref() {
                result
                    .id_map
                    .entry(external.to_string())
                    .or_insert_with(|| node_id.clone());
            }
            result.nodes.push(Node::new(node_id, draft.label.clone(), level, None, position, is_detail));
        }

        // Parent links use internal ids; orphans stay unconnected.
        for i in 0..drafts.len() {
            if let Some(p) = parent_of(i) {
                let parent = result.nodes[p].clone();
                let child = &mut result.nodes[i];
                child.parent_id = Some(parent.id.clone());
                result
                    .edges
                    .push(Edge::new(ids.next_id(), parent.id, child.id.clone(), parent.level));
            }
        }

        debug!(
            "Laid out {} nodes, {} edges ({} orphaned)",
            result.nodes.len(),
            result.edges.len(),
            drafts.iter().filter(|d| d.parent_id.is_some()).count() - result.edges.len()
        );

        result
    }

    /// Approximate x of a parent from its level group alone.
    fn rederived_x(&self, level: u8, index: usize, count: usize) -> f64 {
        match level {
            0 => self.config.root.x,
            1 => centered(self.config.root.x, index, count, self.config.branch_spacing),
            _ => self.config.deep_parent_origin + index as f64 * self.config.deep_parent_spacing,
        }
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}
