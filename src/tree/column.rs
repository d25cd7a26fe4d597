//! A column: the tiling unit inside a workspace.

use serde::{Deserialize, Serialize};

use crate::geometry::Rectangle;
use crate::node::NodeId;

/// How a column lays out its children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnLayout {
    /// Children stacked top-to-bottom, each with an explicit height fraction.
    #[default]
    Vertical,
    /// Only the active child is visible; one titlebar strip per child drawn at
    /// the top in child order.
    Stacked,
    /// Like stacked, but a single titlebar row with per-child tabs.
    Tabbed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ColumnState {
    pub rect: Rectangle,
}

#[derive(Debug)]
pub struct Column {
    id: NodeId,
    pub workspace: NodeId,
    pub layout: ColumnLayout,
    /// Child windows, top-to-bottom.
    pub children: Vec<NodeId>,
    /// Most-recently-focused child; survives refocus elsewhere.
    pub active_child: Option<NodeId>,
    /// Share of the workspace tiling row. Zero means "not placed yet".
    pub width_fraction: f64,
    /// Pixel height available to children at the last arrangement, used to
    /// snap fractions before a resize.
    pub child_total_height: f64,

    pub pending: ColumnState,
    pub current: ColumnState,

    pub destroying: bool,
}

impl Column {
    pub fn new(workspace: NodeId, layout: ColumnLayout) -> Self {
        Self {
            id: NodeId::unique(),
            workspace,
            layout,
            children: Vec::new(),
            active_child: None,
            width_fraction: 0.0,
            child_total_height: 0.0,
            pending: ColumnState::default(),
            current: ColumnState::default(),
            destroying: false,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn child_index(&self, window: NodeId) -> Option<usize> {
        self.children.iter().position(|&child| child == window)
    }

    /// The child to show when only one can be visible. Falls back to the
    /// first child if the active pointer went stale.
    pub fn visible_child(&self) -> Option<NodeId> {
        self.active_child
            .filter(|id| self.children.contains(id))
            .or_else(|| self.children.first().copied())
    }
}
