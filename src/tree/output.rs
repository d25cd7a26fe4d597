//! An output: one physical display, owning an ordered list of workspaces and
//! four layer-surface lists.

use crate::geometry::Rectangle;
use crate::node::NodeId;
use crate::surface::{Popup, SurfaceId};

/// Layer-shell stacking layers, bottom-most first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Layer {
    Background = 0,
    Bottom = 1,
    Top = 2,
    Overlay = 3,
}

impl Layer {
    pub const ALL: [Layer; 4] = [Layer::Background, Layer::Bottom, Layer::Top, Layer::Overlay];
}

/// A layer-shell surface mapped on an output. `rect` is in layout
/// coordinates; `exclusive_zone` carves space out of the usable area.
#[derive(Debug, Clone)]
pub struct LayerSurface {
    pub surface: SurfaceId,
    pub rect: Rectangle,
    pub popups: Vec<Popup>,
}

#[derive(Debug)]
pub struct Output {
    id: NodeId,
    pub name: String,
    pub enabled: bool,

    /// Full geometry in layout coordinates.
    pub rect: Rectangle,
    /// `rect` minus reserved layer-shell struts.
    pub usable_area: Rectangle,
    pub scale: f64,

    /// Owned workspaces, in user order.
    pub workspaces: Vec<NodeId>,
    pub active_workspace: Option<NodeId>,

    /// Layer surfaces per [`Layer`], each list in z-order back-to-front.
    pub layers: [Vec<LayerSurface>; 4],
}

impl Output {
    pub fn new(name: String, rect: Rectangle) -> Self {
        Self {
            id: NodeId::unique(),
            name,
            enabled: false,
            rect,
            usable_area: rect,
            scale: 1.0,
            workspaces: Vec::new(),
            active_workspace: None,
            layers: [Vec::new(), Vec::new(), Vec::new(), Vec::new()],
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn layer(&self, layer: Layer) -> &[LayerSurface] {
        &self.layers[layer as usize]
    }

    pub fn layer_mut(&mut self, layer: Layer) -> &mut Vec<LayerSurface> {
        &mut self.layers[layer as usize]
    }

    pub fn workspace_index(&self, workspace: NodeId) -> Option<usize> {
        self.workspaces.iter().position(|&ws| ws == workspace)
    }
}
