//! A window: the leaf of the tree, wrapping one toplevel surface.

use colonnade_config::BorderStyle;
use serde::{Deserialize, Serialize};

use crate::geometry::{Rectangle, Size};
use crate::node::NodeId;
use crate::surface::{Popup, SavedBuffer, SurfaceId};

/// Where a window is attached. Floating iff the parent is a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowParent {
    Column(NodeId),
    Workspace(NodeId),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FullscreenMode {
    #[default]
    None,
    Workspace,
    Global,
}

/// Double-buffered geometry of a window. Commands write `pending`; the
/// transaction engine publishes it to `current` once clients acked.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WindowState {
    /// Full extent including borders and titlebar.
    pub rect: Rectangle,
    /// The area handed to the client surface.
    pub content_rect: Rectangle,
    /// Titlebar strip, if the border style draws one. In stacked/tabbed
    /// columns every child gets a strip even when its content is hidden.
    pub titlebar: Option<Rectangle>,
    pub fullscreen_mode: FullscreenMode,
    pub border: BorderStyle,
    pub border_thickness: i32,
}

#[derive(Debug)]
pub struct Window {
    id: NodeId,
    pub surface: SurfaceId,
    pub parent: WindowParent,

    pub pending: WindowState,
    pub current: WindowState,

    pub title: Option<String>,
    pub app_id: Option<String>,

    /// Marks are free-form strings, globally unique across windows.
    pub marks: Vec<String>,

    /// Stickiness only has an effect while the window floats.
    pub is_sticky: bool,

    pub urgent: bool,
    /// Whether the view is permitted to raise urgency itself.
    pub allow_urgent: bool,

    /// Share of the column row / column height this window occupies. Zero
    /// means "not placed yet"; the arranger assigns the sibling average.
    pub width_fraction: f64,
    pub height_fraction: f64,

    /// Geometry to restore when the window returns to floating.
    pub floating_rect: Option<Rectangle>,
    /// Geometry saved when entering fullscreen.
    pub saved_rect: Option<Rectangle>,
    /// Non-CSD border style to restore when the view leaves CSD.
    pub saved_border: Option<BorderStyle>,

    /// Size hints advertised by the view. Zero components mean "unbounded".
    pub min_size: Size,
    pub max_size: Size,

    pub popups: Vec<Popup>,
    pub saved_buffers: Vec<SavedBuffer>,

    /// Part of the safe-deletion protocol: a destroying window is skipped by
    /// hit-testing and focus, and freed once no transaction references it.
    pub destroying: bool,
    pub ntxnrefs: u32,
}

impl Window {
    pub fn new(surface: SurfaceId, parent: WindowParent) -> Self {
        Self {
            id: NodeId::unique(),
            surface,
            parent,
            pending: WindowState::default(),
            current: WindowState::default(),
            title: None,
            app_id: None,
            marks: Vec::new(),
            is_sticky: false,
            urgent: false,
            allow_urgent: true,
            width_fraction: 0.0,
            height_fraction: 0.0,
            floating_rect: None,
            saved_rect: None,
            saved_border: None,
            min_size: Size::default(),
            max_size: Size::default(),
            popups: Vec::new(),
            saved_buffers: Vec::new(),
            destroying: false,
            ntxnrefs: 0,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn is_floating(&self) -> bool {
        matches!(self.parent, WindowParent::Workspace(_))
    }

    /// A sticky window follows its output's active workspace. Stickiness is
    /// meaningless while tiled.
    pub fn is_sticky_effective(&self) -> bool {
        self.is_sticky && self.is_floating()
    }

    pub fn has_mark(&self, mark: &str) -> bool {
        self.marks.iter().any(|m| m == mark)
    }

    /// Clamp a floating size to the view's hints. Zero hint components do not
    /// constrain.
    pub fn clamp_to_hints(&self, mut size: Size) -> Size {
        if self.min_size.w > 0 {
            size.w = size.w.max(self.min_size.w);
        }
        if self.min_size.h > 0 {
            size.h = size.h.max(self.min_size.h);
        }
        if self.max_size.w > 0 {
            size.w = size.w.min(self.max_size.w);
        }
        if self.max_size.h > 0 {
            size.h = size.h.min(self.max_size.h);
        }
        size
    }
}
