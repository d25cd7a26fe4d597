//! The renderer-facing view: a read-only snapshot of committed state.
//!
//! Rebuilt wholesale after every retired transaction and handed to the
//! renderer by shared ownership; the renderer never looks at the tree. Work
//! items are z-ordered back-to-front per output.

use std::sync::Arc;

use colonnade_config::Config;

use crate::geometry::Rectangle;
use crate::input::{DropTarget, MoveGrab};
use crate::node::NodeId;
use crate::seat::Seat;
use crate::surface::SurfaceId;
use crate::tree::{ColumnLayout, Layer, Tree};

/// One thing to draw. Variants appear in stacking order inside
/// [`OutputSnapshot::items`].
#[derive(Debug, Clone, PartialEq)]
pub enum WorkItem {
    LayerSurface {
        surface: SurfaceId,
        rect: Rectangle,
    },
    /// Window border frame (drawn under content).
    Border {
        window: NodeId,
        rect: Rectangle,
        thickness: i32,
        tint: [f32; 4],
    },
    Titlebar {
        window: NodeId,
        rect: Rectangle,
        tint: [f32; 4],
        title: Option<String>,
        /// Mark strings to draw, empty when `show_marks` is off.
        marks: Vec<String>,
    },
    Content {
        window: NodeId,
        surface: SurfaceId,
        rect: Rectangle,
    },
    /// Last-known texture of a closed window, for the close animation.
    SavedBuffer {
        texture: u64,
        rect: Rectangle,
    },
    Popup {
        window: NodeId,
        surface: SurfaceId,
        rect: Rectangle,
    },
    DragIcon {
        surface: SurfaceId,
    },
    /// Interactive drag-move drop-zone preview.
    DropZone {
        rect: Rectangle,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputSnapshot {
    pub output: NodeId,
    pub name: String,
    pub rect: Rectangle,
    pub items: Vec<WorkItem>,
}

/// The whole published frame state. The only structure read off-thread.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub outputs: Vec<OutputSnapshot>,
}

/// Build a fresh snapshot from committed (`current`) state.
pub fn snapshot(
    tree: &Tree,
    config: &Config,
    seat: &Seat,
    move_grab: Option<&MoveGrab>,
) -> Arc<Snapshot> {
    let mut outputs = Vec::new();

    for output in tree.enabled_outputs() {
        let mut items = Vec::new();

        for layer in [Layer::Background, Layer::Bottom] {
            for surface in output.layer(layer) {
                items.push(WorkItem::LayerSurface {
                    surface: surface.surface,
                    rect: surface.rect,
                });
            }
        }

        if let Some(ws_id) = output.active_workspace {
            let ws = tree.workspace(ws_id);
            let fullscreen = tree.root.fullscreen_global.or(ws.fullscreen);

            if let Some(fs) = fullscreen {
                push_window(&mut items, tree, config, seat, fs);
            } else {
                for &col_id in &ws.columns {
                    let column = tree.column(col_id);
                    match column.layout {
                        ColumnLayout::Vertical => {
                            for &win in &column.children {
                                push_window(&mut items, tree, config, seat, win);
                            }
                        }
                        ColumnLayout::Stacked | ColumnLayout::Tabbed => {
                            // Strips for every child, content only for the
                            // visible one.
                            for &win in &column.children {
                                push_titlebar(&mut items, tree, config, seat, win);
                            }
                            if let Some(win) = column.visible_child() {
                                push_content(&mut items, tree, win);
                            }
                        }
                    }
                }
                for &win in &ws.floating {
                    push_window(&mut items, tree, config, seat, win);
                }
            }

            // Close animations play above regular content.
            for &win in &ws.floating {
                push_saved_buffers(&mut items, tree, win);
            }
            for col in &ws.columns {
                for &win in &tree.column(*col).children {
                    push_saved_buffers(&mut items, tree, win);
                }
            }
        }

        for surface in output.layer(Layer::Top) {
            items.push(WorkItem::LayerSurface {
                surface: surface.surface,
                rect: surface.rect,
            });
        }

        // The focused view's popups come last among window content.
        if let Some(focused) = seat.focused_window() {
            if let Some(window) = tree.try_window(focused) {
                for popup in &window.popups {
                    items.push(WorkItem::Popup {
                        window: focused,
                        surface: popup.surface,
                        rect: popup.rect,
                    });
                }
            }
        }

        for surface in output.layer(Layer::Overlay) {
            items.push(WorkItem::LayerSurface {
                surface: surface.surface,
                rect: surface.rect,
            });
        }

        for &icon in &tree.root.drag_icons {
            items.push(WorkItem::DragIcon { surface: icon });
        }

        if let Some(DropTarget { drop_box, .. }) =
            move_grab.filter(|grab| grab.threshold_reached).and_then(|grab| grab.target)
        {
            if output.rect.overlaps(drop_box) {
                items.push(WorkItem::DropZone { rect: drop_box });
            }
        }

        outputs.push(OutputSnapshot {
            output: output.id(),
            name: output.name.clone(),
            rect: output.rect,
            items,
        });
    }

    Arc::new(Snapshot { outputs })
}

fn tint(tree: &Tree, config: &Config, seat: &Seat, win: NodeId) -> [f32; 4] {
    let window = tree.window(win);
    if window.urgent {
        config.decorations.urgent_tint
    } else if seat.focused_window() == Some(win) {
        config.decorations.focused_tint
    } else {
        config.decorations.unfocused_tint
    }
}

fn push_window(items: &mut Vec<WorkItem>, tree: &Tree, config: &Config, seat: &Seat, win: NodeId) {
    let Some(window) = tree.try_window(win) else {
        return;
    };
    if window.destroying {
        return;
    }
    if window.current.border_thickness > 0
        && window.current.rect != window.current.content_rect
    {
        items.push(WorkItem::Border {
            window: win,
            rect: window.current.rect,
            thickness: window.current.border_thickness,
            tint: tint(tree, config, seat, win),
        });
    }
    push_titlebar(items, tree, config, seat, win);
    push_content(items, tree, win);
}

fn push_titlebar(
    items: &mut Vec<WorkItem>,
    tree: &Tree,
    config: &Config,
    seat: &Seat,
    win: NodeId,
) {
    let Some(window) = tree.try_window(win) else {
        return;
    };
    let Some(rect) = window.current.titlebar else {
        return;
    };
    let marks = if config.general.show_marks {
        window.marks.clone()
    } else {
        Vec::new()
    };
    items.push(WorkItem::Titlebar {
        window: win,
        rect,
        tint: tint(tree, config, seat, win),
        title: window.title.clone(),
        marks,
    });
}

fn push_content(items: &mut Vec<WorkItem>, tree: &Tree, win: NodeId) {
    let Some(window) = tree.try_window(win) else {
        return;
    };
    if window.destroying || window.current.content_rect.is_empty() {
        return;
    }
    items.push(WorkItem::Content {
        window: win,
        surface: window.surface,
        rect: window.current.content_rect,
    });
}

fn push_saved_buffers(items: &mut Vec<WorkItem>, tree: &Tree, win: NodeId) {
    let Some(window) = tree.try_window(win) else {
        return;
    };
    for buffer in &window.saved_buffers {
        items.push(WorkItem::SavedBuffer {
            texture: buffer.texture,
            rect: buffer.rect,
        });
    }
}
