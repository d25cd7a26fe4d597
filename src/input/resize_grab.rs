//! Interactive resize: floating absolute adjustment and tiled fraction
//! adjustment while a pointer button is held.

use colonnade_config::Config;

use crate::arrange;
use crate::commands::resize::{resize_tiled, ResizeAxis};
use crate::geometry::{Point, Rectangle};
use crate::node::NodeId;
use crate::tree::Tree;

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ResizeEdge: u32 {
        const NONE = 0;
        const TOP = 1;
        const BOTTOM = 2;
        const LEFT = 4;
        const TOP_LEFT = 5;
        const BOTTOM_LEFT = 6;
        const RIGHT = 8;
        const TOP_RIGHT = 9;
        const BOTTOM_RIGHT = 10;
    }
}

/// The interactive resize op. Owned by the engine while the button is held.
#[derive(Debug)]
pub struct ResizeGrab {
    pub window: NodeId,
    pub edges: ResizeEdge,
    start_point: Point<f64>,
    /// Floating geometry at grab start.
    start_rect: Rectangle,
    /// Pointer position at the last tiled fraction mutation.
    last_point: Point<f64>,
    floating: bool,
    /// Keep width/height locked to the start aspect ratio (modifier held).
    pub preserve_aspect: bool,
}

impl ResizeGrab {
    pub fn new(tree: &Tree, window: NodeId, edges: ResizeEdge, point: Point<f64>) -> Self {
        let win = tree.window(window);
        Self {
            window,
            edges,
            start_point: point,
            start_rect: win.pending.rect,
            last_point: point,
            floating: win.is_floating(),
            preserve_aspect: false,
        }
    }

    /// Feed one pointer motion. Returns `true` while the grab stays valid.
    pub fn motion(&mut self, tree: &mut Tree, config: &Config, point: Point<f64>) -> bool {
        if tree.try_window(self.window).is_none_or(|w| w.destroying) {
            return false;
        }

        if self.floating {
            self.resize_floating(tree, config, point);
        } else {
            self.resize_tiled_delta(tree, point);
        }
        true
    }

    fn resize_floating(&mut self, tree: &mut Tree, config: &Config, point: Point<f64>) {
        let dx = (point.x - self.start_point.x) as i32;
        let dy = (point.y - self.start_point.y) as i32;
        let start = self.start_rect;
        let mut rect = start;

        if self.edges.contains(ResizeEdge::LEFT) {
            rect.size.w = start.size.w - dx;
        } else if self.edges.contains(ResizeEdge::RIGHT) {
            rect.size.w = start.size.w + dx;
        }
        if self.edges.contains(ResizeEdge::TOP) {
            rect.size.h = start.size.h - dy;
        } else if self.edges.contains(ResizeEdge::BOTTOM) {
            rect.size.h = start.size.h + dy;
        }

        if self.preserve_aspect && start.size.h > 0 {
            let ratio = start.size.w as f64 / start.size.h as f64;
            if self.edges.intersects(ResizeEdge::LEFT | ResizeEdge::RIGHT) {
                rect.size.h = (rect.size.w as f64 / ratio).round() as i32;
            } else {
                rect.size.w = (rect.size.h as f64 * ratio).round() as i32;
            }
        }

        rect = arrange::clamp_floating(tree, config, self.window, rect);

        // Anchor the edge opposite to the one being dragged.
        if self.edges.contains(ResizeEdge::LEFT) {
            rect.loc.x = start.loc.x + (start.size.w - rect.size.w);
        }
        if self.edges.contains(ResizeEdge::TOP) {
            rect.loc.y = start.loc.y + (start.size.h - rect.size.h);
        }

        let window = tree.window_mut(self.window);
        if window.pending.rect != rect {
            window.pending.rect = rect;
            window.floating_rect = Some(rect);
            tree.dirty.mark(self.window);
        }
    }

    fn resize_tiled_delta(&mut self, tree: &mut Tree, point: Point<f64>) {
        let dx = (point.x - self.last_point.x) as i32;
        let dy = (point.y - self.last_point.y) as i32;

        let mut moved = false;
        if dx != 0 && self.edges.intersects(ResizeEdge::LEFT | ResizeEdge::RIGHT) {
            let (axis, amount) = if self.edges.contains(ResizeEdge::LEFT) {
                (ResizeAxis::Left, -dx)
            } else {
                (ResizeAxis::Right, dx)
            };
            moved |= resize_tiled(tree, self.window, axis, amount);
        }
        if dy != 0 && self.edges.intersects(ResizeEdge::TOP | ResizeEdge::BOTTOM) {
            let (axis, amount) = if self.edges.contains(ResizeEdge::TOP) {
                (ResizeAxis::Up, -dy)
            } else {
                (ResizeAxis::Down, dy)
            };
            moved |= resize_tiled(tree, self.window, axis, amount);
        }
        if moved {
            self.last_point = point;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::SurfaceId;
    use crate::tree::{ColumnLayout, WindowParent};

    fn setup() -> (Tree, Config, NodeId) {
        let mut tree = Tree::new();
        let mut config = Config::default();
        config.decorations.border_style = colonnade_config::BorderStyle::None;
        let output = tree.add_output("DP-1".into(), Rectangle::from_coords(0, 0, 1000, 1000));
        tree.root.outputs.push(output);
        tree.output_mut(output).enabled = true;
        let ws = tree.create_workspace("1".into(), Some(output));
        tree.output_mut(output).active_workspace = Some(ws);
        (tree, config, ws)
    }

    #[test]
    fn floating_resize_anchors_opposite_edge() {
        let (mut tree, config, ws) = setup();
        let win = tree.add_window(SurfaceId::unique(), WindowParent::Workspace(ws));
        tree.window_mut(win).pending.rect = Rectangle::from_coords(400, 400, 200, 200);

        let mut grab = ResizeGrab::new(
            &tree,
            win,
            ResizeEdge::TOP_LEFT,
            Point::new(400.0, 400.0),
        );
        assert!(grab.motion(&mut tree, &config, Point::new(350.0, 360.0)));

        let rect = tree.window(win).pending.rect;
        // Bottom-right corner stays fixed.
        assert_eq!(rect.loc.x + rect.size.w, 600);
        assert_eq!(rect.loc.y + rect.size.h, 600);
        assert_eq!(rect.size.w, 250);
        assert_eq!(rect.size.h, 240);
    }

    #[test]
    fn floating_resize_respects_minimum() {
        let (mut tree, config, ws) = setup();
        let win = tree.add_window(SurfaceId::unique(), WindowParent::Workspace(ws));
        tree.window_mut(win).pending.rect = Rectangle::from_coords(400, 400, 200, 200);

        let mut grab = ResizeGrab::new(
            &tree,
            win,
            ResizeEdge::BOTTOM_RIGHT,
            Point::new(600.0, 600.0),
        );
        grab.motion(&mut tree, &config, Point::new(100.0, 100.0));

        let rect = tree.window(win).pending.rect;
        let (min_w, min_h) = config.general.floating_minimum_size;
        assert_eq!(rect.size.w, min_w);
        assert_eq!(rect.size.h, min_h);
    }

    #[test]
    fn tiled_resize_shifts_column_fractions() {
        let (mut tree, config, ws) = setup();
        let col_a = tree.add_column(ws, ColumnLayout::Vertical, 0);
        let w1 = tree.add_window(SurfaceId::unique(), WindowParent::Column(col_a));
        let col_b = tree.add_column(ws, ColumnLayout::Vertical, 1);
        let _w2 = tree.add_window(SurfaceId::unique(), WindowParent::Column(col_b));
        crate::arrange::arrange_workspace(&mut tree, &config, ws);

        let mut grab = ResizeGrab::new(&tree, w1, ResizeEdge::RIGHT, Point::new(500.0, 500.0));
        grab.motion(&mut tree, &config, Point::new(600.0, 500.0));
        crate::arrange::arrange_workspace(&mut tree, &config, ws);

        assert_eq!(tree.column(col_a).pending.rect.size.w, 600);
        assert_eq!(tree.column(col_b).pending.rect.size.w, 400);
    }
}
