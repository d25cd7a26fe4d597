//! Hit-testing: map layout coordinates to the entity under the cursor.
//!
//! The resolution order is fixed, top-most first: overlay layer, fullscreen
//! takeovers, upper-layer popups, top layer, window content (focused view's
//! popups, floating across outputs, then tiling), and finally the bottom and
//! background layers. The result is deterministic between commits.

use crate::geometry::Point;
use crate::node::NodeId;
use crate::seat::Seat;
use crate::surface::SurfaceId;
use crate::tree::{ColumnLayout, Layer, Tree};

/// What lies under a layout-space point.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HitTarget {
    pub output: Option<NodeId>,
    pub window: Option<NodeId>,
    pub surface: Option<SurfaceId>,
    /// Surface-local coordinates, valid when `surface` is set.
    pub sx: f64,
    pub sy: f64,
}

impl HitTarget {
    const MISS: Self = Self {
        output: None,
        window: None,
        surface: None,
        sx: 0.0,
        sy: 0.0,
    };

    fn surface_at(output: NodeId, surface: SurfaceId, rect_loc: Point, point: Point<f64>) -> Self {
        Self {
            output: Some(output),
            window: None,
            surface: Some(surface),
            sx: point.x - rect_loc.x as f64,
            sy: point.y - rect_loc.y as f64,
        }
    }

    fn window_at(
        output: NodeId,
        window: NodeId,
        surface: Option<SurfaceId>,
        rect_loc: Point,
        point: Point<f64>,
    ) -> Self {
        Self {
            output: Some(output),
            window: Some(window),
            surface,
            sx: point.x - rect_loc.x as f64,
            sy: point.y - rect_loc.y as f64,
        }
    }
}

/// Resolve the entity under `point`. Returns all-null when the point is
/// outside every output.
pub fn target_at(tree: &Tree, seat: &Seat, point: Point<f64>) -> HitTarget {
    let Some(out_id) = output_at(tree, point) else {
        return HitTarget::MISS;
    };

    // 1. Overlay layer, topmost first.
    if let Some(hit) = layer_surface_at(tree, out_id, Layer::Overlay, point) {
        return hit;
    }

    // 2. Fullscreen takeovers swallow everything below them.
    if let Some(fs) = tree.root.fullscreen_global {
        return fullscreen_hit(tree, out_id, fs, point);
    }
    let active_ws = tree.output(out_id).active_workspace;
    if let Some(fs) = active_ws.and_then(|ws| tree.workspace(ws).fullscreen) {
        return fullscreen_hit(tree, out_id, fs, point);
    }

    // 3. Popups of the upper layers, top to bottom.
    for layer in [Layer::Top, Layer::Bottom, Layer::Background] {
        if let Some(hit) = layer_popup_at(tree, out_id, layer, point) {
            return hit;
        }
    }

    // 4. Top layer surfaces.
    if let Some(hit) = layer_surface_at(tree, out_id, Layer::Top, point) {
        return hit;
    }

    // 5. Window content.
    if let Some(hit) = window_content_at(tree, seat, out_id, point) {
        return hit;
    }

    // 6. Bottom then background layers.
    for layer in [Layer::Bottom, Layer::Background] {
        if let Some(hit) = layer_surface_at(tree, out_id, layer, point) {
            return hit;
        }
    }

    HitTarget {
        output: Some(out_id),
        ..HitTarget::MISS
    }
}

pub fn output_at(tree: &Tree, point: Point<f64>) -> Option<NodeId> {
    tree.enabled_outputs()
        .find(|output| output.rect.contains(point))
        .map(|output| output.id())
}

fn fullscreen_hit(tree: &Tree, out_id: NodeId, fs: NodeId, point: Point<f64>) -> HitTarget {
    let window = tree.window(fs);
    for popup in window.popups.iter().rev() {
        if popup.rect.contains(point) {
            return HitTarget::window_at(out_id, fs, Some(popup.surface), popup.rect.loc, point);
        }
    }
    let content = window.current.content_rect;
    if content.contains(point) {
        return HitTarget::window_at(out_id, fs, Some(window.surface), content.loc, point);
    }
    // The takeover still captures the whole output.
    HitTarget {
        output: Some(out_id),
        window: Some(fs),
        surface: None,
        sx: 0.0,
        sy: 0.0,
    }
}

fn layer_surface_at(
    tree: &Tree,
    out_id: NodeId,
    layer: Layer,
    point: Point<f64>,
) -> Option<HitTarget> {
    let output = tree.output(out_id);
    for surface in output.layer(layer).iter().rev() {
        if surface.rect.contains(point) {
            return Some(HitTarget::surface_at(
                out_id,
                surface.surface,
                surface.rect.loc,
                point,
            ));
        }
    }
    None
}

fn layer_popup_at(tree: &Tree, out_id: NodeId, layer: Layer, point: Point<f64>) -> Option<HitTarget> {
    let output = tree.output(out_id);
    for surface in output.layer(layer).iter().rev() {
        for popup in surface.popups.iter().rev() {
            if popup.rect.contains(point) {
                return Some(HitTarget::surface_at(
                    out_id,
                    popup.surface,
                    popup.rect.loc,
                    point,
                ));
            }
        }
    }
    None
}

fn window_content_at(
    tree: &Tree,
    seat: &Seat,
    out_id: NodeId,
    point: Point<f64>,
) -> Option<HitTarget> {
    // a. The focused view's popups escape their parent's clipping.
    if let Some(focused) = seat.focused_window() {
        if let Some(window) = tree.try_window(focused).filter(|w| !w.destroying) {
            for popup in window.popups.iter().rev() {
                if popup.rect.contains(point) {
                    return Some(HitTarget::window_at(
                        out_id,
                        focused,
                        Some(popup.surface),
                        popup.rect.loc,
                        point,
                    ));
                }
            }
        }
    }

    // b. Floating windows across all outputs; later outputs win (a floater
    // overhanging from an earlier output must not shadow them).
    for output in tree.enabled_outputs().collect::<Vec<_>>().into_iter().rev() {
        let Some(ws) = output.active_workspace else {
            continue;
        };
        for &win_id in tree.workspace(ws).floating.iter().rev() {
            let window = tree.window(win_id);
            if window.destroying {
                continue;
            }
            if let Some(hit) = window_hit(tree, output.id(), win_id, point) {
                return Some(hit);
            }
        }
    }

    // c. Tiling windows of the output under the cursor.
    let output = tree.output(out_id);
    if !output.usable_area.contains(point) {
        return None;
    }
    let ws_id = output.active_workspace?;
    for &col_id in &tree.workspace(ws_id).columns {
        let column = tree.column(col_id);
        if !column.pending.rect.contains(point) {
            continue;
        }
        return column_hit(tree, out_id, col_id, point);
    }
    None
}

/// Hit one window's titlebar, border, or content.
fn window_hit(tree: &Tree, out_id: NodeId, win_id: NodeId, point: Point<f64>) -> Option<HitTarget> {
    let window = tree.window(win_id);
    if let Some(titlebar) = window.pending.titlebar {
        if titlebar.contains(point) {
            // Titlebars belong to the engine, not any client surface.
            return Some(HitTarget::window_at(out_id, win_id, None, titlebar.loc, point));
        }
    }
    let content = window.pending.content_rect;
    if content.contains(point) {
        return Some(HitTarget::window_at(
            out_id,
            win_id,
            Some(window.surface),
            content.loc,
            point,
        ));
    }
    if window.pending.rect.contains(point) {
        // Border area.
        return Some(HitTarget::window_at(
            out_id,
            win_id,
            None,
            window.pending.rect.loc,
            point,
        ));
    }
    None
}

/// Choose the child of a column under `point` according to its layout.
fn column_hit(tree: &Tree, out_id: NodeId, col_id: NodeId, point: Point<f64>) -> Option<HitTarget> {
    let column = tree.column(col_id);
    match column.layout {
        ColumnLayout::Vertical => {
            for &win_id in &column.children {
                if tree.window(win_id).pending.rect.contains(point) {
                    return window_hit(tree, out_id, win_id, point);
                }
            }
            None
        }
        ColumnLayout::Stacked | ColumnLayout::Tabbed => {
            for &win_id in &column.children {
                if let Some(titlebar) = tree.window(win_id).pending.titlebar {
                    if titlebar.contains(point) {
                        return Some(HitTarget::window_at(
                            out_id,
                            win_id,
                            None,
                            titlebar.loc,
                            point,
                        ));
                    }
                }
            }
            let active = column.visible_child()?;
            window_hit(tree, out_id, active, point)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rectangle;
    use crate::surface::{Popup, SurfaceId};
    use crate::tree::{LayerSurface, WindowParent};
    use crate::{arrange, seat};

    fn setup() -> (Tree, Seat, NodeId, NodeId) {
        let mut tree = Tree::new();
        let output = tree.add_output("DP-1".into(), Rectangle::from_coords(0, 0, 1000, 1000));
        tree.root.outputs.push(output);
        tree.output_mut(output).enabled = true;
        let ws = tree.create_workspace("1".into(), Some(output));
        tree.output_mut(output).active_workspace = Some(ws);
        (tree, Seat::new("seat0"), output, ws)
    }

    fn config() -> colonnade_config::Config {
        let mut config = colonnade_config::Config::default();
        config.decorations.border_style = colonnade_config::BorderStyle::None;
        config
    }

    #[test]
    fn outside_everything_is_a_miss() {
        let (tree, seat, _, _) = setup();
        let hit = target_at(&tree, &seat, Point::new(5000.0, 5000.0));
        assert_eq!(hit, HitTarget::MISS);
    }

    #[test]
    fn tiled_window_content_resolves_with_local_coords() {
        let (mut tree, seat, output, ws) = setup();
        let col = tree.add_column(ws, ColumnLayout::Vertical, 0);
        let win = tree.add_window(SurfaceId::unique(), WindowParent::Column(col));
        arrange::arrange_workspace(&mut tree, &config(), ws);

        let hit = target_at(&tree, &seat, Point::new(40.0, 60.0));
        assert_eq!(hit.output, Some(output));
        assert_eq!(hit.window, Some(win));
        assert_eq!(hit.surface, Some(tree.window(win).surface));
        assert_eq!((hit.sx, hit.sy), (40.0, 60.0));
    }

    #[test]
    fn overlay_layer_shadows_windows() {
        let (mut tree, seat, output, ws) = setup();
        let col = tree.add_column(ws, ColumnLayout::Vertical, 0);
        let _win = tree.add_window(SurfaceId::unique(), WindowParent::Column(col));
        arrange::arrange_workspace(&mut tree, &config(), ws);

        let bar = SurfaceId::unique();
        tree.output_mut(output).layer_mut(Layer::Overlay).push(LayerSurface {
            surface: bar,
            rect: Rectangle::from_coords(0, 0, 1000, 30),
            popups: Vec::new(),
        });

        let hit = target_at(&tree, &seat, Point::new(10.0, 10.0));
        assert_eq!(hit.surface, Some(bar));
        assert_eq!(hit.window, None);
    }

    #[test]
    fn floating_wins_over_tiling() {
        let (mut tree, mut seat, _, ws) = setup();
        let col = tree.add_column(ws, ColumnLayout::Vertical, 0);
        let tiled = tree.add_window(SurfaceId::unique(), WindowParent::Column(col));
        let floater = tree.add_window(SurfaceId::unique(), WindowParent::Workspace(ws));
        tree.window_mut(floater).pending.rect = Rectangle::from_coords(100, 100, 200, 200);
        let mut events = crate::event::Events::new();
        seat::set_focus(&mut tree, &mut seat, &mut events, tiled);
        arrange::arrange_workspace(&mut tree, &config(), ws);

        let hit = target_at(&tree, &seat, Point::new(150.0, 150.0));
        assert_eq!(hit.window, Some(floater));

        let hit = target_at(&tree, &seat, Point::new(500.0, 500.0));
        assert_eq!(hit.window, Some(tiled));
    }

    #[test]
    fn stacked_titlebar_strip_selects_child() {
        let (mut tree, seat, _, ws) = setup();
        let col = tree.add_column(ws, ColumnLayout::Stacked, 0);
        let w1 = tree.add_window(SurfaceId::unique(), WindowParent::Column(col));
        let w2 = tree.add_window(SurfaceId::unique(), WindowParent::Column(col));
        tree.column_mut(col).active_child = Some(w1);
        let cfg = config();
        arrange::arrange_workspace(&mut tree, &cfg, ws);
        let strip = arrange::titlebar_height(&cfg) as f64;

        // Second strip belongs to w2; content belongs to the active child.
        let hit = target_at(&tree, &seat, Point::new(10.0, strip + 1.0));
        assert_eq!(hit.window, Some(w2));
        assert_eq!(hit.surface, None);

        let hit = target_at(&tree, &seat, Point::new(10.0, strip * 2.0 + 10.0));
        assert_eq!(hit.window, Some(w1));
    }

    #[test]
    fn fullscreen_swallows_the_output() {
        let (mut tree, seat, _, ws) = setup();
        let col = tree.add_column(ws, ColumnLayout::Vertical, 0);
        let w1 = tree.add_window(SurfaceId::unique(), WindowParent::Column(col));
        let floater = tree.add_window(SurfaceId::unique(), WindowParent::Workspace(ws));
        tree.window_mut(floater).pending.rect = Rectangle::from_coords(0, 0, 300, 300);

        tree.set_fullscreen(w1, crate::tree::FullscreenMode::Workspace);
        arrange::arrange_workspace(&mut tree, &config(), ws);
        // Hit-testing walks current state for fullscreen content.
        let window = tree.window_mut(w1);
        window.current = window.pending;

        let hit = target_at(&tree, &seat, Point::new(150.0, 150.0));
        assert_eq!(hit.window, Some(w1));
    }

    #[test]
    fn focused_popup_escapes_clipping() {
        let (mut tree, mut seat, _, ws) = setup();
        let col = tree.add_column(ws, ColumnLayout::Vertical, 0);
        let w1 = tree.add_window(SurfaceId::unique(), WindowParent::Column(col));
        let w2 = tree.add_window(SurfaceId::unique(), WindowParent::Column(col));
        let mut events = crate::event::Events::new();
        seat::set_focus(&mut tree, &mut seat, &mut events, w1);
        arrange::arrange_workspace(&mut tree, &config(), ws);

        let popup_surface = SurfaceId::unique();
        tree.window_mut(w1).popups.push(Popup {
            surface: popup_surface,
            // Overhangs into w2's half of the column.
            rect: Rectangle::from_coords(0, 400, 400, 300),
        });

        let hit = target_at(&tree, &seat, Point::new(200.0, 650.0));
        assert_eq!(hit.window, Some(w1));
        assert_eq!(hit.surface, Some(popup_surface));
    }
}
