//! The arranger: computes pending geometry for every dirty subtree.
//!
//! Geometry flows top-down: root → output → workspace → column → window. All
//! writes go to `pending` state; nothing here touches `current`, which is the
//! transaction engine's job.

use colonnade_config::{BorderStyle, Config, SmartGaps};
use indexmap::IndexSet;

use crate::geometry::{Point, Rectangle, Size};
use crate::node::{NodeId, NodeKind};
use crate::tree::{ColumnLayout, FullscreenMode, Tree};

/// Minimum size a tiled window may be laid out at. Resizes that would go
/// below are rejected; arrangement itself clamps gap growth instead.
pub const MIN_SANE_W: i32 = 100;
pub const MIN_SANE_H: i32 = 60;

/// Height of one titlebar strip.
pub fn titlebar_height(config: &Config) -> i32 {
    config.decorations.font_height
        + 2 * config.decorations.titlebar_v_padding
        + 2 * config.decorations.titlebar_border_thickness
}

/// Arrange every workspace affected by the drained dirty batch.
pub fn arrange_dirty(tree: &mut Tree, config: &Config, batch: &IndexSet<NodeId>) {
    let mut workspaces: IndexSet<NodeId> = IndexSet::new();
    for &id in batch {
        match tree.kind(id) {
            Some(NodeKind::Window) => {
                if tree.try_window(id).is_some_and(|w| !w.destroying) {
                    workspaces.insert(tree.window_workspace(id));
                }
            }
            Some(NodeKind::Column) => {
                if let Some(column) = tree.try_column(id) {
                    workspaces.insert(column.workspace);
                }
            }
            Some(NodeKind::Workspace) => {
                if tree.try_workspace(id).is_some_and(|ws| !ws.destroying) {
                    workspaces.insert(id);
                }
            }
            Some(NodeKind::Output) => {
                if let Some(output) = tree.try_output(id) {
                    workspaces.extend(output.workspaces.iter().copied());
                }
            }
            None => {}
        }
    }

    arrange_root_rect(tree);
    for ws in workspaces {
        arrange_workspace(tree, config, ws);
    }

    if let Some(fs) = tree.root.fullscreen_global {
        let rect = tree.root.rect;
        let window = tree.window_mut(fs);
        window.pending.rect = rect;
        window.pending.content_rect = rect;
        window.pending.titlebar = None;
    }
}

/// Recompute the root bounding box from the enabled outputs.
pub fn arrange_root_rect(tree: &mut Tree) {
    let mut rect: Option<Rectangle> = None;
    for output in tree.enabled_outputs() {
        rect = Some(match rect {
            Some(acc) => acc.merge(output.rect),
            None => output.rect,
        });
    }
    tree.root.rect = rect.unwrap_or_default();
}

/// Arrange one workspace: gaps, the tiling row, floating windows, and the
/// fullscreen takeover.
pub fn arrange_workspace(tree: &mut Tree, config: &Config, ws_id: NodeId) {
    let Some(out_id) = tree.workspace(ws_id).output else {
        // Happens while the workspace is parked without any output.
        return;
    };
    let output_rect = tree.output(out_id).rect;
    let usable = tree.output(out_id).usable_area;

    // Smart gaps look at how many tiled windows are actually visible.
    let visible_tiled = tree.visible_tiled_windows(ws_id).len();
    let ws = tree.workspace(ws_id);
    let (outer, inner) = match config.general.smart_gaps {
        SmartGaps::On if visible_tiled == 1 => (colonnade_config::SideGaps::uniform(0), 0),
        SmartGaps::InverseOuter if visible_tiled > 1 => {
            (colonnade_config::SideGaps::uniform(0), ws.gaps_inner)
        }
        _ => (ws.gaps_outer, ws.gaps_inner),
    };

    let tiling_area = usable.shrink(
        outer.top + inner,
        outer.right + inner,
        outer.bottom + inner,
        outer.left + inner,
    );
    let ws = tree.workspace_mut(ws_id);
    ws.pending.rect = tiling_area;
    tree.dirty.mark(ws_id);

    if let Some(fs) = tree.workspace(ws_id).fullscreen {
        // Fullscreen covers the whole output, gaps and struts included.
        let window = tree.window_mut(fs);
        window.pending.rect = output_rect;
        window.pending.content_rect = output_rect;
        window.pending.titlebar = None;
    }

    arrange_tiling(tree, config, ws_id, inner);
    arrange_floating(tree, config, ws_id);
}

/// Lay out the workspace's columns left-to-right.
fn arrange_tiling(tree: &mut Tree, config: &Config, ws_id: NodeId, inner_gap: i32) {
    let area = tree.workspace(ws_id).pending.rect;
    let columns: Vec<NodeId> = tree.workspace(ws_id).columns.clone();
    if columns.is_empty() {
        return;
    }

    normalize_fractions(
        columns
            .iter()
            .map(|&col| tree.column(col).width_fraction)
            .collect(),
    )
    .into_iter()
    .zip(&columns)
    .for_each(|(fraction, &col)| tree.column_mut(col).width_fraction = fraction);

    let count = columns.len() as i32;
    let total_gap = (inner_gap as f64 * (count - 1) as f64)
        .min(((area.size.w - MIN_SANE_W * count) as f64).max(0.0));
    let child_total_width = area.size.w as f64 - total_gap;
    let gap = if count > 1 {
        (total_gap / (count - 1) as f64).floor() as i32
    } else {
        0
    };
    tree.workspace_mut(ws_id).child_total_width = child_total_width;

    let mut x = area.loc.x;
    for (i, &col_id) in columns.iter().enumerate() {
        let fraction = tree.column(col_id).width_fraction;
        let mut width = (fraction * child_total_width).round() as i32;
        // The last column absorbs rounding residue so the row exactly fills.
        if i == columns.len() - 1 {
            width = area.loc.x + area.size.w - x;
        }
        let rect = Rectangle::from_coords(x, area.loc.y, width, area.size.h);
        tree.column_mut(col_id).pending.rect = rect;
        tree.dirty.mark(col_id);
        x += width + gap;

        arrange_column(tree, config, col_id);
    }
}

/// Lay out a column's children according to its layout mode.
pub fn arrange_column(tree: &mut Tree, config: &Config, col_id: NodeId) {
    let column = tree.column(col_id);
    let layout = column.layout;
    let rect = column.pending.rect;
    let children: Vec<NodeId> = column.children.clone();
    if children.is_empty() {
        return;
    }

    match layout {
        ColumnLayout::Vertical => arrange_column_vertical(tree, config, col_id, rect, &children),
        ColumnLayout::Stacked => arrange_column_stacked(tree, config, col_id, rect, &children),
        ColumnLayout::Tabbed => arrange_column_tabbed(tree, config, col_id, rect, &children),
    }
}

fn arrange_column_vertical(
    tree: &mut Tree,
    config: &Config,
    col_id: NodeId,
    rect: Rectangle,
    children: &[NodeId],
) {
    let inner_gap = tree
        .workspace(tree.column(col_id).workspace)
        .gaps_inner;

    normalize_fractions(
        children
            .iter()
            .map(|&win| tree.window(win).height_fraction)
            .collect(),
    )
    .into_iter()
    .zip(children)
    .for_each(|(fraction, &win)| tree.window_mut(win).height_fraction = fraction);

    let count = children.len() as i32;
    let total_gap = (inner_gap as f64 * (count - 1) as f64)
        .min(((rect.size.h - MIN_SANE_H * count) as f64).max(0.0));
    let child_total_height = rect.size.h as f64 - total_gap;
    let gap = if count > 1 {
        (total_gap / (count - 1) as f64).floor() as i32
    } else {
        0
    };
    tree.column_mut(col_id).child_total_height = child_total_height;

    let mut y = rect.loc.y;
    for (i, &win_id) in children.iter().enumerate() {
        let fraction = tree.window(win_id).height_fraction;
        let mut height = (fraction * child_total_height).round() as i32;
        if i == children.len() - 1 {
            height = rect.loc.y + rect.size.h - y;
        }
        let window_rect = Rectangle::from_coords(rect.loc.x, y, rect.size.w, height);
        y += height + gap;
        arrange_window(tree, config, win_id, window_rect);
    }
}

fn arrange_column_stacked(
    tree: &mut Tree,
    config: &Config,
    col_id: NodeId,
    rect: Rectangle,
    children: &[NodeId],
) {
    let strip = titlebar_height(config);
    let visible = tree.column(col_id).visible_child();
    let strips_total = strip * children.len() as i32;
    let content_area = Rectangle::from_coords(
        rect.loc.x,
        rect.loc.y + strips_total,
        rect.size.w,
        (rect.size.h - strips_total).max(0),
    );

    for (i, &win_id) in children.iter().enumerate() {
        let titlebar = Rectangle::from_coords(
            rect.loc.x,
            rect.loc.y + strip * i as i32,
            rect.size.w,
            strip,
        );
        let window = tree.window_mut(win_id);
        window.pending.titlebar = Some(titlebar);
        if Some(win_id) == visible {
            window.pending.rect = rect;
            window.pending.content_rect = content_area;
        } else {
            window.pending.rect = titlebar;
            window.pending.content_rect = Rectangle::default();
        }
        tree.dirty.mark(win_id);
    }
}

fn arrange_column_tabbed(
    tree: &mut Tree,
    config: &Config,
    col_id: NodeId,
    rect: Rectangle,
    children: &[NodeId],
) {
    let strip = titlebar_height(config);
    let visible = tree.column(col_id).visible_child();
    let content_area = Rectangle::from_coords(
        rect.loc.x,
        rect.loc.y + strip,
        rect.size.w,
        (rect.size.h - strip).max(0),
    );

    let tab_width = rect.size.w / children.len() as i32;
    for (i, &win_id) in children.iter().enumerate() {
        let mut width = tab_width;
        if i == children.len() - 1 {
            width = rect.size.w - tab_width * i as i32;
        }
        let titlebar = Rectangle::from_coords(
            rect.loc.x + tab_width * i as i32,
            rect.loc.y,
            width,
            strip,
        );
        let window = tree.window_mut(win_id);
        window.pending.titlebar = Some(titlebar);
        if Some(win_id) == visible {
            window.pending.rect = rect;
            window.pending.content_rect = content_area;
        } else {
            window.pending.rect = titlebar;
            window.pending.content_rect = Rectangle::default();
        }
        tree.dirty.mark(win_id);
    }
}

/// Give a tiled window its slice of the column, carving out decorations.
fn arrange_window(tree: &mut Tree, config: &Config, win_id: NodeId, rect: Rectangle) {
    if tree.window(win_id).pending.fullscreen_mode != FullscreenMode::None {
        // Fullscreen geometry was fixed at the workspace/root level.
        return;
    }
    let strip = titlebar_height(config);

    let window = tree.window_mut(win_id);
    window.pending.rect = rect;
    let thickness = window.pending.border_thickness;
    match window.pending.border {
        BorderStyle::None | BorderStyle::Csd => {
            window.pending.content_rect = rect;
            window.pending.titlebar = None;
        }
        BorderStyle::Pixel => {
            window.pending.content_rect = rect.shrink(thickness, thickness, thickness, thickness);
            window.pending.titlebar = None;
        }
        BorderStyle::Normal => {
            window.pending.content_rect = rect.shrink(strip, thickness, thickness, thickness);
            window.pending.titlebar =
                Some(Rectangle::from_coords(rect.loc.x, rect.loc.y, rect.size.w, strip));
        }
    }
    tree.dirty.mark(win_id);
}

/// Arrange the floating windows of a workspace: explicit geometry, clamped to
/// the configured floating min/max and the view's size hints.
fn arrange_floating(tree: &mut Tree, config: &Config, ws_id: NodeId) {
    let floating: Vec<NodeId> = tree.workspace(ws_id).floating.clone();
    for win_id in floating {
        if tree.window(win_id).pending.fullscreen_mode != FullscreenMode::None {
            continue;
        }
        let rect = tree.window(win_id).pending.rect;
        let rect = clamp_floating(tree, config, win_id, rect);

        let strip = titlebar_height(config);
        let window = tree.window_mut(win_id);
        window.pending.rect = rect;
        let thickness = window.pending.border_thickness;
        match window.pending.border {
            BorderStyle::None | BorderStyle::Csd => {
                window.pending.content_rect = rect;
                window.pending.titlebar = None;
            }
            BorderStyle::Pixel => {
                window.pending.content_rect =
                    rect.shrink(thickness, thickness, thickness, thickness);
                window.pending.titlebar = None;
            }
            BorderStyle::Normal => {
                window.pending.content_rect = rect.shrink(strip, thickness, thickness, thickness);
                window.pending.titlebar =
                    Some(Rectangle::from_coords(rect.loc.x, rect.loc.y, rect.size.w, strip));
            }
        }
        tree.dirty.mark(win_id);
    }
}

/// Clamp a floating rectangle to configuration bounds and view hints.
pub fn clamp_floating(
    tree: &Tree,
    config: &Config,
    win_id: NodeId,
    mut rect: Rectangle,
) -> Rectangle {
    let (min_w, min_h) = config.general.floating_minimum_size;
    let (max_w, max_h) = config.general.floating_maximum_size;
    if min_w > 0 {
        rect.size.w = rect.size.w.max(min_w);
    }
    if min_h > 0 {
        rect.size.h = rect.size.h.max(min_h);
    }
    if max_w > 0 {
        rect.size.w = rect.size.w.min(max_w);
    }
    if max_h > 0 {
        rect.size.h = rect.size.h.min(max_h);
    }
    rect.size = tree.window(win_id).clamp_to_hints(rect.size);
    rect
}

/// Center a floating rect on a workspace at the given size.
pub fn centered_on(area: Rectangle, size: Size) -> Rectangle {
    Rectangle::new(
        Point::new(
            area.loc.x + (area.size.w - size.w) / 2,
            area.loc.y + (area.size.h - size.h) / 2,
        ),
        size,
    )
}

/// Assign placement fractions: unplaced entries (fraction <= 0) get the
/// average of the live ones, then everything is normalized to sum to 1.
fn normalize_fractions(mut fractions: Vec<f64>) -> Vec<f64> {
    let new_children = fractions.iter().filter(|&&f| f <= 0.0).count();
    let current_total: f64 = fractions.iter().filter(|&&f| f > 0.0).sum();
    let live = fractions.len() - new_children;

    for fraction in &mut fractions {
        if *fraction <= 0.0 {
            *fraction = if live == 0 {
                1.0
            } else {
                current_total / live as f64
            };
        }
    }

    let total: f64 = fractions.iter().sum();
    if total > 0.0 {
        for fraction in &mut fractions {
            *fraction /= total;
        }
    }
    fractions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::SurfaceId;
    use crate::tree::{ColumnLayout, WindowParent};

    fn setup() -> (Tree, Config, NodeId, NodeId) {
        let mut tree = Tree::new();
        let config = Config::default();
        let output = tree.add_output("HDMI-A-1".into(), Rectangle::from_coords(0, 0, 1000, 1000));
        tree.root.outputs.push(output);
        tree.output_mut(output).enabled = true;
        let ws = tree.create_workspace("1".into(), Some(output));
        tree.output_mut(output).active_workspace = Some(ws);
        (tree, config, output, ws)
    }

    fn add_tiled(tree: &mut Tree, ws: NodeId) -> (NodeId, NodeId) {
        let col = tree.add_column(ws, ColumnLayout::Vertical, usize::MAX);
        let win = tree.add_window(SurfaceId::unique(), WindowParent::Column(col));
        (col, win)
    }

    #[test]
    fn single_column_fills_row() {
        let (mut tree, mut config, _, ws) = setup();
        config.decorations.border_style = BorderStyle::None;
        let (col, win) = add_tiled(&mut tree, ws);

        arrange_workspace(&mut tree, &config, ws);
        assert_eq!(
            tree.column(col).pending.rect,
            Rectangle::from_coords(0, 0, 1000, 1000)
        );
        assert_eq!(tree.window(win).pending.content_rect.size.w, 1000);
    }

    #[test]
    fn columns_share_row_and_last_absorbs_residue() {
        let (mut tree, mut config, _, ws) = setup();
        config.decorations.border_style = BorderStyle::None;
        let (_, _) = add_tiled(&mut tree, ws);
        let (_, _) = add_tiled(&mut tree, ws);
        let (_, _) = add_tiled(&mut tree, ws);

        arrange_workspace(&mut tree, &config, ws);

        let columns = tree.workspace(ws).columns.clone();
        let rects: Vec<_> = columns
            .iter()
            .map(|&col| tree.column(col).pending.rect)
            .collect();
        let total: i32 = rects.iter().map(|rect| rect.size.w).sum();
        assert_eq!(total, 1000);
        assert_eq!(rects[2].loc.x + rects[2].size.w, 1000);

        // Fractions normalized (invariant I3).
        let sum: f64 = columns
            .iter()
            .map(|&col| tree.column(col).width_fraction)
            .sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn smart_gaps_collapse_for_single_window() {
        let (mut tree, mut config, _, ws) = setup();
        config.decorations.border_style = BorderStyle::None;
        config.general.smart_gaps = SmartGaps::On;
        tree.workspace_mut(ws).gaps_inner = 10;
        tree.workspace_mut(ws).gaps_outer = colonnade_config::SideGaps::uniform(20);

        let (_, win) = add_tiled(&mut tree, ws);
        arrange_workspace(&mut tree, &config, ws);
        assert_eq!(
            tree.window(win).pending.rect,
            Rectangle::from_coords(0, 0, 1000, 1000)
        );

        // A second window restores the gaps.
        let (_, _) = add_tiled(&mut tree, ws);
        arrange_workspace(&mut tree, &config, ws);
        let rect = tree.window(win).pending.rect;
        assert_eq!(rect.loc, Point::new(30, 30));
    }

    #[test]
    fn inverse_outer_drops_outer_gaps_for_many() {
        let (mut tree, mut config, _, ws) = setup();
        config.decorations.border_style = BorderStyle::None;
        config.general.smart_gaps = SmartGaps::InverseOuter;
        tree.workspace_mut(ws).gaps_inner = 10;
        tree.workspace_mut(ws).gaps_outer = colonnade_config::SideGaps::uniform(20);

        let (_, win) = add_tiled(&mut tree, ws);
        arrange_workspace(&mut tree, &config, ws);
        // One window: outer gaps apply.
        assert_eq!(tree.window(win).pending.rect.loc, Point::new(30, 30));

        let (_, _) = add_tiled(&mut tree, ws);
        arrange_workspace(&mut tree, &config, ws);
        // Two windows: outer gaps collapse, inner stays.
        assert_eq!(tree.window(win).pending.rect.loc, Point::new(10, 10));
    }

    #[test]
    fn vertical_column_heights_follow_fractions() {
        let (mut tree, mut config, _, ws) = setup();
        config.decorations.border_style = BorderStyle::None;
        let (col, w1) = add_tiled(&mut tree, ws);
        let w2 = tree.add_window(SurfaceId::unique(), WindowParent::Column(col));
        tree.window_mut(w1).height_fraction = 0.25;
        tree.window_mut(w2).height_fraction = 0.75;

        arrange_workspace(&mut tree, &config, ws);
        assert_eq!(tree.window(w1).pending.rect.size.h, 250);
        assert_eq!(tree.window(w2).pending.rect.size.h, 750);
    }

    #[test]
    fn stacked_column_titlebars() {
        let (mut tree, config, _, ws) = setup();
        let col = tree.add_column(ws, ColumnLayout::Stacked, 0);
        let w1 = tree.add_window(SurfaceId::unique(), WindowParent::Column(col));
        let w2 = tree.add_window(SurfaceId::unique(), WindowParent::Column(col));
        tree.column_mut(col).active_child = Some(w2);

        arrange_workspace(&mut tree, &config, ws);
        let strip = titlebar_height(&config);

        let t1 = tree.window(w1).pending.titlebar.unwrap();
        let t2 = tree.window(w2).pending.titlebar.unwrap();
        assert_eq!(t1.loc.y, 0);
        assert_eq!(t2.loc.y, strip);

        // Only the active child gets content.
        assert!(tree.window(w1).pending.content_rect.is_empty());
        let content = tree.window(w2).pending.content_rect;
        assert_eq!(content.loc.y, 2 * strip);
        assert_eq!(content.size.h, 1000 - 2 * strip);
    }

    #[test]
    fn tabbed_column_single_strip() {
        let (mut tree, config, _, ws) = setup();
        let col = tree.add_column(ws, ColumnLayout::Tabbed, 0);
        let w1 = tree.add_window(SurfaceId::unique(), WindowParent::Column(col));
        let w2 = tree.add_window(SurfaceId::unique(), WindowParent::Column(col));
        tree.column_mut(col).active_child = Some(w1);

        arrange_workspace(&mut tree, &config, ws);
        let strip = titlebar_height(&config);
        let t1 = tree.window(w1).pending.titlebar.unwrap();
        let t2 = tree.window(w2).pending.titlebar.unwrap();
        assert_eq!((t1.loc.y, t2.loc.y), (0, 0));
        assert_eq!(t1.size.w + t2.size.w, 1000);
        let content = tree.window(w1).pending.content_rect;
        assert_eq!(content.size.h, 1000 - strip);
    }

    #[test]
    fn fullscreen_workspace_covers_whole_output() {
        let (mut tree, mut config, _, ws) = setup();
        config.decorations.border_style = BorderStyle::Normal;
        tree.workspace_mut(ws).gaps_outer = colonnade_config::SideGaps::uniform(15);
        let (_, win) = add_tiled(&mut tree, ws);

        tree.set_fullscreen(win, FullscreenMode::Workspace);
        arrange_workspace(&mut tree, &config, ws);
        assert_eq!(
            tree.window(win).pending.rect,
            Rectangle::from_coords(0, 0, 1000, 1000)
        );
        assert_eq!(tree.window(win).pending.titlebar, None);
    }

    #[test]
    fn new_sibling_gets_average_fraction() {
        let fractions = normalize_fractions(vec![0.6, 0.4, 0.0]);
        // The newcomer got the average (0.5), then everything normalized.
        assert!((fractions.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!((fractions[2] - (0.5 / 1.5)).abs() < 1e-9);
    }
}
