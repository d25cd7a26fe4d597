//! `resize set|grow|shrink` and the shared tiled-resize algorithm, also
//! driven by the interactive resize grab.

use colonnade_ipc::CmdResult;

use crate::arrange::{self, MIN_SANE_H, MIN_SANE_W};
use crate::commands::focused_window;
use crate::engine::Engine;
use crate::node::NodeId;
use crate::tree::Tree;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAxis {
    /// Grow/shrink in both horizontal directions.
    Horizontal,
    /// Grow/shrink in both vertical directions.
    Vertical,
    Up,
    Down,
    Left,
    Right,
}

impl ResizeAxis {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "width" | "horizontal" => Some(Self::Horizontal),
            "height" | "vertical" => Some(Self::Vertical),
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Horizontal | Self::Left | Self::Right)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Px,
    Ppt,
    Default,
}

#[derive(Debug, Clone, Copy)]
pub struct MovementAmount {
    pub amount: i32,
    pub unit: Unit,
}

/// Parse `<amount> [px|ppt]`, returning the tokens consumed.
pub fn parse_movement_amount(args: &[&str]) -> Option<(MovementAmount, usize)> {
    let amount: i32 = args.first()?.parse().ok()?;
    match args.get(1) {
        Some(&"px") => Some((MovementAmount { amount, unit: Unit::Px }, 2)),
        Some(&"ppt") => Some((MovementAmount { amount, unit: Unit::Ppt }, 2)),
        _ => Some((MovementAmount { amount, unit: Unit::Default }, 1)),
    }
}

/// Adjust a tiled window's share along `axis` by `amount` pixels, splitting
/// the delta with the adjacent sibling(s). Fractions snap to whole pixels
/// first so repeated resizes do not accumulate drift. Returns whether
/// anything moved; constraint violations (MIN_SANE, missing neighbor) leave
/// the tree untouched.
pub fn resize_tiled(tree: &mut Tree, window: NodeId, axis: ResizeAxis, amount: i32) -> bool {
    if amount == 0 {
        return false;
    }
    if axis.is_horizontal() {
        resize_columns(tree, window, axis, amount)
    } else {
        resize_rows(tree, window, axis, amount)
    }
}

fn resize_columns(tree: &mut Tree, window: NodeId, axis: ResizeAxis, mut amount: i32) -> bool {
    let Some(col_id) = tree.window_column(window) else {
        return false;
    };
    let ws_id = tree.column(col_id).workspace;
    let siblings = tree.workspace(ws_id).columns.clone();
    if siblings.len() < 2 {
        return false;
    }
    let index = siblings
        .iter()
        .position(|&col| col == col_id)
        .expect("column in its workspace");
    let last = siblings.len() - 1;

    // HORIZONTAL grows both ways when possible; edge entries fall back to a
    // one-sided resize against the inner neighbor.
    let (target, prev, next) = match axis {
        ResizeAxis::Horizontal => {
            if index == 0 {
                (index, None, index + 1)
            } else if index == last {
                amount = -amount;
                (index - 1, None, index)
            } else {
                (index, Some(index - 1), index + 1)
            }
        }
        ResizeAxis::Left => {
            if index == 0 {
                return false;
            }
            amount = -amount;
            (index - 1, None, index)
        }
        ResizeAxis::Right => {
            if index == last {
                return false;
            }
            (index, None, index + 1)
        }
        _ => unreachable!("vertical axis in resize_columns"),
    };

    let sibling_amount = if prev.is_some() {
        (amount as f64 / 2.0).ceil() as i32
    } else {
        amount
    };

    let width = |tree: &Tree, i: usize| tree.column(siblings[i]).pending.rect.size.w;
    if width(tree, target) + amount < MIN_SANE_W
        || width(tree, next) - sibling_amount < MIN_SANE_W
        || prev.is_some_and(|p| width(tree, p) - sibling_amount < MIN_SANE_W)
    {
        return false;
    }
    let child_total = tree.workspace(ws_id).child_total_width;
    if child_total <= 0.0 {
        return false;
    }

    // Snap every sibling's fraction to its realized pixel width.
    for &col in &siblings {
        let w = tree.column(col).pending.rect.size.w as f64;
        tree.column_mut(col).width_fraction = w / child_total;
    }

    let amount_fraction = amount as f64 / child_total;
    let sibling_fraction = if prev.is_some() {
        amount_fraction / 2.0
    } else {
        amount_fraction
    };
    tree.column_mut(siblings[target]).width_fraction += amount_fraction;
    tree.column_mut(siblings[next]).width_fraction -= sibling_fraction;
    if let Some(p) = prev {
        tree.column_mut(siblings[p]).width_fraction -= sibling_fraction;
    }

    tree.dirty.mark(ws_id);
    true
}

fn resize_rows(tree: &mut Tree, window: NodeId, axis: ResizeAxis, mut amount: i32) -> bool {
    let Some(col_id) = tree.window_column(window) else {
        return false;
    };
    let siblings = tree.column(col_id).children.clone();
    if siblings.len() < 2 {
        return false;
    }
    let index = siblings
        .iter()
        .position(|&win| win == window)
        .expect("window in its column");
    let last = siblings.len() - 1;

    let (target, prev, next) = match axis {
        ResizeAxis::Vertical => {
            if index == 0 {
                (index, None, index + 1)
            } else if index == last {
                amount = -amount;
                (index - 1, None, index)
            } else {
                (index, Some(index - 1), index + 1)
            }
        }
        ResizeAxis::Up => {
            if index == 0 {
                return false;
            }
            amount = -amount;
            (index - 1, None, index)
        }
        ResizeAxis::Down => {
            if index == last {
                return false;
            }
            (index, None, index + 1)
        }
        _ => unreachable!("horizontal axis in resize_rows"),
    };

    let sibling_amount = if prev.is_some() {
        (amount as f64 / 2.0).ceil() as i32
    } else {
        amount
    };

    let height = |tree: &Tree, i: usize| tree.window(siblings[i]).pending.rect.size.h;
    if height(tree, target) + amount < MIN_SANE_H
        || height(tree, next) - sibling_amount < MIN_SANE_H
        || prev.is_some_and(|p| height(tree, p) - sibling_amount < MIN_SANE_H)
    {
        return false;
    }
    let child_total = tree.column(col_id).child_total_height;
    if child_total <= 0.0 {
        return false;
    }

    for &win in &siblings {
        let h = tree.window(win).pending.rect.size.h as f64;
        tree.window_mut(win).height_fraction = h / child_total;
    }

    let amount_fraction = amount as f64 / child_total;
    let sibling_fraction = if prev.is_some() {
        amount_fraction / 2.0
    } else {
        amount_fraction
    };
    tree.window_mut(siblings[target]).height_fraction += amount_fraction;
    tree.window_mut(siblings[next]).height_fraction -= sibling_fraction;
    if let Some(p) = prev {
        tree.window_mut(siblings[p]).height_fraction -= sibling_fraction;
    }

    tree.dirty.mark(col_id);
    true
}

/// `resize grow|shrink` on a floating window: absolute pixel change anchored
/// by the named edge, clamped to the floating constraints.
fn resize_adjust_floating(
    engine: &mut Engine,
    window: NodeId,
    axis: ResizeAxis,
    amount: &MovementAmount,
) -> CmdResult {
    let mut grow_w = 0;
    let mut grow_h = 0;
    if axis.is_horizontal() {
        grow_w = amount.amount;
    } else {
        grow_h = amount.amount;
    }

    let rect = engine.tree.window(window).pending.rect;
    let (min_w, min_h) = engine.config.general.floating_minimum_size;
    let (max_w, max_h) = engine.config.general.floating_maximum_size;
    if min_w > 0 && rect.size.w + grow_w < min_w {
        grow_w = min_w - rect.size.w;
    } else if max_w > 0 && rect.size.w + grow_w > max_w {
        grow_w = max_w - rect.size.w;
    }
    if min_h > 0 && rect.size.h + grow_h < min_h {
        grow_h = min_h - rect.size.h;
    } else if max_h > 0 && rect.size.h + grow_h > max_h {
        grow_h = max_h - rect.size.h;
    }
    if grow_w == 0 && grow_h == 0 {
        return CmdResult::invalid("Cannot resize any further");
    }

    let (grow_x, grow_y) = match axis {
        ResizeAxis::Horizontal => (-grow_w / 2, 0),
        ResizeAxis::Vertical => (0, -grow_h / 2),
        ResizeAxis::Up => (0, -grow_h),
        ResizeAxis::Left => (-grow_w, 0),
        ResizeAxis::Down | ResizeAxis::Right => (0, 0),
    };

    let win = engine.tree.window_mut(window);
    win.pending.rect.loc.x += grow_x;
    win.pending.rect.loc.y += grow_y;
    win.pending.rect.size.w += grow_w;
    win.pending.rect.size.h += grow_h;
    win.floating_rect = Some(win.pending.rect);
    engine.tree.dirty.mark(window);
    CmdResult::Success
}

/// `resize set` for a floating window: absolute target size, kept centered.
fn resize_set_floating(
    engine: &mut Engine,
    window: NodeId,
    width: Option<MovementAmount>,
    height: Option<MovementAmount>,
) -> CmdResult {
    let ws_id = engine.tree.window_workspace(window);
    let ws_rect = engine.tree.workspace(ws_id).pending.rect;

    let mut rect = engine.tree.window(window).pending.rect;
    if let Some(width) = width {
        let target = match width.unit {
            Unit::Ppt => ws_rect.size.w * width.amount / 100,
            _ => width.amount,
        };
        let target = arrange::clamp_floating(
            &engine.tree,
            &engine.config,
            window,
            crate::geometry::Rectangle::new(rect.loc, crate::geometry::Size::new(target, rect.size.h)),
        )
        .size
        .w;
        rect.loc.x -= (target - rect.size.w) / 2;
        rect.size.w = target;
    }
    if let Some(height) = height {
        let target = match height.unit {
            Unit::Ppt => ws_rect.size.h * height.amount / 100,
            _ => height.amount,
        };
        let target = arrange::clamp_floating(
            &engine.tree,
            &engine.config,
            window,
            crate::geometry::Rectangle::new(rect.loc, crate::geometry::Size::new(rect.size.w, target)),
        )
        .size
        .h;
        rect.loc.y -= (target - rect.size.h) / 2;
        rect.size.h = target;
    }

    let win = engine.tree.window_mut(window);
    win.pending.rect = rect;
    win.floating_rect = Some(rect);
    engine.tree.dirty.mark(window);
    CmdResult::Success
}

fn resize_set_tiled(
    engine: &mut Engine,
    window: NodeId,
    width: Option<MovementAmount>,
    height: Option<MovementAmount>,
) -> CmdResult {
    if let Some(width) = width {
        let current = engine.tree.window(window).pending.rect.size.w;
        let target = match width.unit {
            Unit::Ppt | Unit::Default => {
                let ws = engine.tree.window_workspace(window);
                engine.tree.workspace(ws).pending.rect.size.w * width.amount / 100
            }
            Unit::Px => width.amount,
        };
        resize_tiled(&mut engine.tree, window, ResizeAxis::Horizontal, target - current);
    }
    if let Some(height) = height {
        let current = engine.tree.window(window).pending.rect.size.h;
        let target = match height.unit {
            Unit::Ppt | Unit::Default => {
                let col = engine.tree.window_column(window);
                match col {
                    Some(col) => engine.tree.column(col).pending.rect.size.h * height.amount / 100,
                    None => height.amount,
                }
            }
            Unit::Px => height.amount,
        };
        resize_tiled(&mut engine.tree, window, ResizeAxis::Vertical, target - current);
    }
    CmdResult::Success
}

/// `resize set [width] <w> [px|ppt] [height] <h> [px|ppt]`
fn cmd_resize_set(engine: &mut Engine, window: NodeId, mut args: &[&str]) -> CmdResult {
    const USAGE: &str = "Expected 'resize set [width] <width> [px|ppt]' or \
        'resize set height <height> [px|ppt]' or \
        'resize set [width] <width> [px|ppt] [height] <height> [px|ppt]'";

    let mut width = None;
    let mut height = None;

    if args.first() == Some(&"width") {
        args = &args[1..];
    }
    if args.first() != Some(&"height") && !args.is_empty() {
        let Some((amount, consumed)) = parse_movement_amount(args) else {
            return CmdResult::invalid(USAGE);
        };
        width = Some(amount);
        args = &args[consumed..];
    }
    if !args.is_empty() {
        if args.first() == Some(&"height") {
            args = &args[1..];
        }
        let Some((amount, consumed)) = parse_movement_amount(args) else {
            return CmdResult::invalid(USAGE);
        };
        if consumed < args.len() {
            return CmdResult::invalid(USAGE);
        }
        height = Some(amount);
    }
    if width.is_none() && height.is_none() {
        return CmdResult::invalid(USAGE);
    }

    // Zero or negative dimensions mean "leave unchanged".
    let width = width.filter(|w| w.amount > 0);
    let height = height.filter(|h| h.amount > 0);

    if engine.tree.window(window).is_floating() {
        resize_set_floating(engine, window, width, height)
    } else {
        resize_set_tiled(engine, window, width, height)
    }
}

/// `resize grow|shrink <axis> [<amount> px|ppt [or <amount> px|ppt]]`
fn cmd_resize_adjust(
    engine: &mut Engine,
    window: NodeId,
    mut args: &[&str],
    multiplier: i32,
) -> CmdResult {
    const USAGE: &str = "Expected 'resize grow|shrink <direction> \
        [<amount> px|ppt [or <amount> px|ppt]]'";

    let Some(axis) = args.first().and_then(|s| ResizeAxis::parse(s)) else {
        return CmdResult::invalid(USAGE);
    };
    args = &args[1..];

    let mut first = MovementAmount {
        amount: 10,
        unit: Unit::Default,
    };
    if !args.is_empty() {
        let Some((amount, consumed)) = parse_movement_amount(args) else {
            return CmdResult::invalid(USAGE);
        };
        first = amount;
        args = &args[consumed..];
    }

    let mut second = None;
    if !args.is_empty() {
        if args[0] != "or" {
            return CmdResult::invalid(USAGE);
        }
        args = &args[1..];
        let Some((amount, consumed)) = parse_movement_amount(args) else {
            return CmdResult::invalid(USAGE);
        };
        if consumed < args.len() {
            return CmdResult::invalid(USAGE);
        }
        second = Some(amount);
    }

    let mut first = first;
    first.amount *= multiplier;
    let second = second.map(|mut a| {
        a.amount *= multiplier;
        a
    });

    if engine.tree.window(window).is_floating() {
        // Floating resizes only make sense in px; fall back through the pair.
        let chosen = [Some(first), second]
            .into_iter()
            .flatten()
            .find(|a| a.unit == Unit::Px)
            .or_else(|| {
                [Some(first), second]
                    .into_iter()
                    .flatten()
                    .find(|a| a.unit == Unit::Default)
            });
        let Some(amount) = chosen else {
            return CmdResult::invalid("Floating windows cannot use ppt measurements");
        };
        return resize_adjust_floating(engine, window, axis, &amount);
    }

    // Tiling prefers ppt, then the unit-less amount, then px.
    let amount = [Some(first), second]
        .into_iter()
        .flatten()
        .find(|a| a.unit == Unit::Ppt)
        .or_else(|| {
            [Some(first), second]
                .into_iter()
                .flatten()
                .find(|a| a.unit == Unit::Default)
        })
        .unwrap_or(first);

    let pixels = match amount.unit {
        Unit::Ppt | Unit::Default => {
            let rect = engine.tree.window(window).pending.rect;
            let base = if axis.is_horizontal() {
                rect.size.w
            } else {
                rect.size.h
            };
            if amount.unit == Unit::Ppt {
                (base as f32 * amount.amount as f32 / 100.0) as i32
            } else {
                amount.amount
            }
        }
        Unit::Px => amount.amount,
    };

    // A resize that would violate MIN_SANE is a no-op.
    resize_tiled(&mut engine.tree, window, axis, pixels);
    CmdResult::Success
}

pub fn cmd_resize(engine: &mut Engine, args: &[&str]) -> CmdResult {
    let window = match focused_window(engine) {
        Ok(window) => window,
        Err(result) => return result,
    };
    let Some((&verb, rest)) = args.split_first() else {
        return CmdResult::invalid("Expected 'resize <set|shrink|grow> ...'");
    };

    match verb {
        "set" => cmd_resize_set(engine, window, rest),
        "grow" => cmd_resize_adjust(engine, window, rest, 1),
        "shrink" => cmd_resize_adjust(engine, window, rest, -1),
        _ => CmdResult::invalid(
            "Expected 'resize <shrink|grow> <width|height|up|down|left|right> [<amount>] [px|ppt]'",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rectangle;
    use crate::surface::SurfaceId;
    use crate::tree::{ColumnLayout, WindowParent};

    fn setup_three_columns() -> (Tree, NodeId, Vec<NodeId>, Vec<NodeId>) {
        let mut tree = Tree::new();
        let output = tree.add_output("DP-1".into(), Rectangle::from_coords(0, 0, 900, 600));
        tree.root.outputs.push(output);
        tree.output_mut(output).enabled = true;
        let ws = tree.create_workspace("1".into(), Some(output));
        tree.output_mut(output).active_workspace = Some(ws);

        let mut cols = Vec::new();
        let mut wins = Vec::new();
        for i in 0..3 {
            let col = tree.add_column(ws, ColumnLayout::Vertical, i);
            wins.push(tree.add_window(SurfaceId::unique(), WindowParent::Column(col)));
            cols.push(col);
        }
        let mut config = colonnade_config::Config::default();
        config.decorations.border_style = colonnade_config::BorderStyle::None;
        crate::arrange::arrange_workspace(&mut tree, &config, ws);
        (tree, ws, cols, wins)
    }

    #[test]
    fn middle_column_grow_splits_between_neighbors() {
        let (mut tree, ws, cols, wins) = setup_three_columns();
        assert!(resize_tiled(&mut tree, wins[1], ResizeAxis::Horizontal, 60));

        let mut config = colonnade_config::Config::default();
        config.decorations.border_style = colonnade_config::BorderStyle::None;
        crate::arrange::arrange_workspace(&mut tree, &config, ws);

        assert_eq!(tree.column(cols[1]).pending.rect.size.w, 360);
        assert_eq!(tree.column(cols[0]).pending.rect.size.w, 270);
        assert_eq!(tree.column(cols[2]).pending.rect.size.w, 270);
    }

    #[test]
    fn shrink_below_min_sane_is_rejected() {
        let (mut tree, _, cols, wins) = setup_three_columns();
        let before: Vec<_> = cols
            .iter()
            .map(|&col| tree.column(col).width_fraction)
            .collect();
        // 300 - 250 = 50 < MIN_SANE_W
        assert!(!resize_tiled(&mut tree, wins[0], ResizeAxis::Horizontal, 250,));
        let after: Vec<_> = cols
            .iter()
            .map(|&col| tree.column(col).width_fraction)
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn fractions_snap_to_pixels_before_resizing() {
        let (mut tree, ws, cols, wins) = setup_three_columns();
        // Introduce drift.
        tree.column_mut(cols[0]).width_fraction = 0.333333333;
        tree.column_mut(cols[1]).width_fraction = 0.333333333;
        tree.column_mut(cols[2]).width_fraction = 0.333333334;

        assert!(resize_tiled(&mut tree, wins[0], ResizeAxis::Right, 30));
        // Post-snap fractions reflect whole pixels of the last arrangement.
        let total: f64 = cols
            .iter()
            .map(|&col| tree.column(col).width_fraction)
            .sum();
        assert!((total - 1.0).abs() < 1e-6);
        let _ = ws;
    }
}
