//! `focus` — move seat focus by direction, criteria, or output.

use colonnade_config::FocusWrapping;
use colonnade_ipc::CmdResult;

use crate::commands::focused_window;
use crate::engine::Engine;
use crate::node::NodeId;
use crate::seat;
use crate::tree::{Direction, WindowParent};

pub fn cmd_focus(engine: &mut Engine, args: &[&str]) -> CmdResult {
    let Some((&what, rest)) = args.split_first() else {
        return CmdResult::invalid("Expected 'focus <direction|output|id|mark> ...'");
    };

    if let Some(direction) = Direction::parse(what) {
        return focus_direction(engine, direction);
    }

    match what {
        "output" => {
            let Some(&arg) = rest.first() else {
                return CmdResult::invalid("Expected 'focus output <direction|name>'");
            };
            focus_output(engine, arg)
        }
        "id" => {
            let Some(id) = rest.first().and_then(|s| s.parse::<u64>().ok()) else {
                return CmdResult::invalid("Expected 'focus id <n>'");
            };
            let Some(window) = engine.tree.find_window_by_id(id).map(|w| w.id()) else {
                return CmdResult::failure(format!("No window with id {id}"));
            };
            seat::set_focus(&mut engine.tree, &mut engine.seat, &mut engine.events, window);
            CmdResult::Success
        }
        "mark" => {
            let Some(&mark) = rest.first() else {
                return CmdResult::invalid("Expected 'focus mark <mark>'");
            };
            let Some(window) = engine.tree.window_by_mark(mark).map(|w| w.id()) else {
                return CmdResult::failure(format!("No window holds mark '{mark}'"));
            };
            seat::set_focus(&mut engine.tree, &mut engine.seat, &mut engine.events, window);
            CmdResult::Success
        }
        _ => CmdResult::invalid(format!("Unknown focus target '{what}'")),
    }
}

fn focus_output(engine: &mut Engine, arg: &str) -> CmdResult {
    let target = match Direction::parse(arg) {
        Some(direction) => {
            let Some(from) = engine
                .focused_workspace()
                .and_then(|ws| engine.tree.workspace(ws).output)
            else {
                return CmdResult::failure("no workspace has focus");
            };
            engine.tree.output_in_direction(from, direction)
        }
        None => engine.tree.output_by_name(arg).map(|o| o.id()),
    };
    let Some(out_id) = target else {
        return CmdResult::failure(format!("No output matching '{arg}'"));
    };
    let Some(ws) = engine.tree.output(out_id).active_workspace else {
        return CmdResult::failure("Output has no active workspace");
    };
    seat::focus_workspace(&mut engine.tree, &mut engine.seat, &mut engine.events, ws);
    CmdResult::Success
}

fn focus_direction(engine: &mut Engine, direction: Direction) -> CmdResult {
    let window = match focused_window(engine) {
        Ok(window) => window,
        Err(result) => return result,
    };

    match neighbor(engine, window, direction) {
        Some(Neighbor::Window(next)) => {
            seat::set_focus(&mut engine.tree, &mut engine.seat, &mut engine.events, next);
            CmdResult::Success
        }
        Some(Neighbor::Output(out_id)) => {
            let Some(ws) = engine.tree.output(out_id).active_workspace else {
                return CmdResult::failure("no target");
            };
            seat::focus_workspace(&mut engine.tree, &mut engine.seat, &mut engine.events, ws);
            CmdResult::Success
        }
        None => CmdResult::failure("no target"),
    }
}

enum Neighbor {
    Window(NodeId),
    Output(NodeId),
}

/// The focus target adjacent to `window` in `direction`, honoring
/// `focus_wrapping`.
fn neighbor(engine: &Engine, window: NodeId, direction: Direction) -> Option<Neighbor> {
    let tree = &engine.tree;
    let wrapping = engine.config.general.focus_wrapping;

    let WindowParent::Column(col_id) = tree.window(window).parent else {
        // Floating: nearest window rectangle in that direction.
        return spatial_neighbor(engine, window, direction).map(Neighbor::Window);
    };

    let column = tree.column(col_id);
    let ws_id = column.workspace;

    if !direction.is_horizontal() {
        // Within the column.
        let index = column.child_index(window)?;
        let next = match direction {
            Direction::Up if index > 0 => Some(index - 1),
            Direction::Down if index + 1 < column.children.len() => Some(index + 1),
            _ => None,
        };
        if let Some(next) = next {
            return Some(Neighbor::Window(column.children[next]));
        }
        if wrapping != FocusWrapping::No && column.children.len() > 1 {
            let wrapped = match direction {
                Direction::Up => *column.children.last()?,
                _ => *column.children.first()?,
            };
            return Some(Neighbor::Window(wrapped));
        }
        return None;
    }

    // Across columns.
    let ws = tree.workspace(ws_id);
    let index = ws.column_index(col_id)?;
    let next = match direction {
        Direction::Left if index > 0 => Some(index - 1),
        Direction::Right if index + 1 < ws.columns.len() => Some(index + 1),
        _ => None,
    };
    if let Some(next) = next {
        let target = tree.column(ws.columns[next]).visible_child()?;
        return Some(Neighbor::Window(target));
    }

    // Edge of the workspace: force-wrapping wraps before trying outputs.
    let wrap = || {
        let wrapped_col = match direction {
            Direction::Left => *ws.columns.last()?,
            _ => *ws.columns.first()?,
        };
        tree.column(wrapped_col).visible_child().map(Neighbor::Window)
    };
    if wrapping == FocusWrapping::Force && ws.columns.len() > 1 {
        return wrap();
    }
    if let Some(out_id) = ws
        .output
        .and_then(|from| tree.output_in_direction(from, direction))
    {
        return Some(Neighbor::Output(out_id));
    }
    if wrapping == FocusWrapping::Yes && ws.columns.len() > 1 {
        return wrap();
    }
    None
}

/// Nearest window whose rectangle lies in `direction`, for floating focus.
fn spatial_neighbor(engine: &Engine, window: NodeId, direction: Direction) -> Option<NodeId> {
    let tree = &engine.tree;
    let ws_id = tree.window_workspace(window);
    let center = tree.window(window).pending.rect.center();

    tree.workspace_windows(ws_id)
        .into_iter()
        .filter(|&other| other != window)
        .filter(|&other| {
            let rect = tree.window(other).pending.rect.center();
            match direction {
                Direction::Left => rect.x < center.x,
                Direction::Right => rect.x > center.x,
                Direction::Up => rect.y < center.y,
                Direction::Down => rect.y > center.y,
            }
        })
        .min_by_key(|&other| {
            let rect = tree.window(other).pending.rect.center();
            let (dx, dy) = ((rect.x - center.x) as i64, (rect.y - center.y) as i64);
            dx * dx + dy * dy
        })
}
