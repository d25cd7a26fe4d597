//! `move` — directional reflow, workspace/output relocation, and floating
//! positioning.

use colonnade_ipc::{CmdResult, Event, WindowChange};

use crate::commands::focused_window;
use crate::commands::resize::{parse_movement_amount, Unit};
use crate::commands::workspace::{resolve_or_create, WorkspaceRef};
use crate::engine::Engine;
use crate::geometry::Point;
use crate::node::NodeId;
use crate::seat;
use crate::tree::{ColumnLayout, Direction, FullscreenMode, TreeError};

const EXPECTED_SYNTAX: &str = "Expected 'move <left|right|up|down> [<px> px]' or \
    'move [--no-auto-back-and-forth] <container|window> [to] workspace <name>' or \
    'move <container|window|workspace> [to] output <name|direction>' or \
    'move [absolute] position <x> [px|ppt] <y> [px|ppt]|center|cursor'";

pub fn cmd_move(engine: &mut Engine, args: &[&str]) -> CmdResult {
    let mut args = args;
    let mut no_auto_back_and_forth = false;
    if args.first() == Some(&"--no-auto-back-and-forth") {
        no_auto_back_and_forth = true;
        args = &args[1..];
    }

    // `move workspace to output ...` relocates the focused workspace.
    if args.first() == Some(&"workspace")
        && (args.get(1) == Some(&"to") || args.get(1) == Some(&"output"))
    {
        let rest = if args.get(1) == Some(&"to") { &args[3..] } else { &args[2..] };
        return move_workspace_to_output(engine, rest);
    }

    // Skip the optional subject and `to` filler words.
    while matches!(args.first(), Some(&"container") | Some(&"window") | Some(&"to")) {
        args = &args[1..];
    }

    let Some(&what) = args.first() else {
        return CmdResult::invalid(EXPECTED_SYNTAX);
    };

    if let Some(direction) = Direction::parse(what) {
        return move_in_direction(engine, direction, &args[1..]);
    }
    match what {
        "workspace" => move_to_workspace(engine, &args[1..], no_auto_back_and_forth),
        "output" => move_to_output(engine, &args[1..]),
        "absolute" | "position" => {
            let absolute = what == "absolute";
            let rest = if absolute {
                if args.get(1) != Some(&"position") {
                    return CmdResult::invalid(EXPECTED_SYNTAX);
                }
                &args[2..]
            } else {
                &args[1..]
            };
            move_to_position(engine, rest, absolute)
        }
        _ => CmdResult::invalid(EXPECTED_SYNTAX),
    }
}

// {{{ Directional move

fn move_in_direction(engine: &mut Engine, direction: Direction, rest: &[&str]) -> CmdResult {
    let window = match focused_window(engine) {
        Ok(window) => window,
        Err(result) => return result,
    };

    if engine.tree.window(window).is_floating() {
        let amount = match parse_movement_amount(rest) {
            Some((amount, _)) => amount.amount,
            None if rest.is_empty() => 10,
            None => return CmdResult::invalid(EXPECTED_SYNTAX),
        };
        return move_floating(engine, window, direction, amount);
    }

    match engine.tree.window(window).pending.fullscreen_mode {
        FullscreenMode::Global => {
            return CmdResult::failure("Can't move fullscreen global container")
        }
        FullscreenMode::Workspace => {
            // Fullscreen moves hop between outputs directly.
            return move_to_next_output(engine, window, direction);
        }
        FullscreenMode::None => {}
    }

    match direction {
        Direction::Up | Direction::Down => {
            // Reordering within a column is not defined yet.
            CmdResult::failure("no target")
        }
        Direction::Left | Direction::Right => {
            let Some(col_id) = engine.tree.window_column(window) else {
                return CmdResult::failure("no target");
            };
            let ws_id = engine.tree.column(col_id).workspace;
            let col_index = engine
                .tree
                .workspace(ws_id)
                .column_index(col_id)
                .expect("column in its workspace");
            let col_count = engine.tree.workspace(ws_id).columns.len();
            let at_edge = match direction {
                Direction::Left => col_index == 0,
                _ => col_index == col_count - 1,
            };

            if at_edge {
                if engine.tree.column(col_id).children.len() == 1 {
                    // Lone window in the edge column: try the next output.
                    return move_to_next_output(engine, window, direction);
                }
                // Otherwise open a fresh column at the edge and fall through.
                let insert_at = if direction == Direction::Left { 0 } else { col_count };
                let new_col = engine.tree.add_column(ws_id, ColumnLayout::Vertical, insert_at);
                engine
                    .tree
                    .move_window_to_column_from_direction(window, new_col, direction);
            } else {
                let target_index = if direction == Direction::Left {
                    col_index - 1
                } else {
                    col_index + 1
                };
                let target = engine.tree.workspace(ws_id).columns[target_index];
                engine
                    .tree
                    .move_window_to_column_from_direction(window, target, direction);
            }

            engine.tree.column_consider_destroy(col_id);
            engine.events.push(Event::Window {
                change: WindowChange::Move,
                id: window.get(),
                title: engine.tree.window(window).title.clone(),
            });
            seat::set_focus(&mut engine.tree, &mut engine.seat, &mut engine.events, window);
            CmdResult::Success
        }
    }
}

fn move_to_next_output(engine: &mut Engine, window: NodeId, direction: Direction) -> CmdResult {
    let Some(from) = engine
        .tree
        .workspace(engine.tree.window_workspace(window))
        .output
    else {
        return CmdResult::failure("no target");
    };
    let Some(next) = engine.tree.output_in_direction(from, direction) else {
        return CmdResult::failure("no target");
    };
    let Some(ws) = engine.tree.output(next).active_workspace else {
        return CmdResult::failure("no target");
    };
    finish_window_move(engine, window, ws, Some(direction))
}

fn move_floating(
    engine: &mut Engine,
    window: NodeId,
    direction: Direction,
    amount: i32,
) -> CmdResult {
    let mut rect = engine.tree.window(window).pending.rect;
    match direction {
        Direction::Left => rect.loc.x -= amount,
        Direction::Right => rect.loc.x += amount,
        Direction::Up => rect.loc.y -= amount,
        Direction::Down => rect.loc.y += amount,
    }

    // Keep the window's center inside the union of outputs.
    let bounds = engine.tree.root.rect;
    if !bounds.is_empty() {
        let center = rect.center();
        let clamped = Point::new(
            center.x.clamp(bounds.loc.x, bounds.loc.x + bounds.size.w - 1),
            center.y.clamp(bounds.loc.y, bounds.loc.y + bounds.size.h - 1),
        );
        rect.loc.x += clamped.x - center.x;
        rect.loc.y += clamped.y - center.y;
    }

    let win = engine.tree.window_mut(window);
    win.pending.rect = rect;
    win.floating_rect = Some(rect);
    engine.tree.dirty.mark(window);
    CmdResult::Success
}

// }}}

// {{{ Workspace / output moves

fn move_to_workspace(
    engine: &mut Engine,
    tokens: &[&str],
    no_auto_back_and_forth: bool,
) -> CmdResult {
    let window = match focused_window(engine) {
        Ok(window) => window,
        Err(result) => return result,
    };
    if engine.tree.window(window).pending.fullscreen_mode == FullscreenMode::Global {
        return CmdResult::failure("Can't move fullscreen global container");
    }

    let reference = match WorkspaceRef::parse(tokens) {
        Ok(reference) => reference,
        Err(result) => return result,
    };

    // Moving to the workspace we are on bounces to the previous one, unless
    // suppressed.
    let reference = match (&reference, engine.config.general.auto_back_and_forth) {
        (WorkspaceRef::Name(name), true)
            if !no_auto_back_and_forth
                && engine.seat.prev_workspace_name.is_some()
                && engine
                    .focused_workspace()
                    .is_some_and(|ws| engine.tree.workspace(ws).name == *name) =>
        {
            WorkspaceRef::BackAndForth
        }
        _ => reference,
    };

    let (target_ws, _created) = match resolve_or_create(engine, &reference) {
        Ok(resolved) => resolved,
        Err(result) => return result,
    };
    finish_window_move(engine, window, target_ws, None)
}

fn move_to_output(engine: &mut Engine, tokens: &[&str]) -> CmdResult {
    let window = match focused_window(engine) {
        Ok(window) => window,
        Err(result) => return result,
    };
    let Some(&arg) = tokens.first() else {
        return CmdResult::invalid(EXPECTED_SYNTAX);
    };

    let target = match Direction::parse(arg) {
        Some(direction) => {
            let from = engine
                .tree
                .workspace(engine.tree.window_workspace(window))
                .output;
            from.and_then(|from| engine.tree.output_in_direction(from, direction))
        }
        None => engine.tree.output_by_name(&tokens.join(" ")).map(|o| o.id()),
    };
    let Some(out_id) = target else {
        return CmdResult::failure(format!("No output matching '{arg}'"));
    };
    let Some(ws) = engine.tree.output(out_id).active_workspace else {
        return CmdResult::failure("Output has no active workspace");
    };
    finish_window_move(engine, window, ws, None)
}

fn move_workspace_to_output(engine: &mut Engine, tokens: &[&str]) -> CmdResult {
    let Some(ws_id) = engine.focused_workspace() else {
        return CmdResult::failure("no workspace has focus");
    };
    let Some(&arg) = tokens.first() else {
        return CmdResult::invalid(EXPECTED_SYNTAX);
    };
    let target = match Direction::parse(arg) {
        Some(direction) => engine
            .tree
            .workspace(ws_id)
            .output
            .and_then(|from| engine.tree.output_in_direction(from, direction)),
        None => engine.tree.output_by_name(&tokens.join(" ")).map(|o| o.id()),
    };
    let Some(out_id) = target else {
        return CmdResult::failure(format!("No output matching '{arg}'"));
    };

    engine.move_workspace_to_output(ws_id, out_id);
    let out = engine.tree.output_mut(out_id);
    out.active_workspace = Some(ws_id);
    seat::focus_workspace(&mut engine.tree, &mut engine.seat, &mut engine.events, ws_id);
    CmdResult::Success
}

/// Common tail of every window relocation: perform the tree move, restore
/// focus on the source workspace, clean up emptied containers.
fn finish_window_move(
    engine: &mut Engine,
    window: NodeId,
    target_ws: NodeId,
    direction: Option<Direction>,
) -> CmdResult {
    let old_ws = engine.tree.window_workspace(window);
    if old_ws == target_ws {
        return CmdResult::Success;
    }
    let old_column = engine.tree.window_column(window);

    if let Err(TreeError::StickySameOutput) = engine.tree.move_window_to_workspace(window, target_ws)
    {
        return CmdResult::failure(
            "Can't move sticky container to another workspace on the same output",
        );
    }

    // Entering from a direction lands in the near edge column: moving right
    // enters the leftmost column, moving left the rightmost.
    if let Some(direction) = direction {
        if !engine.tree.window(window).is_floating() {
            let edge_col = {
                let ws = engine.tree.workspace(target_ws);
                match direction {
                    Direction::Right => ws.columns.first().copied(),
                    Direction::Left => ws.columns.last().copied(),
                    Direction::Up | Direction::Down => None,
                }
            };
            let landed = engine.tree.window_column(window);
            if let Some(col) = edge_col.filter(|&col| Some(col) != landed) {
                engine
                    .tree
                    .move_window_to_column_from_direction(window, col, direction);
                if let Some(old) = landed {
                    engine.tree.column_consider_destroy(old);
                }
            }
        }
    }

    engine.events.push(Event::Window {
        change: WindowChange::Move,
        id: window.get(),
        title: engine.tree.window(window).title.clone(),
    });

    if let Some(col) = old_column {
        engine.tree.column_consider_destroy(col);
    }

    // Focus stays on the source workspace.
    if let Some(next) = seat::workspace_focus_target(&engine.tree, &engine.seat, old_ws) {
        seat::set_focus(&mut engine.tree, &mut engine.seat, &mut engine.events, next);
    } else {
        engine.seat.clear_window_focus();
        engine.seat.focused_workspace = Some(old_ws);
    }

    let focused = engine.focused_workspace() == Some(old_ws)
        && engine
            .tree
            .workspace(old_ws)
            .output
            .is_some_and(|out| engine.tree.output(out).active_workspace == Some(old_ws));
    engine.tree.workspace_consider_destroy(old_ws, focused);
    CmdResult::Success
}

// }}}

// {{{ Position

fn move_to_position(engine: &mut Engine, tokens: &[&str], absolute: bool) -> CmdResult {
    let window = match focused_window(engine) {
        Ok(window) => window,
        Err(result) => return result,
    };
    if !engine.tree.window(window).is_floating() {
        return CmdResult::failure("Only floating windows can be repositioned");
    }
    let ws_id = engine.tree.window_workspace(window);
    let rect = engine.tree.window(window).pending.rect;

    let target = match tokens.first() {
        Some(&"center") => {
            let area = if absolute {
                engine.tree.root.rect
            } else {
                engine.tree.workspace(ws_id).pending.rect
            };
            crate::arrange::centered_on(area, rect.size).loc
        }
        Some(&"cursor") | Some(&"mouse") | Some(&"pointer") => {
            let cursor = engine.cursor;
            let centered = Point::new(
                cursor.x as i32 - rect.size.w / 2,
                cursor.y as i32 - rect.size.h / 2,
            );
            // Clamp to the output under the cursor.
            match crate::input::target::output_at(&engine.tree, cursor) {
                Some(out_id) => {
                    let bounds = engine.tree.output(out_id).rect;
                    Point::new(
                        centered.x.clamp(
                            bounds.loc.x,
                            (bounds.loc.x + bounds.size.w - rect.size.w).max(bounds.loc.x),
                        ),
                        centered.y.clamp(
                            bounds.loc.y,
                            (bounds.loc.y + bounds.size.h - rect.size.h).max(bounds.loc.y),
                        ),
                    )
                }
                None => centered,
            }
        }
        Some(_) => {
            let Some((x, consumed)) = parse_movement_amount(tokens) else {
                return CmdResult::invalid(EXPECTED_SYNTAX);
            };
            let Some((y, rest)) = parse_movement_amount(&tokens[consumed..]) else {
                return CmdResult::invalid(EXPECTED_SYNTAX);
            };
            if consumed + rest < tokens.len() {
                return CmdResult::invalid(EXPECTED_SYNTAX);
            }
            let base = if absolute {
                engine.tree.root.rect
            } else {
                engine.tree.workspace(ws_id).pending.rect
            };
            let px = |amount: crate::commands::resize::MovementAmount, extent: i32, origin: i32| {
                match amount.unit {
                    Unit::Ppt => origin + extent * amount.amount / 100,
                    _ => origin + amount.amount,
                }
            };
            Point::new(
                px(x, base.size.w, base.loc.x),
                px(y, base.size.h, base.loc.y),
            )
        }
        None => return CmdResult::invalid(EXPECTED_SYNTAX),
    };

    let win = engine.tree.window_mut(window);
    win.pending.rect.loc = target;
    win.floating_rect = Some(win.pending.rect);
    engine.tree.dirty.mark(window);
    CmdResult::Success
}

// }}}
