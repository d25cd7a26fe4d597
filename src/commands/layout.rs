//! `layout` and `split` — column layout modes and column wrapping.

use colonnade_ipc::CmdResult;

use crate::commands::focused_window;
use crate::engine::Engine;
use crate::node::NodeId;
use crate::tree::ColumnLayout;

pub fn cmd_layout(engine: &mut Engine, args: &[&str]) -> CmdResult {
    let window = match focused_window(engine) {
        Ok(window) => window,
        Err(result) => return result,
    };
    let Some(col_id) = engine.tree.window_column(window) else {
        return CmdResult::failure("Cannot change the layout of a floating window");
    };

    let current = engine.tree.column(col_id).layout;
    let target = match args.first() {
        Some(&"splith") | Some(&"splitv") | Some(&"default") => ColumnLayout::Vertical,
        Some(&"stacked") | Some(&"stacking") => ColumnLayout::Stacked,
        Some(&"tabbed") => ColumnLayout::Tabbed,
        Some(&"toggle") => match args.get(1) {
            None | Some(&"all") => match current {
                ColumnLayout::Vertical => ColumnLayout::Stacked,
                ColumnLayout::Stacked => ColumnLayout::Tabbed,
                ColumnLayout::Tabbed => ColumnLayout::Vertical,
            },
            Some(&"split") => ColumnLayout::Vertical,
            Some(&"stacking") => ColumnLayout::Stacked,
            Some(&"tabbed") => ColumnLayout::Tabbed,
            Some(other) => {
                return CmdResult::invalid(format!("Unknown layout toggle '{other}'"))
            }
        },
        Some(other) => return CmdResult::invalid(format!("Unknown layout '{other}'")),
        None => {
            return CmdResult::invalid(
                "Expected 'layout <splith|splitv|stacked|tabbed|toggle> ...'",
            )
        }
    };

    if target != current {
        engine.tree.column_mut(col_id).layout = target;
        engine.tree.dirty.mark(col_id);
    }
    CmdResult::Success
}

pub fn cmd_split(engine: &mut Engine, args: &[&str]) -> CmdResult {
    let window = match focused_window(engine) {
        Ok(window) => window,
        Err(result) => return result,
    };
    if engine.tree.window(window).is_floating() {
        return CmdResult::failure("Cannot split a floating window");
    }

    match args.first() {
        Some(&"v") | Some(&"vertical") | Some(&"h") | Some(&"horizontal") => {
            wrap_in_column(engine, window)
        }
        Some(&"t") | Some(&"toggle") => {
            let col = engine.tree.window_column(window).expect("tiled window");
            if engine.tree.column(col).children.len() == 1 {
                flatten(engine, window)
            } else {
                wrap_in_column(engine, window)
            }
        }
        Some(&"n") | Some(&"none") => flatten(engine, window),
        _ => CmdResult::invalid("Expected 'split <v|h|t|n>'"),
    }
}

/// Extract the window into a column of its own, right of its current one.
fn wrap_in_column(engine: &mut Engine, window: NodeId) -> CmdResult {
    let col_id = engine.tree.window_column(window).expect("tiled window");
    if engine.tree.column(col_id).children.len() == 1 {
        // Already alone in a column.
        return CmdResult::Success;
    }
    let ws_id = engine.tree.column(col_id).workspace;
    let index = engine
        .tree
        .workspace(ws_id)
        .column_index(col_id)
        .expect("column in its workspace");
    let new_col = engine
        .tree
        .add_column(ws_id, ColumnLayout::Vertical, index + 1);
    engine.tree.move_window_to_column(window, new_col);
    engine.tree.window_mut(window).height_fraction = 0.0;
    CmdResult::Success
}

/// Undo a wrap: merge a sole-child column into its neighbor.
fn flatten(engine: &mut Engine, window: NodeId) -> CmdResult {
    let col_id = engine.tree.window_column(window).expect("tiled window");
    if engine.tree.column(col_id).children.len() != 1 {
        return CmdResult::failure("Can only flatten a column with a single window");
    }
    let ws_id = engine.tree.column(col_id).workspace;
    let index = engine
        .tree
        .workspace(ws_id)
        .column_index(col_id)
        .expect("column in its workspace");
    let columns = &engine.tree.workspace(ws_id).columns;
    let neighbor = if index > 0 {
        Some(columns[index - 1])
    } else {
        columns.get(1).copied()
    };
    let Some(neighbor) = neighbor else {
        return CmdResult::failure("No neighboring column to merge into");
    };

    engine.tree.move_window_to_column(window, neighbor);
    engine.tree.window_mut(window).height_fraction = 0.0;
    engine.tree.column_consider_destroy(col_id);
    engine.tree.column_mut(neighbor).active_child = Some(window);
    CmdResult::Success
}
