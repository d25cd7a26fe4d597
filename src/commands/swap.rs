//! `swap container with id|container_id|mark <arg>`

use colonnade_ipc::CmdResult;

use crate::commands::focused_window;
use crate::engine::Engine;
use crate::seat;

const EXPECTED_SYNTAX: &str = "Expected 'swap container with id|container_id|mark <arg>'";

pub fn cmd_swap(engine: &mut Engine, args: &[&str]) -> CmdResult {
    if args.len() < 3 {
        return CmdResult::invalid(EXPECTED_SYNTAX);
    }
    if !args[0].eq_ignore_ascii_case("container") || !args[1].eq_ignore_ascii_case("with") {
        return CmdResult::invalid(EXPECTED_SYNTAX);
    }

    let current = match focused_window(engine) {
        Ok(window) => window,
        Err(result) => return result,
    };

    let value = args[3..].join(" ");
    let other = match args[2] {
        "id" | "container_id" => value
            .parse::<u64>()
            .ok()
            .and_then(|id| engine.tree.find_window_by_id(id))
            .map(|w| w.id()),
        "mark" => engine.tree.window_by_mark(&value).map(|w| w.id()),
        _ => return CmdResult::invalid(EXPECTED_SYNTAX),
    };

    let Some(other) = other else {
        return CmdResult::failure(format!("Failed to find {} '{}'", args[2], value));
    };
    if current == other {
        return CmdResult::failure("Cannot swap a container with itself");
    }

    // The focus churn below must not corrupt back-and-forth.
    let stored_prev_name = engine.seat.prev_workspace_name.clone();
    let focused = engine.focused_window();

    if engine.tree.swap_windows(current, other).is_err() {
        return CmdResult::failure("Cannot swap a container with itself");
    }

    // Focus follows the focused window to its new position.
    if let Some(focus) = focused.filter(|&f| f == current || f == other) {
        seat::set_focus(&mut engine.tree, &mut engine.seat, &mut engine.events, focus);
    }
    engine.seat.prev_workspace_name = stored_prev_name;

    CmdResult::Success
}
