//! The command dispatcher.
//!
//! Commands arrive as tokenized argv vectors from an external parser; each
//! maps to a handler through a static table. Handlers mutate `pending` state
//! only and report through [`CmdResult`]; the engine commits after a
//! successful dispatch.

use colonnade_ipc::CmdResult;

use crate::engine::Engine;
use crate::node::NodeId;

mod config;
mod focus;
mod layout;
mod mark;
mod movement;
pub(crate) mod resize;
mod state;
mod swap;
mod workspace;

pub type CmdHandler = fn(&mut Engine, &[&str]) -> CmdResult;

/// Name → handler → whether the command needs at least one live output.
const HANDLERS: &[(&str, CmdHandler, bool)] = &[
    ("border", state::cmd_border, true),
    ("floating", state::cmd_floating, true),
    ("focus", focus::cmd_focus, true),
    ("fullscreen", state::cmd_fullscreen, true),
    ("gaps", config::cmd_gaps, false),
    ("kill", state::cmd_kill, true),
    ("layout", layout::cmd_layout, true),
    ("mark", mark::cmd_mark, true),
    ("move", movement::cmd_move, true),
    ("rename", workspace::cmd_rename, true),
    ("resize", resize::cmd_resize, true),
    ("show_marks", config::cmd_show_marks, false),
    ("smart_gaps", config::cmd_smart_gaps, false),
    ("split", layout::cmd_split, true),
    ("sticky", state::cmd_sticky, true),
    ("swap", swap::cmd_swap, true),
    ("unmark", mark::cmd_unmark, true),
    ("urgent", state::cmd_urgent, true),
    ("workspace", workspace::cmd_workspace, true),
    ("workspace_auto_back_and_forth", config::cmd_auto_back_and_forth, false),
];

pub fn dispatch(engine: &mut Engine, argv: &[&str]) -> CmdResult {
    let Some((&name, rest)) = argv.split_first() else {
        return CmdResult::invalid("empty command");
    };
    let Some(&(_, handler, needs_output)) = HANDLERS
        .iter()
        .find(|(cmd, _, _)| cmd.eq_ignore_ascii_case(name))
    else {
        return CmdResult::invalid(format!("Unknown/invalid command '{name}'"));
    };

    if needs_output && engine.tree.root.outputs.is_empty() {
        if engine.deferring {
            return CmdResult::Defer;
        }
        return CmdResult::invalid(
            "Can't run this command while there's no outputs connected.",
        );
    }

    handler(engine, rest)
}

/// The window commands act on, or the canonical failure.
pub(crate) fn focused_window(engine: &Engine) -> Result<NodeId, CmdResult> {
    engine
        .focused_window()
        .ok_or_else(|| CmdResult::failure("no window has focus"))
}

/// Boolean words accepted across commands. `toggle` flips `current`.
pub(crate) fn parse_boolean(value: &str, current: bool) -> Option<bool> {
    match value {
        "1" | "yes" | "on" | "true" | "enable" | "enabled" | "active" => Some(true),
        "0" | "no" | "off" | "false" | "disable" | "disabled" | "inactive" => Some(false),
        "toggle" => Some(!current),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colonnade_config::Config;

    #[test]
    fn unknown_command_is_invalid() {
        let mut engine = Engine::new(Config::default());
        assert!(matches!(
            dispatch(&mut engine, &["frobnicate"]),
            CmdResult::Invalid(_)
        ));
    }

    #[test]
    fn output_commands_defer_during_config_load() {
        let mut engine = Engine::new(Config::default());
        engine.deferring = true;
        assert_eq!(dispatch(&mut engine, &["focus", "left"]), CmdResult::Defer);

        engine.deferring = false;
        assert!(matches!(
            dispatch(&mut engine, &["focus", "left"]),
            CmdResult::Invalid(_)
        ));
    }
}
