//! Configuration-surface commands: `gaps`, `smart_gaps`, `show_marks`,
//! `workspace_auto_back_and_forth`. These mutate the running configuration
//! and mark affected subtrees dirty.

use colonnade_config::SmartGaps;
use colonnade_ipc::CmdResult;

use crate::commands::parse_boolean;
use crate::engine::Engine;
use crate::node::NodeId;

fn mark_all_workspaces_dirty(engine: &mut Engine) {
    let all: Vec<NodeId> = engine.tree.all_workspaces().map(|ws| ws.id()).collect();
    for ws in all {
        engine.tree.dirty.mark(ws);
    }
}

/// `gaps inner|outer_top|outer_right|outer_bottom|outer_left <px>` — sets
/// the default and applies it to every workspace without a per-workspace
/// override.
pub fn cmd_gaps(engine: &mut Engine, args: &[&str]) -> CmdResult {
    let (Some(&kind), Some(amount)) = (args.first(), args.get(1).and_then(|s| s.parse::<i32>().ok()))
    else {
        return CmdResult::invalid(
            "Expected 'gaps inner|outer_top|outer_right|outer_bottom|outer_left <px>'",
        );
    };
    if amount < 0 {
        return CmdResult::failure("gaps must be non-negative");
    }

    let overridden: Vec<String> = engine
        .config
        .workspaces
        .iter()
        .filter(|ws| ws.gaps_inner.is_some() || ws.gaps_outer.is_some())
        .map(|ws| ws.name.clone())
        .collect();

    match kind {
        "inner" => engine.config.general.gaps_inner = amount,
        "outer_top" => engine.config.general.gaps_outer.top = amount,
        "outer_right" => engine.config.general.gaps_outer.right = amount,
        "outer_bottom" => engine.config.general.gaps_outer.bottom = amount,
        "outer_left" => engine.config.general.gaps_outer.left = amount,
        _ => return CmdResult::invalid(format!("Unknown gaps kind '{kind}'")),
    }

    let (gaps_inner, gaps_outer) = (
        engine.config.general.gaps_inner,
        engine.config.general.gaps_outer,
    );
    let targets: Vec<NodeId> = engine
        .tree
        .all_workspaces()
        .filter(|ws| !overridden.contains(&ws.name))
        .map(|ws| ws.id())
        .collect();
    for ws_id in targets {
        let ws = engine.tree.workspace_mut(ws_id);
        ws.gaps_inner = gaps_inner;
        ws.gaps_outer = gaps_outer;
        engine.tree.dirty.mark(ws_id);
    }
    CmdResult::Success
}

pub fn cmd_smart_gaps(engine: &mut Engine, args: &[&str]) -> CmdResult {
    let target = match args.first() {
        Some(&"on") => SmartGaps::On,
        Some(&"off") => SmartGaps::Off,
        Some(&"inverse_outer") => SmartGaps::InverseOuter,
        Some(&arg) => match parse_boolean(arg, engine.config.general.smart_gaps == SmartGaps::On) {
            Some(true) => SmartGaps::On,
            Some(false) => SmartGaps::Off,
            None => return CmdResult::invalid("Expected 'smart_gaps <on|off|inverse_outer>'"),
        },
        None => return CmdResult::invalid("Expected 'smart_gaps <on|off|inverse_outer>'"),
    };
    if engine.config.general.smart_gaps != target {
        engine.config.general.smart_gaps = target;
        mark_all_workspaces_dirty(engine);
    }
    CmdResult::Success
}

pub fn cmd_show_marks(engine: &mut Engine, args: &[&str]) -> CmdResult {
    let current = engine.config.general.show_marks;
    let Some(target) = args.first().and_then(|arg| parse_boolean(arg, current)) else {
        return CmdResult::invalid("Expected 'show_marks <yes|no>'");
    };
    if target != current {
        engine.config.general.show_marks = target;
        mark_all_workspaces_dirty(engine);
    }
    CmdResult::Success
}

pub fn cmd_auto_back_and_forth(engine: &mut Engine, args: &[&str]) -> CmdResult {
    let current = engine.config.general.auto_back_and_forth;
    let Some(target) = args.first().and_then(|arg| parse_boolean(arg, current)) else {
        return CmdResult::invalid("Expected 'workspace_auto_back_and_forth <yes|no>'");
    };
    engine.config.general.auto_back_and_forth = target;
    CmdResult::Success
}
