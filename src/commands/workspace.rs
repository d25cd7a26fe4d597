//! `workspace` and `rename` — switching, creation, back-and-forth, and
//! per-workspace gap overrides.

use colonnade_ipc::{CmdResult, Event, WorkspaceChange};

use crate::engine::Engine;
use crate::node::NodeId;
use crate::seat;

/// How a command referred to a workspace.
#[derive(Debug)]
pub(crate) enum WorkspaceRef {
    Name(String),
    Number(i32),
    Next,
    Prev,
    NextOnOutput,
    PrevOnOutput,
    BackAndForth,
    Current,
}

impl WorkspaceRef {
    /// Parse the tail of a `workspace`/`move to workspace` command. Multiple
    /// trailing tokens join into one name, like the original's `join_args`.
    pub(crate) fn parse(tokens: &[&str]) -> Result<Self, CmdResult> {
        let Some(&first) = tokens.first() else {
            return Err(CmdResult::invalid("Expected a workspace name"));
        };
        Ok(match first {
            "next" => Self::Next,
            "prev" => Self::Prev,
            "next_on_output" => Self::NextOnOutput,
            "prev_on_output" => Self::PrevOnOutput,
            "back_and_forth" => Self::BackAndForth,
            "current" => Self::Current,
            "number" => {
                let Some(number) = tokens.get(1).and_then(|s| s.parse().ok()) else {
                    return Err(CmdResult::invalid(format!(
                        "Invalid workspace number '{}'",
                        tokens.get(1).unwrap_or(&"")
                    )));
                };
                Self::Number(number)
            }
            _ => Self::Name(tokens.join(" ")),
        })
    }
}

/// All workspaces in display order: per output, in list order.
fn workspaces_in_order(engine: &Engine) -> Vec<NodeId> {
    engine
        .tree
        .enabled_outputs()
        .flat_map(|output| output.workspaces.clone())
        .collect()
}

fn relative_workspace(engine: &Engine, current: NodeId, offset: i32, same_output: bool) -> Option<NodeId> {
    let list: Vec<NodeId> = if same_output {
        let out = engine.tree.workspace(current).output?;
        engine.tree.output(out).workspaces.clone()
    } else {
        workspaces_in_order(engine)
    };
    let index = list.iter().position(|&ws| ws == current)?;
    let len = list.len() as i32;
    let next = (index as i32 + offset).rem_euclid(len);
    Some(list[next as usize])
}

/// The output a new workspace with this name should land on: a configured
/// binding first, then the focused output.
fn initial_output(engine: &Engine, name: &str) -> Option<NodeId> {
    if let Some(ws_config) = engine.config.workspace_config(name) {
        for preferred in &ws_config.outputs {
            if let Some(output) = engine.tree.output_by_name(preferred) {
                return Some(output.id());
            }
        }
    }
    engine
        .focused_workspace()
        .and_then(|ws| engine.tree.workspace(ws).output)
        .or_else(|| engine.tree.root.outputs.first().copied())
}

/// Resolve a [`WorkspaceRef`] to an existing workspace, or the name a new
/// one would get.
pub(crate) fn resolve(
    engine: &Engine,
    reference: &WorkspaceRef,
) -> Result<Result<NodeId, String>, CmdResult> {
    let current = engine
        .focused_workspace()
        .ok_or_else(|| CmdResult::failure("no workspace has focus"))?;
    match reference {
        WorkspaceRef::Name(name) => Ok(engine
            .tree
            .workspace_by_name(name)
            .map(|ws| ws.id())
            .ok_or_else(|| name.clone())),
        WorkspaceRef::Number(number) => Ok(engine
            .tree
            .workspace_by_number(*number)
            .map(|ws| ws.id())
            .ok_or_else(|| number.to_string())),
        WorkspaceRef::Current => Ok(Ok(current)),
        WorkspaceRef::Next => relative_workspace(engine, current, 1, false)
            .map(Ok)
            .ok_or_else(|| CmdResult::failure("no next workspace")),
        WorkspaceRef::Prev => relative_workspace(engine, current, -1, false)
            .map(Ok)
            .ok_or_else(|| CmdResult::failure("no previous workspace")),
        WorkspaceRef::NextOnOutput => relative_workspace(engine, current, 1, true)
            .map(Ok)
            .ok_or_else(|| CmdResult::failure("no next workspace on output")),
        WorkspaceRef::PrevOnOutput => relative_workspace(engine, current, -1, true)
            .map(Ok)
            .ok_or_else(|| CmdResult::failure("no previous workspace on output")),
        WorkspaceRef::BackAndForth => {
            let name = engine
                .seat
                .prev_workspace_name
                .clone()
                .ok_or_else(|| CmdResult::failure("No workspace was previously active."))?;
            Ok(engine
                .tree
                .workspace_by_name(&name)
                .map(|ws| ws.id())
                .ok_or(name))
        }
    }
}

/// Materialize the resolution: create the workspace when only a name came
/// back. Returns the workspace and whether it was created.
pub(crate) fn resolve_or_create(
    engine: &mut Engine,
    reference: &WorkspaceRef,
) -> Result<(NodeId, bool), CmdResult> {
    match resolve(engine, reference)? {
        Ok(ws) => Ok((ws, false)),
        Err(name) => {
            let output = initial_output(engine, &name);
            Ok((engine.create_workspace(&name, output), true))
        }
    }
}

pub fn cmd_workspace(engine: &mut Engine, args: &[&str]) -> CmdResult {
    if args.is_empty() {
        return CmdResult::invalid("Expected 'workspace <name>' or 'workspace <name> gaps ...'");
    }

    // Per-workspace gap override: `workspace NAME gaps inner|outer_* AMOUNT`.
    if let Some(gaps_at) = args.iter().position(|&tok| tok == "gaps") {
        if gaps_at > 0 {
            return workspace_gaps(engine, &args[..gaps_at], &args[gaps_at + 1..]);
        }
    }

    let reference = match WorkspaceRef::parse(args) {
        Ok(reference) => reference,
        Err(result) => return result,
    };

    // `workspace <current name>` bounces back when auto-back-and-forth is on.
    let reference = match (&reference, engine.config.general.auto_back_and_forth) {
        (WorkspaceRef::Name(name), true)
            if engine
                .focused_workspace()
                .is_some_and(|ws| engine.tree.workspace(ws).name == *name)
                && engine.seat.prev_workspace_name.is_some() =>
        {
            WorkspaceRef::BackAndForth
        }
        _ => reference,
    };

    let (ws_id, _created) = match resolve_or_create(engine, &reference) {
        Ok(ws) => ws,
        Err(result) => return result,
    };
    seat::focus_workspace(&mut engine.tree, &mut engine.seat, &mut engine.events, ws_id);
    CmdResult::Success
}

fn workspace_gaps(engine: &mut Engine, name_tokens: &[&str], args: &[&str]) -> CmdResult {
    let name = name_tokens.join(" ");
    let Some(ws_id) = engine.tree.workspace_by_name(&name).map(|ws| ws.id()) else {
        return CmdResult::failure(format!("No workspace named '{name}'"));
    };
    let (Some(&kind), Some(amount)) = (args.first(), args.get(1).and_then(|s| s.parse::<i32>().ok()))
    else {
        return CmdResult::invalid(
            "Expected 'workspace <name> gaps inner|outer_top|outer_right|outer_bottom|outer_left <px>'",
        );
    };
    if amount < 0 {
        return CmdResult::failure("gaps must be non-negative");
    }

    let ws = engine.tree.workspace_mut(ws_id);
    match kind {
        "inner" => ws.gaps_inner = amount,
        "outer_top" => ws.gaps_outer.top = amount,
        "outer_right" => ws.gaps_outer.right = amount,
        "outer_bottom" => ws.gaps_outer.bottom = amount,
        "outer_left" => ws.gaps_outer.left = amount,
        _ => return CmdResult::invalid(format!("Unknown gaps kind '{kind}'")),
    }
    engine.tree.dirty.mark(ws_id);
    CmdResult::Success
}

/// `rename workspace [<old>] to <new>`
pub fn cmd_rename(engine: &mut Engine, args: &[&str]) -> CmdResult {
    const USAGE: &str = "Expected 'rename workspace [<old_name>] to <new_name>'";
    let Some((&"workspace", rest)) = args.split_first() else {
        return CmdResult::invalid(USAGE);
    };
    let Some(to_at) = rest.iter().position(|&tok| tok == "to") else {
        return CmdResult::invalid(USAGE);
    };
    let (old_tokens, new_tokens) = rest.split_at(to_at);
    let new_name = new_tokens[1..].join(" ");
    if new_name.is_empty() {
        return CmdResult::invalid(USAGE);
    }

    let ws_id = if old_tokens.is_empty() {
        match engine.focused_workspace() {
            Some(ws) => ws,
            None => return CmdResult::failure("no workspace has focus"),
        }
    } else {
        let old_name = old_tokens.join(" ");
        match engine.tree.workspace_by_name(&old_name) {
            Some(ws) => ws.id(),
            None => return CmdResult::failure(format!("No workspace named '{old_name}'")),
        }
    };

    if engine.tree.workspace_by_name(&new_name).is_some() {
        return CmdResult::failure(format!("Workspace '{new_name}' already exists"));
    }

    let old_name = engine.tree.workspace(ws_id).name.clone();
    engine.tree.workspace_mut(ws_id).name = new_name.clone();
    engine.tree.root.pid_workspaces.rename(&old_name, &new_name);
    if engine.seat.prev_workspace_name.as_deref() == Some(old_name.as_str()) {
        engine.seat.prev_workspace_name = Some(new_name.clone());
    }
    engine.tree.dirty.mark(ws_id);
    engine.events.push(Event::Workspace {
        change: WorkspaceChange::Rename,
        id: ws_id.get(),
        name: new_name,
        old: Some(old_name),
    });
    CmdResult::Success
}
