//! Per-window state commands: `sticky`, `floating`, `fullscreen`, `urgent`,
//! `border`, `kill`.

use colonnade_config::BorderStyle;
use colonnade_ipc::{CmdResult, Event, WindowChange};

use crate::commands::{focused_window, parse_boolean};
use crate::engine::Engine;
use crate::geometry::Size;
use crate::node::NodeId;
use crate::seat;
use crate::surface::SurfaceRequest;
use crate::tree::{ColumnLayout, FullscreenMode};

pub fn cmd_sticky(engine: &mut Engine, args: &[&str]) -> CmdResult {
    let window = match focused_window(engine) {
        Ok(window) => window,
        Err(result) => return result,
    };
    let current = engine.tree.window(window).is_sticky;
    let Some(target) = args.first().and_then(|arg| parse_boolean(arg, current)) else {
        return CmdResult::invalid("Expected 'sticky <yes|no|toggle>'");
    };

    if !engine.tree.window(window).is_floating() {
        return CmdResult::failure("Can't set sticky on a tiled container");
    }
    if target == current {
        return CmdResult::Success;
    }
    engine.tree.window_mut(window).is_sticky = target;

    if target {
        // A sticky window lives on whatever workspace its output shows.
        let ws_id = engine.tree.window_workspace(window);
        if let Some(active) = engine
            .tree
            .workspace(ws_id)
            .output
            .and_then(|out| engine.tree.output(out).active_workspace)
        {
            if active != ws_id {
                engine.tree.attach_window_floating(window, active);
                engine.events.push(Event::Window {
                    change: WindowChange::Move,
                    id: window.get(),
                    title: engine.tree.window(window).title.clone(),
                });
            }
        }
    }
    CmdResult::Success
}

pub fn cmd_floating(engine: &mut Engine, args: &[&str]) -> CmdResult {
    let window = match focused_window(engine) {
        Ok(window) => window,
        Err(result) => return result,
    };
    let floating = engine.tree.window(window).is_floating();
    let Some(target) = args.first().and_then(|arg| parse_boolean(arg, floating)) else {
        return CmdResult::invalid("Expected 'floating <enable|disable|toggle>'");
    };
    if target == floating {
        return CmdResult::Success;
    }

    if target {
        float_window(engine, window);
    } else {
        tile_window(engine, window);
    }

    engine.events.push(Event::Window {
        change: WindowChange::Floating,
        id: window.get(),
        title: engine.tree.window(window).title.clone(),
    });
    seat::set_focus(&mut engine.tree, &mut engine.seat, &mut engine.events, window);
    CmdResult::Success
}

fn float_window(engine: &mut Engine, window: NodeId) {
    let ws_id = engine.tree.window_workspace(window);
    let old_column = engine.tree.window_column(window);

    // Previous floating geometry wins; otherwise center at the current
    // content size.
    let rect = engine.tree.window(window).floating_rect.unwrap_or_else(|| {
        let area = engine.tree.workspace(ws_id).pending.rect;
        let current = engine.tree.window(window).pending.content_rect.size;
        let size = if current.w > 0 && current.h > 0 {
            current
        } else {
            Size::new(
                engine.config.general.floating_minimum_size.0.max(400),
                engine.config.general.floating_minimum_size.1.max(300),
            )
        };
        crate::arrange::centered_on(area, size)
    });

    engine.tree.attach_window_floating(window, ws_id);
    let win = engine.tree.window_mut(window);
    win.pending.rect = rect;
    win.floating_rect = Some(rect);

    if let Some(col) = old_column {
        engine.tree.column_consider_destroy(col);
    }
}

fn tile_window(engine: &mut Engine, window: NodeId) {
    let ws_id = engine.tree.window_workspace(window);
    // Remember where the window floated for the way back.
    let rect = engine.tree.window(window).pending.rect;
    engine.tree.window_mut(window).floating_rect = Some(rect);
    engine.tree.window_mut(window).is_sticky = false;

    let target_column = engine
        .tree
        .workspace(ws_id)
        .active_column
        .filter(|&col| engine.tree.try_column(col).is_some_and(|c| !c.destroying));
    match target_column {
        Some(col) => engine.tree.move_window_to_column(window, col),
        None => {
            let col = engine.tree.add_column(
                ws_id,
                ColumnLayout::Vertical,
                engine.tree.workspace(ws_id).columns.len(),
            );
            engine.tree.attach_window_to_column(window, col, 0);
        }
    }
    let win = engine.tree.window_mut(window);
    win.height_fraction = 0.0;
    win.width_fraction = 0.0;
}

pub fn cmd_fullscreen(engine: &mut Engine, args: &[&str]) -> CmdResult {
    let window = match focused_window(engine) {
        Ok(window) => window,
        Err(result) => return result,
    };

    let global = args.contains(&"global");
    let verb = args
        .iter()
        .copied()
        .find(|&arg| arg != "global")
        .unwrap_or("toggle");

    let current = engine.tree.window(window).pending.fullscreen_mode;
    let engaged = match verb {
        "enable" => true,
        "disable" => false,
        "toggle" => current == FullscreenMode::None,
        _ => return CmdResult::invalid("Expected 'fullscreen [enable|disable|toggle] [global]'"),
    };

    let target = match (engaged, global) {
        (false, _) => FullscreenMode::None,
        (true, false) => FullscreenMode::Workspace,
        (true, true) => FullscreenMode::Global,
    };
    if target == current {
        return CmdResult::Success;
    }

    engine.tree.set_fullscreen(window, target);
    engine.events.push(Event::Window {
        change: WindowChange::FullscreenMode,
        id: window.get(),
        title: engine.tree.window(window).title.clone(),
    });
    CmdResult::Success
}

pub fn cmd_urgent(engine: &mut Engine, args: &[&str]) -> CmdResult {
    let window = match focused_window(engine) {
        Ok(window) => window,
        Err(result) => return result,
    };
    match args.first() {
        Some(&"allow") => {
            engine.tree.window_mut(window).allow_urgent = true;
            CmdResult::Success
        }
        Some(&"deny") => {
            engine.tree.window_mut(window).allow_urgent = false;
            CmdResult::Success
        }
        Some(&arg) => {
            let current = engine.tree.window(window).urgent;
            let Some(urgent) = parse_boolean(arg, current) else {
                return CmdResult::invalid("Expected 'urgent <allow|deny|enable|disable|toggle>'");
            };
            seat::set_urgent(&mut engine.tree, &mut engine.events, window, urgent);
            CmdResult::Success
        }
        None => CmdResult::invalid("Expected 'urgent <allow|deny|enable|disable|toggle>'"),
    }
}

pub fn cmd_border(engine: &mut Engine, args: &[&str]) -> CmdResult {
    let window = match focused_window(engine) {
        Ok(window) => window,
        Err(result) => return result,
    };
    let current = engine.tree.window(window).pending.border;

    let (style, thickness) = match args.first() {
        Some(&"none") => (BorderStyle::None, None),
        Some(&"pixel") => (
            BorderStyle::Pixel,
            args.get(1).and_then(|s| s.parse::<i32>().ok()),
        ),
        Some(&"normal") => (
            BorderStyle::Normal,
            args.get(1).and_then(|s| s.parse::<i32>().ok()),
        ),
        Some(&"csd") => (BorderStyle::Csd, None),
        Some(&"toggle") => (
            match current {
                BorderStyle::None => BorderStyle::Pixel,
                BorderStyle::Pixel => BorderStyle::Normal,
                BorderStyle::Normal => BorderStyle::Csd,
                BorderStyle::Csd => BorderStyle::None,
            },
            None,
        ),
        _ => return CmdResult::invalid("Expected 'border <none|normal|pixel|csd|toggle> [<n>]'"),
    };

    let win = engine.tree.window_mut(window);
    if style == BorderStyle::Csd && current != BorderStyle::Csd {
        // Remember what to restore when the view leaves CSD.
        win.saved_border = Some(current);
    }
    win.pending.border = style;
    if let Some(thickness) = thickness {
        win.pending.border_thickness = thickness;
    }
    engine.tree.dirty.mark(window);
    CmdResult::Success
}

pub fn cmd_kill(engine: &mut Engine, _args: &[&str]) -> CmdResult {
    let window = match focused_window(engine) {
        Ok(window) => window,
        Err(result) => return result,
    };
    let surface = engine.tree.window(window).surface;
    engine.push_request(SurfaceRequest::Close { surface });
    CmdResult::Success
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rectangle;
    use crate::surface::SurfaceId;
    use std::time::Instant;

    fn engine_with_window() -> (Engine, NodeId) {
        let mut engine = Engine::new(colonnade_config::Config::default());
        let output = engine.add_output("DP-1", Rectangle::from_coords(0, 0, 1000, 1000));
        engine.enable_output(output);
        let win = engine.map_window_with_parent_lookup(
            SurfaceId::unique(),
            None,
            Instant::now(),
            |_| None,
        );
        (engine, win)
    }

    #[test]
    fn floating_round_trip_restores_tiling() {
        let (mut engine, win) = engine_with_window();
        assert!(!engine.tree.window(win).is_floating());

        assert!(cmd_floating(&mut engine, &["enable"]).is_success());
        assert!(engine.tree.window(win).is_floating());

        assert!(cmd_floating(&mut engine, &["disable"]).is_success());
        assert!(!engine.tree.window(win).is_floating());
        assert!(engine.tree.window_column(win).is_some());
    }

    #[test]
    fn fullscreen_toggle_cycles() {
        let (mut engine, win) = engine_with_window();
        assert!(cmd_fullscreen(&mut engine, &["toggle"]).is_success());
        assert_eq!(
            engine.tree.window(win).pending.fullscreen_mode,
            FullscreenMode::Workspace
        );
        assert!(cmd_fullscreen(&mut engine, &["toggle"]).is_success());
        assert_eq!(
            engine.tree.window(win).pending.fullscreen_mode,
            FullscreenMode::None
        );
    }

    #[test]
    fn sticky_requires_floating() {
        let (mut engine, _) = engine_with_window();
        assert!(matches!(
            cmd_sticky(&mut engine, &["enable"]),
            CmdResult::Failure(_)
        ));
        cmd_floating(&mut engine, &["enable"]);
        assert!(cmd_sticky(&mut engine, &["enable"]).is_success());
    }
}
