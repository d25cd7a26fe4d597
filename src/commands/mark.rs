//! `mark` and `unmark`. Marks are free-form strings, unique across all
//! windows: attaching a mark steals it from wherever it was.

use colonnade_ipc::{CmdResult, Event, WindowChange};

use crate::commands::focused_window;
use crate::engine::Engine;

pub fn cmd_mark(engine: &mut Engine, args: &[&str]) -> CmdResult {
    let window = match focused_window(engine) {
        Ok(window) => window,
        Err(result) => return result,
    };

    let mut add = false;
    let mut toggle = false;
    let mut rest = args;
    loop {
        match rest.first() {
            Some(&"--add") => add = true,
            Some(&"--replace") => add = false,
            Some(&"--toggle") => toggle = true,
            _ => break,
        }
        rest = &rest[1..];
    }
    if rest.len() != 1 {
        return CmdResult::invalid("Expected 'mark [--add|--replace] [--toggle] <identifier>'");
    }
    let mark = rest[0].to_owned();

    let had_mark = engine.tree.window(window).has_mark(&mark);

    // Uniqueness: strip the mark from any other holder.
    if let Some(holder) = engine.tree.window_by_mark(&mark).map(|w| w.id()) {
        if holder != window {
            engine.tree.window_mut(holder).marks.retain(|m| *m != mark);
            engine.events.push(Event::Window {
                change: WindowChange::Mark,
                id: holder.get(),
                title: engine.tree.window(holder).title.clone(),
            });
        }
    }

    let win = engine.tree.window_mut(window);
    if toggle && had_mark {
        win.marks.retain(|m| *m != mark);
    } else {
        if !add {
            win.marks.clear();
        }
        if !had_mark {
            win.marks.push(mark);
        }
    }

    engine.tree.dirty.mark(window);
    engine.events.push(Event::Window {
        change: WindowChange::Mark,
        id: window.get(),
        title: engine.tree.window(window).title.clone(),
    });
    CmdResult::Success
}

pub fn cmd_unmark(engine: &mut Engine, args: &[&str]) -> CmdResult {
    match args.first() {
        // `unmark <name>`: remove that mark wherever it lives.
        Some(&mark) => {
            if let Some(holder) = engine.tree.window_by_mark(mark).map(|w| w.id()) {
                engine.tree.window_mut(holder).marks.retain(|m| m != mark);
                engine.tree.dirty.mark(holder);
                engine.events.push(Event::Window {
                    change: WindowChange::Mark,
                    id: holder.get(),
                    title: engine.tree.window(holder).title.clone(),
                });
            }
            CmdResult::Success
        }
        // Bare `unmark`: clear every mark on every window.
        None => {
            let marked: Vec<_> = engine
                .tree
                .all_windows()
                .filter(|w| !w.marks.is_empty())
                .map(|w| w.id())
                .collect();
            for id in marked {
                engine.tree.window_mut(id).marks.clear();
                engine.tree.dirty.mark(id);
                engine.events.push(Event::Window {
                    change: WindowChange::Mark,
                    id: id.get(),
                    title: engine.tree.window(id).title.clone(),
                });
            }
            CmdResult::Success
        }
    }
}
