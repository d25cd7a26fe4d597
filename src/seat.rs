//! The focus model.
//!
//! Each seat keeps a focus stack of windows, most-recently-focused first.
//! Setting focus walks the ancestor chain updating every `active_child`
//! pointer, switches the output's visible workspace when needed (carrying
//! sticky floating windows along), and queues the focus events.

use crate::event::{Event, Events, WindowChange, WorkspaceChange};
use crate::node::NodeId;
use crate::tree::{Tree, WindowParent};

#[derive(Debug)]
pub struct Seat {
    pub name: String,
    /// The window holding focus right now. `None` when a bare (empty)
    /// workspace is focused.
    focused: Option<NodeId>,
    /// Window focus history, most-recent first.
    focus_stack: Vec<NodeId>,
    /// The workspace considered focused; kept in sync with the focused
    /// window, and standing in for it when no window holds focus.
    pub focused_workspace: Option<NodeId>,
    /// Name of the previously focused workspace, for `back_and_forth`.
    pub prev_workspace_name: Option<String>,
}

impl Seat {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            focused: None,
            focus_stack: Vec::new(),
            focused_workspace: None,
            prev_workspace_name: None,
        }
    }

    pub fn focused_window(&self) -> Option<NodeId> {
        self.focused
    }

    /// Drop window focus (an empty workspace took over).
    pub fn clear_window_focus(&mut self) {
        self.focused = None;
    }

    /// Most recent focused window satisfying `pred` (used to restore focus
    /// into a workspace).
    pub fn focus_inactive(&self, pred: impl Fn(NodeId) -> bool) -> Option<NodeId> {
        self.focus_stack.iter().copied().find(|&id| pred(id))
    }

    fn promote(&mut self, window: NodeId) {
        self.focus_stack.retain(|&id| id != window);
        self.focus_stack.insert(0, window);
        self.focused = Some(window);
    }

    /// Drop a window from focus and history (it is being destroyed).
    pub fn forget(&mut self, window: NodeId) {
        self.focus_stack.retain(|&id| id != window);
        if self.focused == Some(window) {
            self.focused = None;
        }
    }
}

/// Focus a window: promote it in the stack, update the ancestor chain's
/// active-child pointers, and switch the visible workspace if necessary.
pub fn set_focus(tree: &mut Tree, seat: &mut Seat, events: &mut Events, window_id: NodeId) {
    if tree.try_window(window_id).is_none_or(|w| w.destroying) {
        return;
    }

    let ws_id = tree.window_workspace(window_id);

    // Ancestor bookkeeping.
    match tree.window(window_id).parent {
        WindowParent::Column(col_id) => {
            tree.column_mut(col_id).active_child = Some(window_id);
            tree.workspace_mut(ws_id).active_column = Some(col_id);
        }
        WindowParent::Workspace(_) => {
            tree.raise_floating(window_id);
        }
    }

    // Make the workspace visible on its output, carrying sticky windows.
    if let Some(out_id) = tree.workspace(ws_id).output {
        if tree.output(out_id).active_workspace != Some(ws_id) {
            switch_output_workspace(tree, events, out_id, ws_id);
        }
    }

    let old_workspace = seat.focused_workspace;
    if old_workspace != Some(ws_id) {
        if let Some(old) = old_workspace.and_then(|id| tree.try_workspace(id)) {
            seat.prev_workspace_name = Some(old.name.clone());
        }
        events.push(Event::Workspace {
            change: WorkspaceChange::Focus,
            id: ws_id.get(),
            name: tree.workspace(ws_id).name.clone(),
            old: old_workspace
                .and_then(|id| tree.try_workspace(id))
                .map(|ws| ws.name.clone()),
        });
    }
    seat.focused_workspace = Some(ws_id);
    seat.promote(window_id);

    events.push(Event::Window {
        change: WindowChange::Focus,
        id: window_id.get(),
        title: tree.window(window_id).title.clone(),
    });

    // Focus clears urgency.
    if tree.window(window_id).urgent {
        set_urgent(tree, events, window_id, false);
    }
}

/// Focus a workspace: pick its most recently relevant window, or focus the
/// bare workspace when empty.
pub fn focus_workspace(tree: &mut Tree, seat: &mut Seat, events: &mut Events, ws_id: NodeId) {
    if let Some(out_id) = tree.workspace(ws_id).output {
        if tree.output(out_id).active_workspace != Some(ws_id) {
            switch_output_workspace(tree, events, out_id, ws_id);
        }
    }

    if let Some(window) = workspace_focus_target(tree, seat, ws_id) {
        set_focus(tree, seat, events, window);
        return;
    }

    seat.clear_window_focus();
    let old_workspace = seat.focused_workspace;
    if old_workspace != Some(ws_id) {
        if let Some(old) = old_workspace.and_then(|id| tree.try_workspace(id)) {
            seat.prev_workspace_name = Some(old.name.clone());
        }
        events.push(Event::Workspace {
            change: WorkspaceChange::Focus,
            id: ws_id.get(),
            name: tree.workspace(ws_id).name.clone(),
            old: old_workspace
                .and_then(|id| tree.try_workspace(id))
                .map(|ws| ws.name.clone()),
        });
    }
    seat.focused_workspace = Some(ws_id);
}

/// The window that should receive focus when a workspace is focused: the
/// seat's most recent window inside it, then the active column's active
/// child, then the top floating window.
pub fn workspace_focus_target(tree: &Tree, seat: &Seat, ws_id: NodeId) -> Option<NodeId> {
    if let Some(window) = seat.focus_inactive(|id| {
        tree.try_window(id).is_some_and(|w| !w.destroying) && tree.window_workspace(id) == ws_id
    }) {
        return Some(window);
    }
    let ws = tree.workspace(ws_id);
    ws.active_column
        .and_then(|col| tree.column(col).visible_child())
        .or_else(|| ws.columns.first().and_then(|&col| tree.column(col).visible_child()))
        .or_else(|| ws.floating.last().copied())
}

/// Make `ws_id` the visible workspace of `out_id`, reparenting sticky
/// floating windows from the previously visible one.
pub fn switch_output_workspace(
    tree: &mut Tree,
    events: &mut Events,
    out_id: NodeId,
    ws_id: NodeId,
) {
    let old_active = tree.output(out_id).active_workspace;
    if old_active == Some(ws_id) {
        return;
    }

    if let Some(old_ws) = old_active {
        let sticky: Vec<NodeId> = tree
            .workspace(old_ws)
            .floating
            .iter()
            .copied()
            .filter(|&w| tree.window(w).is_sticky_effective())
            .collect();
        for window in sticky {
            tree.attach_window_floating(window, ws_id);
            events.push(Event::Window {
                change: WindowChange::Move,
                id: window.get(),
                title: tree.window(window).title.clone(),
            });
        }
    }

    tree.output_mut(out_id).active_workspace = Some(ws_id);
    tree.dirty.mark(ws_id);
}

/// Set or clear a window's urgency and bubble it to the workspace.
pub fn set_urgent(tree: &mut Tree, events: &mut Events, window_id: NodeId, urgent: bool) {
    let window = tree.window_mut(window_id);
    if window.urgent == urgent {
        return;
    }
    window.urgent = urgent;
    events.push(Event::Window {
        change: WindowChange::Urgent,
        id: window_id.get(),
        title: tree.window(window_id).title.clone(),
    });

    let ws_id = tree.window_workspace(window_id);
    let any_urgent = tree
        .workspace_windows(ws_id)
        .iter()
        .any(|&w| tree.window(w).urgent);
    let ws = tree.workspace_mut(ws_id);
    if ws.urgent != any_urgent {
        ws.urgent = any_urgent;
        events.push(Event::Workspace {
            change: WorkspaceChange::Urgent,
            id: ws_id.get(),
            name: tree.workspace(ws_id).name.clone(),
            old: None,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rectangle;
    use crate::surface::SurfaceId;
    use crate::tree::{ColumnLayout, WindowParent};

    fn setup() -> (Tree, Seat, Events, NodeId, NodeId) {
        let mut tree = Tree::new();
        let output = tree.add_output("DP-1".into(), Rectangle::from_coords(0, 0, 800, 600));
        tree.root.outputs.push(output);
        tree.output_mut(output).enabled = true;
        let ws = tree.create_workspace("1".into(), Some(output));
        tree.output_mut(output).active_workspace = Some(ws);
        (tree, Seat::new("seat0"), Events::new(), output, ws)
    }

    #[test]
    fn focus_updates_ancestor_chain() {
        let (mut tree, mut seat, mut events, _, ws) = setup();
        let col = tree.add_column(ws, ColumnLayout::Vertical, 0);
        let w1 = tree.add_window(SurfaceId::unique(), WindowParent::Column(col));
        let w2 = tree.add_window(SurfaceId::unique(), WindowParent::Column(col));

        set_focus(&mut tree, &mut seat, &mut events, w2);
        assert_eq!(seat.focused_window(), Some(w2));
        assert_eq!(tree.column(col).active_child, Some(w2));
        assert_eq!(tree.workspace(ws).active_column, Some(col));

        set_focus(&mut tree, &mut seat, &mut events, w1);
        assert_eq!(seat.focused_window(), Some(w1));
        // The history keeps w2 right below for refocusing.
        seat.forget(w1);
        assert_eq!(seat.focused_window(), None);
        assert_eq!(seat.focus_inactive(|id| id == w2), Some(w2));
    }

    #[test]
    fn sticky_windows_follow_workspace_switch() {
        let (mut tree, mut seat, mut events, output, ws_a) = setup();
        let ws_b = tree.create_workspace("2".into(), Some(output));

        let sticky = tree.add_window(SurfaceId::unique(), WindowParent::Workspace(ws_a));
        tree.window_mut(sticky).is_sticky = true;
        let plain = tree.add_window(SurfaceId::unique(), WindowParent::Workspace(ws_a));

        focus_workspace(&mut tree, &mut seat, &mut events, ws_b);
        assert_eq!(tree.window_workspace(sticky), ws_b);
        assert_eq!(tree.window_workspace(plain), ws_a);
        assert_eq!(tree.output(output).active_workspace, Some(ws_b));
    }

    #[test]
    fn urgency_bubbles_to_workspace() {
        let (mut tree, mut seat, mut events, _, ws) = setup();
        let col = tree.add_column(ws, ColumnLayout::Vertical, 0);
        let win = tree.add_window(SurfaceId::unique(), WindowParent::Column(col));

        set_urgent(&mut tree, &mut events, win, true);
        assert!(tree.workspace(ws).urgent);

        // Focusing the window clears both.
        set_focus(&mut tree, &mut seat, &mut events, win);
        assert!(!tree.window(win).urgent);
        assert!(!tree.workspace(ws).urgent);
    }

    #[test]
    fn prev_workspace_name_tracks_switches() {
        let (mut tree, mut seat, mut events, output, ws_a) = setup();
        let ws_b = tree.create_workspace("2".into(), Some(output));

        focus_workspace(&mut tree, &mut seat, &mut events, ws_a);
        focus_workspace(&mut tree, &mut seat, &mut events, ws_b);
        assert_eq!(seat.prev_workspace_name.as_deref(), Some("1"));
    }
}
