//! The tree model.
//!
//! Entities live in arenas keyed by stable [`NodeId`]s; parent/child links and
//! every other back-reference are ids, never pointers. The shape is
//!
//! ```text
//! root → outputs → workspaces → { floating windows, columns → windows }
//! ```
//!
//! All mutators mark the affected entities dirty; the transaction engine
//! drains the dirty set into atomic commits. Deletion is two-phase: an entity
//! marked `destroying` is detached and skipped by lookups but stays in the
//! arena until every transaction referencing it has retired.

use indexmap::IndexMap;

pub use self::column::{Column, ColumnLayout};
pub use self::output::{Layer, LayerSurface, Output};
pub use self::root::{proc_parent_pid, PidWorkspaces, Root};
pub use self::window::{FullscreenMode, Window, WindowParent, WindowState};
pub use self::workspace::{workspace_name_order, Workspace};

use crate::geometry::Rectangle;
use crate::node::{DirtySet, NodeId, NodeKind};
use crate::surface::SurfaceId;

pub mod column;
pub mod output;
pub mod root;
pub mod window;
pub mod workspace;

/// Direction in layout space, used by focus/move commands and drop-zone
/// resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            _ => None,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("no such node: {0:?}")]
    NoSuchNode(NodeId),
    #[error("a sticky window cannot move to another workspace on the same output")]
    StickySameOutput,
    #[error("cannot swap a window with itself")]
    SwapSelf,
}

#[derive(Debug)]
pub struct Tree {
    pub root: Root,
    outputs: IndexMap<NodeId, Output>,
    workspaces: IndexMap<NodeId, Workspace>,
    columns: IndexMap<NodeId, Column>,
    windows: IndexMap<NodeId, Window>,
    pub dirty: DirtySet,
}

impl Tree {
    pub fn new() -> Self {
        // The fallback output parks workspaces while no real output exists.
        // It is never enabled and never listed in root.outputs.
        let fallback = Output::new("FALLBACK".to_owned(), Rectangle::default());
        let fallback_id = fallback.id();
        let mut outputs = IndexMap::new();
        outputs.insert(fallback_id, fallback);

        Self {
            root: Root::new(fallback_id),
            outputs,
            workspaces: IndexMap::new(),
            columns: IndexMap::new(),
            windows: IndexMap::new(),
            dirty: DirtySet::new(),
        }
    }

    // {{{ Lookups

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        if self.outputs.contains_key(&id) {
            Some(NodeKind::Output)
        } else if self.workspaces.contains_key(&id) {
            Some(NodeKind::Workspace)
        } else if self.columns.contains_key(&id) {
            Some(NodeKind::Column)
        } else if self.windows.contains_key(&id) {
            Some(NodeKind::Window)
        } else {
            None
        }
    }

    pub fn output(&self, id: NodeId) -> &Output {
        self.outputs.get(&id).expect("output id out of tree")
    }

    pub fn output_mut(&mut self, id: NodeId) -> &mut Output {
        self.outputs.get_mut(&id).expect("output id out of tree")
    }

    pub fn workspace(&self, id: NodeId) -> &Workspace {
        self.workspaces.get(&id).expect("workspace id out of tree")
    }

    pub fn workspace_mut(&mut self, id: NodeId) -> &mut Workspace {
        self.workspaces.get_mut(&id).expect("workspace id out of tree")
    }

    pub fn column(&self, id: NodeId) -> &Column {
        self.columns.get(&id).expect("column id out of tree")
    }

    pub fn column_mut(&mut self, id: NodeId) -> &mut Column {
        self.columns.get_mut(&id).expect("column id out of tree")
    }

    pub fn window(&self, id: NodeId) -> &Window {
        self.windows.get(&id).expect("window id out of tree")
    }

    pub fn window_mut(&mut self, id: NodeId) -> &mut Window {
        self.windows.get_mut(&id).expect("window id out of tree")
    }

    pub fn try_window(&self, id: NodeId) -> Option<&Window> {
        self.windows.get(&id)
    }

    pub fn try_workspace(&self, id: NodeId) -> Option<&Workspace> {
        self.workspaces.get(&id)
    }

    pub fn try_column(&self, id: NodeId) -> Option<&Column> {
        self.columns.get(&id)
    }

    pub fn try_output(&self, id: NodeId) -> Option<&Output> {
        self.outputs.get(&id)
    }

    /// Enabled outputs, in plug order.
    pub fn enabled_outputs(&self) -> impl Iterator<Item = &Output> + '_ {
        self.root.outputs.iter().map(|id| self.output(*id))
    }

    /// Every live (non-destroying) window, including ones parked on the
    /// fallback output.
    pub fn all_windows(&self) -> impl Iterator<Item = &Window> + '_ {
        self.windows.values().filter(|window| !window.destroying)
    }

    pub fn all_workspaces(&self) -> impl Iterator<Item = &Workspace> + '_ {
        self.workspaces.values().filter(|ws| !ws.destroying)
    }

    pub fn all_columns(&self) -> impl Iterator<Item = &Column> + '_ {
        self.columns.values().filter(|column| !column.destroying)
    }

    pub fn workspace_by_name(&self, name: &str) -> Option<&Workspace> {
        self.all_workspaces().find(|ws| ws.name == name)
    }

    pub fn workspace_by_number(&self, number: i32) -> Option<&Workspace> {
        self.all_workspaces().find(|ws| ws.number() == Some(number))
    }

    pub fn output_by_name(&self, name: &str) -> Option<&Output> {
        self.enabled_outputs().find(|output| output.name == name)
    }

    pub fn window_by_mark(&self, mark: &str) -> Option<&Window> {
        self.all_windows().find(|window| window.has_mark(mark))
    }

    pub fn window_by_surface(&self, surface: SurfaceId) -> Option<&Window> {
        self.all_windows().find(|window| window.surface == surface)
    }

    /// Like [`Tree::window_by_surface`] but including destroying windows
    /// (late configure acks must still resolve).
    pub fn window_by_surface_any(&self, surface: SurfaceId) -> Option<NodeId> {
        self.windows
            .values()
            .find(|window| window.surface == surface)
            .map(|window| window.id())
    }

    pub fn find_window_by_id(&self, id: u64) -> Option<&Window> {
        self.all_windows().find(|window| window.id().get() == id)
    }

    /// The workspace a window ultimately belongs to (invariant 1 holds by
    /// construction: it is derived from the parent link).
    pub fn window_workspace(&self, window: NodeId) -> NodeId {
        match self.window(window).parent {
            WindowParent::Column(col) => self.column(col).workspace,
            WindowParent::Workspace(ws) => ws,
        }
    }

    /// The column holding a window, if it is tiled.
    pub fn window_column(&self, window: NodeId) -> Option<NodeId> {
        match self.window(window).parent {
            WindowParent::Column(col) => Some(col),
            WindowParent::Workspace(_) => None,
        }
    }

    pub fn workspace_output(&self, workspace: NodeId) -> Option<NodeId> {
        self.workspace(workspace).output
    }

    /// Tiled windows of a workspace, column by column, top to bottom.
    pub fn tiled_windows(&self, workspace: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.workspace(workspace)
            .columns
            .iter()
            .flat_map(|&col| self.column(col).children.iter().copied())
    }

    pub fn workspace_windows(&self, workspace: NodeId) -> Vec<NodeId> {
        let ws = self.workspace(workspace);
        self.tiled_windows(workspace)
            .chain(ws.floating.iter().copied())
            .collect()
    }

    pub fn num_tiled_windows(&self, workspace: NodeId) -> usize {
        self.tiled_windows(workspace).count()
    }

    /// Tiled windows visible on a workspace: in stacked/tabbed columns only
    /// the active child shows.
    pub fn visible_tiled_windows(&self, workspace: NodeId) -> Vec<NodeId> {
        let mut visible = Vec::new();
        for &col_id in &self.workspace(workspace).columns {
            let col = self.column(col_id);
            match col.layout {
                ColumnLayout::Vertical => visible.extend(col.children.iter().copied()),
                ColumnLayout::Stacked | ColumnLayout::Tabbed => {
                    visible.extend(col.visible_child());
                }
            }
        }
        visible
    }

    pub fn num_sticky_windows(&self, workspace: NodeId) -> usize {
        self.workspace(workspace)
            .floating
            .iter()
            .filter(|&&w| self.window(w).is_sticky_effective())
            .count()
    }

    /// The nearest enabled output in `direction` from `from`, judged by
    /// center distance.
    pub fn output_in_direction(&self, from: NodeId, direction: Direction) -> Option<NodeId> {
        let center = self.output(from).rect.center();
        self.enabled_outputs()
            .filter(|output| output.id() != from)
            .filter(|output| {
                let other = output.rect.center();
                match direction {
                    Direction::Left => other.x < center.x,
                    Direction::Right => other.x > center.x,
                    Direction::Up => other.y < center.y,
                    Direction::Down => other.y > center.y,
                }
            })
            .min_by_key(|output| {
                let other = output.rect.center();
                let (dx, dy) = ((other.x - center.x) as i64, (other.y - center.y) as i64);
                dx * dx + dy * dy
            })
            .map(|output| output.id())
    }

    // }}}

    // {{{ Construction

    pub fn add_output(&mut self, name: String, rect: Rectangle) -> NodeId {
        let output = Output::new(name, rect);
        let id = output.id();
        self.outputs.insert(id, output);
        id
    }

    /// Create a workspace attached to `output` (or parked on the fallback
    /// output), inserted in name-sorted position.
    pub fn create_workspace(&mut self, name: String, output: Option<NodeId>) -> NodeId {
        debug_assert!(
            self.workspace_by_name(&name).is_none(),
            "workspace names must be unique"
        );
        let target = output.unwrap_or(self.root.fallback_output);
        let workspace = Workspace::new(name, Some(target));
        let id = workspace.id();
        self.workspaces.insert(id, workspace);
        self.insert_workspace_sorted(target, id);
        self.dirty.mark(id);
        id
    }

    /// Insert `workspace` into `output`'s list, numeric names first ascending,
    /// then lexicographic.
    fn insert_workspace_sorted(&mut self, output: NodeId, workspace: NodeId) {
        let name = self.workspace(workspace).name.clone();
        let out = self.output(output);
        let index = out
            .workspaces
            .iter()
            .position(|&other| {
                workspace_name_order(&name, &self.workspace(other).name).is_lt()
            })
            .unwrap_or(out.workspaces.len());
        let out = self.output_mut(output);
        out.workspaces.insert(index, workspace);
        if out.active_workspace.is_none() {
            out.active_workspace = Some(workspace);
        }
    }

    pub fn add_column(&mut self, workspace: NodeId, layout: ColumnLayout, index: usize) -> NodeId {
        let column = Column::new(workspace, layout);
        let id = column.id();
        self.columns.insert(id, column);
        let ws = self.workspace_mut(workspace);
        let index = index.min(ws.columns.len());
        ws.columns.insert(index, id);
        self.dirty.mark(id);
        self.dirty.mark(workspace);
        id
    }

    pub fn add_window(&mut self, surface: SurfaceId, parent: WindowParent) -> NodeId {
        let window = Window::new(surface, parent);
        let id = window.id();
        self.windows.insert(id, window);
        match parent {
            WindowParent::Column(col) => {
                let column = self.column_mut(col);
                column.children.push(id);
                column.active_child.get_or_insert(id);
                let ws = column.workspace;
                self.dirty.mark(col);
                self.dirty.mark(ws);
            }
            WindowParent::Workspace(ws) => {
                self.workspace_mut(ws).floating.push(id);
                self.dirty.mark(ws);
            }
        }
        self.dirty.mark(id);
        id
    }

    // }}}

    // {{{ Attach / detach

    /// Remove a window from its parent's child list, marking both ends dirty.
    /// Returns the parent it was detached from.
    pub fn detach_window(&mut self, window_id: NodeId) -> WindowParent {
        let parent = self.window(window_id).parent;
        match parent {
            WindowParent::Column(col_id) => {
                let column = self.column_mut(col_id);
                column.children.retain(|&child| child != window_id);
                if column.active_child == Some(window_id) {
                    column.active_child = column.children.first().copied();
                }
                let ws = column.workspace;
                self.dirty.mark(col_id);
                self.dirty.mark(ws);
            }
            WindowParent::Workspace(ws_id) => {
                let ws = self.workspace_mut(ws_id);
                ws.floating.retain(|&w| w != window_id);
                self.dirty.mark(ws_id);
            }
        }

        let ws_id = match parent {
            WindowParent::Column(col) => self.column(col).workspace,
            WindowParent::Workspace(ws) => ws,
        };
        let ws = self.workspace_mut(ws_id);
        if ws.fullscreen == Some(window_id) {
            ws.fullscreen = None;
        }
        self.dirty.mark(window_id);
        parent
    }

    /// Insert a window into a column at `index`, detaching it from its prior
    /// parent first. Sibling fractions renormalize at the next arrangement.
    pub fn attach_window_to_column(&mut self, window_id: NodeId, col_id: NodeId, index: usize) {
        self.detach_window(window_id);
        let column = self.column_mut(col_id);
        let index = index.min(column.children.len());
        column.children.insert(index, window_id);
        column.active_child.get_or_insert(window_id);
        let ws = column.workspace;
        self.window_mut(window_id).parent = WindowParent::Column(col_id);
        self.dirty.mark(col_id);
        self.dirty.mark(ws);
        self.dirty.mark(window_id);
    }

    /// Re-parent a window directly under a workspace (floating), on top of
    /// the existing stack.
    pub fn attach_window_floating(&mut self, window_id: NodeId, ws_id: NodeId) {
        self.detach_window(window_id);
        self.workspace_mut(ws_id).floating.push(window_id);
        self.window_mut(window_id).parent = WindowParent::Workspace(ws_id);
        self.dirty.mark(ws_id);
        self.dirty.mark(window_id);
    }

    pub fn detach_column(&mut self, col_id: NodeId) {
        let ws_id = self.column(col_id).workspace;
        let ws = self.workspace_mut(ws_id);
        ws.columns.retain(|&col| col != col_id);
        if ws.active_column == Some(col_id) {
            ws.active_column = ws.columns.first().copied();
        }
        self.dirty.mark(ws_id);
        self.dirty.mark(col_id);
    }

    pub fn attach_column(&mut self, col_id: NodeId, ws_id: NodeId, index: usize) {
        let old_ws = self.column(col_id).workspace;
        if self.workspaces.contains_key(&old_ws) {
            let ws = self.workspace_mut(old_ws);
            ws.columns.retain(|&col| col != col_id);
            if ws.active_column == Some(col_id) {
                ws.active_column = ws.columns.first().copied();
            }
            self.dirty.mark(old_ws);
        }
        let ws = self.workspace_mut(ws_id);
        let index = index.min(ws.columns.len());
        ws.columns.insert(index, col_id);
        self.column_mut(col_id).workspace = ws_id;
        self.dirty.mark(ws_id);
        self.dirty.mark(col_id);
    }

    /// Raise a floating window to the top of its workspace's stack.
    pub fn raise_floating(&mut self, window_id: NodeId) {
        if let WindowParent::Workspace(ws_id) = self.window(window_id).parent {
            let ws = self.workspace_mut(ws_id);
            ws.floating.retain(|&w| w != window_id);
            ws.floating.push(window_id);
            self.dirty.mark(ws_id);
        }
    }

    // }}}

    // {{{ Moves

    /// Move a window to a workspace: into the focused column if one exists,
    /// otherwise into a fresh column at the end of the row. Floating windows
    /// stay floating. Sticky floating windows may not move between workspaces
    /// of the same output.
    pub fn move_window_to_workspace(
        &mut self,
        window_id: NodeId,
        ws_id: NodeId,
    ) -> Result<(), TreeError> {
        let old_ws = self.window_workspace(window_id);
        if old_ws == ws_id {
            return Ok(());
        }
        if self.window(window_id).is_sticky_effective()
            && self.workspace(old_ws).output == self.workspace(ws_id).output
        {
            return Err(TreeError::StickySameOutput);
        }

        let was_ws_fullscreen =
            self.window(window_id).pending.fullscreen_mode == FullscreenMode::Workspace;
        if self.window(window_id).is_floating() {
            self.attach_window_floating(window_id, ws_id);
        } else {
            let target_column = self
                .workspace(ws_id)
                .active_column
                .filter(|&col| !self.column(col).destroying);
            match target_column {
                Some(col) => {
                    let end = self.column(col).children.len();
                    self.attach_window_to_column(window_id, col, end);
                }
                None => {
                    let col = self.add_column(
                        ws_id,
                        ColumnLayout::Vertical,
                        self.workspace(ws_id).columns.len(),
                    );
                    // Fresh column: let the arranger hand it the average width.
                    self.attach_window_to_column(window_id, col, 0);
                }
            }
        }

        if was_ws_fullscreen {
            let old = self.workspace_mut(old_ws);
            if old.fullscreen == Some(window_id) {
                old.fullscreen = None;
            }
            self.workspace_mut(ws_id).fullscreen = Some(window_id);
        }
        Ok(())
    }

    /// Move a window to the end of a column.
    pub fn move_window_to_column(&mut self, window_id: NodeId, col_id: NodeId) {
        let end = self.column(col_id).children.len();
        self.attach_window_to_column(window_id, col_id, end);
    }

    /// Like [`Tree::move_window_to_column`], choosing the insertion index by
    /// the direction of travel: entering from above inserts first, everything
    /// else appends.
    pub fn move_window_to_column_from_direction(
        &mut self,
        window_id: NodeId,
        col_id: NodeId,
        direction: Direction,
    ) {
        let index = match direction {
            Direction::Up => 0,
            Direction::Down | Direction::Left | Direction::Right => {
                self.column(col_id).children.len()
            }
        };
        self.attach_window_to_column(window_id, col_id, index);
        self.column_mut(col_id).active_child = Some(window_id);
    }

    /// Swap the tree positions, geometry fractions, and pending rectangles of
    /// two windows, restoring fullscreen state afterwards.
    pub fn swap_windows(&mut self, a: NodeId, b: NodeId) -> Result<(), TreeError> {
        if a == b {
            return Err(TreeError::SwapSelf);
        }

        let fs_a = self.window(a).pending.fullscreen_mode;
        let fs_b = self.window(b).pending.fullscreen_mode;
        if fs_a != FullscreenMode::None {
            self.set_fullscreen(a, FullscreenMode::None);
        }
        if fs_b != FullscreenMode::None {
            self.set_fullscreen(b, FullscreenMode::None);
        }

        let (parent_a, index_a) = self.position_of(a);
        let (parent_b, index_b) = self.position_of(b);

        self.detach_window(a);
        self.place_at(a, parent_b, index_b);
        self.detach_window(b);
        self.place_at(b, parent_a, index_a);

        {
            let win_a = self.window(a);
            let geo_a = (
                win_a.width_fraction,
                win_a.height_fraction,
                win_a.pending.rect,
                win_a.pending.content_rect,
                win_a.floating_rect,
            );
            let win_b = self.window(b);
            let geo_b = (
                win_b.width_fraction,
                win_b.height_fraction,
                win_b.pending.rect,
                win_b.pending.content_rect,
                win_b.floating_rect,
            );
            let win_a = self.window_mut(a);
            (
                win_a.width_fraction,
                win_a.height_fraction,
                win_a.pending.rect,
                win_a.pending.content_rect,
                win_a.floating_rect,
            ) = geo_b;
            let win_b = self.window_mut(b);
            (
                win_b.width_fraction,
                win_b.height_fraction,
                win_b.pending.rect,
                win_b.pending.content_rect,
                win_b.floating_rect,
            ) = geo_a;
        }

        if fs_a != FullscreenMode::None {
            self.set_fullscreen(b, fs_a);
        }
        if fs_b != FullscreenMode::None {
            self.set_fullscreen(a, fs_b);
        }
        Ok(())
    }

    fn position_of(&self, window_id: NodeId) -> (WindowParent, usize) {
        let parent = self.window(window_id).parent;
        let index = match parent {
            WindowParent::Column(col) => self.column(col).child_index(window_id),
            WindowParent::Workspace(ws) => self
                .workspace(ws)
                .floating
                .iter()
                .position(|&w| w == window_id),
        };
        (parent, index.expect("window present in its parent"))
    }

    fn place_at(&mut self, window_id: NodeId, parent: WindowParent, index: usize) {
        match parent {
            WindowParent::Column(col) => self.attach_window_to_column(window_id, col, index),
            WindowParent::Workspace(ws) => {
                self.attach_window_floating(window_id, ws);
                let floating = &mut self.workspace_mut(ws).floating;
                let popped = floating.pop().expect("just attached");
                let index = index.min(floating.len());
                floating.insert(index, popped);
            }
        }
    }

    // }}}

    // {{{ Fullscreen

    /// Set a window's fullscreen mode, maintaining the per-workspace and
    /// global exclusivity invariants. Geometry is restored from `saved_rect`
    /// on the way out.
    pub fn set_fullscreen(&mut self, window_id: NodeId, mode: FullscreenMode) {
        let ws_id = self.window_workspace(window_id);
        let current = self.window(window_id).pending.fullscreen_mode;
        if current == mode {
            return;
        }

        // Leaving whatever state we were in.
        match current {
            FullscreenMode::Workspace => {
                let ws = self.workspace_mut(ws_id);
                if ws.fullscreen == Some(window_id) {
                    ws.fullscreen = None;
                }
            }
            FullscreenMode::Global => {
                if self.root.fullscreen_global == Some(window_id) {
                    self.root.fullscreen_global = None;
                }
            }
            FullscreenMode::None => {}
        }

        match mode {
            FullscreenMode::Workspace => {
                // Exclusive: kick out the previous holder.
                if let Some(prev) = self.workspace(ws_id).fullscreen.filter(|&p| p != window_id) {
                    self.set_fullscreen(prev, FullscreenMode::None);
                }
                self.save_rect_once(window_id);
                self.workspace_mut(ws_id).fullscreen = Some(window_id);
            }
            FullscreenMode::Global => {
                if let Some(prev) = self.root.fullscreen_global.filter(|&p| p != window_id) {
                    self.set_fullscreen(prev, FullscreenMode::None);
                }
                self.save_rect_once(window_id);
                self.root.fullscreen_global = Some(window_id);
            }
            FullscreenMode::None => {
                let window = self.window_mut(window_id);
                if let Some(saved) = window.saved_rect.take() {
                    if window.is_floating() {
                        window.pending.rect = saved;
                    }
                }
            }
        }

        let window = self.window_mut(window_id);
        window.pending.fullscreen_mode = mode;
        self.dirty.mark(window_id);
        self.dirty.mark(ws_id);
    }

    fn save_rect_once(&mut self, window_id: NodeId) {
        let window = self.window_mut(window_id);
        if window.saved_rect.is_none() {
            window.saved_rect = Some(window.pending.rect);
        }
    }

    // }}}

    // {{{ Destruction

    /// Destroy a column iff it has no children. Returns whether it was
    /// destroyed.
    pub fn column_consider_destroy(&mut self, col_id: NodeId) -> bool {
        let Some(column) = self.columns.get(&col_id) else {
            return false;
        };
        if !column.children.is_empty() || column.destroying {
            return false;
        }
        self.detach_column(col_id);
        self.column_mut(col_id).destroying = true;
        true
    }

    /// Destroy a workspace iff it is empty and nothing focuses it.
    pub fn workspace_consider_destroy(&mut self, ws_id: NodeId, is_focused: bool) -> bool {
        let Some(ws) = self.workspaces.get(&ws_id) else {
            return false;
        };
        if !ws.is_empty() || ws.destroying || is_focused {
            return false;
        }
        self.begin_destroy_workspace(ws_id);
        true
    }

    pub fn begin_destroy_workspace(&mut self, ws_id: NodeId) {
        let output = self.workspace(ws_id).output;
        if let Some(out_id) = output {
            let out = self.output_mut(out_id);
            out.workspaces.retain(|&ws| ws != ws_id);
            if out.active_workspace == Some(ws_id) {
                out.active_workspace = out.workspaces.first().copied();
            }
        }
        let ws = self.workspace_mut(ws_id);
        ws.output = None;
        ws.destroying = true;
        self.dirty.mark(ws_id);
    }

    /// Mark a window destroying; it leaves the tree structure now and the
    /// arena once its transaction references retire.
    pub fn begin_destroy_window(&mut self, window_id: NodeId) {
        if self.window(window_id).pending.fullscreen_mode != FullscreenMode::None {
            self.set_fullscreen(window_id, FullscreenMode::None);
        }
        let parent = self.detach_window(window_id);
        self.window_mut(window_id).destroying = true;
        if let WindowParent::Column(col) = parent {
            self.column_consider_destroy(col);
        }
    }

    /// Drop every destroying entity whose transactions have all retired.
    /// Returns the freed window ids (for `window: close` events).
    pub fn reap_destroyed(&mut self) -> Vec<NodeId> {
        let mut closed = Vec::new();
        self.windows.retain(|&id, window| {
            if window.destroying && window.ntxnrefs == 0 {
                closed.push(id);
                false
            } else {
                true
            }
        });
        self.columns.retain(|_, column| !column.destroying);
        self.workspaces.retain(|_, ws| !ws.destroying);
        for id in &closed {
            self.dirty.remove(*id);
        }
        closed
    }

    // }}}
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rectangle;

    fn tree_with_workspace() -> (Tree, NodeId, NodeId) {
        let mut tree = Tree::new();
        let output = tree.add_output("HDMI-A-1".into(), Rectangle::from_coords(0, 0, 1920, 1080));
        tree.root.outputs.push(output);
        tree.output_mut(output).enabled = true;
        let ws = tree.create_workspace("1".into(), Some(output));
        tree.output_mut(output).active_workspace = Some(ws);
        (tree, output, ws)
    }

    #[test]
    fn window_attach_detach_round_trip() {
        let (mut tree, _, ws) = tree_with_workspace();
        let col = tree.add_column(ws, ColumnLayout::Vertical, 0);
        let win = tree.add_window(SurfaceId::unique(), WindowParent::Column(col));

        assert_eq!(tree.window_workspace(win), ws);
        assert_eq!(tree.column(col).active_child, Some(win));

        tree.detach_window(win);
        assert!(tree.column(col).children.is_empty());
        assert!(tree.column_consider_destroy(col));
        assert!(tree.workspace(ws).columns.is_empty());
    }

    #[test]
    fn move_to_workspace_lands_in_active_column() {
        let (mut tree, output, ws_a) = tree_with_workspace();
        let ws_b = tree.create_workspace("2".into(), Some(output));

        let col_a = tree.add_column(ws_a, ColumnLayout::Vertical, 0);
        let win = tree.add_window(SurfaceId::unique(), WindowParent::Column(col_a));

        let col_b = tree.add_column(ws_b, ColumnLayout::Vertical, 0);
        let other = tree.add_window(SurfaceId::unique(), WindowParent::Column(col_b));
        tree.workspace_mut(ws_b).active_column = Some(col_b);

        tree.move_window_to_workspace(win, ws_b).unwrap();
        assert_eq!(tree.column(col_b).children, vec![other, win]);
        assert_eq!(tree.window_workspace(win), ws_b);
    }

    #[test]
    fn sticky_same_output_move_is_rejected() {
        let (mut tree, output, ws_a) = tree_with_workspace();
        let ws_b = tree.create_workspace("2".into(), Some(output));

        let win = tree.add_window(SurfaceId::unique(), WindowParent::Workspace(ws_a));
        tree.window_mut(win).is_sticky = true;

        assert_eq!(
            tree.move_window_to_workspace(win, ws_b),
            Err(TreeError::StickySameOutput)
        );
        assert_eq!(tree.window_workspace(win), ws_a);
    }

    #[test]
    fn swap_exchanges_positions_and_fractions() {
        let (mut tree, _, ws) = tree_with_workspace();
        let col_a = tree.add_column(ws, ColumnLayout::Vertical, 0);
        let col_b = tree.add_column(ws, ColumnLayout::Vertical, 1);
        let a = tree.add_window(SurfaceId::unique(), WindowParent::Column(col_a));
        let b = tree.add_window(SurfaceId::unique(), WindowParent::Column(col_b));
        tree.window_mut(a).height_fraction = 0.25;
        tree.window_mut(b).height_fraction = 0.75;

        tree.swap_windows(a, b).unwrap();
        assert_eq!(tree.column(col_a).children, vec![b]);
        assert_eq!(tree.column(col_b).children, vec![a]);
        assert_eq!(tree.window(a).height_fraction, 0.75);
        assert_eq!(tree.window(b).height_fraction, 0.25);

        // Swapping twice is the identity on positions.
        tree.swap_windows(a, b).unwrap();
        assert_eq!(tree.column(col_a).children, vec![a]);
        assert_eq!(tree.column(col_b).children, vec![b]);
    }

    #[test]
    fn workspace_fullscreen_is_exclusive() {
        let (mut tree, _, ws) = tree_with_workspace();
        let col = tree.add_column(ws, ColumnLayout::Vertical, 0);
        let w1 = tree.add_window(SurfaceId::unique(), WindowParent::Column(col));
        let w2 = tree.add_window(SurfaceId::unique(), WindowParent::Column(col));

        tree.set_fullscreen(w1, FullscreenMode::Workspace);
        assert_eq!(tree.workspace(ws).fullscreen, Some(w1));

        tree.set_fullscreen(w2, FullscreenMode::Workspace);
        assert_eq!(tree.workspace(ws).fullscreen, Some(w2));
        assert_eq!(tree.window(w1).pending.fullscreen_mode, FullscreenMode::None);
        assert_eq!(
            tree.window(w2).pending.fullscreen_mode,
            FullscreenMode::Workspace
        );
    }

    #[test]
    fn destroying_window_waits_for_txn_refs() {
        let (mut tree, _, ws) = tree_with_workspace();
        let col = tree.add_column(ws, ColumnLayout::Vertical, 0);
        let win = tree.add_window(SurfaceId::unique(), WindowParent::Column(col));

        tree.window_mut(win).ntxnrefs = 1;
        tree.begin_destroy_window(win);
        assert!(tree.reap_destroyed().is_empty());
        assert!(tree.try_window(win).is_some());

        tree.window_mut(win).ntxnrefs = 0;
        assert_eq!(tree.reap_destroyed(), vec![win]);
        assert!(tree.try_window(win).is_none());
    }

    #[test]
    fn sorted_workspace_insertion() {
        let (mut tree, output, _) = tree_with_workspace();
        tree.create_workspace("10".into(), Some(output));
        tree.create_workspace("2".into(), Some(output));
        tree.create_workspace("web".into(), Some(output));

        let names: Vec<_> = tree
            .output(output)
            .workspaces
            .iter()
            .map(|&ws| tree.workspace(ws).name.clone())
            .collect();
        assert_eq!(names, vec!["1", "2", "10", "web"]);
    }
}
