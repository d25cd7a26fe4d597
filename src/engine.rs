//! The engine: the single object owning the tree, the seat, transactions,
//! events, and the interactive ops. Every operation is a method here or is
//! dispatched through [`crate::commands`].

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use colonnade_config::Config;
use colonnade_ipc::CmdResult;
use indexmap::IndexSet;

use crate::event::{Event, Events, EventSink, WindowChange, WorkspaceChange};
use crate::geometry::{Point, Rectangle};
use crate::input::{self, HitTarget, MoveGrab, ResizeEdge, ResizeGrab};
use crate::node::NodeId;
use crate::render::{self, Snapshot};
use crate::seat::{self, Seat};
use crate::surface::{ConfigureSerial, SurfaceId, SurfaceRequest};
use crate::transaction::Transactions;
use crate::tree::{workspace_name_order, ColumnLayout, Tree, WindowParent};

pub struct Engine {
    pub tree: Tree,
    pub config: Config,
    pub seat: Seat,
    pub events: Events,
    txns: Transactions,
    outbox: Vec<SurfaceRequest>,
    emitted: Vec<Event>,
    sink: Option<Box<dyn EventSink>>,

    pub(crate) move_grab: Option<MoveGrab>,
    pub(crate) resize_grab: Option<ResizeGrab>,

    snapshot: Arc<Snapshot>,

    /// Last known pointer position in layout coordinates.
    pub cursor: Point<f64>,

    /// While the embedder loads configuration there are no outputs yet;
    /// commands needing one defer instead of failing.
    pub deferring: bool,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("outputs", &self.tree.root.outputs.len())
            .field("deferring", &self.deferring)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Build an engine from a configuration file on disk.
    pub fn from_config_file(path: &std::path::Path) -> anyhow::Result<Self> {
        let config = colonnade_config::load(path)
            .with_context(|| format!("loading engine configuration from {}", path.display()))?;
        Ok(Self::new(config))
    }

    pub fn new(config: Config) -> Self {
        Self {
            tree: Tree::new(),
            config,
            seat: Seat::new("seat0"),
            events: Events::new(),
            txns: Transactions::new(),
            outbox: Vec::new(),
            emitted: Vec::new(),
            sink: None,
            move_grab: None,
            resize_grab: None,
            snapshot: Arc::new(Snapshot::default()),
            cursor: Point::default(),
            deferring: false,
        }
    }

    /// Install the opaque event sink. Without one, events accumulate for
    /// [`Engine::take_events`].
    pub fn set_event_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sink = Some(sink);
    }

    // {{{ Embedder surface

    /// Drain the pending surface requests (configures, close requests).
    pub fn take_requests(&mut self) -> Vec<SurfaceRequest> {
        std::mem::take(&mut self.outbox)
    }

    pub(crate) fn push_request(&mut self, request: SurfaceRequest) {
        self.outbox.push(request);
    }

    /// Drain events emitted since the last call (when no sink is installed).
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.emitted)
    }

    /// The last published render snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot)
    }

    pub fn focused_window(&self) -> Option<NodeId> {
        self.seat
            .focused_window()
            .filter(|&id| self.tree.try_window(id).is_some_and(|w| !w.destroying))
    }

    pub fn focused_workspace(&self) -> Option<NodeId> {
        if let Some(window) = self.focused_window() {
            return Some(self.tree.window_workspace(window));
        }
        self.seat
            .focused_workspace
            .filter(|&id| self.tree.try_workspace(id).is_some_and(|ws| !ws.destroying))
    }

    /// Swap in a freshly loaded configuration. Workspaces without explicit
    /// overrides pick up the new gap defaults, and everything re-arranges.
    pub fn reload_config(&mut self, config: Config) {
        self.config = config;
        let workspaces: Vec<NodeId> = self.tree.all_workspaces().map(|ws| ws.id()).collect();
        for ws_id in workspaces {
            let name = self.tree.workspace(ws_id).name.clone();
            let general = &self.config.general;
            let (mut gaps_inner, mut gaps_outer) = (general.gaps_inner, general.gaps_outer);
            if let Some(ws_config) = self.config.workspace_config(&name) {
                if let Some(inner) = ws_config.gaps_inner {
                    gaps_inner = inner;
                }
                if let Some(outer) = ws_config.gaps_outer {
                    gaps_outer = outer;
                }
            }
            let ws = self.tree.workspace_mut(ws_id);
            ws.gaps_inner = gaps_inner;
            ws.gaps_outer = gaps_outer;
            self.tree.dirty.mark(ws_id);
            self.events.push(Event::Workspace {
                change: WorkspaceChange::Reload,
                id: ws_id.get(),
                name,
                old: None,
            });
        }
    }

    /// Dispatch one tokenized command and queue a commit for its effects.
    pub fn command(&mut self, argv: &[&str], now: Instant) -> CmdResult {
        let result = crate::commands::dispatch(self, argv);
        if result.is_success() {
            self.commit(now);
        }
        result
    }

    // }}}

    // {{{ Transactions

    /// Commit the dirty set. Safe to call with nothing dirty.
    pub fn commit(&mut self, now: Instant) {
        loop {
            let Some(batch) = self
                .txns
                .commit(&mut self.tree, &self.config, now, &mut self.outbox)
            else {
                return;
            };
            self.finish_retire(&batch);
            if !self.txns.take_queued() {
                return;
            }
        }
    }

    /// A client acked a configure. Destroying windows still resolve here:
    /// their acks release the transaction references keeping them alive.
    pub fn ack_configure(&mut self, surface: SurfaceId, serial: ConfigureSerial, now: Instant) {
        let Some(window) = self.tree.window_by_surface_any(surface) else {
            return;
        };
        if let Some(batch) = self.txns.ack(&mut self.tree, window, serial) {
            self.finish_retire(&batch);
            if self.txns.take_queued() {
                self.commit(now);
            }
        }
    }

    /// Drive timeouts. Call at (or after) [`Engine::next_deadline`].
    pub fn tick(&mut self, now: Instant) {
        if let Some(batch) = self.txns.tick(&mut self.tree, now) {
            self.finish_retire(&batch);
            if self.txns.take_queued() {
                self.commit(now);
            }
        }
    }

    /// The next instant [`Engine::tick`] has work to do, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.txns.next_deadline()
    }

    fn finish_retire(&mut self, _batch: &IndexSet<NodeId>) {
        let closed = self.tree.reap_destroyed();
        for id in closed {
            self.seat.forget(id);
            self.events.push(Event::Window {
                change: WindowChange::Close,
                id: id.get(),
                title: None,
            });
        }

        self.snapshot = render::snapshot(
            &self.tree,
            &self.config,
            &self.seat,
            self.move_grab.as_ref(),
        );

        match &mut self.sink {
            Some(sink) => self.events.flush(sink.as_mut()),
            None => self.emitted.extend(self.events.drain()),
        }
    }

    // }}}

    // {{{ Output lifecycle

    /// Register a new display. It stays invisible until enabled.
    pub fn add_output(&mut self, name: &str, rect: Rectangle) -> NodeId {
        let id = self.tree.add_output(name.to_owned(), rect);
        if let Some(output_config) = self.config.output_config(name) {
            let scale = output_config.scale;
            self.tree.output_mut(id).scale = scale;
        }
        id
    }

    /// Enable an output: pull back every workspace that prefers it, or create
    /// a fresh default one.
    pub fn enable_output(&mut self, out_id: NodeId) {
        let name = self.tree.output(out_id).name.clone();
        {
            let output = self.tree.output_mut(out_id);
            if output.enabled {
                return;
            }
            output.enabled = true;
        }
        self.tree.root.outputs.push(out_id);

        // Workspaces parked on the fallback output return if they prefer us.
        let fallback = self.tree.root.fallback_output;
        let returning: Vec<NodeId> = self
            .tree
            .output(fallback)
            .workspaces
            .iter()
            .copied()
            .filter(|&ws| {
                let ws = self.tree.workspace(ws);
                ws.output_priority.iter().any(|pref| *pref == name)
                    || self
                        .config
                        .workspace_config(&ws.name)
                        .is_some_and(|cfg| cfg.outputs.contains(&name))
            })
            .collect();
        for ws in &returning {
            self.move_workspace_to_output(*ws, out_id);
        }

        if self.tree.output(out_id).workspaces.is_empty() {
            let name = self.next_workspace_name_for(&name);
            self.create_workspace(&name, Some(out_id));
        }

        let output = self.tree.output_mut(out_id);
        if output.active_workspace.is_none() {
            output.active_workspace = output.workspaces.first().copied();
        }
        self.tree.dirty.mark(out_id);

        if self.seat.focused_workspace.is_none() {
            let ws = self.tree.output(out_id).active_workspace;
            self.seat.focused_workspace = ws;
        }
    }

    /// First unused workspace name for a fresh output: a configured binding
    /// for this output first, then the lowest unused integer.
    fn next_workspace_name_for(&self, output_name: &str) -> String {
        for ws_config in &self.config.workspaces {
            if ws_config.outputs.iter().any(|o| o == output_name)
                && self.tree.workspace_by_name(&ws_config.name).is_none()
            {
                return ws_config.name.clone();
            }
        }
        let mut n = 1;
        while self.tree.workspace_by_name(&n.to_string()).is_some() {
            n += 1;
        }
        n.to_string()
    }

    /// Create a workspace, seeding gaps and output priority from
    /// configuration, and announce it.
    pub fn create_workspace(&mut self, name: &str, output: Option<NodeId>) -> NodeId {
        let ws_id = self.tree.create_workspace(name.to_owned(), output);

        let general = &self.config.general;
        let (mut gaps_inner, mut gaps_outer) = (general.gaps_inner, general.gaps_outer);
        let mut priority = Vec::new();
        if let Some(ws_config) = self.config.workspace_config(name) {
            if let Some(inner) = ws_config.gaps_inner {
                gaps_inner = inner;
            }
            if let Some(outer) = ws_config.gaps_outer {
                gaps_outer = outer;
            }
            priority = ws_config.outputs.clone();
        }
        let ws = self.tree.workspace_mut(ws_id);
        ws.gaps_inner = gaps_inner;
        ws.gaps_outer = gaps_outer;
        ws.output_priority = priority;

        self.events.push(Event::Workspace {
            change: WorkspaceChange::Init,
            id: ws_id.get(),
            name: name.to_owned(),
            old: None,
        });
        ws_id
    }

    /// Disable an output, evacuating its workspaces.
    pub fn disable_output(&mut self, out_id: NodeId) {
        if !self.tree.output(out_id).enabled {
            return;
        }
        let focused_here = self
            .focused_workspace()
            .and_then(|ws| self.tree.workspace(ws).output)
            == Some(out_id);

        let workspaces: Vec<NodeId> = self.tree.output(out_id).workspaces.clone();
        let mut landing = None;
        for ws_id in workspaces {
            let target = self.evacuation_target(ws_id, out_id);

            let ws = self.tree.workspace(ws_id);
            let target_has_active = self
                .tree
                .try_output(target)
                .and_then(|o| o.active_workspace)
                .is_some();
            if ws.is_empty() && self.tree.num_sticky_windows(ws_id) == 0 && target_has_active {
                self.tree.begin_destroy_workspace(ws_id);
                continue;
            }

            self.move_workspace_to_output(ws_id, target);

            // Sticky windows belong to whatever workspace the target output
            // is showing, not to the evacuated one.
            if let Some(active) = self
                .tree
                .try_output(target)
                .and_then(|o| o.active_workspace)
                .filter(|&active| active != ws_id)
            {
                let sticky: Vec<NodeId> = self
                    .tree
                    .workspace(ws_id)
                    .floating
                    .iter()
                    .copied()
                    .filter(|&w| self.tree.window(w).is_sticky_effective())
                    .collect();
                for window in sticky {
                    self.tree.attach_window_floating(window, active);
                    self.events.push(Event::Window {
                        change: WindowChange::Move,
                        id: window.get(),
                        title: self.tree.window(window).title.clone(),
                    });
                }
            }
            landing = Some((ws_id, target));
        }

        let output = self.tree.output_mut(out_id);
        output.enabled = false;
        output.workspaces.clear();
        output.active_workspace = None;
        self.tree.root.outputs.retain(|&id| id != out_id);
        crate::arrange::arrange_root_rect(&mut self.tree);

        if focused_here {
            if let Some((ws, target)) = landing {
                if self.tree.try_output(target).is_some_and(|o| o.enabled) {
                    seat::focus_workspace(&mut self.tree, &mut self.seat, &mut self.events, ws);
                } else {
                    self.seat.focused_workspace = Some(ws);
                }
            }
        }
    }

    /// The output a workspace should evacuate to: its priority list first,
    /// then any live output, then the fallback.
    fn evacuation_target(&self, ws_id: NodeId, departing: NodeId) -> NodeId {
        let ws = self.tree.workspace(ws_id);
        for pref in &ws.output_priority {
            if let Some(output) = self
                .tree
                .enabled_outputs()
                .find(|o| o.id() != departing && o.name == *pref)
            {
                return output.id();
            }
        }
        self.tree
            .enabled_outputs()
            .find(|o| o.id() != departing)
            .map(|o| o.id())
            .unwrap_or(self.tree.root.fallback_output)
    }

    /// Attach a workspace to an output in sorted position, emitting the move
    /// events.
    pub fn move_workspace_to_output(&mut self, ws_id: NodeId, out_id: NodeId) {
        let old_output = self.tree.workspace(ws_id).output;
        if old_output == Some(out_id) {
            return;
        }
        if let Some(old) = old_output {
            let output = self.tree.output_mut(old);
            output.workspaces.retain(|&ws| ws != ws_id);
            if output.active_workspace == Some(ws_id) {
                output.active_workspace = output.workspaces.first().copied();
            }
        }

        // Insert sorted: numeric names first ascending, then lexicographic.
        let name = self.tree.workspace(ws_id).name.clone();
        let index = {
            let output = self.tree.output(out_id);
            output
                .workspaces
                .iter()
                .position(|&other| {
                    workspace_name_order(&name, &self.tree.workspace(other).name).is_lt()
                })
                .unwrap_or(output.workspaces.len())
        };
        let output = self.tree.output_mut(out_id);
        output.workspaces.insert(index, ws_id);
        if output.active_workspace.is_none() {
            output.active_workspace = Some(ws_id);
        }
        let output_name = self.tree.output(out_id).name.clone();
        let ws = self.tree.workspace_mut(ws_id);
        ws.output = Some(out_id);
        if self.tree.try_output(out_id).is_some_and(|o| o.enabled) {
            self.tree.workspace_mut(ws_id).raise_output_priority(&output_name);
        }
        self.tree.dirty.mark(ws_id);

        self.events.push(Event::Workspace {
            change: WorkspaceChange::Move,
            id: ws_id.get(),
            name,
            old: None,
        });
        for win in self.tree.workspace_windows(ws_id) {
            self.events.push(Event::Window {
                change: WindowChange::Move,
                id: win.get(),
                title: self.tree.window(win).title.clone(),
            });
        }
    }

    /// Update an output's usable area (layer-shell struts changed).
    pub fn set_usable_area(&mut self, out_id: NodeId, area: Rectangle) {
        let output = self.tree.output_mut(out_id);
        if output.usable_area != area {
            output.usable_area = area;
            self.tree.dirty.mark(out_id);
        }
    }

    // }}}

    // {{{ Window lifecycle

    /// Map a new toplevel. The target workspace comes from the spawn
    /// registry (keyed by the client pid walking up to its ancestors) or the
    /// focused workspace.
    pub fn map_window(&mut self, surface: SurfaceId, pid: Option<u32>, now: Instant) -> NodeId {
        self.map_window_with_parent_lookup(surface, pid, now, crate::tree::proc_parent_pid)
    }

    /// [`Engine::map_window`] with an explicit parent-pid lookup (tests).
    pub fn map_window_with_parent_lookup(
        &mut self,
        surface: SurfaceId,
        pid: Option<u32>,
        now: Instant,
        parent_of: impl Fn(u32) -> Option<u32>,
    ) -> NodeId {
        let ws_id = pid
            .and_then(|pid| {
                self.tree
                    .root
                    .pid_workspaces
                    .take(pid, now, parent_of)
            })
            .and_then(|(name, _)| self.tree.workspace_by_name(&name).map(|ws| ws.id()))
            .or_else(|| self.focused_workspace())
            .or_else(|| {
                self.tree
                    .enabled_outputs()
                    .next()
                    .and_then(|o| o.active_workspace)
            })
            .unwrap_or_else(|| {
                // Headless: park on the fallback output.
                let fallback = self.tree.root.fallback_output;
                self.tree
                    .output(fallback)
                    .workspaces
                    .first()
                    .copied()
                    .unwrap_or_else(|| self.tree.create_workspace("1".to_owned(), None))
            });

        // A new window opens a column of its own at the end of the row.
        let col = self.tree.add_column(
            ws_id,
            ColumnLayout::Vertical,
            self.tree.workspace(ws_id).columns.len(),
        );
        let win = self.tree.add_window(surface, WindowParent::Column(col));

        let border = self.config.decorations.border_style;
        let thickness = self.config.decorations.border_thickness;
        let window = self.tree.window_mut(win);
        window.pending.border = border;
        window.pending.border_thickness = thickness;

        self.events.push(Event::Window {
            change: WindowChange::New,
            id: win.get(),
            title: None,
        });
        seat::set_focus(&mut self.tree, &mut self.seat, &mut self.events, win);
        win
    }

    /// The client unmapped its toplevel: the window leaves the tree and focus
    /// falls back to the next candidate on its workspace.
    pub fn unmap_window(&mut self, win_id: NodeId) {
        if self.tree.try_window(win_id).is_none() {
            return;
        }
        let was_focused = self.focused_window() == Some(win_id);
        let ws_id = self.tree.window_workspace(win_id);
        self.tree.begin_destroy_window(win_id);
        self.seat.forget(win_id);
        if self.move_grab.as_ref().is_some_and(|grab| grab.window == win_id) {
            self.move_grab = None;
        }
        if self.resize_grab.as_ref().is_some_and(|grab| grab.window == win_id) {
            self.resize_grab = None;
            self.txns.resizing = None;
        }

        if was_focused {
            if let Some(next) = seat::workspace_focus_target(&self.tree, &self.seat, ws_id) {
                seat::set_focus(&mut self.tree, &mut self.seat, &mut self.events, next);
            } else {
                self.seat.focused_workspace = Some(ws_id);
            }
        }
    }

    /// Title changed on a view.
    pub fn set_window_title(&mut self, win_id: NodeId, title: Option<String>) {
        let window = self.tree.window_mut(win_id);
        if window.title != title {
            window.title = title;
            self.events.push(Event::Window {
                change: WindowChange::Title,
                id: win_id.get(),
                title: self.tree.window(win_id).title.clone(),
            });
        }
    }

    /// Application id changed on a view (no event fires; IPC clients read it
    /// through queries).
    pub fn set_window_app_id(&mut self, win_id: NodeId, app_id: Option<String>) {
        self.tree.window_mut(win_id).app_id = app_id;
    }

    /// Attach a captured texture for the close animation. Usually called
    /// right before [`Engine::unmap_window`].
    pub fn save_close_buffer(&mut self, win_id: NodeId, buffer: crate::surface::SavedBuffer) {
        if self.tree.try_window(win_id).is_some() {
            self.tree.window_mut(win_id).saved_buffers.push(buffer);
        }
    }

    /// A view raised (or cleared) urgency itself; honored only when allowed.
    pub fn view_set_urgent(&mut self, win_id: NodeId, urgent: bool) {
        if self.tree.window(win_id).allow_urgent {
            seat::set_urgent(&mut self.tree, &mut self.events, win_id, urgent);
        }
    }

    /// Remember the workspace a process was spawned from (60 s lifetime).
    pub fn record_workspace_pid(&mut self, pid: u32, now: Instant) {
        let Some(ws_id) = self.focused_workspace() else {
            return;
        };
        let ws = self.tree.workspace(ws_id);
        let name = ws.name.clone();
        let output = ws.output;
        self.tree
            .root
            .pid_workspaces
            .record(pid, &name, output, now);
    }

    // }}}

    // {{{ Pointer

    /// Resolve what lies under the pointer.
    pub fn target_at(&self, point: Point<f64>) -> HitTarget {
        input::target_at(&self.tree, &self.seat, point)
    }

    /// Pointer motion while no button-driven op runs focuses nothing; during
    /// an op it advances the op. Returns `true` when a redraw is warranted.
    pub fn pointer_motion(&mut self, point: Point<f64>, now: Instant) -> bool {
        self.cursor = point;
        if let Some(mut grab) = self.move_grab.take() {
            grab.motion(&self.tree, &self.seat, &self.config, point);
            self.move_grab = Some(grab);
            // Keep the drop-zone preview fresh.
            self.snapshot = render::snapshot(
                &self.tree,
                &self.config,
                &self.seat,
                self.move_grab.as_ref(),
            );
            return true;
        }
        if let Some(mut grab) = self.resize_grab.take() {
            let alive = grab.motion(&mut self.tree, &self.config, point);
            if alive {
                self.resize_grab = Some(grab);
            } else {
                self.txns.resizing = None;
            }
            self.commit(now);
            return true;
        }
        false
    }

    /// A pointer button press outside any grab: focus whatever window lies
    /// under the cursor.
    pub fn pointer_button_pressed(&mut self, point: Point<f64>, now: Instant) -> HitTarget {
        self.cursor = point;
        let hit = self.target_at(point);
        if let Some(window) = hit.window {
            seat::set_focus(&mut self.tree, &mut self.seat, &mut self.events, window);
            self.commit(now);
        }
        hit
    }

    /// Begin a drag-move on a window (button press on its titlebar).
    pub fn begin_move_grab(&mut self, window: NodeId, point: Point<f64>) {
        if self.move_grab.is_some() || self.resize_grab.is_some() {
            return;
        }
        self.tree.raise_floating(window);
        self.move_grab = Some(MoveGrab::new(window, point));
    }

    /// Begin an interactive resize on a window edge (or chord).
    pub fn begin_resize_grab(&mut self, window: NodeId, edges: ResizeEdge, point: Point<f64>) {
        if self.move_grab.is_some() || self.resize_grab.is_some() {
            return;
        }
        self.txns.resizing = Some(window);
        self.resize_grab = Some(ResizeGrab::new(&self.tree, window, edges, point));
    }

    /// All pointer buttons released: finish whichever op was running.
    pub fn end_pointer_ops(&mut self, now: Instant) {
        if let Some(grab) = self.move_grab.take() {
            grab.finish(&mut self.tree, &mut self.seat, &mut self.events);
            self.commit(now);
        }
        if let Some(grab) = self.resize_grab.take() {
            // One final configure without the resizing hint so clients can
            // re-enable expensive rendering.
            self.txns.resizing = None;
            self.tree.dirty.mark(grab.window);
            self.commit(now);
        }
    }

    // }}}
}
