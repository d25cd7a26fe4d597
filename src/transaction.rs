//! The transaction engine: publishes `pending` state to `current` atomically.
//!
//! A commit drains the dirty set, runs the arranger over it, and sends one
//! configure to every window whose geometry changed. The batch retires (and
//! becomes visible) once every referenced client acked, or when the deadline
//! fires. Two commits are never in flight: a commit requested while one is
//! pending runs right after it retires.

use std::time::{Duration, Instant};

use colonnade_config::Config;
use indexmap::{IndexMap, IndexSet};

use crate::arrange;
use crate::node::NodeId;
use crate::surface::{ConfigureFlags, ConfigureSerial, SurfaceRequest};
use crate::tree::{FullscreenMode, Tree};

/// How long a commit waits for client acks before force-retiring.
pub const COMMIT_TIMEOUT: Duration = Duration::from_millis(200);

#[derive(Debug)]
struct Inflight {
    /// Windows we are still waiting on, and the serial each must ack.
    waiting: IndexMap<NodeId, ConfigureSerial>,
    /// Every window this commit sent a configure to (for ref-count release).
    referenced: Vec<NodeId>,
    /// All entities in the batch, published on retire.
    batch: IndexSet<NodeId>,
    deadline: Instant,
}

/// The outcome of feeding an ack or a tick into the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Nothing retired yet.
    Pending,
    /// The in-flight batch retired (all acks, or timeout).
    Retired,
}

#[derive(Debug)]
pub struct Transactions {
    inflight: Option<Inflight>,
    /// A commit was requested while one was in flight.
    queued: bool,
    timeout: Duration,
    next_serial: u64,
    /// Window currently in an interactive resize; its configures carry the
    /// resizing hint so clients may cheapen their rendering.
    pub resizing: Option<NodeId>,
}

impl Transactions {
    pub fn new() -> Self {
        Self {
            inflight: None,
            queued: false,
            timeout: COMMIT_TIMEOUT,
            next_serial: 1,
            resizing: None,
        }
    }

    pub fn has_inflight(&self) -> bool {
        self.inflight.is_some()
    }

    fn serial(&mut self) -> ConfigureSerial {
        let serial = ConfigureSerial(self.next_serial);
        self.next_serial += 1;
        serial
    }

    /// Start a commit over the current dirty set. If a commit is already in
    /// flight the request queues and runs after retirement. Returns the
    /// retired batch when the commit completed synchronously (no client had
    /// geometry changes to ack).
    pub fn commit(
        &mut self,
        tree: &mut Tree,
        config: &Config,
        now: Instant,
        outbox: &mut Vec<SurfaceRequest>,
    ) -> Option<IndexSet<NodeId>> {
        if tree.dirty.is_empty() {
            return None;
        }
        if self.inflight.is_some() {
            self.queued = true;
            return None;
        }

        let batch = tree.dirty.drain();
        arrange::arrange_dirty(tree, config, &batch);
        // Arranging may have dirtied more nodes (titlebars, content rects);
        // fold them into this batch so the visual update stays atomic.
        let mut batch = batch;
        batch.extend(tree.dirty.drain());

        let mut waiting = IndexMap::new();
        let mut referenced = Vec::new();
        for &id in &batch {
            let Some(window) = tree.try_window(id) else {
                continue;
            };
            if window.destroying {
                continue;
            }
            if window.pending.content_rect == window.current.content_rect {
                continue;
            }
            let serial = self.serial();
            let mut flags = ConfigureFlags::empty();
            let window = tree.window_mut(id);
            if !window.is_floating() {
                flags |= ConfigureFlags::TILED;
            }
            if window.pending.fullscreen_mode != FullscreenMode::None {
                flags |= ConfigureFlags::FULLSCREEN;
            }
            if self.resizing == Some(id) {
                flags |= ConfigureFlags::RESIZING;
            }
            window.ntxnrefs += 1;
            outbox.push(SurfaceRequest::Configure {
                surface: window.surface,
                serial,
                size: window.pending.content_rect.size,
                flags,
            });
            waiting.insert(id, serial);
            referenced.push(id);
        }

        if waiting.is_empty() {
            // Nothing to wait on: publish immediately.
            let inflight = Inflight {
                waiting,
                referenced,
                batch,
                deadline: now + self.timeout,
            };
            return Some(self.retire(tree, inflight));
        }

        self.inflight = Some(Inflight {
            waiting,
            referenced,
            batch,
            deadline: now + self.timeout,
        });
        None
    }

    /// Record a configure ack from a client. Returns the retired batch once
    /// the last ack arrives.
    pub fn ack(
        &mut self,
        tree: &mut Tree,
        window: NodeId,
        serial: ConfigureSerial,
    ) -> Option<IndexSet<NodeId>> {
        let inflight = self.inflight.as_mut()?;
        match inflight.waiting.get(&window) {
            Some(&expected) if serial >= expected => {
                inflight.waiting.shift_remove(&window);
            }
            _ => return None,
        }
        if inflight.waiting.is_empty() {
            let inflight = self.inflight.take().expect("checked above");
            return Some(self.retire(tree, inflight));
        }
        None
    }

    /// Force-retire the in-flight commit if its deadline passed. Protects
    /// against unresponsive clients at the cost of briefly showing them with
    /// stale geometry.
    pub fn tick(&mut self, tree: &mut Tree, now: Instant) -> Option<IndexSet<NodeId>> {
        let inflight = self.inflight.as_ref()?;
        if now < inflight.deadline {
            return None;
        }
        let inflight = self.inflight.take().expect("checked above");
        if !inflight.waiting.is_empty() {
            warn!(
                outstanding = inflight.waiting.len(),
                "Commit deadline passed with un-acked configures, force-retiring"
            );
        }
        Some(self.retire(tree, inflight))
    }

    /// The earliest instant at which [`Transactions::tick`] will do work.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.inflight.as_ref().map(|inflight| inflight.deadline)
    }

    /// Whether a queued commit should start now that the previous retired.
    pub fn take_queued(&mut self) -> bool {
        std::mem::take(&mut self.queued)
    }

    fn retire(&mut self, tree: &mut Tree, inflight: Inflight) -> IndexSet<NodeId> {
        for &id in &inflight.batch {
            if let Some(window) = tree.try_window(id) {
                if !window.destroying {
                    let window = tree.window_mut(id);
                    window.current = window.pending;
                }
                continue;
            }
            if tree.try_column(id).is_some() {
                let column = tree.column_mut(id);
                column.current = column.pending;
                continue;
            }
            if tree.try_workspace(id).is_some() {
                let ws = tree.workspace_mut(id);
                ws.current = ws.pending;
            }
        }

        for &id in &inflight.referenced {
            if let Some(window) = tree.try_window(id) {
                let window = tree.window_mut(id);
                window.ntxnrefs = window.ntxnrefs.saturating_sub(1);
            }
        }

        inflight.batch
    }
}

impl Default for Transactions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rectangle;
    use crate::surface::SurfaceId;
    use crate::tree::{ColumnLayout, WindowParent};

    fn setup() -> (Tree, Config, NodeId) {
        let mut tree = Tree::new();
        let output = tree.add_output("X-1".into(), Rectangle::from_coords(0, 0, 800, 600));
        tree.root.outputs.push(output);
        tree.output_mut(output).enabled = true;
        let ws = tree.create_workspace("1".into(), Some(output));
        tree.output_mut(output).active_workspace = Some(ws);
        (tree, Config::default(), ws)
    }

    #[test]
    fn commit_waits_for_ack_then_publishes() {
        let (mut tree, config, ws) = setup();
        let col = tree.add_column(ws, ColumnLayout::Vertical, 0);
        let win = tree.add_window(SurfaceId::unique(), WindowParent::Column(col));

        let mut txns = Transactions::new();
        let mut outbox = Vec::new();
        let now = Instant::now();
        assert!(txns.commit(&mut tree, &config, now, &mut outbox).is_none());
        assert!(txns.has_inflight());

        let serial = match outbox.as_slice() {
            [SurfaceRequest::Configure { serial, .. }] => *serial,
            other => panic!("expected one configure, got {other:?}"),
        };
        assert_eq!(tree.window(win).ntxnrefs, 1);
        // Not yet published.
        assert_eq!(tree.window(win).current.rect, Rectangle::default());

        let batch = txns.ack(&mut tree, win, serial).expect("last ack retires");
        assert!(batch.contains(&win));
        assert_eq!(tree.window(win).ntxnrefs, 0);
        assert_ne!(tree.window(win).current.rect, Rectangle::default());
        assert_eq!(tree.window(win).current.rect, tree.window(win).pending.rect);
    }

    #[test]
    fn deadline_force_retires() {
        let (mut tree, config, ws) = setup();
        let col = tree.add_column(ws, ColumnLayout::Vertical, 0);
        let win = tree.add_window(SurfaceId::unique(), WindowParent::Column(col));

        let mut txns = Transactions::new();
        let mut outbox = Vec::new();
        let start = Instant::now();
        txns.commit(&mut tree, &config, start, &mut outbox);

        assert!(txns.tick(&mut tree, start + Duration::from_millis(100)).is_none());
        let batch = txns
            .tick(&mut tree, start + Duration::from_millis(250))
            .expect("deadline passed");
        assert!(batch.contains(&win));
        assert_eq!(tree.window(win).current.rect, tree.window(win).pending.rect);
    }

    #[test]
    fn second_commit_queues_behind_first() {
        let (mut tree, config, ws) = setup();
        let col = tree.add_column(ws, ColumnLayout::Vertical, 0);
        let _win = tree.add_window(SurfaceId::unique(), WindowParent::Column(col));

        let mut txns = Transactions::new();
        let mut outbox = Vec::new();
        let now = Instant::now();
        txns.commit(&mut tree, &config, now, &mut outbox);

        // More mutations while in flight.
        let win2 = tree.add_window(SurfaceId::unique(), WindowParent::Column(col));
        assert!(txns.commit(&mut tree, &config, now, &mut outbox).is_none());
        assert!(txns.take_queued());
        assert!(tree.dirty.contains(win2));
    }
}
