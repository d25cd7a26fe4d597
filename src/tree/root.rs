//! The root of the tree: output layout bookkeeping, drag icons, the global
//! fullscreen pointer, and the pid→workspace spawn registry.

use std::time::{Duration, Instant};

use crate::geometry::Rectangle;
use crate::node::NodeId;
use crate::surface::SurfaceId;

#[derive(Debug)]
pub struct Root {
    /// Bounding box of every enabled output, in layout coordinates.
    pub rect: Rectangle,
    /// Enabled outputs, in plug order.
    pub outputs: Vec<NodeId>,
    /// Invisible headless output owning workspaces while no real output can.
    pub fallback_output: NodeId,
    /// Drag-icon surfaces, rendered above everything.
    pub drag_icons: Vec<SurfaceId>,
    /// At most one global-fullscreen window process-wide.
    pub fullscreen_global: Option<NodeId>,

    pub pid_workspaces: PidWorkspaces,
}

impl Root {
    pub fn new(fallback_output: NodeId) -> Self {
        Self {
            rect: Rectangle::default(),
            outputs: Vec::new(),
            fallback_output,
            drag_icons: Vec::new(),
            fullscreen_global: None,
            pid_workspaces: PidWorkspaces::default(),
        }
    }
}

/// How long a pid→workspace association stays alive.
const PID_WORKSPACE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct PidWorkspace {
    pid: u32,
    workspace: String,
    output: Option<NodeId>,
    added: Instant,
}

/// Process-lifetime registry associating launcher pids with the workspace
/// they were spawned from, so a newly-mapped window lands where the user
/// started its program. Entries expire after 60 seconds.
#[derive(Debug, Default)]
pub struct PidWorkspaces {
    entries: Vec<PidWorkspace>,
}

impl PidWorkspaces {
    pub fn record(&mut self, pid: u32, workspace: &str, output: Option<NodeId>, now: Instant) {
        self.expire(now);
        debug!(pid, workspace, "Recording workspace for process");
        self.entries.push(PidWorkspace {
            pid,
            workspace: workspace.to_owned(),
            output,
            added: now,
        });
    }

    pub fn remove(&mut self, pid: u32) {
        self.entries.retain(|entry| entry.pid != pid);
    }

    pub fn rename(&mut self, old_name: &str, new_name: &str) {
        for entry in &mut self.entries {
            if entry.workspace == old_name {
                entry.workspace = new_name.to_owned();
            }
        }
    }

    /// Find the workspace recorded for `pid` or any of its ancestors, walking
    /// up through `parent_of`. A hit consumes the entry.
    pub fn take(
        &mut self,
        mut pid: u32,
        now: Instant,
        parent_of: impl Fn(u32) -> Option<u32>,
    ) -> Option<(String, Option<NodeId>)> {
        self.expire(now);
        loop {
            if let Some(idx) = self.entries.iter().position(|entry| entry.pid == pid) {
                let entry = self.entries.remove(idx);
                debug!(pid, workspace = entry.workspace, "Found workspace for pid");
                return Some((entry.workspace, entry.output));
            }
            match parent_of(pid) {
                Some(parent) if parent > 1 && parent != pid => pid = parent,
                _ => return None,
            }
        }
    }

    fn expire(&mut self, now: Instant) {
        self.entries
            .retain(|entry| now.duration_since(entry.added) < PID_WORKSPACE_TIMEOUT);
    }
}

/// Parent pid of `pid` via procfs, for production use as the `parent_of`
/// argument of [`PidWorkspaces::take`].
pub fn proc_parent_pid(pid: u32) -> Option<u32> {
    let stat = std::fs::read_to_string(format!("/proc/{pid}/stat")).ok()?;
    // Field 4, after the parenthesized (and possibly space-containing) comm.
    let rest = stat.rsplit_once(')')?.1;
    rest.split_whitespace().nth(1)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_parents_and_consumes() {
        let now = Instant::now();
        let mut registry = PidWorkspaces::default();
        registry.record(100, "mail", None, now);

        // 300 -> 200 -> 100
        let parent_of = |pid: u32| match pid {
            300 => Some(200),
            200 => Some(100),
            _ => None,
        };

        let (name, _) = registry.take(300, now, parent_of).unwrap();
        assert_eq!(name, "mail");
        assert!(registry.take(300, now, parent_of).is_none());
    }

    #[test]
    fn entries_expire() {
        let start = Instant::now();
        let mut registry = PidWorkspaces::default();
        registry.record(42, "web", None, start);

        let later = start + Duration::from_secs(61);
        assert!(registry.take(42, later, |_| None).is_none());
    }

    #[test]
    fn rename_updates_entries() {
        let now = Instant::now();
        let mut registry = PidWorkspaces::default();
        registry.record(7, "old", None, now);
        registry.rename("old", "new");
        let (name, _) = registry.take(7, now, |_| None).unwrap();
        assert_eq!(name, "new");
    }
}
