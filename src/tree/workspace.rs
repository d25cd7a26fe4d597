//! A workspace: a named virtual desktop holding columns and floating windows.

use colonnade_config::SideGaps;

use crate::geometry::Rectangle;
use crate::node::NodeId;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WorkspaceState {
    /// Tiling area: the owning output's usable area minus gaps.
    pub rect: Rectangle,
}

#[derive(Debug)]
pub struct Workspace {
    id: NodeId,
    /// Unique process-wide.
    pub name: String,
    /// The owning output. `None` only transiently, while the workspace is
    /// being moved between outputs.
    pub output: Option<NodeId>,

    /// Tiling children, left-to-right.
    pub columns: Vec<NodeId>,
    /// Floating windows in z-order, back-to-front.
    pub floating: Vec<NodeId>,
    /// The workspace-fullscreen window, if any.
    pub fullscreen: Option<NodeId>,

    /// Column the last tiling focus was in; new windows land at its end.
    pub active_column: Option<NodeId>,

    pub gaps_inner: i32,
    pub gaps_outer: SideGaps,

    /// Output names this workspace prefers, most-preferred first. Updated
    /// whenever the workspace is deliberately placed on an output.
    pub output_priority: Vec<String>,

    pub urgent: bool,

    /// Pixel width available to columns at the last arrangement, used to snap
    /// fractions before a resize.
    pub child_total_width: f64,

    pub pending: WorkspaceState,
    pub current: WorkspaceState,

    pub destroying: bool,
}

impl Workspace {
    pub fn new(name: String, output: Option<NodeId>) -> Self {
        Self {
            id: NodeId::unique(),
            name,
            output,
            columns: Vec::new(),
            floating: Vec::new(),
            fullscreen: None,
            active_column: None,
            gaps_inner: 0,
            gaps_outer: SideGaps::default(),
            output_priority: Vec::new(),
            urgent: false,
            child_total_width: 0.0,
            pending: WorkspaceState::default(),
            current: WorkspaceState::default(),
            destroying: false,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.floating.is_empty()
    }

    pub fn column_index(&self, column: NodeId) -> Option<usize> {
        self.columns.iter().position(|&c| c == column)
    }

    /// Record that this workspace was deliberately placed on `output_name`,
    /// promoting it to the front of the priority list.
    pub fn raise_output_priority(&mut self, output_name: &str) {
        self.output_priority.retain(|name| name != output_name);
        self.output_priority.insert(0, output_name.to_owned());
    }

    /// Numeric prefix of the workspace name, for `workspace number N` and for
    /// sorted insertion (numeric names first, ascending).
    pub fn number(&self) -> Option<i32> {
        parse_workspace_number(&self.name)
    }
}

pub fn parse_workspace_number(name: &str) -> Option<i32> {
    let digits: &str = name
        .split_once(|c: char| !c.is_ascii_digit())
        .map_or(name, |(head, _)| head);
    if digits.is_empty() || !name.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Ordering for workspace lists: numeric names first ascending, then the rest
/// lexicographically.
pub fn workspace_name_order(a: &str, b: &str) -> std::cmp::Ordering {
    match (parse_workspace_number(a), parse_workspace_number(b)) {
        (Some(na), Some(nb)) => na.cmp(&nb).then_with(|| a.cmp(b)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_numbers() {
        assert_eq!(parse_workspace_number("3"), Some(3));
        assert_eq!(parse_workspace_number("10:web"), Some(10));
        assert_eq!(parse_workspace_number("web"), None);
        assert_eq!(parse_workspace_number(""), None);
    }

    #[test]
    fn name_ordering_puts_numbers_first() {
        let mut names = vec!["web", "2", "10", "1:mail", "chat"];
        names.sort_by(|a, b| workspace_name_order(a, b));
        assert_eq!(names, vec!["1:mail", "2", "10", "chat", "web"]);
    }
}
