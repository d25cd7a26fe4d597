//! Inter-process communication types for `colonnade`
//!
//! This crate holds the serde representation of everything that crosses the
//! engine boundary towards IPC clients: the semantic [`Event`] stream the
//! engine emits after each committed transaction, and the [`CmdResult`]
//! returned for every dispatched command.
//!
//! The engine itself does not own a socket. An embedding compositor forwards
//! [`Event`]s to its subscribers and routes command strings back, typically as
//! JSON via [`serde_json`].

use serde::{Deserialize, Serialize};

/// The result of dispatching one command.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CmdResult {
    /// The command ran and mutated (or deliberately did not mutate) the tree.
    Success,
    /// The command's argv does not parse. The tree was not touched.
    Invalid(String),
    /// The command parsed but could not apply in the current context.
    Failure(String),
    /// The command is valid but not yet applicable (e.g. no outputs exist).
    Defer,
}

impl CmdResult {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    pub fn failure(msg: impl Into<String>) -> Self {
        Self::Failure(msg.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// What changed about a workspace.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum WorkspaceChange {
    Init,
    Empty,
    Focus,
    Move,
    Urgent,
    Rename,
    Reload,
}

/// What changed about a window.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum WindowChange {
    New,
    Close,
    Focus,
    FullscreenMode,
    Move,
    Floating,
    Urgent,
    Mark,
    Title,
}

/// What changed about an input device.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum InputChange {
    Added,
    Removed,
    XkbKeymap,
    XkbLayout,
    LibinputConfig,
}

/// A semantic event, emitted once per change after each committed transaction.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum Event {
    Workspace {
        change: WorkspaceChange,
        /// Node id of the workspace.
        id: u64,
        name: String,
        /// For `focus`: the previously focused workspace. For `rename`: the
        /// workspace's old name.
        #[serde(skip_serializing_if = "Option::is_none")]
        old: Option<String>,
    },
    Window {
        change: WindowChange,
        /// Node id of the window.
        id: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    Mode {
        name: String,
    },
    BarconfigUpdate {
        bar_id: String,
    },
    Shutdown,
    Binding {
        command: String,
    },
    Input {
        change: InputChange,
        device: String,
    },
}
