//! Core window-management engine for a column-based tiling compositor.
//!
//! The engine owns a tree of outputs, workspaces, columns and windows,
//! accepts tokenized commands from an external parser, arranges geometry,
//! resolves input targets, and publishes render snapshots. It speaks to the
//! embedding compositor exclusively through message-passing seams: configure
//! requests flow out of an outbox, acks and input events flow back in, and
//! semantic events leave through an opaque sink.
//!
//! ```no_run
//! use std::time::Instant;
//! use colonnade::{Engine, Rectangle, SurfaceId};
//!
//! let mut engine = Engine::new(colonnade_config::Config::default());
//! let output = engine.add_output("DP-1", Rectangle::from_coords(0, 0, 1920, 1080));
//! engine.enable_output(output);
//!
//! let window = engine.map_window(SurfaceId::unique(), None, Instant::now());
//! engine.commit(Instant::now());
//! for request in engine.take_requests() {
//!     // forward configures to the client, feed acks back in
//! }
//! # let _ = window;
//! ```

#[macro_use]
extern crate tracing;

pub mod arrange;
pub mod commands;
pub mod engine;
pub mod event;
pub mod geometry;
pub mod input;
pub mod node;
pub mod render;
pub mod seat;
pub mod surface;
pub mod transaction;
pub mod tree;

pub use colonnade_ipc::{CmdResult, Event};
pub use engine::Engine;
pub use geometry::{Point, Rectangle, Size};
pub use input::{HitTarget, ResizeEdge};
pub use node::{NodeId, NodeKind};
pub use render::{Snapshot, WorkItem};
pub use surface::{ConfigureFlags, ConfigureSerial, SurfaceId, SurfaceRequest};
pub use tree::{ColumnLayout, Direction, FullscreenMode, Layer, Tree};
