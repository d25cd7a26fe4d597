//! Input-side components: hit-testing and the interactive pointer ops.
//!
//! The embedder translates its native input streams (pointer, touch, tablet
//! tool) into the generic calls on [`Engine`](crate::Engine):
//! `pointer_motion`, `pointer_button`, and the grab entry points. Everything
//! here consumes layout coordinates.

pub mod move_grab;
pub mod resize_grab;
pub mod target;

pub use move_grab::{DropNode, DropTarget, MoveGrab};
pub use resize_grab::{ResizeEdge, ResizeGrab};
pub use target::{target_at, HitTarget};
