//! The seam towards surface primitives.
//!
//! The engine never talks to clients directly. Commits produce
//! [`ConfigureRequest`]s in an outbox the embedder drains and forwards to the
//! backing protocol objects; acknowledgements flow back through
//! `Engine::ack_configure`. Everything the engine needs to know about a
//! surface tree (popup geometry, subsurface extents) is registered on the
//! owning entity by the embedder.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::geometry::{Rectangle, Size};

static SURFACE_IDS: AtomicU64 = AtomicU64::new(1);

/// Opaque handle to a client surface.
#[derive(Clone, Copy, Hash, PartialEq, Eq)]
pub struct SurfaceId(u64);

impl SurfaceId {
    pub fn unique() -> Self {
        Self(SURFACE_IDS.fetch_add(1, Ordering::SeqCst))
    }
}

impl std::fmt::Debug for SurfaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "surface-{}", self.0)
    }
}

/// Serial attached to one configure, echoed back by the client's ack.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ConfigureSerial(pub u64);

bitflags::bitflags! {
    /// State bits sent alongside a configure.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ConfigureFlags: u32 {
        const ACTIVATED  = 1;
        const RESIZING   = 2;
        const FULLSCREEN = 4;
        const TILED      = 8;
    }
}

/// One pending request towards a client, produced at commit time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceRequest {
    Configure {
        surface: SurfaceId,
        serial: ConfigureSerial,
        size: Size,
        flags: ConfigureFlags,
    },
    /// Ask the client to close its toplevel (`kill` command).
    Close { surface: SurfaceId },
}

/// A popup (or equivalent child surface) of a window or layer surface,
/// registered by the embedder. `rect` is in layout coordinates and may escape
/// the parent's clipping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Popup {
    pub surface: SurfaceId,
    pub rect: Rectangle,
}

/// Texture captured right before a surface unmaps, kept on the window so the
/// renderer can play a close animation from the snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedBuffer {
    pub texture: u64,
    pub rect: Rectangle,
}
