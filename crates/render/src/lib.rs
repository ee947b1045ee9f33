//! Rendering adapter: renderer-agnostic backend interface.
//!
//! # Invariants
//! - Backends never mutate the scene; render state derives from scene + camera.
//! - Every resource handed out by [`ResourceAllocator::allocate`] stays live until
//!   [`RenderBackend::release`] is called for it.
//!
//! The [`HeadlessBackend`] keeps resources in memory and counts everything it
//! does. Swap in a GPU implementation without changing consumers.

mod backend;
mod headless;

pub use backend::{
    GeometryDesc, MaterialDesc, RenderBackend, RenderError, ResourceAllocator, ResourceDesc,
    ResourceKind, SurfaceSize,
};
pub use headless::{FrameRecord, HeadlessBackend};
