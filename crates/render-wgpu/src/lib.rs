//! wgpu render backend for background scenes.
//!
//! Draws point clouds as camera-facing sprites and meshes and grids as line
//! lists, onto a single window surface.
//!
//! # Invariants
//! - The backend never mutates the scene it draws.
//! - At most one logical surface is live at a time.

mod backend;
mod mesh;
mod shaders;

pub use backend::WgpuBackend;
