//! Shared types for the backdrop workspace.

mod types;

pub use types::{Color, NodeId, ResourceId, SessionId, SurfaceId, Transform};
