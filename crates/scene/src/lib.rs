//! Scene graph: drawable nodes and the camera that views them.
//!
//! # Invariants
//! - Nodes reference GPU resources only by handle; the scene never owns them.
//! - Node iteration order is insertion order (sequential `NodeId`s in a BTreeMap).

pub mod camera;
pub mod graph;

pub use camera::PerspectiveCamera;
pub use graph::{Drawable, DrawableCounts, Scene, SceneNode};
