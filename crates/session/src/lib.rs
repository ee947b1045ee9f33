//! Scene lifecycle: one render session per mounted view.
//!
//! # Invariants
//! - A session's frame never runs after `stop` returns for it.
//! - At most one frame request is pending per session.
//! - Every surface attached to a container by `start` is detached by `stop`.
//! - Every resource allocated while building a session's content is released
//!   by `stop`, best effort.
//! - A container hosts at most one live session.

pub mod container;
pub mod manager;
pub mod scheduler;
pub mod section;

pub use container::{Container, ContainerHandle, MountPoint};
pub use manager::{RenderSession, SceneLifecycleManager, SessionError, SessionHandle};
pub use scheduler::{FrameQueue, FrameScheduler, FrameToken};
pub use section::{Section, SectionHost};
