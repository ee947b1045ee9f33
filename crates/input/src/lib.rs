//! Input bridge: pointer and viewport state shared with the frame loop.
//!
//! # Invariants
//! - Handlers only store the latest value; nothing is queued.
//! - Every listener added through [`InputBridge::attach`] is removed by the
//!   returned [`Subscription`].

pub mod bridge;
pub mod event;
pub mod hub;

pub use bridge::{InputBridge, PointerState, Subscription, ViewportState, MAX_PIXEL_RATIO};
pub use event::{EventKind, InputEvent};
pub use hub::{EventHub, ListenerId};
