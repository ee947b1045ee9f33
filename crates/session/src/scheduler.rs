use crate::manager::SessionHandle;
use std::collections::BTreeMap;

/// A pending frame request, the equivalent of a `requestAnimationFrame` id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameToken(pub u64);

/// The host's per-display-frame callback mechanism.
///
/// The manager requests one frame at a time per session. When the display is
/// ready the host drains [`FrameScheduler::take_due`] and calls
/// `SceneLifecycleManager::frame` for each handle.
pub trait FrameScheduler {
    fn request_frame(&mut self, session: SessionHandle) -> FrameToken;

    /// Cancel a pending request. Unknown or already delivered tokens are ignored.
    fn cancel_frame(&mut self, token: FrameToken);

    /// Sessions whose requested frame is now due, in request order.
    fn take_due(&mut self) -> Vec<SessionHandle>;

    fn pending(&self) -> usize;
}

/// Bookkeeping for frame requests. Every request is due on the next
/// [`FrameScheduler::take_due`].
#[derive(Debug, Default)]
pub struct FrameQueue {
    pending: BTreeMap<FrameToken, SessionHandle>,
    next_token: u64,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending_for(&self, session: SessionHandle) -> bool {
        self.pending.values().any(|s| *s == session)
    }
}

impl FrameScheduler for FrameQueue {
    fn request_frame(&mut self, session: SessionHandle) -> FrameToken {
        let token = FrameToken(self.next_token);
        self.next_token += 1;
        self.pending.insert(token, session);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        self.pending.remove(&token);
    }

    fn take_due(&mut self) -> Vec<SessionHandle> {
        std::mem::take(&mut self.pending).into_values().collect()
    }

    fn pending(&self) -> usize {
        self.pending.len()
    }
}
