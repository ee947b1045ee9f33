use crate::container::ContainerHandle;
use crate::scheduler::{FrameScheduler, FrameToken};
use backdrop_common::{ResourceId, SessionId, SurfaceId};
use backdrop_content::{ContentError, ContentSpec, FrameInput, SceneContent};
use backdrop_input::{EventHub, InputBridge, PointerState, Subscription, ViewportState};
use backdrop_render::{RenderBackend, RenderError, ResourceAllocator, ResourceDesc, SurfaceSize};
use backdrop_scene::{PerspectiveCamera, Scene};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Instant;

/// Errors from starting a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("container already hosts session {0:?}")]
    AlreadyMounted(SessionHandle),
    #[error("render error: {0}")]
    Render(#[from] RenderError),
    #[error("content error: {0}")]
    Content(#[from] ContentError),
}

/// Opaque handle returned by [`SceneLifecycleManager::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionHandle(pub SessionId);

/// Records every allocation a content builder makes so the session can
/// release them all on stop.
struct TrackingAllocator<'a, B: RenderBackend> {
    backend: &'a mut B,
    allocated: Vec<ResourceId>,
}

impl<B: RenderBackend> ResourceAllocator for TrackingAllocator<'_, B> {
    fn allocate(&mut self, desc: ResourceDesc) -> Result<ResourceId, RenderError> {
        let id = self.backend.allocate(desc)?;
        self.allocated.push(id);
        Ok(id)
    }
}

/// Release resources best effort: a failure is logged and the rest are
/// still released. Returns how many failed.
fn release_all<B: RenderBackend>(backend: &mut B, resources: &[ResourceId]) -> usize {
    let mut failed = 0;
    for &id in resources {
        if let Err(e) = backend.release(id) {
            tracing::warn!("failed to release {id:?}: {e}");
            failed += 1;
        }
    }
    failed
}

/// All mutable state of one mounted scene view.
pub struct RenderSession {
    handle: SessionHandle,
    container: ContainerHandle,
    surface: SurfaceId,
    surface_size: SurfaceSize,
    camera: PerspectiveCamera,
    scene: Scene,
    content: Box<dyn SceneContent>,
    input: InputBridge,
    subscription: Option<Subscription>,
    resources: Vec<ResourceId>,
    pending_frame: Option<FrameToken>,
    started_at: Instant,
    frames: u64,
}

impl std::fmt::Debug for RenderSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderSession")
            .field("handle", &self.handle)
            .field("content", &self.content.name())
            .field("surface", &self.surface)
            .field("nodes", &self.scene.len())
            .field("resources", &self.resources.len())
            .field("frames", &self.frames)
            .finish()
    }
}

impl RenderSession {
    pub fn handle(&self) -> SessionHandle {
        self.handle
    }

    pub fn content_name(&self) -> &'static str {
        self.content.name()
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    /// Surface size in physical pixels as last applied.
    pub fn surface_size(&self) -> SurfaceSize {
        self.surface_size
    }

    pub fn pointer(&self) -> PointerState {
        self.input.pointer()
    }

    pub fn viewport(&self) -> ViewportState {
        self.input.viewport()
    }

    /// Resources owned by this session.
    pub fn resources(&self) -> &[ResourceId] {
        &self.resources
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn has_pending_frame(&self) -> bool {
        self.pending_frame.is_some()
    }

    /// Apply a resize that arrived since the last frame. On failure the
    /// camera keeps its old aspect and the resize is retried next frame.
    fn apply_resize<B: RenderBackend>(&mut self, backend: &mut B) {
        let Some(viewport) = self.input.take_resize() else {
            return;
        };
        let (width, height) = viewport.pixel_size();
        let size = SurfaceSize::new(width, height);
        if size.is_empty() {
            tracing::debug!(session = %self.handle.0.short(), "viewport collapsed, keeping surface");
            return;
        }
        if let Err(e) = backend.resize_surface(self.surface, size) {
            tracing::warn!(session = %self.handle.0.short(), "resize failed: {e}");
            self.input.defer_resize();
            return;
        }
        self.surface_size = size;
        self.camera.set_viewport(viewport.width, viewport.height);
        tracing::debug!(
            session = %self.handle.0.short(),
            width,
            height,
            aspect = self.camera.aspect,
            "session resized"
        );
    }
}

/// Owns creation, per-frame update, input binding and disposal of render
/// sessions.
///
/// Single-threaded. The host drives frames by draining the scheduler
/// ([`SceneLifecycleManager::run_due_frames`]) once per display refresh and
/// feeds window events into the shared [`EventHub`].
pub struct SceneLifecycleManager<B: RenderBackend, S: FrameScheduler> {
    backend: B,
    scheduler: S,
    events: Rc<RefCell<EventHub>>,
    sessions: BTreeMap<SessionHandle, RenderSession>,
}

impl<B: RenderBackend, S: FrameScheduler> SceneLifecycleManager<B, S> {
    pub fn new(backend: B, scheduler: S, events: Rc<RefCell<EventHub>>) -> Self {
        Self {
            backend,
            scheduler,
            events,
            sessions: BTreeMap::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn events(&self) -> &Rc<RefCell<EventHub>> {
        &self.events
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_running(&self, handle: SessionHandle) -> bool {
        self.sessions.contains_key(&handle)
    }

    pub fn session(&self, handle: SessionHandle) -> Option<&RenderSession> {
        self.sessions.get(&handle)
    }

    /// The live session mounted in `container`, if any.
    pub fn mounted_in(&self, container: &ContainerHandle) -> Option<SessionHandle> {
        self.sessions
            .values()
            .find(|s| std::ptr::addr_eq(Rc::as_ptr(&s.container), Rc::as_ptr(container)))
            .map(|s| s.handle)
    }

    /// Mount a scene into `container` and schedule its first frame.
    ///
    /// On failure nothing stays behind: the surface is detached and destroyed
    /// and resources already allocated are released.
    pub fn start(
        &mut self,
        container: ContainerHandle,
        content: &ContentSpec,
        viewport: ViewportState,
        now: Instant,
    ) -> Result<SessionHandle, SessionError> {
        if let Some(existing) = self.mounted_in(&container) {
            return Err(SessionError::AlreadyMounted(existing));
        }

        let (width, height) = viewport.pixel_size();
        let surface_size = SurfaceSize::new(width, height);
        let surface = self.backend.create_surface(surface_size)?;
        container.borrow_mut().attach_surface(surface);

        let mut camera = PerspectiveCamera::with_viewport(viewport.width, viewport.height);
        let mut scene = Scene::new();

        let mut tracker = TrackingAllocator {
            backend: &mut self.backend,
            allocated: Vec::new(),
        };
        let built = content.build(&mut scene, &mut camera, &mut tracker);
        let resources = tracker.allocated;
        let content = match built {
            Ok(content) => content,
            Err(e) => {
                release_all(&mut self.backend, &resources);
                container.borrow_mut().detach_surface(surface);
                if let Err(destroy) = self.backend.destroy_surface(surface) {
                    tracing::warn!("failed to destroy surface after failed start: {destroy}");
                }
                return Err(e.into());
            }
        };

        let untracked = scene
            .referenced_resources()
            .into_iter()
            .filter(|id| !resources.contains(id))
            .count();
        if untracked > 0 {
            tracing::warn!(untracked, "scene references resources it did not allocate");
        }

        let input = InputBridge::new(viewport);
        let subscription = input.attach(&mut self.events.borrow_mut());

        let handle = SessionHandle(SessionId::new());
        let pending_frame = Some(self.scheduler.request_frame(handle));

        tracing::info!(
            session = %handle.0.short(),
            content = content.name(),
            backend = self.backend.name(),
            width,
            height,
            resources = resources.len(),
            "session started"
        );

        self.sessions.insert(
            handle,
            RenderSession {
                handle,
                container,
                surface,
                surface_size,
                camera,
                scene,
                content,
                input,
                subscription: Some(subscription),
                resources,
                pending_frame,
                started_at: now,
                frames: 0,
            },
        );
        Ok(handle)
    }

    /// Run one frame of a session. Returns false, doing nothing, for a handle
    /// that is not running.
    pub fn frame(&mut self, handle: SessionHandle, now: Instant) -> bool {
        let Some(session) = self.sessions.get_mut(&handle) else {
            return false;
        };
        if let Some(token) = session.pending_frame.take() {
            self.scheduler.cancel_frame(token);
        }

        session.apply_resize(&mut self.backend);

        let input = FrameInput {
            elapsed: now.saturating_duration_since(session.started_at).as_secs_f32(),
            pointer: session.input.pointer(),
            viewport: session.input.viewport(),
        };
        session
            .content
            .update(&input, &mut session.scene, &mut session.camera);

        if let Err(e) = self
            .backend
            .render(session.surface, &session.scene, &session.camera)
        {
            tracing::warn!(session = %handle.0.short(), "frame render failed: {e}");
        }
        session.frames += 1;
        session.pending_frame = Some(self.scheduler.request_frame(handle));
        true
    }

    /// Run every frame the scheduler reports as due. Returns how many ran.
    pub fn run_due_frames(&mut self, now: Instant) -> usize {
        let due = self.scheduler.take_due();
        due.into_iter().filter(|h| self.frame(*h, now)).count()
    }

    /// Tear a session down. Idempotent: unknown or stopped handles are a
    /// no-op and return false.
    pub fn stop(&mut self, handle: SessionHandle) -> bool {
        let Some(mut session) = self.sessions.remove(&handle) else {
            tracing::debug!(session = %handle.0.short(), "stop on inactive session ignored");
            return false;
        };

        if let Some(token) = session.pending_frame.take() {
            self.scheduler.cancel_frame(token);
        }
        if let Some(subscription) = session.subscription.take() {
            subscription.unsubscribe(&mut self.events.borrow_mut());
        }
        if !session.container.borrow_mut().detach_surface(session.surface) {
            tracing::warn!(session = %handle.0.short(), "surface was not attached to its container");
        }
        if let Err(e) = self.backend.destroy_surface(session.surface) {
            tracing::warn!(session = %handle.0.short(), "failed to destroy surface: {e}");
        }

        session.scene.clear();
        let failed = release_all(&mut self.backend, &session.resources);
        tracing::info!(
            session = %handle.0.short(),
            frames = session.frames,
            released = session.resources.len() - failed,
            failed,
            "session stopped"
        );
        true
    }

    /// Stop every running session.
    pub fn shutdown(&mut self) {
        let handles: Vec<_> = self.sessions.keys().copied().collect();
        for handle in handles {
            self.stop(handle);
        }
    }
}

impl<B: RenderBackend, S: FrameScheduler> Drop for SceneLifecycleManager<B, S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{Container, MountPoint};
    use crate::scheduler::FrameQueue;
    use backdrop_content::{CubeFieldConfig, ParticleFieldConfig};
    use backdrop_input::{EventKind, InputEvent};
    use backdrop_render::HeadlessBackend;
    use std::time::Duration;

    type Manager = SceneLifecycleManager<HeadlessBackend, FrameQueue>;

    fn manager() -> Manager {
        manager_with(HeadlessBackend::new())
    }

    fn manager_with(backend: HeadlessBackend) -> Manager {
        SceneLifecycleManager::new(backend, FrameQueue::new(), Rc::new(RefCell::new(EventHub::new())))
    }

    fn particles() -> ContentSpec {
        ContentSpec::Particles(ParticleFieldConfig {
            seed: Some(11),
            ..ParticleFieldConfig::default()
        })
    }

    fn cubes() -> ContentSpec {
        ContentSpec::Cubes(CubeFieldConfig {
            seed: Some(12),
            ..CubeFieldConfig::default()
        })
    }

    fn hd() -> ViewportState {
        ViewportState::new(1920.0, 1080.0, 1.0)
    }

    #[test]
    fn start_allocates_and_schedules() {
        let mut m = manager();
        let mount = MountPoint::shared();
        let now = Instant::now();
        let handle = m.start(mount.clone(), &particles(), hd(), now).unwrap();

        assert!(m.is_running(handle));
        assert_eq!(mount.borrow().surface_count(), 1);
        assert_eq!(m.backend().surface_count(), 1);
        assert_eq!(m.backend().live_resources(), 2);
        assert_eq!(m.events().borrow().listener_count(), 2);
        assert_eq!(m.scheduler().pending(), 1);

        let session = m.session(handle).unwrap();
        assert_eq!(session.content_name(), "particle-field");
        assert_eq!(session.scene().counts().points, 3000);
        assert!((session.camera().aspect - 1920.0 / 1080.0).abs() < f32::EPSILON);
        assert_eq!(session.surface_size(), SurfaceSize::new(1920, 1080));
    }

    #[test]
    fn drawable_counts_ignore_viewport() {
        let mut m = manager();
        for viewport in [
            ViewportState::new(320.0, 240.0, 3.0),
            hd(),
            ViewportState::new(3840.0, 2160.0, 1.5),
        ] {
            let mount = MountPoint::shared();
            let handle = m.start(mount.clone(), &particles(), viewport, Instant::now()).unwrap();
            assert_eq!(m.session(handle).unwrap().scene().counts().points, 3000);
            m.stop(handle);

            let handle = m.start(mount, &cubes(), viewport, Instant::now()).unwrap();
            assert_eq!(m.session(handle).unwrap().scene().counts().meshes, 50);
            m.stop(handle);
        }
        assert_eq!(m.backend().live_resources(), 0);
    }

    #[test]
    fn frame_renders_and_reschedules_once() {
        let mut m = manager();
        let now = Instant::now();
        let handle = m.start(MountPoint::shared(), &cubes(), hd(), now).unwrap();

        assert_eq!(m.run_due_frames(now + Duration::from_millis(16)), 1);
        assert_eq!(m.backend().frames_rendered(), 1);
        assert_eq!(m.scheduler().pending(), 1);

        // A direct call replaces the pending request instead of adding one.
        assert!(m.frame(handle, now + Duration::from_millis(20)));
        assert_eq!(m.scheduler().pending(), 1);
        assert_eq!(m.session(handle).unwrap().frames(), 2);
        assert_eq!(m.backend().last_frame().unwrap().draw_calls, 51);
    }

    #[test]
    fn stop_releases_everything() {
        let mut m = manager();
        let mount = MountPoint::shared();
        let handle = m.start(mount.clone(), &cubes(), hd(), Instant::now()).unwrap();
        m.run_due_frames(Instant::now());

        assert!(m.stop(handle));
        assert!(!m.is_running(handle));
        assert_eq!(m.backend().live_resources(), 0);
        assert_eq!(m.backend().surface_count(), 0);
        assert_eq!(m.events().borrow().listener_count(), 0);
        assert_eq!(m.scheduler().pending(), 0);
        assert_eq!(mount.borrow().surface_count(), 0);
    }

    #[test]
    fn stop_is_idempotent_and_safe_before_start() {
        let mut m = manager();
        let never_started = SessionHandle(SessionId::new());
        assert!(!m.stop(never_started));

        let handle = m
            .start(MountPoint::shared(), &particles(), hd(), Instant::now())
            .unwrap();
        assert!(m.stop(handle));
        assert!(!m.stop(handle));
        assert_eq!(m.backend().releases(), 2);
    }

    #[test]
    fn no_frame_runs_after_stop() {
        let mut m = manager();
        let now = Instant::now();
        let handle = m.start(MountPoint::shared(), &particles(), hd(), now).unwrap();
        m.stop(handle);

        assert!(!m.frame(handle, now));
        assert_eq!(m.run_due_frames(now), 0);
        assert_eq!(m.backend().frames_rendered(), 0);
    }

    #[test]
    fn repeated_mount_unmount_balances_surfaces() {
        let mut m = manager();
        let mount = MountPoint::shared();
        for i in 0..25 {
            let spec = if i % 2 == 0 { particles() } else { cubes() };
            let handle = m.start(mount.clone(), &spec, hd(), Instant::now()).unwrap();
            m.run_due_frames(Instant::now());
            m.stop(handle);
        }
        let mount = mount.borrow();
        assert_eq!(mount.inserted(), 25);
        assert_eq!(mount.removed(), 25);
        assert_eq!(mount.surface_count(), 0);
        assert_eq!(m.backend().live_resources(), 0);
        assert_eq!(m.backend().allocations(), m.backend().releases());
        assert_eq!(m.events().borrow().listener_count(), 0);
    }

    #[test]
    fn double_mount_is_rejected() {
        let mut m = manager();
        let mount = MountPoint::shared();
        let first = m.start(mount.clone(), &particles(), hd(), Instant::now()).unwrap();

        let err = m
            .start(mount.clone(), &cubes(), hd(), Instant::now())
            .unwrap_err();
        assert!(matches!(err, SessionError::AlreadyMounted(h) if h == first));
        assert_eq!(m.active_sessions(), 1);
        assert_eq!(m.events().borrow().listener_count(), 2);
        assert_eq!(mount.borrow().surface_count(), 1);

        // A different container may host its own session.
        let other = MountPoint::shared();
        assert!(m.start(other, &cubes(), hd(), Instant::now()).is_ok());
        assert_eq!(m.active_sessions(), 2);
    }

    #[test]
    fn missing_context_fails_fast_without_side_effects() {
        let mut m = manager_with(HeadlessBackend::without_context());
        let mount = MountPoint::shared();
        let err = m
            .start(mount.clone(), &particles(), hd(), Instant::now())
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Render(RenderError::NoCompatibleContext(_))
        ));
        assert_eq!(mount.borrow().inserted(), 0);
        assert_eq!(m.events().borrow().listener_count(), 0);
        assert_eq!(m.scheduler().pending(), 0);
        assert_eq!(m.active_sessions(), 0);
    }

    #[test]
    fn failed_build_rolls_back() {
        let mut m = manager();
        let mount = MountPoint::shared();
        let bad = ContentSpec::Cubes(CubeFieldConfig {
            smoothing: 0.0,
            ..CubeFieldConfig::default()
        });
        assert!(matches!(
            m.start(mount.clone(), &bad, hd(), Instant::now()),
            Err(SessionError::Content(_))
        ));
        assert_eq!(mount.borrow().surface_count(), 0);
        assert_eq!(mount.borrow().inserted(), mount.borrow().removed());
        assert_eq!(m.backend().surface_count(), 0);
        assert_eq!(m.backend().live_resources(), 0);
    }

    #[test]
    fn resize_updates_aspect_and_surface_on_next_frame() {
        let mut m = manager();
        let now = Instant::now();
        let handle = m.start(MountPoint::shared(), &particles(), hd(), now).unwrap();

        let next = ViewportState::new(1000.0, 800.0, 3.0);
        m.events().borrow_mut().dispatch(&InputEvent::Resized(next));
        m.frame(handle, now);

        let session = m.session(handle).unwrap();
        assert_eq!(session.camera().aspect, 1000.0 / 800.0);
        assert_eq!(session.surface_size(), SurfaceSize::new(2000, 1600));
        assert_eq!(
            m.backend().surface_size(session.surface()),
            Some(SurfaceSize::new(2000, 1600))
        );
    }

    #[test]
    fn failed_resize_keeps_camera_and_retries() {
        let mut m = manager();
        let now = Instant::now();
        let handle = m.start(MountPoint::shared(), &particles(), hd(), now).unwrap();
        let before = m.session(handle).unwrap().camera().aspect;

        m.backend_mut().set_fail_resize(true);
        m.events()
            .borrow_mut()
            .dispatch(&InputEvent::Resized(ViewportState::new(500.0, 500.0, 1.0)));
        assert!(m.frame(handle, now));
        assert_eq!(m.session(handle).unwrap().camera().aspect, before);
        assert_eq!(m.backend().frames_rendered(), 1);

        m.backend_mut().set_fail_resize(false);
        m.frame(handle, now);
        assert_eq!(m.session(handle).unwrap().camera().aspect, 1.0);
    }

    #[test]
    fn release_failure_does_not_stop_cleanup() {
        let mut m = manager();
        let handle = m
            .start(MountPoint::shared(), &cubes(), hd(), Instant::now())
            .unwrap();
        let resources = m.session(handle).unwrap().resources().to_vec();
        m.backend_mut().fail_release_of(resources[0]);
        m.backend_mut().fail_release_of(resources[10]);

        assert!(m.stop(handle));
        assert_eq!(m.backend().releases(), resources.len() as u64);
        assert_eq!(m.backend().live_resources(), 0);
    }

    #[test]
    fn sessions_do_not_share_pointer_state() {
        let mut m = manager();
        let a = m
            .start(MountPoint::shared(), &particles(), hd(), Instant::now())
            .unwrap();
        m.events().borrow_mut().dispatch(&InputEvent::PointerMoved {
            client_x: 1160.0,
            client_y: 540.0,
        });
        let b = m
            .start(MountPoint::shared(), &cubes(), hd(), Instant::now())
            .unwrap();

        assert_eq!(m.session(a).unwrap().pointer(), PointerState { x: 2.0, y: 0.0 });
        assert_eq!(m.session(b).unwrap().pointer(), PointerState::default());
        assert_eq!(m.events().borrow().listener_count_for(EventKind::PointerMove), 2);

        m.stop(a);
        assert_eq!(m.events().borrow().listener_count_for(EventKind::PointerMove), 1);
    }

    #[test]
    fn elapsed_time_reaches_content() {
        let mut m = manager();
        let start = Instant::now();
        let handle = m.start(MountPoint::shared(), &cubes(), hd(), start).unwrap();
        let heights = |m: &Manager| -> Vec<f32> {
            m.session(handle)
                .unwrap()
                .scene()
                .nodes()
                .values()
                .filter(|n| n.name.starts_with("cube_"))
                .map(|n| n.transform.position.y)
                .collect()
        };

        m.frame(handle, start);
        let at_start = heights(&m);
        m.frame(handle, start + Duration::from_secs(50));
        let later = heights(&m);

        // sin(50 * speed) with speed in [0.01, 0.03) is well away from zero.
        for (a, b) in at_start.iter().zip(&later) {
            assert!((a - b).abs() > 0.2);
        }
    }

    #[test]
    fn drop_shuts_down_sessions() {
        let events = Rc::new(RefCell::new(EventHub::new()));
        let mount = MountPoint::shared();
        {
            let mut m = SceneLifecycleManager::new(HeadlessBackend::new(), FrameQueue::new(), events.clone());
            m.start(mount.clone(), &particles(), hd(), Instant::now()).unwrap();
        }
        assert_eq!(events.borrow().listener_count(), 0);
        assert_eq!(mount.borrow().surface_count(), 0);
    }

    #[test]
    fn end_to_end_hd_scenario() {
        let mut m = manager();
        let mount = MountPoint::shared();
        let start = Instant::now();
        let handle = m.start(mount.clone(), &cubes(), hd(), start).unwrap();
        assert!((m.session(handle).unwrap().camera().aspect - 1.778).abs() < 1e-3);

        // Pointer parked off-center, then moved to the exact center.
        m.events().borrow_mut().dispatch(&InputEvent::PointerMoved {
            client_x: 1360.0,
            client_y: 340.0,
        });
        for i in 0..30 {
            m.frame(handle, start + Duration::from_millis(16 * i));
        }
        m.events().borrow_mut().dispatch(&InputEvent::PointerMoved {
            client_x: 960.0,
            client_y: 540.0,
        });
        assert_eq!(m.session(handle).unwrap().pointer(), PointerState::default());

        let mut previous = m.session(handle).unwrap().camera().position.x.abs();
        for i in 30..400 {
            m.run_due_frames(start + Duration::from_millis(16 * i));
            let x = m.session(handle).unwrap().camera().position.x.abs();
            assert!(x <= previous);
            previous = x;
        }
        let camera = *m.session(handle).unwrap().camera();
        assert!(camera.position.x.abs() < 1e-3);
        assert!(camera.position.y.abs() < 1e-3);

        m.stop(handle);
        assert_eq!(m.events().borrow().listener_count(), 0);
        assert_eq!(m.backend().live_resources(), 0);
        assert_eq!(mount.borrow().surface_count(), 0);
    }
}
