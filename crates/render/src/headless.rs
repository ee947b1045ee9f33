use crate::backend::{
    RenderBackend, RenderError, ResourceAllocator, ResourceDesc, ResourceKind, SurfaceSize,
};
use backdrop_common::{ResourceId, SurfaceId};
use backdrop_scene::{Drawable, PerspectiveCamera, Scene};
use glam::Mat4;
use std::collections::{BTreeMap, BTreeSet};

/// What the last rendered frame contained.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    pub surface: SurfaceId,
    pub size: SurfaceSize,
    pub draw_calls: usize,
    pub points: usize,
    pub view_proj: Mat4,
}

/// In-memory backend with no GPU.
///
/// Tracks surfaces and resources so tests and the CLI can check that every
/// allocation is released. Failures can be injected to exercise error paths.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    surfaces: BTreeMap<SurfaceId, SurfaceSize>,
    resources: BTreeMap<ResourceId, ResourceKind>,
    next_surface: u64,
    next_resource: u64,
    frames_rendered: u64,
    allocations: u64,
    releases: u64,
    last_frame: Option<FrameRecord>,
    no_context: bool,
    fail_resize: bool,
    fail_release: BTreeSet<ResourceId>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose surface creation always fails, like a device without
    /// a usable graphics context.
    pub fn without_context() -> Self {
        Self {
            no_context: true,
            ..Self::default()
        }
    }

    /// Make every following resize fail until reset.
    pub fn set_fail_resize(&mut self, fail: bool) {
        self.fail_resize = fail;
    }

    /// Make the next release of `id` fail. The resource is still dropped from
    /// the live set, the way a lost GPU object would be.
    pub fn fail_release_of(&mut self, id: ResourceId) {
        self.fail_release.insert(id);
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    pub fn surface_size(&self, surface: SurfaceId) -> Option<SurfaceSize> {
        self.surfaces.get(&surface).copied()
    }

    pub fn live_of_kind(&self, kind: ResourceKind) -> usize {
        self.resources.values().filter(|k| **k == kind).count()
    }

    pub fn is_live(&self, id: ResourceId) -> bool {
        self.resources.contains_key(&id)
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn allocations(&self) -> u64 {
        self.allocations
    }

    pub fn releases(&self) -> u64 {
        self.releases
    }

    pub fn last_frame(&self) -> Option<&FrameRecord> {
        self.last_frame.as_ref()
    }

    /// Human-readable dump of a scene as this backend would draw it.
    pub fn describe(scene: &Scene, camera: &PerspectiveCamera) -> String {
        let counts = scene.counts();
        let mut out = String::new();
        out.push_str(&format!(
            "=== Scene ({} nodes, {} points, {} meshes, {} line sets) ===\n",
            scene.len(),
            counts.points,
            counts.meshes,
            counts.line_sets
        ));
        out.push_str(&format!(
            "Camera: pos=({:.2}, {:.2}, {:.2}) fov={:.0} aspect={:.3}\n",
            camera.position.x,
            camera.position.y,
            camera.position.z,
            camera.fov_degrees,
            camera.aspect
        ));
        for (id, node) in scene.nodes().iter().take(8) {
            let p = node.transform.position;
            let r = node.transform.rotation;
            out.push_str(&format!(
                "  [{}] {} pos=({:.2}, {:.2}, {:.2}) rot=({:.3}, {:.3}, {:.3})\n",
                id.0, node.name, p.x, p.y, p.z, r.x, r.y, r.z
            ));
        }
        if scene.len() > 8 {
            out.push_str(&format!("  ... {} more\n", scene.len() - 8));
        }
        out
    }
}

impl ResourceAllocator for HeadlessBackend {
    fn allocate(&mut self, desc: ResourceDesc) -> Result<ResourceId, RenderError> {
        let id = ResourceId(self.next_resource);
        self.next_resource += 1;
        self.resources.insert(id, desc.kind());
        self.allocations += 1;
        Ok(id)
    }
}

impl RenderBackend for HeadlessBackend {
    fn name(&self) -> &str {
        "headless"
    }

    fn create_surface(&mut self, size: SurfaceSize) -> Result<SurfaceId, RenderError> {
        if self.no_context {
            tracing::debug!("headless surface refused: no context");
            return Err(RenderError::NoCompatibleContext(
                "headless backend created without a context".into(),
            ));
        }
        if size.is_empty() {
            return Err(RenderError::InvalidSize {
                width: size.width,
                height: size.height,
            });
        }
        let id = SurfaceId(self.next_surface);
        self.next_surface += 1;
        self.surfaces.insert(id, size);
        tracing::debug!(
            surface = id.0,
            width = size.width,
            height = size.height,
            "headless surface created"
        );
        Ok(id)
    }

    fn resize_surface(
        &mut self,
        surface: SurfaceId,
        size: SurfaceSize,
    ) -> Result<(), RenderError> {
        if self.fail_resize {
            tracing::warn!(surface = surface.0, "injecting resize failure");
            return Err(RenderError::Backend("injected resize failure".into()));
        }
        if size.is_empty() {
            return Err(RenderError::InvalidSize {
                width: size.width,
                height: size.height,
            });
        }
        let slot = self
            .surfaces
            .get_mut(&surface)
            .ok_or(RenderError::UnknownSurface(surface))?;
        *slot = size;
        Ok(())
    }

    fn destroy_surface(&mut self, surface: SurfaceId) -> Result<(), RenderError> {
        self.surfaces
            .remove(&surface)
            .map(|_| ())
            .ok_or(RenderError::UnknownSurface(surface))
    }

    fn release(&mut self, id: ResourceId) -> Result<(), RenderError> {
        if self.resources.remove(&id).is_none() {
            tracing::warn!("release of unknown resource {id:?}");
            return Err(RenderError::UnknownResource(id));
        }
        self.releases += 1;
        if self.fail_release.remove(&id) {
            tracing::warn!("injecting release failure for {id:?}");
            return Err(RenderError::Backend(format!("injected release failure for {id:?}")));
        }
        Ok(())
    }

    fn render(
        &mut self,
        surface: SurfaceId,
        scene: &Scene,
        camera: &PerspectiveCamera,
    ) -> Result<(), RenderError> {
        let size = self
            .surfaces
            .get(&surface)
            .copied()
            .ok_or(RenderError::UnknownSurface(surface))?;

        let mut draw_calls = 0;
        let mut points = 0;
        for node in scene.nodes().values().filter(|n| n.visible) {
            for id in [node.drawable.geometry(), node.drawable.material()] {
                if !self.resources.contains_key(&id) {
                    return Err(RenderError::UnknownResource(id));
                }
            }
            if let Drawable::Points { count, .. } = node.drawable {
                points += count as usize;
            }
            draw_calls += 1;
        }

        self.frames_rendered += 1;
        self.last_frame = Some(FrameRecord {
            surface,
            size,
            draw_calls,
            points,
            view_proj: camera.view_projection(),
        });
        Ok(())
    }

    fn live_resources(&self) -> usize {
        self.resources.len()
    }
}
