use backdrop_common::{Color, ResourceId, SurfaceId};
use backdrop_scene::{PerspectiveCamera, Scene};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Errors from render backends.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("no compatible rendering context: {0}")]
    NoCompatibleContext(String),
    #[error("unknown surface: {0:?}")]
    UnknownSurface(SurfaceId),
    #[error("unknown resource: {0:?}")]
    UnknownResource(ResourceId),
    #[error("invalid surface size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("surface already in use")]
    SurfaceBusy,
    #[error("surface lost")]
    SurfaceLost,
    #[error("backend error: {0}")]
    Backend(String),
}

/// Render surface size in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Vertex data a backend turns into a GPU buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryDesc {
    /// One sprite per position; `scales` and `colors` have the same length.
    Points {
        positions: Vec<Vec3>,
        scales: Vec<f32>,
        colors: Vec<Color>,
    },
    /// Edges of an axis-aligned cube centered at the origin.
    WireBox { edge: f32 },
    /// Square grid in the XZ plane. The two center lines use `center_color`.
    Grid {
        size: f32,
        divisions: u32,
        center_color: Color,
        line_color: Color,
    },
}

impl GeometryDesc {
    /// Number of vertices the backend will upload.
    pub fn vertex_count(&self) -> u32 {
        match self {
            Self::Points { positions, .. } => positions.len() as u32,
            // 12 edges, 2 vertices each
            Self::WireBox { .. } => 24,
            // (divisions + 1) lines per axis
            Self::Grid { divisions, .. } => (divisions + 1) * 4,
        }
    }
}

/// Appearance parameters a backend turns into pipeline state and uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaterialDesc {
    /// Soft round sprites using the per-point colors of the geometry.
    PointSprite { opacity: f32, additive: bool },
    /// Flat color, optionally drawn as edges only.
    Basic {
        color: Color,
        opacity: f32,
        wireframe: bool,
    },
    /// Uses the colors stored in the geometry.
    VertexColors { opacity: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResourceDesc {
    Geometry(GeometryDesc),
    Material(MaterialDesc),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    Geometry,
    Material,
}

impl ResourceDesc {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Geometry(_) => ResourceKind::Geometry,
            Self::Material(_) => ResourceKind::Material,
        }
    }
}

/// The allocation half of a backend, handed to scene content builders.
pub trait ResourceAllocator {
    fn allocate(&mut self, desc: ResourceDesc) -> Result<ResourceId, RenderError>;
}

/// Renderer-agnostic interface. All backends implement this trait.
pub trait RenderBackend: ResourceAllocator {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Create a render surface. Fails with [`RenderError::NoCompatibleContext`]
    /// when the host cannot render at all.
    fn create_surface(&mut self, size: SurfaceSize) -> Result<SurfaceId, RenderError>;

    fn resize_surface(&mut self, surface: SurfaceId, size: SurfaceSize)
    -> Result<(), RenderError>;

    fn destroy_surface(&mut self, surface: SurfaceId) -> Result<(), RenderError>;

    /// Free a resource returned by [`ResourceAllocator::allocate`].
    fn release(&mut self, id: ResourceId) -> Result<(), RenderError>;

    /// Render one frame of `scene` through `camera` onto `surface`.
    fn render(
        &mut self,
        surface: SurfaceId,
        scene: &Scene,
        camera: &PerspectiveCamera,
    ) -> Result<(), RenderError>;

    /// Resources currently allocated and not yet released.
    fn live_resources(&self) -> usize;
}
