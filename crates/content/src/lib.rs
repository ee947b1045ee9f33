//! Scene content: what a render session draws and how it animates.
//!
//! A [`ContentSpec`] populates a scene, allocating GPU resources through a
//! [`ResourceAllocator`], and returns a [`SceneContent`] that advances the
//! scene once per frame.
//!
//! # Invariants
//! - Content allocates only through the allocator it is given, so the caller
//!   can account for (and release) every resource.
//! - `update` is driven once per frame and never blocks.

pub mod config;
pub mod cubes;
pub mod easing;
pub mod particles;

use backdrop_input::{PointerState, ViewportState};
use backdrop_render::{RenderError, ResourceAllocator};
use backdrop_scene::{PerspectiveCamera, Scene};
use serde::{Deserialize, Serialize};

pub use config::{
    BackdropConfig, ConfigError, CubeFieldConfig, GridConfig, ParticleFieldConfig, ValueRange,
    WindowConfig,
};
pub use cubes::{CubeField, CubeState};
pub use particles::ParticleField;

/// Errors from building scene content.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("render error: {0}")]
    Render(#[from] RenderError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Per-frame inputs handed to [`SceneContent::update`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    /// Seconds since the session started.
    pub elapsed: f32,
    pub pointer: PointerState,
    pub viewport: ViewportState,
}

/// Animation hook produced by a content builder.
pub trait SceneContent {
    fn name(&self) -> &'static str;

    /// Advance the scene by one frame.
    fn update(&mut self, frame: &FrameInput, scene: &mut Scene, camera: &mut PerspectiveCamera);
}

/// Declarative description of a scene's content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentSpec {
    Particles(ParticleFieldConfig),
    Cubes(CubeFieldConfig),
}

impl ContentSpec {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Particles(_) => ParticleField::NAME,
            Self::Cubes(_) => CubeField::NAME,
        }
    }

    /// Populate `scene`, set up `camera`, and return the per-frame hook.
    ///
    /// On error, resources already allocated through `alloc` are left for
    /// the caller to release.
    pub fn build(
        &self,
        scene: &mut Scene,
        camera: &mut PerspectiveCamera,
        alloc: &mut dyn ResourceAllocator,
    ) -> Result<Box<dyn SceneContent>, ContentError> {
        match self {
            Self::Particles(config) => {
                config.validate()?;
                Ok(Box::new(ParticleField::build(config, scene, camera, alloc)?))
            }
            Self::Cubes(config) => {
                config.validate()?;
                Ok(Box::new(CubeField::build(config, scene, camera, alloc)?))
            }
        }
    }
}

pub(crate) fn seeded_rng(seed: Option<u64>, content: &'static str) -> rand::rngs::StdRng {
    use rand::{RngExt, SeedableRng};
    let seed = seed.unwrap_or_else(|| rand::rng().random());
    tracing::debug!(content, seed, "content rng seeded");
    rand::rngs::StdRng::seed_from_u64(seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use backdrop_render::{HeadlessBackend, RenderBackend};

    #[test]
    fn spec_round_trips_through_yaml_tag() {
        let yaml = "kind: cubes\ncount: 12\n";
        let spec: ContentSpec = serde_yaml::from_str(yaml).unwrap();
        match &spec {
            ContentSpec::Cubes(config) => {
                assert_eq!(config.count, 12);
                assert_eq!(config.edge, 0.2);
            }
            other => panic!("expected cubes, got {other:?}"),
        }
        assert_eq!(spec.name(), "cube-field");
    }

    #[test]
    fn invalid_config_fails_before_allocating() {
        let mut config = ParticleFieldConfig::default();
        config.opacity = 2.0;
        let mut backend = HeadlessBackend::new();
        let mut scene = Scene::new();
        let mut camera = PerspectiveCamera::default();
        let result = ContentSpec::Particles(config).build(&mut scene, &mut camera, &mut backend);
        assert!(matches!(result, Err(ContentError::Config(_))));
        assert_eq!(backend.live_resources(), 0);
        assert!(scene.is_empty());
    }
}
