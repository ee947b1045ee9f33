use crate::config::ParticleFieldConfig;
use crate::easing::ease_toward;
use crate::{ContentError, FrameInput, SceneContent, seeded_rng};
use backdrop_common::{Color, NodeId, Transform};
use backdrop_render::{GeometryDesc, MaterialDesc, ResourceAllocator, ResourceDesc};
use backdrop_scene::{Drawable, PerspectiveCamera, Scene};
use glam::Vec3;
use rand::RngExt;

/// Rotating point cloud that leans toward the pointer.
#[derive(Debug)]
pub struct ParticleField {
    config: ParticleFieldConfig,
    node: NodeId,
}

impl ParticleField {
    pub const NAME: &'static str = "particle-field";

    pub fn build(
        config: &ParticleFieldConfig,
        scene: &mut Scene,
        _camera: &mut PerspectiveCamera,
        alloc: &mut dyn ResourceAllocator,
    ) -> Result<Self, ContentError> {
        let mut rng = seeded_rng(config.seed, Self::NAME);
        let count = config.count as usize;
        let mut positions = Vec::with_capacity(count);
        let mut scales = Vec::with_capacity(count);
        let mut colors = Vec::with_capacity(count);

        for _ in 0..count {
            let position = Vec3::new(
                (rng.random::<f32>() - 0.5) * config.extent,
                (rng.random::<f32>() - 0.5) * config.extent,
                (rng.random::<f32>() - 0.5) * config.extent,
            );
            scales.push(rng.random::<f32>() * config.max_scale);
            colors.push(point_color(config, position));
            positions.push(position);
        }

        let geometry = alloc.allocate(ResourceDesc::Geometry(GeometryDesc::Points {
            positions,
            scales,
            colors,
        }))?;
        let material = alloc.allocate(ResourceDesc::Material(MaterialDesc::PointSprite {
            opacity: config.opacity,
            additive: true,
        }))?;

        let node = scene.add(
            "particles",
            Transform::default(),
            Drawable::Points {
                geometry,
                material,
                count: config.count,
            },
        );
        tracing::debug!(count = config.count, "particle field built");

        Ok(Self {
            config: config.clone(),
            node,
        })
    }

    pub fn node(&self) -> NodeId {
        self.node
    }
}

/// Color of a point, blended outward by its distance from the origin.
fn point_color(config: &ParticleFieldConfig, position: Vec3) -> Color {
    config
        .inner_color
        .lerp(config.outer_color, position.length() / config.color_radius)
}

impl SceneContent for ParticleField {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn update(&mut self, frame: &FrameInput, scene: &mut Scene, _camera: &mut PerspectiveCamera) {
        let Some(node) = scene.get_mut(self.node) else {
            return;
        };
        let target_x = frame.pointer.x * self.config.pointer_gain;
        let target_y = frame.pointer.y * self.config.pointer_gain;

        let rotation = &mut node.transform.rotation;
        rotation.x += self.config.spin_per_frame;
        rotation.y += self.config.spin_per_frame;
        rotation.x = ease_toward(rotation.x, target_y, self.config.smoothing);
        rotation.y = ease_toward(rotation.y, target_x, self.config.smoothing);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backdrop_common::ResourceId;
    use backdrop_input::{PointerState, ViewportState};
    use backdrop_render::{HeadlessBackend, RenderBackend, RenderError};

    fn seeded() -> ParticleFieldConfig {
        ParticleFieldConfig {
            seed: Some(1),
            ..ParticleFieldConfig::default()
        }
    }

    fn frame(pointer: PointerState) -> FrameInput {
        FrameInput {
            elapsed: 0.0,
            pointer,
            viewport: ViewportState::default(),
        }
    }

    #[test]
    fn builds_one_cloud_of_3000_points() {
        let mut backend = HeadlessBackend::new();
        let mut scene = Scene::new();
        let mut camera = PerspectiveCamera::default();
        let field = ParticleField::build(&seeded(), &mut scene, &mut camera, &mut backend).unwrap();

        let counts = scene.counts();
        assert_eq!(counts.point_clouds, 1);
        assert_eq!(counts.points, 3000);
        assert_eq!(backend.live_resources(), 2);
        assert!(scene.get(field.node()).is_some());
    }

    #[test]
    fn colors_blend_by_distance() {
        let config = ParticleFieldConfig::default();
        assert_eq!(point_color(&config, Vec3::ZERO), config.inner_color);
        assert_eq!(point_color(&config, Vec3::new(5.0, 0.0, 0.0)), config.outer_color);
        // Corners of the cube lie beyond the radius and clamp.
        assert_eq!(point_color(&config, Vec3::splat(5.0)), config.outer_color);
        let half = point_color(&config, Vec3::new(0.0, 2.5, 0.0));
        assert!((half.r - 0.25).abs() < 1e-6);
    }

    #[test]
    fn centered_pointer_only_spins() {
        let mut backend = HeadlessBackend::new();
        let mut scene = Scene::new();
        let mut camera = PerspectiveCamera::default();
        let mut field =
            ParticleField::build(&seeded(), &mut scene, &mut camera, &mut backend).unwrap();

        field.update(&frame(PointerState::default()), &mut scene, &mut camera);
        let r = scene.get(field.node()).unwrap().transform.rotation;
        // 0.0005 spin then eased 2% back toward zero.
        let expected = 0.0005 * 0.98;
        assert!((r.x - expected).abs() < 1e-7);
        assert!((r.y - expected).abs() < 1e-7);
    }

    #[test]
    fn rotation_follows_pointer() {
        let mut backend = HeadlessBackend::new();
        let mut scene = Scene::new();
        let mut camera = PerspectiveCamera::default();
        let mut field =
            ParticleField::build(&seeded(), &mut scene, &mut camera, &mut backend).unwrap();

        let pointer = PointerState { x: 2.0, y: -1.0 };
        for _ in 0..1000 {
            field.update(&frame(pointer), &mut scene, &mut camera);
        }
        let r = scene.get(field.node()).unwrap().transform.rotation;
        // Steady state sits a constant spin offset past the target:
        // r = r + s + (t - r - s) * k  =>  r = t + s * (1 - k) / k
        let offset = 0.0005 * 0.98 / 0.02;
        assert!((r.y - (1.0 + offset)).abs() < 1e-3, "y rotation {}", r.y);
        assert!((r.x - (-0.5 + offset)).abs() < 1e-3, "x rotation {}", r.x);
    }

    #[derive(Default)]
    struct Recorder {
        descs: Vec<ResourceDesc>,
    }

    impl ResourceAllocator for Recorder {
        fn allocate(&mut self, desc: ResourceDesc) -> Result<ResourceId, RenderError> {
            self.descs.push(desc);
            Ok(ResourceId(self.descs.len() as u64 - 1))
        }
    }

    fn recorded_points(config: &ParticleFieldConfig) -> (Vec<Vec3>, Vec<f32>) {
        let mut recorder = Recorder::default();
        let mut scene = Scene::new();
        let mut camera = PerspectiveCamera::default();
        ParticleField::build(config, &mut scene, &mut camera, &mut recorder).unwrap();
        match recorder.descs.into_iter().next() {
            Some(ResourceDesc::Geometry(GeometryDesc::Points {
                positions, scales, ..
            })) => (positions, scales),
            other => panic!("expected point geometry first, got {other:?}"),
        }
    }

    #[test]
    fn points_fill_the_cube_with_bounded_scales() {
        let (positions, scales) = recorded_points(&seeded());
        assert_eq!(positions.len(), 3000);
        assert_eq!(scales.len(), 3000);
        for p in &positions {
            assert!(p.abs().max_element() <= 5.0, "{p} outside the cube");
        }
        for s in &scales {
            assert!((0.0..0.8).contains(s), "scale {s} out of range");
        }
    }

    #[test]
    fn same_seed_same_cloud() {
        assert_eq!(recorded_points(&seeded()), recorded_points(&seeded()));
        let other = ParticleFieldConfig {
            seed: Some(2),
            ..ParticleFieldConfig::default()
        };
        assert_ne!(recorded_points(&seeded()).0, recorded_points(&other).0);
    }
}
