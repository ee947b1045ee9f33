use crate::config::CubeFieldConfig;
use crate::easing::ease_vec3;
use crate::{ContentError, FrameInput, SceneContent, seeded_rng};
use backdrop_common::{Color, NodeId, Transform};
use backdrop_render::{GeometryDesc, MaterialDesc, ResourceAllocator, ResourceDesc};
use backdrop_scene::{Drawable, PerspectiveCamera, Scene};
use glam::Vec3;
use rand::RngExt;
use std::f32::consts::TAU;

/// Animation parameters carried by one cube.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubeState {
    pub node: NodeId,
    pub baseline_y: f32,
    pub speed: f32,
    pub phase: f32,
}

impl CubeState {
    /// Vertical position at `elapsed` seconds.
    pub fn height_at(&self, elapsed: f32, amplitude: f32) -> f32 {
        self.baseline_y + (elapsed * self.speed + self.phase).sin() * amplitude
    }
}

/// Floating wireframe cubes over a slowly turning grid. The camera drifts
/// with the pointer and keeps looking at the origin.
#[derive(Debug)]
pub struct CubeField {
    config: CubeFieldConfig,
    cubes: Vec<CubeState>,
    grid: NodeId,
}

impl CubeField {
    pub const NAME: &'static str = "cube-field";

    pub fn build(
        config: &CubeFieldConfig,
        scene: &mut Scene,
        camera: &mut PerspectiveCamera,
        alloc: &mut dyn ResourceAllocator,
    ) -> Result<Self, ContentError> {
        let mut rng = seeded_rng(config.seed, Self::NAME);

        let grid_geometry = alloc.allocate(ResourceDesc::Geometry(GeometryDesc::Grid {
            size: config.grid.size,
            divisions: config.grid.divisions,
            center_color: config.grid.center_color,
            line_color: config.grid.line_color,
        }))?;
        let grid_material =
            alloc.allocate(ResourceDesc::Material(MaterialDesc::VertexColors { opacity: 1.0 }))?;
        let grid = scene.add(
            "grid",
            Transform::from_position(Vec3::new(0.0, config.grid.offset_y, 0.0)),
            Drawable::Lines {
                geometry: grid_geometry,
                material: grid_material,
            },
        );

        // All cubes share one edge list; each gets its own material.
        let cube_geometry =
            alloc.allocate(ResourceDesc::Geometry(GeometryDesc::WireBox { edge: config.edge }))?;

        let mut cubes = Vec::with_capacity(config.count as usize);
        for i in 0..config.count {
            let color = Color::new(
                config.red.sample(&mut rng),
                config.green.sample(&mut rng),
                config.blue.sample(&mut rng),
            );
            let material = alloc.allocate(ResourceDesc::Material(MaterialDesc::Basic {
                color,
                opacity: config.opacity,
                wireframe: true,
            }))?;

            let position = Vec3::new(
                (rng.random::<f32>() - 0.5) * config.extent,
                (rng.random::<f32>() - 0.5) * config.extent,
                (rng.random::<f32>() - 0.5) * config.extent,
            );
            let speed = config.speed.sample(&mut rng);
            let phase = if config.random_phase {
                rng.random::<f32>() * TAU
            } else {
                0.0
            };

            let node = scene.add(
                format!("cube_{i}"),
                Transform::from_position(position),
                Drawable::Mesh {
                    geometry: cube_geometry,
                    material,
                    color,
                    opacity: config.opacity,
                },
            );
            cubes.push(CubeState {
                node,
                baseline_y: position.y,
                speed,
                phase,
            });
        }

        camera.look_at(Vec3::ZERO);
        tracing::debug!(cubes = cubes.len(), "cube field built");

        Ok(Self {
            config: config.clone(),
            cubes,
            grid,
        })
    }

    pub fn cubes(&self) -> &[CubeState] {
        &self.cubes
    }

    pub fn grid(&self) -> NodeId {
        self.grid
    }
}

impl SceneContent for CubeField {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn update(&mut self, frame: &FrameInput, scene: &mut Scene, camera: &mut PerspectiveCamera) {
        let gain = self.config.pointer_gain;
        let target = Vec3::new(
            frame.pointer.x * gain,
            -frame.pointer.y * gain,
            camera.position.z,
        );
        camera.position = ease_vec3(camera.position, target, self.config.smoothing);
        camera.look_at(Vec3::ZERO);

        let spin = self.config.spin_per_frame;
        for cube in &self.cubes {
            if let Some(node) = scene.get_mut(cube.node) {
                node.transform.rotation.x += spin;
                node.transform.rotation.y += spin;
                node.transform.position.y =
                    cube.height_at(frame.elapsed, self.config.bob_amplitude);
            }
        }

        if let Some(grid) = scene.get_mut(self.grid) {
            grid.transform.rotation.y += self.config.grid.spin_per_frame;
        }
    }
}
