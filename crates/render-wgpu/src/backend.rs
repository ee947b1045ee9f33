use crate::mesh::{self, LineVertex, PointInstance};
use crate::shaders;
use backdrop_common::{Color, ResourceId, SurfaceId};
use backdrop_render::{
    GeometryDesc, MaterialDesc, RenderBackend, RenderError, ResourceAllocator, ResourceDesc,
    SurfaceSize,
};
use backdrop_scene::{Drawable, PerspectiveCamera, Scene};
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use std::collections::BTreeMap;
use std::num::NonZeroU64;
use wgpu::util::DeviceExt;

/// Pixel diameter of a point sprite of scale 1 at depth 1.
const POINT_SIZE_SCALE: f32 = 600.0;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct FrameUniforms {
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
    viewport: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct DrawUniforms {
    model: [[f32; 4]; 4],
    tint: [f32; 4],
    params: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pipeline {
    SpriteAdditive,
    SpriteAlpha,
    Lines,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GeometryKind {
    Points,
    Lines,
}

/// Pick the pipeline for a geometry/material pair, or `None` if the pair
/// cannot be drawn together.
pub(crate) fn pipeline_for(geometry: GeometryKind, material: &MaterialDesc) -> Option<Pipeline> {
    match (geometry, material) {
        (GeometryKind::Points, MaterialDesc::PointSprite { additive: true, .. }) => {
            Some(Pipeline::SpriteAdditive)
        }
        (GeometryKind::Points, MaterialDesc::PointSprite { additive: false, .. }) => {
            Some(Pipeline::SpriteAlpha)
        }
        (GeometryKind::Lines, MaterialDesc::Basic { .. } | MaterialDesc::VertexColors { .. }) => {
            Some(Pipeline::Lines)
        }
        _ => None,
    }
}

/// Per-draw tint: RGB multiplier plus overall opacity.
pub(crate) fn tint_for(drawable: &Drawable, material: &MaterialDesc) -> [f32; 4] {
    match (drawable, material) {
        (Drawable::Mesh { color, opacity, .. }, _) => color.to_rgba(*opacity),
        (_, MaterialDesc::Basic { color, opacity, .. }) => color.to_rgba(*opacity),
        (_, MaterialDesc::PointSprite { opacity, .. } | MaterialDesc::VertexColors { opacity }) => {
            Color::WHITE.to_rgba(*opacity)
        }
    }
}

/// Round `size` up to a multiple of `alignment`.
pub(crate) fn align_to(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment) * alignment
}

enum GpuResource {
    Points { instances: wgpu::Buffer, count: u32 },
    Lines { vertices: wgpu::Buffer, count: u32 },
    Material(MaterialDesc),
}

struct Draw {
    pipeline: Pipeline,
    geometry: ResourceId,
    count: u32,
}

/// Render backend drawing onto one window surface with wgpu.
///
/// The window holds at most one logical surface at a time. Resources are
/// GPU buffers for geometry and pipeline selections for materials.
pub struct WgpuBackend {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    adapter_name: String,
    active: Option<SurfaceId>,
    next_surface: u64,
    resources: BTreeMap<ResourceId, GpuResource>,
    next_resource: u64,
    sprite_additive: wgpu::RenderPipeline,
    sprite_alpha: wgpu::RenderPipeline,
    lines: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    draw_layout: wgpu::BindGroupLayout,
    draw_buffer: wgpu::Buffer,
    draw_bind_group: wgpu::BindGroup,
    draw_stride: u64,
    draw_capacity: u64,
    clear_color: wgpu::Color,
}

impl WgpuBackend {
    /// Open a device able to present to `target`. Fails with
    /// [`RenderError::NoCompatibleContext`] when no adapter or device is
    /// available.
    pub fn new(target: impl Into<wgpu::SurfaceTarget<'static>>) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(target)
            .map_err(|e| RenderError::NoCompatibleContext(e.to_string()))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| RenderError::NoCompatibleContext("no suitable adapter".into()))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("backdrop_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: Default::default(),
            },
            None,
        ))
        .map_err(|e| RenderError::NoCompatibleContext(e.to_string()))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or_else(|| RenderError::NoCompatibleContext("surface has no formats".into()))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: 1,
            height: 1,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let frame_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("frame_uniforms"),
            contents: bytemuck::bytes_of(&FrameUniforms {
                view: Mat4::IDENTITY.to_cols_array_2d(),
                proj: Mat4::IDENTITY.to_cols_array_2d(),
                viewport: [1.0, 1.0, 0.0, 0.0],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let draw_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("draw_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(std::mem::size_of::<DrawUniforms>() as u64),
                },
                count: None,
            }],
        });

        let draw_stride = align_to(
            std::mem::size_of::<DrawUniforms>() as u64,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );
        let draw_capacity = 64;
        let (draw_buffer, draw_bind_group) =
            Self::create_draw_uniforms(&device, &draw_layout, draw_stride, draw_capacity);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &draw_layout],
            push_constant_ranges: &[],
        });

        let sprite_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sprite_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SPRITE_SHADER.into()),
        });
        let line_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("line_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::LINE_SHADER.into()),
        });

        let additive = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent::OVER,
        };
        let sprite_additive = Self::sprite_pipeline(
            &device,
            &pipeline_layout,
            &sprite_shader,
            format,
            additive,
            "sprite_additive_pipeline",
        );
        let sprite_alpha = Self::sprite_pipeline(
            &device,
            &pipeline_layout,
            &sprite_shader,
            format,
            wgpu::BlendState::ALPHA_BLENDING,
            "sprite_alpha_pipeline",
        );

        let lines = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("line_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &line_shader,
                entry_point: Some("vs_line"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<LineVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x4,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &line_shader,
                entry_point: Some("fs_line"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let adapter_name = adapter.get_info().name;
        tracing::info!(
            adapter = %adapter_name,
            backend = adapter.get_info().backend.to_str(),
            ?format,
            "wgpu backend ready"
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            adapter_name,
            active: None,
            next_surface: 0,
            resources: BTreeMap::new(),
            next_resource: 0,
            sprite_additive,
            sprite_alpha,
            lines,
            frame_buffer,
            frame_bind_group,
            draw_layout,
            draw_buffer,
            draw_bind_group,
            draw_stride,
            draw_capacity,
            clear_color: wgpu::Color::BLACK,
        })
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    fn sprite_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
        format: wgpu::TextureFormat,
        blend: wgpu::BlendState,
        label: &str,
    ) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_sprite"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<PointInstance>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32,
                        2 => Float32x4,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_sprite"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: Default::default(),
            multiview: None,
            cache: None,
        })
    }

    fn create_draw_uniforms(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        stride: u64,
        capacity: u64,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("draw_uniforms"),
            size: stride * capacity,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("draw_bind_group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(std::mem::size_of::<DrawUniforms>() as u64),
                }),
            }],
        });
        (buffer, bind_group)
    }

    fn ensure_draw_capacity(&mut self, draws: u64) {
        if draws <= self.draw_capacity {
            return;
        }
        let capacity = draws.next_power_of_two();
        let (buffer, bind_group) =
            Self::create_draw_uniforms(&self.device, &self.draw_layout, self.draw_stride, capacity);
        self.draw_buffer = buffer;
        self.draw_bind_group = bind_group;
        self.draw_capacity = capacity;
        tracing::debug!(capacity, "grew draw uniform buffer");
    }

    fn line_buffer(&self, vertices: &[LineVertex]) -> GpuResource {
        GpuResource::Lines {
            vertices: self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("line_vertices"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            }),
            count: vertices.len() as u32,
        }
    }

    fn check_surface(&self, surface: SurfaceId) -> Result<(), RenderError> {
        if self.active == Some(surface) {
            Ok(())
        } else {
            Err(RenderError::UnknownSurface(surface))
        }
    }

    fn configure(&mut self, size: SurfaceSize) -> Result<(), RenderError> {
        if size.is_empty() {
            return Err(RenderError::InvalidSize {
                width: size.width,
                height: size.height,
            });
        }
        let max = self.device.limits().max_texture_dimension_2d;
        self.config.width = size.width.min(max);
        self.config.height = size.height.min(max);
        self.surface.configure(&self.device, &self.config);
        Ok(())
    }

    fn acquire(&self) -> Result<wgpu::SurfaceTexture, RenderError> {
        match self.surface.get_current_texture() {
            Ok(frame) => Ok(frame),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                Err(RenderError::SurfaceLost)
            }
            Err(e) => Err(RenderError::Backend(e.to_string())),
        }
    }

    /// Resolve every visible node into a draw, checking its resources.
    fn plan(&self, scene: &Scene) -> Result<Vec<(Draw, DrawUniforms)>, RenderError> {
        let mut draws = Vec::new();
        for node in scene.nodes().values().filter(|n| n.visible) {
            let geometry_id = node.drawable.geometry();
            let material_id = node.drawable.material();
            let (kind, count) = match self.resources.get(&geometry_id) {
                Some(GpuResource::Points { count, .. }) => (GeometryKind::Points, *count),
                Some(GpuResource::Lines { count, .. }) => (GeometryKind::Lines, *count),
                _ => return Err(RenderError::UnknownResource(geometry_id)),
            };
            let Some(GpuResource::Material(material)) = self.resources.get(&material_id) else {
                return Err(RenderError::UnknownResource(material_id));
            };
            let pipeline = pipeline_for(kind, material).ok_or_else(|| {
                RenderError::Backend(format!("{material:?} cannot draw {kind:?} geometry"))
            })?;
            if count == 0 {
                continue;
            }
            draws.push((
                Draw {
                    pipeline,
                    geometry: geometry_id,
                    count,
                },
                DrawUniforms {
                    model: node.transform.matrix().to_cols_array_2d(),
                    tint: tint_for(&node.drawable, material),
                    params: [POINT_SIZE_SCALE, 0.0, 0.0, 0.0],
                },
            ));
        }
        Ok(draws)
    }
}

impl ResourceAllocator for WgpuBackend {
    fn allocate(&mut self, desc: ResourceDesc) -> Result<ResourceId, RenderError> {
        let id = ResourceId(self.next_resource);
        let resource = match desc {
            ResourceDesc::Geometry(GeometryDesc::Points {
                positions,
                scales,
                colors,
            }) => {
                let instances = mesh::point_instances(&positions, &scales, &colors);
                GpuResource::Points {
                    instances: self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("point_instances"),
                        contents: bytemuck::cast_slice(&instances),
                        usage: wgpu::BufferUsages::VERTEX,
                    }),
                    count: instances.len() as u32,
                }
            }
            ResourceDesc::Geometry(GeometryDesc::WireBox { edge }) => {
                self.line_buffer(&mesh::wire_box(edge))
            }
            ResourceDesc::Geometry(GeometryDesc::Grid {
                size,
                divisions,
                center_color,
                line_color,
            }) => self.line_buffer(&mesh::grid(size, divisions, center_color, line_color)),
            ResourceDesc::Material(material) => GpuResource::Material(material),
        };
        self.next_resource += 1;
        self.resources.insert(id, resource);
        Ok(id)
    }
}

impl RenderBackend for WgpuBackend {
    fn name(&self) -> &str {
        "wgpu"
    }

    fn create_surface(&mut self, size: SurfaceSize) -> Result<SurfaceId, RenderError> {
        if self.active.is_some() {
            return Err(RenderError::SurfaceBusy);
        }
        self.configure(size)?;
        let id = SurfaceId(self.next_surface);
        self.next_surface += 1;
        self.active = Some(id);
        tracing::debug!(?id, width = size.width, height = size.height, "surface created");
        Ok(id)
    }

    fn resize_surface(&mut self, surface: SurfaceId, size: SurfaceSize) -> Result<(), RenderError> {
        self.check_surface(surface)?;
        self.configure(size)
    }

    fn destroy_surface(&mut self, surface: SurfaceId) -> Result<(), RenderError> {
        self.check_surface(surface)?;
        self.active = None;

        // Present one cleared frame so the old scene does not linger.
        let frame = self.acquire()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("clear_encoder"),
            });
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("clear_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            ..Default::default()
        });
        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn release(&mut self, id: ResourceId) -> Result<(), RenderError> {
        match self.resources.remove(&id) {
            Some(GpuResource::Points { instances: buffer, .. })
            | Some(GpuResource::Lines { vertices: buffer, .. }) => {
                buffer.destroy();
                Ok(())
            }
            Some(GpuResource::Material(_)) => Ok(()),
            None => Err(RenderError::UnknownResource(id)),
        }
    }

    fn render(
        &mut self,
        surface: SurfaceId,
        scene: &Scene,
        camera: &PerspectiveCamera,
    ) -> Result<(), RenderError> {
        self.check_surface(surface)?;
        let draws = self.plan(scene)?;
        self.ensure_draw_capacity(draws.len() as u64);

        self.queue.write_buffer(
            &self.frame_buffer,
            0,
            bytemuck::bytes_of(&FrameUniforms {
                view: camera.view_matrix().to_cols_array_2d(),
                proj: camera.projection_matrix().to_cols_array_2d(),
                viewport: [self.config.width as f32, self.config.height as f32, 0.0, 0.0],
            }),
        );
        let mut uniforms = vec![0u8; (self.draw_stride * draws.len() as u64) as usize];
        for (i, (_, draw)) in draws.iter().enumerate() {
            let start = i * self.draw_stride as usize;
            let bytes = bytemuck::bytes_of(draw);
            uniforms[start..start + bytes.len()].copy_from_slice(bytes);
        }
        if !uniforms.is_empty() {
            self.queue.write_buffer(&self.draw_buffer, 0, &uniforms);
        }

        let frame = self.acquire()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("render_encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                ..Default::default()
            });
            pass.set_bind_group(0, &self.frame_bind_group, &[]);

            for (i, (draw, _)) in draws.iter().enumerate() {
                let offset = (i as u64 * self.draw_stride) as u32;
                let pipeline = match draw.pipeline {
                    Pipeline::SpriteAdditive => &self.sprite_additive,
                    Pipeline::SpriteAlpha => &self.sprite_alpha,
                    Pipeline::Lines => &self.lines,
                };
                pass.set_pipeline(pipeline);
                pass.set_bind_group(1, &self.draw_bind_group, &[offset]);
                match self.resources.get(&draw.geometry) {
                    Some(GpuResource::Points { instances, .. }) => {
                        pass.set_vertex_buffer(0, instances.slice(..));
                        pass.draw(0..6, 0..draw.count);
                    }
                    Some(GpuResource::Lines { vertices, .. }) => {
                        pass.set_vertex_buffer(0, vertices.slice(..));
                        pass.draw(0..draw.count, 0..1);
                    }
                    _ => {}
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn live_resources(&self) -> usize {
        self.resources.len()
    }
}
