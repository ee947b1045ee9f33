/// Soft round point sprites, sized in pixels and shrinking with depth.
pub const SPRITE_SHADER: &str = r#"
struct FrameUniforms {
    view: mat4x4<f32>,
    proj: mat4x4<f32>,
    viewport: vec4<f32>,
};

struct DrawUniforms {
    model: mat4x4<f32>,
    tint: vec4<f32>,
    params: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: FrameUniforms;

@group(1) @binding(0)
var<uniform> per_draw: DrawUniforms;

struct PointInstance {
    @location(0) center: vec3<f32>,
    @location(1) scale: f32,
    @location(2) color: vec4<f32>,
};

struct SpriteOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) color: vec4<f32>,
};

@vertex
fn vs_sprite(@builtin(vertex_index) vid: u32, instance: PointInstance) -> SpriteOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, 1.0),
    );
    let corner = corners[vid];

    let view_pos = globals.view * per_draw.model * vec4<f32>(instance.center, 1.0);
    let clip = globals.proj * view_pos;
    // Diameter in pixels; NDC spans two units across the viewport.
    let size_px = instance.scale * per_draw.params.x / max(-view_pos.z, 0.001);
    let shift = corner * size_px / globals.viewport.xy * clip.w;

    var out: SpriteOutput;
    out.clip_position = vec4<f32>(clip.xy + shift, clip.zw);
    out.uv = corner * 0.5 + vec2<f32>(0.5, 0.5);
    out.color = instance.color;
    return out;
}

@fragment
fn fs_sprite(in: SpriteOutput) -> @location(0) vec4<f32> {
    let dist = length(in.uv - vec2<f32>(0.5, 0.5));
    if dist > 0.5 {
        discard;
    }
    return vec4<f32>(in.color.rgb * per_draw.tint.rgb, (1.0 - dist * 2.0) * per_draw.tint.a);
}
"#;

/// Colored line lists: wireframe cubes and the ground grid.
pub const LINE_SHADER: &str = r#"
struct FrameUniforms {
    view: mat4x4<f32>,
    proj: mat4x4<f32>,
    viewport: vec4<f32>,
};

struct DrawUniforms {
    model: mat4x4<f32>,
    tint: vec4<f32>,
    params: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: FrameUniforms;

@group(1) @binding(0)
var<uniform> per_draw: DrawUniforms;

struct LineVertex {
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
};

struct LineOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_line(vertex: LineVertex) -> LineOutput {
    var out: LineOutput;
    out.clip_position = globals.proj * globals.view * per_draw.model * vec4<f32>(vertex.position, 1.0);
    out.color = vertex.color * per_draw.tint;
    return out;
}

@fragment
fn fs_line(in: LineOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;
