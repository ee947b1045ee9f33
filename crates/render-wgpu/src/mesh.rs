use backdrop_common::Color;
use bytemuck::{Pod, Zeroable};
use glam::Vec3;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct PointInstance {
    pub center: [f32; 3],
    pub scale: f32,
    pub color: [f32; 4],
}

/// The 12 edges of a cube centered at the origin, as a line list.
pub(crate) fn wire_box(edge: f32) -> Vec<LineVertex> {
    let h = edge / 2.0;
    let corner = |i: usize| {
        [
            if i & 1 == 0 { -h } else { h },
            if i & 2 == 0 { -h } else { h },
            if i & 4 == 0 { -h } else { h },
        ]
    };
    let mut verts = Vec::with_capacity(24);
    // Corners differing in exactly one bit share an edge.
    for a in 0..8 {
        for bit in [1, 2, 4] {
            let b = a | bit;
            if a & bit == 0 {
                for i in [a, b] {
                    verts.push(LineVertex {
                        position: corner(i),
                        color: Color::WHITE.to_rgba(1.0),
                    });
                }
            }
        }
    }
    verts
}

/// Square grid in the XZ plane. With an even division count the middle line
/// on each axis gets `center_color`; an odd count has no middle line.
pub(crate) fn grid(size: f32, divisions: u32, center_color: Color, line_color: Color) -> Vec<LineVertex> {
    let half = size / 2.0;
    let step = size / divisions.max(1) as f32;
    let mut verts = Vec::with_capacity(((divisions + 1) * 4) as usize);

    for i in 0..=divisions {
        let k = -half + i as f32 * step;
        let middle = divisions % 2 == 0 && i == divisions / 2;
        let color = (if middle { center_color } else { line_color }).to_rgba(1.0);
        for position in [[-half, 0.0, k], [half, 0.0, k], [k, 0.0, -half], [k, 0.0, half]] {
            verts.push(LineVertex { position, color });
        }
    }
    verts
}

pub(crate) fn point_instances(positions: &[Vec3], scales: &[f32], colors: &[Color]) -> Vec<PointInstance> {
    positions
        .iter()
        .zip(scales)
        .zip(colors)
        .map(|((p, s), c)| PointInstance {
            center: p.to_array(),
            scale: *s,
            color: c.to_rgba(1.0),
        })
        .collect()
}
