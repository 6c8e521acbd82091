//! # Vertex: Per-Corner Data Sent to the GPU
//!
//! Every sprite and glyph becomes four of these. Positions are already in
//! target pixel space (origin, scale and rotation are applied on the CPU), so
//! quads with different transforms still share one draw call as long as they
//! share a render target and sampler.
//!
//! ```text
//! Vertex (36 bytes per vertex)
//! ┌────────────────┬────────────────────────┬──────────────┐
//! │ position       │ color                  │ uv           │
//! │ [f32; 3]       │ [f32; 4]               │ [f32; 2]     │
//! │ 12 bytes       │ 16 bytes               │ 8 bytes      │
//! │ offset 0       │ offset 12              │ offset 28    │
//! │ location(0)    │ location(1)            │ location(2)  │
//! └────────────────┴────────────────────────┴──────────────┘
//! ```
//!
//! `position.z` carries the layer depth and is passed through to clip space
//! untouched, so it must stay within `[0, 1]`.

use bytemuck::{Pod, Zeroable};

/// One corner of a quad.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const SIZE: usize = std::mem::size_of::<Vertex>();

    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: Self::SIZE as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // color
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x4,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 28,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };
}

/// Pixel-to-clip-space matrix uploaded as a uniform before every draw.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub(crate) struct TransformUniform {
    pub transform: [[f32; 4]; 4],
}

impl TransformUniform {
    /// Orthographic projection for a `width × height` target: origin at the
    /// top-left, Y pointing down, Z passed through.
    pub fn for_target(width: u32, height: u32) -> Self {
        let w = width.max(1) as f32;
        let h = height.max(1) as f32;
        let m = glam::Mat4::from_cols(
            glam::Vec4::new(2.0 / w, 0.0, 0.0, 0.0),
            glam::Vec4::new(0.0, -2.0 / h, 0.0, 0.0),
            glam::Vec4::new(0.0, 0.0, 1.0, 0.0),
            glam::Vec4::new(-1.0, 1.0, 0.0, 1.0),
        );
        Self {
            transform: m.to_cols_array_2d(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_36_bytes() {
        assert_eq!(Vertex::SIZE, 36);
    }

    #[test]
    fn projection_maps_corners_to_clip_space() {
        let t = TransformUniform::for_target(800, 600);
        let m = glam::Mat4::from_cols_array_2d(&t.transform);

        let top_left = m * glam::Vec4::new(0.0, 0.0, 0.5, 1.0);
        assert_eq!(top_left, glam::Vec4::new(-1.0, 1.0, 0.5, 1.0));

        let bottom_right = m * glam::Vec4::new(800.0, 600.0, 0.0, 1.0);
        assert!((bottom_right.x - 1.0).abs() < 1e-6);
        assert!((bottom_right.y + 1.0).abs() < 1e-6);
    }
}
