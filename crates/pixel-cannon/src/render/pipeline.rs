//! # Pipeline: Fixed GPU State for Sprite Batches
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ SpritePipeline                                              │
//! │                                                             │
//! │  Shader module ─── vs_main + fs_main from shader.wgsl       │
//! │                                                             │
//! │  Bind group layouts                                         │
//! │    group 0: target transform (mat4x4, vertex-only)          │
//! │    group 1: texture + sampler (fragment-only)               │
//! │                                                             │
//! │  Two render pipelines, identical except for output format:  │
//! │    back buffer  ─── surface format                          │
//! │    frame buffer ─── Rgba8UnormSrgb                          │
//! │                                                             │
//! │  Vertex buffer ─── max_vertices × 36 bytes, rewritten       │
//! │                    before every draw                        │
//! │  Index buffer  ─── static, [v, v+1, v+3, v+1, v+2, v+3]     │
//! │                    per quad                                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Blending is `ALPHA_BLENDING` with no depth buffer: draw order alone
//! decides what ends up on top.

use wgpu::util::DeviceExt;

use super::GpuContext;
use crate::config::TextureFilter;
use crate::graphics::vertex::TransformUniform;
use crate::graphics::Vertex;

/// Pixel format of every texture and frame buffer.
pub(crate) const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// GPU objects shared by every draw call.
pub(crate) struct SpritePipeline {
    pub surface_pipeline: wgpu::RenderPipeline,
    pub frame_buffer_pipeline: wgpu::RenderPipeline,
    pub texture_bind_group_layout: wgpu::BindGroupLayout,
    pub transform_buffer: wgpu::Buffer,
    pub transform_bind_group: wgpu::BindGroup,
    pub sampler: wgpu::Sampler,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
}

impl SpritePipeline {
    pub fn new(gpu: &GpuContext, max_vertices: usize, filter: TextureFilter) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sprite shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let transform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("transform bind group layout"),
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

        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("texture bind group layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            multisampled: false,
                            view_dimension: wgpu::TextureViewDimension::D2,
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sprite pipeline layout"),
            bind_group_layouts: &[&transform_bind_group_layout, &texture_bind_group_layout],
            push_constant_ranges: &[],
        });

        let surface_pipeline =
            build_pipeline(device, &pipeline_layout, &shader, gpu.surface_format(), "back buffer");
        let frame_buffer_pipeline =
            build_pipeline(device, &pipeline_layout, &shader, TEXTURE_FORMAT, "frame buffer");

        let (width, height) = gpu.surface_size();
        let transform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("transform uniform buffer"),
            contents: bytemuck::cast_slice(&[TransformUniform::for_target(width, height)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let transform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("transform bind group"),
            layout: &transform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: transform_buffer.as_entire_binding(),
            }],
        });

        let filter: wgpu::FilterMode = filter.into();
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sprite sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: filter,
            min_filter: filter,
            ..Default::default()
        });

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sprite vertex buffer"),
            size: (max_vertices * Vertex::SIZE) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sprite index buffer"),
            contents: bytemuck::cast_slice(&quad_indices(max_vertices / 4)),
            usage: wgpu::BufferUsages::INDEX,
        });

        log::debug!("sprite pipeline ready: {max_vertices} vertices per batch, {filter:?} filtering");

        Self {
            surface_pipeline,
            frame_buffer_pipeline,
            texture_bind_group_layout,
            transform_buffer,
            transform_bind_group,
            sampler,
            vertex_buffer,
            index_buffer,
        }
    }

    /// Bind a texture view together with the shared sampler (group 1).
    pub fn texture_bind_group(&self, device: &wgpu::Device, view: &wgpu::TextureView, label: &str) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.texture_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }
}

fn build_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    name: &str,
) -> wgpu::RenderPipeline {
    let label = format!("sprite pipeline ({name})");
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::LAYOUT],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None, // rotated and mirrored quads flip winding
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

/// Two triangles per quad over corners in top-left, top-right, bottom-right,
/// bottom-left order.
pub(crate) fn quad_indices(quads: usize) -> Vec<u16> {
    (0..quads)
        .flat_map(|q| {
            let v = (q * 4) as u16;
            [v, v + 1, v + 3, v + 1, v + 2, v + 3]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_pattern() {
        assert_eq!(quad_indices(2), vec![0, 1, 3, 1, 2, 3, 4, 5, 7, 5, 6, 7]);
    }

    #[test]
    fn largest_batch_fits_u16() {
        let indices = quad_indices(crate::graphics::MAX_VERTICES_LIMIT / 4);
        assert_eq!(indices.len(), crate::graphics::MAX_VERTICES_LIMIT / 4 * 6);
        assert_eq!(indices.iter().copied().max(), Some(u16::MAX));
    }
}
