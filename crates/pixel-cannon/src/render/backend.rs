//! # WgpuBackend: GraphicsBackend on Top of wgpu
//!
//! Every flush from the batch becomes one render pass and one queue submit:
//!
//! ```text
//! draw(target, sampler, vertices)
//!   ├─ write vertices into the shared vertex buffer
//!   ├─ write the pixel→clip transform for the target's size
//!   ├─ render pass on the target view (LoadOp::Load)
//!   │    set pipeline, bind groups 0 + 1, draw_indexed(0..quads × 6)
//!   └─ queue.submit
//! ```
//!
//! Because buffer writes are ordered against submits, reusing one vertex
//! buffer for every flush is safe.
//!
//! The back buffer is acquired lazily on the first clear or draw of a frame
//! and held until [`present`](GraphicsBackend::present).

use std::sync::Arc;

use super::pipeline::{SpritePipeline, TEXTURE_FORMAT};
use super::GpuContext;
use crate::color::{Color, Pixel};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::graphics::resource::{FrameBufferId, RenderTarget, SamplerId, TextureId};
use crate::graphics::vertex::TransformUniform;
use crate::graphics::{GraphicsBackend, Vertex};
use crate::math::Size;
use crate::registry::Registry;

/// A texture (or frame buffer) together with everything needed to sample it.
struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
    width: u32,
    height: u32,
}

/// The back buffer for the frame being drawn.
struct Frame {
    texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

/// The production [`GraphicsBackend`], drawing into a window surface.
pub struct WgpuBackend {
    gpu: GpuContext,
    pipeline: SpritePipeline,
    textures: Registry<GpuTexture>,
    frame_buffers: Registry<GpuTexture>,
    frame: Option<Frame>,
    max_vertices: usize,
}

impl WgpuBackend {
    pub fn new(window: Arc<winit::window::Window>, config: &Config) -> Result<Self> {
        let gpu = GpuContext::new(window, config)?;
        let max_vertices = config.graphics.max_vertices;
        let pipeline = SpritePipeline::new(&gpu, max_vertices, config.graphics.texture_filter);
        Ok(Self {
            gpu,
            pipeline,
            textures: Registry::new(),
            frame_buffers: Registry::new(),
            frame: None,
            max_vertices,
        })
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    /// Drop any acquired frame and configure the surface again.
    pub fn reconfigure_surface(&mut self) {
        self.frame = None;
        self.gpu.reconfigure();
    }

    fn check_dimensions(&self, width: u32, height: u32) -> Result<()> {
        let max = self.gpu.max_texture_size();
        if width > max || height > max {
            return Err(Error::invalid_argument(
                "size",
                format!("{width}x{height} exceeds the device limit of {max}x{max}"),
            ));
        }
        Ok(())
    }

    fn allocate(&self, width: u32, height: u32, usage: wgpu::TextureUsages, label: &str) -> GpuTexture {
        let texture = self.gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.pipeline.texture_bind_group(&self.gpu.device, &view, label);
        GpuTexture {
            texture,
            view,
            bind_group,
            width,
            height,
        }
    }

    fn upload(&self, target: &GpuTexture, data: &[u8]) {
        self.gpu.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * target.width),
                rows_per_image: Some(target.height),
            },
            wgpu::Extent3d {
                width: target.width,
                height: target.height,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Acquire the back buffer if this frame has not done so yet.
    fn ensure_frame(&mut self) -> Result<()> {
        if self.frame.is_some() {
            return Ok(());
        }
        let texture = match self.gpu.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("surface lost or outdated, reconfiguring");
                self.gpu.reconfigure();
                self.gpu.surface.get_current_texture()?
            }
            Err(e) => return Err(e.into()),
        };
        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.frame = Some(Frame { texture, view });
        Ok(())
    }

    /// View, size and pipeline for a render target. The back buffer must
    /// already be acquired.
    fn target(&self, target: RenderTarget) -> Result<(&wgpu::TextureView, (u32, u32), &wgpu::RenderPipeline)> {
        match target {
            RenderTarget::BackBuffer => {
                let frame = self.frame.as_ref().ok_or(Error::Surface(wgpu::SurfaceError::Lost))?;
                Ok((&frame.view, self.gpu.surface_size(), &self.pipeline.surface_pipeline))
            }
            RenderTarget::FrameBuffer(id) => {
                let fb = self.frame_buffers.get(id.0).ok_or_else(|| invalid_frame_buffer(id))?;
                Ok((&fb.view, (fb.width, fb.height), &self.pipeline.frame_buffer_pipeline))
            }
        }
    }

    fn sampler_bind_group(&self, sampler: SamplerId) -> Result<&wgpu::BindGroup> {
        match sampler {
            SamplerId::Texture(id) => self.textures.get(id.0).map(|t| &t.bind_group).ok_or_else(|| invalid_texture(id)),
            SamplerId::FrameBuffer(id) => self
                .frame_buffers
                .get(id.0)
                .map(|fb| &fb.bind_group)
                .ok_or_else(|| invalid_frame_buffer(id)),
        }
    }

    fn submit(&self, encoder: wgpu::CommandEncoder) {
        self.gpu.queue.submit(std::iter::once(encoder.finish()));
    }
}

impl GraphicsBackend for WgpuBackend {
    fn create_texture(&mut self, width: u32, height: u32, data: Option<&[u8]>) -> Result<TextureId> {
        self.check_dimensions(width, height)?;
        let texture = self.allocate(
            width,
            height,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            "sprite texture",
        );
        if let Some(data) = data {
            self.upload(&texture, data);
        }
        let id = TextureId(self.textures.insert(texture));
        log::debug!("created {id} ({width}x{height})");
        Ok(id)
    }

    fn set_texture_data(&mut self, id: TextureId, data: &[u8]) -> Result<()> {
        let texture = self.textures.get(id.0).ok_or_else(|| invalid_texture(id))?;
        self.upload(texture, data);
        Ok(())
    }

    fn free_texture(&mut self, id: TextureId) -> Result<()> {
        let texture = self.textures.remove(id.0).ok_or_else(|| invalid_texture(id))?;
        texture.texture.destroy();
        log::debug!("freed {id}");
        Ok(())
    }

    fn create_frame_buffer(&mut self, width: u32, height: u32) -> Result<FrameBufferId> {
        self.check_dimensions(width, height)?;
        let fb = self.allocate(
            width,
            height,
            wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST,
            "frame buffer",
        );
        let id = FrameBufferId(self.frame_buffers.insert(fb));
        log::debug!("created {id} ({width}x{height})");
        Ok(id)
    }

    fn set_frame_buffer_data(&mut self, id: FrameBufferId, data: &[Pixel]) -> Result<()> {
        let fb = self.frame_buffers.get(id.0).ok_or_else(|| invalid_frame_buffer(id))?;
        self.upload(fb, bytemuck::cast_slice(data));
        Ok(())
    }

    fn free_frame_buffer(&mut self, id: FrameBufferId) -> Result<()> {
        let fb = self.frame_buffers.remove(id.0).ok_or_else(|| invalid_frame_buffer(id))?;
        fb.texture.destroy();
        log::debug!("freed {id}");
        Ok(())
    }

    fn back_buffer_size(&self) -> Size {
        let (width, height) = self.gpu.surface_size();
        Size::new(width as i32, height as i32)
    }

    fn clear(&mut self, target: RenderTarget, color: Color) -> Result<()> {
        if target == RenderTarget::BackBuffer {
            self.ensure_frame()?;
        }
        let (view, _, _) = self.target(target)?;
        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("clear encoder"),
            });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("clear pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(color.into()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }
        self.submit(encoder);
        Ok(())
    }

    fn draw(&mut self, target: RenderTarget, sampler: SamplerId, vertices: &[Vertex]) -> Result<()> {
        if vertices.len() > self.max_vertices {
            return Err(Error::invalid_argument(
                "vertices",
                format!("{} vertices exceed the batch capacity of {}", vertices.len(), self.max_vertices),
            ));
        }
        let quads = (vertices.len() / 4) as u32;

        if target == RenderTarget::BackBuffer {
            self.ensure_frame()?;
        }
        let bind_group = self.sampler_bind_group(sampler)?;
        let (view, (width, height), pipeline) = self.target(target)?;
        let queue = &self.gpu.queue;

        queue.write_buffer(&self.pipeline.vertex_buffer, 0, bytemuck::cast_slice(vertices));
        queue.write_buffer(
            &self.pipeline.transform_buffer,
            0,
            bytemuck::cast_slice(&[TransformUniform::for_target(width, height)]),
        );

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sprite encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sprite pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &self.pipeline.transform_bind_group, &[]);
            pass.set_bind_group(1, bind_group, &[]);
            pass.set_vertex_buffer(0, self.pipeline.vertex_buffer.slice(..));
            pass.set_index_buffer(self.pipeline.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            pass.draw_indexed(0..quads * 6, 0, 0..1);
        }
        self.submit(encoder);
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        match self.frame.take() {
            Some(frame) => {
                drop(frame.view);
                frame.texture.present();
            }
            None => log::trace!("present with nothing drawn this frame"),
        }
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        // The held frame belongs to the old surface configuration.
        self.frame = None;
        self.gpu.resize(width, height);
    }
}

fn invalid_texture(id: TextureId) -> Error {
    Error::InvalidHandle {
        kind: "texture",
        handle: id.0.to_string(),
    }
}

fn invalid_frame_buffer(id: FrameBufferId) -> Error {
    Error::InvalidHandle {
        kind: "frame buffer",
        handle: id.0.to_string(),
    }
}
