//! A backend that records calls instead of talking to a GPU.

use crate::color::{Color, Pixel};
use crate::error::{Error, Result};
use crate::math::Size;
use crate::registry::Registry;

use super::backend::GraphicsBackend;
use super::resource::{FrameBufferId, RenderTarget, SamplerId, TextureId};
use super::vertex::Vertex;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum BackendCall {
    CreateTexture { id: TextureId, width: u32, height: u32, has_data: bool },
    SetTextureData { id: TextureId, len: usize },
    FreeTexture(TextureId),
    CreateFrameBuffer { id: FrameBufferId, width: u32, height: u32 },
    SetFrameBufferData { id: FrameBufferId, len: usize },
    FreeFrameBuffer(FrameBufferId),
    Clear { target: RenderTarget, color: Color },
    Draw { target: RenderTarget, sampler: SamplerId, vertices: Vec<Vertex> },
    Present,
    Resize { width: u32, height: u32 },
}

pub(crate) struct RecordingBackend {
    size: Size,
    textures: Registry<(u32, u32)>,
    frame_buffers: Registry<(u32, u32)>,
    calls: Vec<BackendCall>,
}

impl RecordingBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Size::new(width as i32, height as i32),
            textures: Registry::new(),
            frame_buffers: Registry::new(),
            calls: Vec::new(),
        }
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    /// `(target, sampler, vertex count)` for every draw call, in order.
    pub fn draws(&self) -> Vec<(RenderTarget, SamplerId, usize)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                BackendCall::Draw {
                    target,
                    sampler,
                    vertices,
                } => Some((*target, *sampler, vertices.len())),
                _ => None,
            })
            .collect()
    }

    /// Vertices of the `n`th draw call.
    pub fn drawn_vertices(&self, n: usize) -> Vec<Vertex> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                BackendCall::Draw { vertices, .. } => Some(vertices.clone()),
                _ => None,
            })
            .nth(n)
            .unwrap_or_default()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn live_frame_buffers(&self) -> usize {
        self.frame_buffers.len()
    }

    /// Create a texture directly on the backend and return it as a sampler.
    pub fn texture_sampler(&mut self, width: u32, height: u32) -> SamplerId {
        let id = self.textures.insert((width, height));
        SamplerId::Texture(TextureId(id))
    }

    pub fn frame_buffer_id(&mut self, width: u32, height: u32) -> FrameBufferId {
        FrameBufferId(self.frame_buffers.insert((width, height)))
    }
}

impl GraphicsBackend for RecordingBackend {
    fn create_texture(&mut self, width: u32, height: u32, data: Option<&[u8]>) -> Result<TextureId> {
        let id = TextureId(self.textures.insert((width, height)));
        self.calls.push(BackendCall::CreateTexture {
            id,
            width,
            height,
            has_data: data.is_some(),
        });
        Ok(id)
    }

    fn set_texture_data(&mut self, id: TextureId, data: &[u8]) -> Result<()> {
        if !self.textures.contains(id.0) {
            return Err(Error::InvalidHandle {
                kind: "texture",
                handle: id.0.to_string(),
            });
        }
        self.calls.push(BackendCall::SetTextureData {
            id,
            len: data.len(),
        });
        Ok(())
    }

    fn free_texture(&mut self, id: TextureId) -> Result<()> {
        self.textures.remove(id.0).ok_or(Error::InvalidHandle {
            kind: "texture",
            handle: id.0.to_string(),
        })?;
        self.calls.push(BackendCall::FreeTexture(id));
        Ok(())
    }

    fn create_frame_buffer(&mut self, width: u32, height: u32) -> Result<FrameBufferId> {
        let id = FrameBufferId(self.frame_buffers.insert((width, height)));
        self.calls
            .push(BackendCall::CreateFrameBuffer { id, width, height });
        Ok(id)
    }

    fn set_frame_buffer_data(&mut self, id: FrameBufferId, data: &[Pixel]) -> Result<()> {
        if !self.frame_buffers.contains(id.0) {
            return Err(Error::InvalidHandle {
                kind: "frame buffer",
                handle: id.0.to_string(),
            });
        }
        self.calls.push(BackendCall::SetFrameBufferData {
            id,
            len: data.len(),
        });
        Ok(())
    }

    fn free_frame_buffer(&mut self, id: FrameBufferId) -> Result<()> {
        self.frame_buffers.remove(id.0).ok_or(Error::InvalidHandle {
            kind: "frame buffer",
            handle: id.0.to_string(),
        })?;
        self.calls.push(BackendCall::FreeFrameBuffer(id));
        Ok(())
    }

    fn back_buffer_size(&self) -> Size {
        self.size
    }

    fn clear(&mut self, target: RenderTarget, color: Color) -> Result<()> {
        self.calls.push(BackendCall::Clear { target, color });
        Ok(())
    }

    fn draw(&mut self, target: RenderTarget, sampler: SamplerId, vertices: &[Vertex]) -> Result<()> {
        assert!(!vertices.is_empty(), "empty draw call");
        assert_eq!(vertices.len() % 4, 0, "partial quad");
        self.calls.push(BackendCall::Draw {
            target,
            sampler,
            vertices: vertices.to_vec(),
        });
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        self.calls.push(BackendCall::Present);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = Size::new(width as i32, height as i32);
        self.calls.push(BackendCall::Resize { width, height });
    }
}
