//! The seam between the batching layer and a GPU API.
//!
//! [`GraphicsContext`](super::GraphicsContext) owns all batching policy and
//! argument validation. A backend only has to store resources, clear targets
//! and draw a slice of quads. Vertices always arrive as whole quads in
//! top-left, top-right, bottom-right, bottom-left order, so a backend can use
//! a static index buffer with the pattern `[v, v+1, v+3, v+1, v+2, v+3]`.

use crate::color::{Color, Pixel};
use crate::error::Result;
use crate::math::Size;

use super::resource::{FrameBufferId, RenderTarget, SamplerId, TextureId};
use super::vertex::Vertex;

/// Operations a GPU API must provide to drive a [`GraphicsContext`](super::GraphicsContext).
pub trait GraphicsBackend {
    /// Allocate a `width × height` RGBA8 texture. `data`, if given, has
    /// already been checked to hold exactly `width * height * 4` bytes.
    fn create_texture(&mut self, width: u32, height: u32, data: Option<&[u8]>) -> Result<TextureId>;

    /// Replace the full contents of a texture.
    fn set_texture_data(&mut self, id: TextureId, data: &[u8]) -> Result<()>;

    fn free_texture(&mut self, id: TextureId) -> Result<()>;

    /// Allocate an off-screen render target that can also be sampled.
    fn create_frame_buffer(&mut self, width: u32, height: u32) -> Result<FrameBufferId>;

    /// Replace the full contents of a frame buffer.
    fn set_frame_buffer_data(&mut self, id: FrameBufferId, data: &[Pixel]) -> Result<()>;

    fn free_frame_buffer(&mut self, id: FrameBufferId) -> Result<()>;

    /// Current size of the window's back buffer.
    fn back_buffer_size(&self) -> Size;

    fn clear(&mut self, target: RenderTarget, color: Color) -> Result<()>;

    /// Draw `vertices` (a whole number of quads) into `target`, sampling
    /// from `sampler`.
    fn draw(&mut self, target: RenderTarget, sampler: SamplerId, vertices: &[Vertex]) -> Result<()>;

    /// Show the back buffer.
    fn present(&mut self) -> Result<()>;

    fn resize(&mut self, width: u32, height: u32);
}
