//! # Resources: Textures, Frame Buffers, and What Can Be Drawn Where
//!
//! The graphics context hands out [`Texture`] and [`FrameBuffer`] values.
//! Both are move-only: they are not `Clone` or `Copy`, and the `free_*`
//! methods on [`GraphicsContext`](super::GraphicsContext) take them by value,
//! so freeing the same resource twice is a compile error. A resource that is
//! never freed lives until the context (and with it the backend) is dropped.
//!
//! Two small `Copy` types describe batch state:
//!
//! - [`RenderTarget`]: where quads are drawn (the back buffer or a frame buffer)
//! - [`SamplerId`]: what quads are textured with (a texture or a frame buffer)
//!
//! The batch compares these to decide when it has to flush.

use std::fmt;

use crate::math::Size;
use crate::registry::Handle;

/// Backend identifier for a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub(crate) Handle);

/// Backend identifier for a frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameBufferId(pub(crate) Handle);

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "texture {}", self.0)
    }
}

impl fmt::Display for FrameBufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame buffer {}", self.0)
    }
}

/// An image on the GPU that can be sampled when drawing sprites.
#[derive(Debug, PartialEq, Eq)]
pub struct Texture {
    pub(crate) id: TextureId,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl Texture {
    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width as i32, self.height as i32)
    }
}

/// An off-screen image that can be both drawn into and sampled from.
#[derive(Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    pub(crate) id: FrameBufferId,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl FrameBuffer {
    pub fn id(&self) -> FrameBufferId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width as i32, self.height as i32)
    }
}

/// Where a batch is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderTarget {
    /// The window's swap-chain image.
    BackBuffer,
    /// An off-screen frame buffer.
    FrameBuffer(FrameBufferId),
}

impl From<&FrameBuffer> for RenderTarget {
    fn from(fb: &FrameBuffer) -> Self {
        RenderTarget::FrameBuffer(fb.id)
    }
}

impl fmt::Display for RenderTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderTarget::BackBuffer => f.write_str("back buffer"),
            RenderTarget::FrameBuffer(id) => id.fmt(f),
        }
    }
}

/// What a batch samples from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerId {
    Texture(TextureId),
    FrameBuffer(FrameBufferId),
}

impl fmt::Display for SamplerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplerId::Texture(id) => id.fmt(f),
            SamplerId::FrameBuffer(id) => id.fmt(f),
        }
    }
}

/// Anything a sprite can be textured with.
pub trait Sampler {
    fn sampler_id(&self) -> SamplerId;

    /// Size in pixels. Source rectangles and UVs are relative to this.
    fn sampler_size(&self) -> (u32, u32);
}

impl Sampler for Texture {
    fn sampler_id(&self) -> SamplerId {
        SamplerId::Texture(self.id)
    }

    fn sampler_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Sampler for FrameBuffer {
    fn sampler_id(&self) -> SamplerId {
        SamplerId::FrameBuffer(self.id)
    }

    fn sampler_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
