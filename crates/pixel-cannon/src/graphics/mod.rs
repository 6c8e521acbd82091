//! # Graphics: Batched Sprite and Text Drawing
//!
//! Everything above the GPU API lives here:
//!
//! - [`vertex`]: `Vertex` layout and the pixel-space projection
//! - [`resource`]: textures, frame buffers and render targets
//! - [`backend`]: the [`GraphicsBackend`] trait a GPU API implements
//! - [`batch`]: the vertex accumulator and its flush policy
//! - [`context`]: [`GraphicsContext`], the drawing API
//! - [`text`]: string layout on top of sprites
//!
//! The only production backend is
//! [`WgpuBackend`](crate::render::WgpuBackend).

pub mod backend;
pub mod batch;
pub mod context;
pub mod resource;
pub mod text;
pub mod vertex;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::GraphicsBackend;
pub use batch::{FlushReason, RenderStats};
pub use context::{DEFAULT_MAX_VERTICES, Destination, GraphicsContext, MAX_VERTICES_LIMIT, SpriteOptions};
pub use resource::{FrameBuffer, FrameBufferId, RenderTarget, Sampler, SamplerId, Texture, TextureId};
pub use text::TextOptions;
pub use vertex::Vertex;
