//! # PixelCannon: Minimal 2D Sprite and Text Batching
//!
//! Sprites and glyphs are queued as textured quads and merged into as few
//! draw calls as possible: a batch only breaks when the render target or the
//! sampled image changes, or when the vertex buffer is full.
//!
//! - [`graphics`]: the backend-independent drawing API ([`GraphicsContext`](graphics::GraphicsContext))
//! - [`render`]: the wgpu backend
//! - [`font`]: glyph sheets and text measuring
//! - [`app`] / [`window`]: a winit event loop driving a [`Game`](app::Game)
//!
//! Start with `use pixel_cannon::prelude::*`.

pub mod app;
pub mod color;
pub mod config;
pub mod error;
pub mod font;
pub mod graphics;
pub mod input;
pub mod logger;
pub mod math;
pub mod prelude;
pub mod registry;
pub mod render;
pub mod surface;
pub mod time;
pub mod window;

pub use error::{Error, Result};
