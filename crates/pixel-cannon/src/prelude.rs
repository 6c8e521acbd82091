//! Convenience re-exports: `use pixel_cannon::prelude::*` for the common items.

pub use crate::app::{App, Game, GameContext};
pub use crate::color::{Color, Pixel};
pub use crate::config::{Config, GraphicsConfig, PowerPreference, TextureFilter, WindowConfig};
pub use crate::error::{Error, Result};
pub use crate::font::{Character, Font};
pub use crate::graphics::{
    Destination, FrameBuffer, GraphicsBackend, GraphicsContext, RenderStats, RenderTarget, Sampler, SpriteOptions,
    TextOptions, Texture,
};
pub use crate::input::{Cursor, Input, KeyCode, MouseButton};
pub use crate::logger::init_logger;
pub use crate::math::{Point, Rectangle, Size, Vec2};
pub use crate::surface::Surface;
pub use crate::time::Time;
