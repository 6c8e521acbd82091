//! Text layout: strings become one sprite per glyph from the font's sheet.
//!
//! The cursor starts at the destination's top-left corner. Each glyph is
//! drawn at `cursor + offset` and the cursor moves right by the glyph's
//! advance. A `'\n'`, or a glyph that would cross the right edge of the
//! destination rectangle, moves the cursor to the start of the next line.
//! Layout stops as soon as a new line would extend past the bottom edge.
//!
//! Scale and rotation apply to the string as a whole: every glyph pivots
//! around the same `origin`, measured from the string's top-left corner.

use glam::Vec2;

use crate::color::Color;
use crate::error::Result;
use crate::font::Font;
use crate::math::{Rectangle, Size};

use super::backend::GraphicsBackend;
use super::context::{GraphicsContext, QuadPlacement, check_layer_depth};
use super::resource::RenderTarget;
use super::Destination;

/// Optional parameters for [`GraphicsContext::draw_string`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextOptions {
    /// Extra pixels between lines.
    pub line_spacing: i32,
    /// Layout box for a position destination. `None` means no wrapping and
    /// no clipping.
    pub size: Option<Size>,
    pub tint: Color,
    /// Pivot for scale and rotation, in unscaled pixels from the string's
    /// top-left corner.
    pub origin: Vec2,
    pub scale: Vec2,
    /// Radians.
    pub rotation: f32,
    pub layer_depth: f32,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            line_spacing: 0,
            size: None,
            tint: Color::WHITE,
            origin: Vec2::ZERO,
            scale: Vec2::ONE,
            rotation: 0.0,
            layer_depth: 0.0,
        }
    }
}

impl TextOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_line_spacing(mut self, line_spacing: i32) -> Self {
        self.line_spacing = line_spacing;
        self
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_tint(mut self, tint: Color) -> Self {
        self.tint = tint;
        self
    }

    pub fn with_origin(mut self, origin: Vec2) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_layer_depth(mut self, layer_depth: f32) -> Self {
        self.layer_depth = layer_depth;
        self
    }
}

/// Edges of the layout box. Unbounded sides are infinite.
struct TextBounds {
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
}

impl TextBounds {
    fn new(position: Vec2, size: Option<Size>) -> Self {
        match size {
            Some(size) => Self {
                left: position.x,
                top: position.y,
                right: position.x + size.width as f32,
                bottom: position.y + size.height as f32,
            },
            None => Self {
                left: position.x,
                top: position.y,
                right: f32::INFINITY,
                bottom: f32::INFINITY,
            },
        }
    }

    fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

impl From<Rectangle> for TextBounds {
    fn from(r: Rectangle) -> Self {
        Self::new(Vec2::new(r.x as f32, r.y as f32), Some(r.size()))
    }
}

impl<B: GraphicsBackend> GraphicsContext<B> {
    /// Queue `text` with `font`, returning the cursor after the last
    /// character that was laid out.
    ///
    /// A [`Destination::Rectangle`] wraps at its right edge and stops at its
    /// bottom edge; a [`Destination::Position`] only does so when
    /// [`TextOptions::size`] is set. Characters the font lacks are skipped.
    pub fn draw_string(
        &mut self,
        target: impl Into<RenderTarget>,
        font: &Font,
        text: &str,
        destination: impl Into<Destination>,
        options: &TextOptions,
    ) -> Result<Vec2> {
        let target = target.into();
        self.ensure_drawing()?;
        check_layer_depth(options.layer_depth)?;

        let destination = destination.into();
        let start = destination.position();
        if text.is_empty() {
            return Ok(start);
        }

        let bounds = match destination {
            Destination::Rectangle(r) => TextBounds::from(r),
            Destination::Position(p) => TextBounds::new(p, options.size),
        };

        let scale = options.scale;
        let line_height = font.line_height() as f32 * scale.y;
        let line_step = line_height + options.line_spacing as f32;
        if line_height > bounds.height() {
            return Ok(start);
        }

        let mut cursor = start;
        for ch in text.chars() {
            if ch == '\r' {
                continue;
            }

            let glyph = if ch == '\n' {
                None
            } else {
                match font.character(ch) {
                    Some(c) => Some(*c),
                    None => continue,
                }
            };

            let overflows = glyph.is_some_and(|g| {
                cursor.x > bounds.left && cursor.x + g.width as f32 * scale.x > bounds.right
            });
            if glyph.is_none() || overflows {
                cursor.x = bounds.left;
                cursor.y += line_step;
                if cursor.y + line_height > bounds.bottom {
                    return Ok(cursor);
                }
            }

            let Some(glyph) = glyph else {
                continue;
            };

            if glyph.width > 0 && glyph.height > 0 {
                let offset = Vec2::new(glyph.offset_x as f32, glyph.offset_y as f32) * scale;
                self.queue_quad(
                    target,
                    font.texture(),
                    QuadPlacement {
                        anchor: start,
                        offset: cursor - start + offset - scale * options.origin,
                        size: Vec2::new(glyph.width as f32, glyph.height as f32) * scale,
                        rotation: options.rotation,
                        source: glyph.rectangle(),
                        tint: options.tint,
                        layer_depth: options.layer_depth,
                    },
                )?;
            }

            cursor.x += glyph.advance_x as f32 * scale.x;
        }

        Ok(cursor)
    }
}
