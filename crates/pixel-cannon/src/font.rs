//! # Font: Glyph Sheets and Text Metrics
//!
//! A [`Font`] is a texture holding every glyph plus a table of
//! [`Character`] metrics saying where each glyph lives on the sheet and how
//! to place it relative to the text cursor. Drawing text is then just drawing
//! sprites from that texture (see
//! [`GraphicsContext::draw_string`](crate::graphics::GraphicsContext::draw_string)).
//!
//! ## Rasterization
//!
//! With the `text` feature (on by default), TrueType/OpenType fonts are
//! rasterized with [fontdue](https://docs.rs/fontdue). Each glyph becomes
//! white pixels with the coverage in the alpha channel
//! (`[255, 255, 255, coverage]`), so the sprite shader's
//! `texture × tint` produces text in the tint color.
//!
//! ## Sheet Packing
//!
//! Glyphs are packed left to right into rows with 1px of padding around
//! each. The sheet starts small and doubles its shorter side until
//! everything fits, so both dimensions are always powers of two:
//!
//! ```text
//! ┌───────────────────────────────┐
//! │ A B C D E F G H I J K L M N O │ ← row height = tallest glyph in the row
//! │ P Q R S T U V W X Y Z a b c d │
//! │ e f g h i j k l ...           │
//! └───────────────────────────────┘
//! ```
//!
//! ## Metrics
//!
//! ```text
//!  line top ─────────────────────────────
//!               │ offset_y
//!             ┌─┴──┐
//!  offset_x ──┤ g  │ height
//!             └────┘
//!  cursor ────────────► advance_x
//! ```
//!
//! `offset_y` is measured from the top of the line, not from the baseline, so
//! a glyph's top-left corner is simply `cursor + (offset_x, offset_y)`.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::graphics::Texture;
use crate::math::{Rectangle, Size};

#[cfg(feature = "text")]
use crate::color::Pixel;
#[cfg(feature = "text")]
use crate::graphics::{GraphicsBackend, GraphicsContext};
#[cfg(feature = "text")]
use crate::surface::Surface;

/// Placement of one glyph on the sheet and relative to the cursor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Character {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Left bearing.
    pub offset_x: i32,
    /// Distance from the top of the line to the top of the glyph.
    pub offset_y: i32,
    pub advance_x: i32,
    pub advance_y: i32,
}

impl Character {
    /// The glyph's region of the sheet.
    pub fn rectangle(&self) -> Rectangle {
        Rectangle::new(self.x, self.y, self.width, self.height)
    }
}

/// A glyph sheet texture plus per-character metrics.
#[derive(Debug)]
pub struct Font {
    texture: Texture,
    characters: HashMap<char, Character>,
    line_height: i32,
}

impl Font {
    pub fn new(texture: Texture, characters: HashMap<char, Character>, line_height: i32) -> Self {
        Self {
            texture,
            characters,
            line_height,
        }
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    pub fn characters(&self) -> &HashMap<char, Character> {
        &self.characters
    }

    pub fn character(&self, ch: char) -> Option<&Character> {
        self.characters.get(&ch)
    }

    pub fn line_height(&self) -> i32 {
        self.line_height
    }

    /// Give up the font and keep its texture, e.g. to free it.
    pub fn into_texture(self) -> Texture {
        self.texture
    }

    /// Size of `text` when drawn without scaling or wrapping.
    ///
    /// Height starts at one line; every `'\n'` adds `line_height +
    /// line_spacing`. Width is the widest line's sum of advances. `'\r'` and
    /// characters the font lacks take no space.
    pub fn measure_string(&self, text: &str, line_spacing: i32) -> Size {
        self.measure_chars(text.chars(), line_spacing)
    }

    /// Like [`measure_string`](Self::measure_string) for `length` characters
    /// starting at character index `start`.
    pub fn measure_range(&self, text: &str, start: usize, length: usize, line_spacing: i32) -> Result<Size> {
        let count = text.chars().count();
        if start > count {
            return Err(Error::invalid_argument(
                "start",
                format!("{start} is not an index within the string (length {count})"),
            ));
        }
        if start.checked_add(length).is_none_or(|end| end > count) {
            return Err(Error::invalid_argument(
                "length",
                format!("start + length is greater than the string's length ({count})"),
            ));
        }

        Ok(self.measure_chars(text.chars().skip(start).take(length), line_spacing))
    }

    fn measure_chars(&self, chars: impl Iterator<Item = char>, line_spacing: i32) -> Size {
        let mut size = Size::new(0, self.line_height);
        let mut line_width = 0;

        for ch in chars {
            match ch {
                '\n' => {
                    size.width = size.width.max(line_width);
                    line_width = 0;
                    size.height += self.line_height + line_spacing;
                }
                '\r' => {}
                _ => {
                    if let Some(c) = self.characters.get(&ch) {
                        line_width += c.advance_x;
                    }
                }
            }
        }

        size.width = size.width.max(line_width);
        size
    }
}

#[cfg(feature = "text")]
impl Font {
    /// Rasterize `chars` from a font file at `size` pixels.
    pub fn load<B: GraphicsBackend>(
        ctx: &mut GraphicsContext<B>,
        path: impl AsRef<std::path::Path>,
        size: f32,
        chars: impl IntoIterator<Item = char>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("loading font '{}' at {size}px", path.display());
        Self::from_bytes(ctx, &bytes, size, chars)
    }

    /// Rasterize the printable ASCII range (32–126).
    pub fn ascii<B: GraphicsBackend>(
        ctx: &mut GraphicsContext<B>,
        path: impl AsRef<std::path::Path>,
        size: f32,
    ) -> Result<Self> {
        Self::load(ctx, path, size, (32u8..=126).map(char::from))
    }

    /// Rasterize `chars` from in-memory TrueType/OpenType data.
    pub fn from_bytes<B: GraphicsBackend>(
        ctx: &mut GraphicsContext<B>,
        bytes: &[u8],
        size: f32,
        chars: impl IntoIterator<Item = char>,
    ) -> Result<Self> {
        if !(size.is_finite() && size > 0.0) {
            return Err(Error::invalid_argument(
                "size",
                format!("font size must be positive, was {size}"),
            ));
        }

        let font = fontdue::Font::from_bytes(
            bytes,
            fontdue::FontSettings {
                scale: size,
                ..Default::default()
            },
        )
        .map_err(|e| Error::Font(e.to_string()))?;

        let mut glyphs = Vec::new();
        for ch in chars {
            if glyphs.iter().any(|g: &RasterGlyph| g.ch == ch) {
                continue;
            }
            if font.lookup_glyph_index(ch) == 0 && !ch.is_whitespace() {
                log::warn!("font has no glyph for '{ch}' (U+{:04X}), skipping", ch as u32);
                continue;
            }
            let (metrics, bitmap) = font.rasterize(ch, size);
            glyphs.push(RasterGlyph::from_fontdue(ch, &metrics, bitmap));
        }

        let line = font.horizontal_line_metrics(size);
        let ascent = line.map_or(size, |m| m.ascent);
        let line_height = line.map_or(size, |m| m.new_line_size).round() as i32;

        let (sheet, characters) = pack_glyphs(&glyphs, ascent.round() as i32)?;
        log::debug!(
            "rasterized {} glyphs into a {}x{} sheet, line height {line_height}",
            characters.len(),
            sheet.width(),
            sheet.height()
        );

        let texture = ctx.create_texture_from_surface(&sheet)?;
        Ok(Self::new(texture, characters, line_height))
    }
}

/// One rasterized glyph before packing. `coverage` is `width × height`
/// bytes, row-major, top row first.
#[cfg(feature = "text")]
#[derive(Debug, Clone)]
struct RasterGlyph {
    ch: char,
    width: u32,
    height: u32,
    coverage: Vec<u8>,
    xmin: i32,
    /// Baseline to glyph bottom, Y up.
    ymin: i32,
    advance_x: f32,
    advance_y: f32,
}

#[cfg(feature = "text")]
impl RasterGlyph {
    fn from_fontdue(ch: char, metrics: &fontdue::Metrics, coverage: Vec<u8>) -> Self {
        Self {
            ch,
            width: metrics.width as u32,
            height: metrics.height as u32,
            coverage,
            xmin: metrics.xmin,
            ymin: metrics.ymin,
            advance_x: metrics.advance_width,
            advance_y: metrics.advance_height,
        }
    }
}

#[cfg(feature = "text")]
const GLYPH_PADDING: u32 = 1;
#[cfg(feature = "text")]
const MIN_SHEET_SIZE: u32 = 16;
#[cfg(feature = "text")]
const MAX_SHEET_SIZE: u32 = 8192;

/// Pack glyphs into the smallest power-of-two sheet (growing the shorter
/// side first) and compute their metrics. `ascent` is the baseline's distance
/// from the line top.
#[cfg(feature = "text")]
fn pack_glyphs(glyphs: &[RasterGlyph], ascent: i32) -> Result<(Surface, HashMap<char, Character>)> {
    let (mut width, mut height) = (MIN_SHEET_SIZE, MIN_SHEET_SIZE);
    let positions = loop {
        if let Some(positions) = shelf_layout(glyphs, width, height) {
            break positions;
        }
        if width <= height {
            width *= 2;
        } else {
            height *= 2;
        }
        if width > MAX_SHEET_SIZE || height > MAX_SHEET_SIZE {
            return Err(Error::Font(format!(
                "{} glyphs do not fit in a {MAX_SHEET_SIZE}x{MAX_SHEET_SIZE} sheet",
                glyphs.len()
            )));
        }
    };

    let mut sheet = Surface::new(width, height);
    let mut characters = HashMap::with_capacity(glyphs.len());

    for (glyph, &(x, y)) in glyphs.iter().zip(&positions) {
        for gy in 0..glyph.height {
            for gx in 0..glyph.width {
                let alpha = glyph.coverage[(gy * glyph.width + gx) as usize];
                sheet[(x + gx, y + gy)] = Pixel::new(255, 255, 255, alpha);
            }
        }

        characters.insert(
            glyph.ch,
            Character {
                x: x as i32,
                y: y as i32,
                width: glyph.width as i32,
                height: glyph.height as i32,
                offset_x: glyph.xmin,
                offset_y: ascent - (glyph.ymin + glyph.height as i32),
                advance_x: glyph.advance_x.round() as i32,
                advance_y: glyph.advance_y.round() as i32,
            },
        );
    }

    Ok((sheet, characters))
}

/// Top-left position of every glyph on a `width × height` sheet, or `None`
/// if they don't fit. Empty glyphs (spaces) take no room and sit at `(0, 0)`.
#[cfg(feature = "text")]
fn shelf_layout(glyphs: &[RasterGlyph], width: u32, height: u32) -> Option<Vec<(u32, u32)>> {
    let mut positions = Vec::with_capacity(glyphs.len());
    let mut x = GLYPH_PADDING;
    let mut y = GLYPH_PADDING;
    let mut row_height = 0;

    for glyph in glyphs {
        if glyph.width == 0 || glyph.height == 0 {
            positions.push((0, 0));
            continue;
        }

        if x + glyph.width + GLYPH_PADDING > width {
            x = GLYPH_PADDING;
            y += row_height + GLYPH_PADDING;
            row_height = 0;
        }
        if x + glyph.width + GLYPH_PADDING > width || y + glyph.height + GLYPH_PADDING > height {
            return None;
        }

        positions.push((x, y));
        x += glyph.width + GLYPH_PADDING;
        row_height = row_height.max(glyph.height);
    }

    Some(positions)
}
