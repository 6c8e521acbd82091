//! Float and byte RGBA colors.
//!
//! [`Color`] is what the renderer consumes: four `f32` channels clamped to
//! `[0, 1]`, copied straight into each [`Vertex`](crate::graphics::Vertex).
//! [`Pixel`] is the byte form used for CPU-side image data
//! ([`Surface`](crate::surface::Surface), texture uploads).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An RGBA color with each channel clamped to `[0, 1]`.
///
/// Serialized as an `RRGGBBAA` hex string.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    r: f32,
    g: f32,
    b: f32,
    a: f32,
}

impl Color {
    pub const WHITE: Self = Self::from_bytes(0xFF, 0xFF, 0xFF, 0xFF);
    pub const BLACK: Self = Self::from_bytes(0x00, 0x00, 0x00, 0xFF);
    pub const TRANSPARENT: Self = Self::from_bytes(0x00, 0x00, 0x00, 0x00);
    pub const RED: Self = Self::from_bytes(0xFF, 0x00, 0x00, 0xFF);
    pub const GREEN: Self = Self::from_bytes(0x00, 0x80, 0x00, 0xFF);
    pub const BLUE: Self = Self::from_bytes(0x00, 0x00, 0xFF, 0xFF);
    pub const YELLOW: Self = Self::from_bytes(0xFF, 0xFF, 0x00, 0xFF);
    pub const MAGENTA: Self = Self::from_bytes(0xFF, 0x00, 0xFF, 0xFF);
    pub const CYAN: Self = Self::from_bytes(0x00, 0xFF, 0xFF, 0xFF);
    pub const GRAY: Self = Self::from_bytes(0x80, 0x80, 0x80, 0xFF);
    pub const CORNFLOWER_BLUE: Self = Self::from_bytes(0x64, 0x95, 0xED, 0xFF);

    /// Create a color from RGBA. Each channel is clamped to `[0, 1]`.
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self {
            r: clamp_unit(r),
            g: clamp_unit(g),
            b: clamp_unit(b),
            a: clamp_unit(a),
        }
    }

    /// Create an opaque color from RGB.
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Create a color from byte channels (`0..=255`).
    pub const fn from_bytes(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: a as f32 / 255.0,
        }
    }

    pub fn r(&self) -> f32 {
        self.r
    }

    pub fn g(&self) -> f32 {
        self.g
    }

    pub fn b(&self) -> f32 {
        self.b
    }

    pub fn a(&self) -> f32 {
        self.a
    }

    pub fn set_r(&mut self, value: f32) {
        self.r = clamp_unit(value);
    }

    pub fn set_g(&mut self, value: f32) {
        self.g = clamp_unit(value);
    }

    pub fn set_b(&mut self, value: f32) {
        self.b = clamp_unit(value);
    }

    pub fn set_a(&mut self, value: f32) {
        self.a = clamp_unit(value);
    }

    /// A copy with each channel capped at the given maximum.
    pub fn limit(&self, r: f32, g: f32, b: f32, a: f32) -> Self {
        Self::new(self.r.min(r), self.g.min(g), self.b.min(b), self.a.min(a))
    }

    /// A copy with each channel capped at the other color's channel.
    pub fn limit_color(&self, other: Color) -> Self {
        self.limit(other.r, other.g, other.b, other.a)
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Format as `RRGGBBAA` (uppercase hex).
    pub fn to_hex_string(&self) -> String {
        let p = Pixel::from(*self);
        format!("{:02X}{:02X}{:02X}{:02X}", p.r, p.g, p.b, p.a)
    }

    /// Parse an `RRGGBBAA` hex string. An optional leading `#` is accepted.
    pub fn from_hex_string(hex: &str) -> Result<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 8 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::invalid_argument(
                "hex",
                format!("expected 8 hex digits (RRGGBBAA), got '{hex}'"),
            ));
        }

        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|e| Error::invalid_argument("hex", e.to_string()))
        };

        Ok(Self::from_bytes(channel(0)?, channel(2)?, channel(4)?, channel(6)?))
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ {}, {}, {}, {} }}", self.r, self.g, self.b, self.a)
    }
}

impl TryFrom<String> for Color {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Color::from_hex_string(&value)
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_hex_string()
    }
}

impl From<Pixel> for Color {
    fn from(p: Pixel) -> Self {
        Color::from_bytes(p.r, p.g, p.b, p.a)
    }
}

impl From<Color> for wgpu::Color {
    fn from(c: Color) -> Self {
        wgpu::Color {
            r: c.r as f64,
            g: c.g as f64,
            b: c.b as f64,
            a: c.a as f64,
        }
    }
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// An RGBA color with byte channels. Four bytes, laid out `r, g, b, a`, so a
/// `&[Pixel]` can be uploaded directly as RGBA8 data.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Pixel {
    pub const WHITE: Self = Self::new(0xFF, 0xFF, 0xFF, 0xFF);
    pub const BLACK: Self = Self::new(0x00, 0x00, 0x00, 0xFF);
    pub const TRANSPARENT: Self = Self::new(0x00, 0x00, 0x00, 0x00);
    pub const RED: Self = Self::new(0xFF, 0x00, 0x00, 0xFF);
    pub const GREEN: Self = Self::new(0x00, 0x80, 0x00, 0xFF);
    pub const BLUE: Self = Self::new(0x00, 0x00, 0xFF, 0xFF);
    pub const YELLOW: Self = Self::new(0xFF, 0xFF, 0x00, 0xFF);
    pub const MAGENTA: Self = Self::new(0xFF, 0x00, 0xFF, 0xFF);
    pub const CYAN: Self = Self::new(0x00, 0xFF, 0xFF, 0xFF);
    pub const GRAY: Self = Self::new(0x80, 0x80, 0x80, 0xFF);
    pub const CORNFLOWER_BLUE: Self = Self::new(0x64, 0x95, 0xED, 0xFF);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl fmt::Display for Pixel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}, {}, {}, {}}}", self.r, self.g, self.b, self.a)
    }
}

impl From<Color> for Pixel {
    fn from(c: Color) -> Self {
        let byte = |v: f32| (v * 255.0).round() as u8;
        Pixel::new(byte(c.r), byte(c.g), byte(c.b), byte(c.a))
    }
}
