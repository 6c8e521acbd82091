//! # Surface: CPU-Side Pixel Buffers
//!
//! A [`Surface`] is a plain `width × height` grid of [`Pixel`]s in row-major
//! order. It never touches the GPU: images are decoded into a surface, glyph
//! bitmaps are packed into one, and the result is handed to
//! [`GraphicsContext::create_texture_from_surface`](crate::graphics::GraphicsContext::create_texture_from_surface)
//! for upload.
//!
//! Decoding goes through the [`image`](https://docs.rs/image) crate. Every
//! format is normalized to RGBA8; images without an alpha channel come out
//! fully opaque.

use std::ops::{Index, IndexMut};
use std::path::Path;

use crate::color::Pixel;
use crate::error::{Error, Result};
use crate::math::{Point, Rectangle};

/// A row-major grid of pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<Pixel>,
}

impl Surface {
    /// Create a surface filled with transparent black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Pixel::TRANSPARENT; (width as usize) * (height as usize)],
        }
    }

    /// Wrap existing pixel data. `pixels.len()` must equal `width * height`.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Pixel>) -> Result<Self> {
        let expected = (width as usize) * (height as usize);
        if pixels.len() != expected {
            return Err(Error::invalid_argument(
                "pixels",
                format!(
                    "expected length of pixels to be {expected} but was {}",
                    pixels.len()
                ),
            ));
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Decode an image file (PNG, JPEG, TGA).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let format = image::ImageFormat::from_path(path)
            .or_else(|_| image::guess_format(&bytes))?;
        let img = image::load_from_memory_with_format(&bytes, format)?;
        log::debug!(
            "decoded '{}' ({}x{}, {:?})",
            path.display(),
            img.width(),
            img.height(),
            format
        );
        Ok(Self::from_image(img))
    }

    /// Decode an in-memory image, guessing the format from its header.
    pub fn from_memory(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes)?;
        Ok(Self::from_image(img))
    }

    fn from_image(img: image::DynamicImage) -> Self {
        // `to_rgba8` fills alpha with 255 for formats that have none.
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let pixels = bytemuck::cast_slice::<u8, Pixel>(rgba.as_raw()).to_vec();
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of pixels.
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Pixel] {
        &mut self.pixels
    }

    /// The pixel data as tightly packed RGBA8 bytes.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn into_pixels(self) -> Vec<Pixel> {
        self.pixels
    }

    /// The pixel at `(x, y)`, or `None` if out of bounds.
    pub fn get(&self, x: u32, y: u32) -> Option<&Pixel> {
        if x < self.width && y < self.height {
            self.pixels.get((y * self.width + x) as usize)
        } else {
            None
        }
    }

    /// Fill every pixel with `pixel`.
    pub fn clear(&mut self, pixel: Pixel) {
        self.pixels.fill(pixel);
    }

    /// Copy `source` (or a region of it) onto this surface with its top-left
    /// corner at `destination`. The copy is clipped to both surfaces' bounds.
    pub fn blit(&mut self, source: &Surface, destination: Point, region: Option<Rectangle>) {
        let src_bounds = Rectangle::new(0, 0, source.width as i32, source.height as i32);
        let region = region.unwrap_or(src_bounds);
        let Some(clipped) = region.intersection(&src_bounds) else {
            return;
        };

        // Pixels cut off the source region move the destination with them.
        let dst_bounds = Rectangle::new(0, 0, self.width as i32, self.height as i32);
        let target = Rectangle::new(
            destination.x.saturating_add(clipped.x - region.x),
            destination.y.saturating_add(clipped.y - region.y),
            clipped.width,
            clipped.height,
        );
        let Some(visible) = target.intersection(&dst_bounds) else {
            return;
        };

        // Offset into the source region caused by clipping at the destination.
        let skip_x = visible.x - target.x;
        let skip_y = visible.y - target.y;

        for row in 0..visible.height {
            let src_y = (clipped.y + skip_y + row) as u32;
            let dst_y = (visible.y + row) as u32;
            let src_start = (src_y * source.width + (clipped.x + skip_x) as u32) as usize;
            let dst_start = (dst_y * self.width + visible.x as u32) as usize;
            let len = visible.width as usize;
            self.pixels[dst_start..dst_start + len]
                .copy_from_slice(&source.pixels[src_start..src_start + len]);
        }
    }
}

impl Index<usize> for Surface {
    type Output = Pixel;

    fn index(&self, i: usize) -> &Pixel {
        &self.pixels[i]
    }
}

impl IndexMut<usize> for Surface {
    fn index_mut(&mut self, i: usize) -> &mut Pixel {
        &mut self.pixels[i]
    }
}

impl Index<(u32, u32)> for Surface {
    type Output = Pixel;

    fn index(&self, (x, y): (u32, u32)) -> &Pixel {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        &self.pixels[(y * self.width + x) as usize]
    }
}

impl IndexMut<(u32, u32)> for Surface {
    fn index_mut(&mut self, (x, y): (u32, u32)) -> &mut Pixel {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        &mut self.pixels[(y * self.width + x) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(width: u32, height: u32) -> Surface {
        let mut s = Surface::new(width, height);
        for y in 0..height {
            for x in 0..width {
                s[(x, y)] = if (x + y) % 2 == 0 { Pixel::WHITE } else { Pixel::BLACK };
            }
        }
        s
    }

    #[test]
    fn from_pixels_checks_length() {
        assert!(Surface::from_pixels(2, 2, vec![Pixel::RED; 4]).is_ok());
        let err = Surface::from_pixels(2, 2, vec![Pixel::RED; 3]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { name: "pixels", .. }));
    }

    #[test]
    fn clear_fills_everything() {
        let mut s = Surface::new(3, 2);
        s.clear(Pixel::CYAN);
        assert!(s.pixels().iter().all(|&p| p == Pixel::CYAN));
    }

    #[test]
    fn index_is_row_major() {
        let mut s = Surface::new(4, 3);
        s[(1, 2)] = Pixel::RED;
        assert_eq!(s[2 * 4 + 1], Pixel::RED);
        assert_eq!(s.get(1, 2), Some(&Pixel::RED));
        assert_eq!(s.get(4, 0), None);
    }

    #[test]
    fn blit_full_source() {
        let src = checker(2, 2);
        let mut dst = Surface::new(4, 4);
        dst.blit(&src, Point::new(1, 1), None);
        assert_eq!(dst[(1, 1)], Pixel::WHITE);
        assert_eq!(dst[(2, 1)], Pixel::BLACK);
        assert_eq!(dst[(2, 2)], Pixel::WHITE);
        assert_eq!(dst[(0, 0)], Pixel::TRANSPARENT);
        assert_eq!(dst[(3, 3)], Pixel::TRANSPARENT);
    }

    #[test]
    fn blit_region() {
        let src = checker(4, 4);
        let mut dst = Surface::new(2, 1);
        dst.blit(&src, Point::ZERO, Some(Rectangle::new(1, 0, 2, 1)));
        assert_eq!(dst[(0, 0)], Pixel::BLACK);
        assert_eq!(dst[(1, 0)], Pixel::WHITE);
    }

    #[test]
    fn blit_clips_at_destination_edges() {
        let mut src = Surface::new(3, 3);
        src.clear(Pixel::RED);
        src[(2, 2)] = Pixel::BLUE;

        let mut dst = Surface::new(2, 2);
        dst.blit(&src, Point::new(-1, -1), None);
        // Source (1,1)..(3,3) lands on destination (0,0)..(2,2).
        assert_eq!(dst[(0, 0)], Pixel::RED);
        assert_eq!(dst[(1, 1)], Pixel::BLUE);

        let mut far = Surface::new(2, 2);
        far.blit(&src, Point::new(5, 5), None);
        assert!(far.pixels().iter().all(|&p| p == Pixel::TRANSPARENT));
    }

    #[test]
    fn blit_region_clipped_at_source_keeps_alignment() {
        let mut src = Surface::new(3, 1);
        src.clear(Pixel::RED);
        src[(0, 0)] = Pixel::BLUE;

        let mut dst = Surface::new(4, 1);
        dst.blit(&src, Point::ZERO, Some(Rectangle::new(-2, 0, 4, 1)));
        // The two columns left of the source stay empty.
        assert_eq!(dst[(0, 0)], Pixel::TRANSPARENT);
        assert_eq!(dst[(1, 0)], Pixel::TRANSPARENT);
        assert_eq!(dst[(2, 0)], Pixel::BLUE);
        assert_eq!(dst[(3, 0)], Pixel::RED);
    }

    #[test]
    fn as_bytes_is_rgba() {
        let s = Surface::from_pixels(1, 1, vec![Pixel::new(1, 2, 3, 4)]).unwrap();
        assert_eq!(s.as_bytes(), &[1, 2, 3, 4]);
    }

    #[test]
    fn decode_png_without_alpha_is_opaque() {
        let img = image::RgbImage::from_pixel(2, 1, image::Rgb([10, 20, 30]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        let s = Surface::from_memory(&bytes).unwrap();
        assert_eq!((s.width(), s.height()), (2, 1));
        assert_eq!(s[0], Pixel::new(10, 20, 30, 255));
    }

    #[test]
    fn unknown_format_is_rejected() {
        let err = Surface::from_memory(b"definitely not an image").unwrap_err();
        assert!(matches!(err, Error::UnsupportedImageFormat(_)));
    }
}
