//! # Graphics Context: The Immediate-Mode Drawing API
//!
//! [`GraphicsContext`] is what a game talks to. It owns a
//! [`GraphicsBackend`] and a [`SpriteBatch`], validates every argument,
//! turns sprite draws into quads and decides when the batch must flush.
//!
//! ## Frame Flow
//!
//! ```text
//! ctx.clear(ctx.back_buffer(), Color::CORNFLOWER_BLUE)?;
//! ctx.begin()?;
//!   ctx.draw_sprite(target, &texture, pos, SpriteOptions::default())?;   ─┐ queued
//!   ctx.draw_string(target, &font, "hi", pos, &TextOptions::default())?; ─┘
//! let stats = ctx.end()?;                                                ─── flushed
//! ctx.present()?;
//! ```
//!
//! ## Sprite Placement
//!
//! A sprite is a `width × height` rectangle placed with its `origin` at the
//! destination. Scale is applied around the origin, then rotation (radians,
//! clockwise on screen since Y points down), then the translation:
//!
//! ```text
//! corner' = destination + R(rotation) · (scale ⊙ (corner − origin))
//! ```
//!
//! All of this happens on the CPU so that sprites with different transforms
//! still batch together.
//!
//! ## Resource Lifetime
//!
//! `create_*` hands out move-only [`Texture`] / [`FrameBuffer`] values and
//! `free_*` consumes them. If the pending batch still references a resource
//! that is about to be freed or overwritten, the batch is flushed first so
//! that the queued quads see the old contents.

use std::path::Path;

use glam::Vec2;

use crate::color::{Color, Pixel};
use crate::error::{Error, Result};
use crate::font::Font;
use crate::math::{Point, Rectangle, Size};
use crate::surface::Surface;

use super::backend::GraphicsBackend;
use super::batch::{FlushReason, RenderStats, SpriteBatch};
use super::resource::{FrameBuffer, RenderTarget, Sampler, SamplerId, Texture};
use super::vertex::Vertex;

/// Vertex capacity used when none is configured.
pub const DEFAULT_MAX_VERTICES: usize = 8192;

/// Indices are 16-bit, so one batch can address at most this many vertices.
pub const MAX_VERTICES_LIMIT: usize = 1 << 16;

/// Where a sprite or string is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Destination {
    /// Top-left position; the size comes from the source rectangle.
    Position(Vec2),
    /// Position and size.
    Rectangle(Rectangle),
}

impl Destination {
    pub fn position(&self) -> Vec2 {
        match self {
            Destination::Position(p) => *p,
            Destination::Rectangle(r) => Vec2::new(r.x as f32, r.y as f32),
        }
    }
}

impl From<Vec2> for Destination {
    fn from(p: Vec2) -> Self {
        Destination::Position(p)
    }
}

impl From<Point> for Destination {
    fn from(p: Point) -> Self {
        Destination::Position(p.into())
    }
}

impl From<Rectangle> for Destination {
    fn from(r: Rectangle) -> Self {
        Destination::Rectangle(r)
    }
}

/// Optional parameters for [`GraphicsContext::draw_sprite`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteOptions {
    /// Region of the sampler to draw. `None` draws all of it.
    pub source: Option<Rectangle>,
    /// Multiplied with the sampled color.
    pub tint: Color,
    /// Pivot for scale and rotation, in unscaled sprite pixels.
    pub origin: Vec2,
    pub scale: Vec2,
    /// Radians.
    pub rotation: f32,
    /// Written to the vertex Z coordinate. Must be within `[0, 1]`.
    pub layer_depth: f32,
}

impl Default for SpriteOptions {
    fn default() -> Self {
        Self {
            source: None,
            tint: Color::WHITE,
            origin: Vec2::ZERO,
            scale: Vec2::ONE,
            rotation: 0.0,
            layer_depth: 0.0,
        }
    }
}

impl SpriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: Rectangle) -> Self {
        self.source = Some(source);
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

/// A quad ready to be turned into vertices: `offset` and `size` are in
/// scaled, unrotated pixels relative to `anchor`.
pub(super) struct QuadPlacement {
    pub anchor: Vec2,
    pub offset: Vec2,
    pub size: Vec2,
    pub rotation: f32,
    pub source: Rectangle,
    pub tint: Color,
    pub layer_depth: f32,
}

/// Batches sprites and text into draw calls on a [`GraphicsBackend`].
pub struct GraphicsContext<B: GraphicsBackend> {
    backend: B,
    batch: SpriteBatch,
    drawing: bool,
}

impl<B: GraphicsBackend> GraphicsContext<B> {
    /// Wrap a backend. `max_vertices` must be in `4..=65536`; it is rounded
    /// down to a whole number of quads.
    pub fn new(backend: B, max_vertices: usize) -> Result<Self> {
        if !(4..=MAX_VERTICES_LIMIT).contains(&max_vertices) {
            return Err(Error::invalid_argument(
                "max_vertices",
                format!("must be between 4 and {MAX_VERTICES_LIMIT}, was {max_vertices}"),
            ));
        }
        let capacity = max_vertices - max_vertices % 4;
        log::debug!("graphics context created with room for {} quads", capacity / 4);

        Ok(Self {
            backend,
            batch: SpriteBatch::new(capacity),
            drawing: false,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Vertex capacity of one batch.
    pub fn max_vertices(&self) -> usize {
        self.batch.capacity()
    }

    pub fn back_buffer(&self) -> RenderTarget {
        RenderTarget::BackBuffer
    }

    pub fn back_buffer_size(&self) -> Size {
        self.backend.back_buffer_size()
    }

    /// `true` between `begin()` and `end()`.
    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    /// Counters for the current (or last finished) pass.
    pub fn stats(&self) -> RenderStats {
        self.batch.stats()
    }

    // ── Frame ─────────────────────────────────────────────────────────

    pub fn begin(&mut self) -> Result<()> {
        if self.drawing {
            return Err(Error::DrawAlreadyInProgress);
        }
        self.batch.reset_stats();
        self.drawing = true;
        Ok(())
    }

    /// Flush whatever is pending and close the pass.
    pub fn end(&mut self) -> Result<RenderStats> {
        self.ensure_drawing()?;
        // The pass is over even if the final flush fails.
        self.drawing = false;
        let flushed = self.batch.flush(&mut self.backend, FlushReason::End);
        self.batch.reset_state();
        flushed?;
        Ok(self.batch.stats())
    }

    /// Close a pass that failed half way, dropping anything not yet drawn.
    /// Does nothing outside a pass.
    pub fn abandon(&mut self) {
        if self.drawing {
            log::debug!("abandoning pass with {} pending vertices", self.batch.len());
            self.batch.discard();
            self.drawing = false;
        }
    }

    /// Fill a render target with `color`. Allowed inside and outside a pass.
    pub fn clear(&mut self, target: impl Into<RenderTarget>, color: Color) -> Result<()> {
        let target = target.into();
        let samples_target = match target {
            RenderTarget::FrameBuffer(id) => self.batch.references_sampler(SamplerId::FrameBuffer(id)),
            RenderTarget::BackBuffer => false,
        };
        if self.batch.references_target(target) || samples_target {
            self.batch.flush(&mut self.backend, FlushReason::Clear)?;
        }
        self.backend.clear(target, color)
    }

    /// Show the back buffer. Not allowed while a pass is open.
    pub fn present(&mut self) -> Result<()> {
        if self.drawing {
            return Err(Error::DrawAlreadyInProgress);
        }
        self.backend.present()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        log::debug!("back buffer resized to {width}x{height}");
        self.backend.resize(width, height);
    }

    // ── Sprites ───────────────────────────────────────────────────────

    /// Queue one sprite.
    ///
    /// A [`Destination::Position`] uses the size of the source rectangle (or
    /// the whole sampler); a [`Destination::Rectangle`] stretches the source
    /// to fit. Scale is applied on top of either.
    pub fn draw_sprite<S: Sampler + ?Sized>(
        &mut self,
        target: impl Into<RenderTarget>,
        sampler: &S,
        destination: impl Into<Destination>,
        options: SpriteOptions,
    ) -> Result<()> {
        let target = target.into();
        self.ensure_drawing()?;
        check_layer_depth(options.layer_depth)?;

        let (sw, sh) = sampler.sampler_size();
        let source = match options.source {
            Some(source) => check_source(source)?,
            None => Rectangle::new(0, 0, sw as i32, sh as i32),
        };

        let (anchor, size) = match destination.into() {
            Destination::Position(p) => (p, Vec2::new(source.width as f32, source.height as f32)),
            Destination::Rectangle(r) => (
                Vec2::new(r.x as f32, r.y as f32),
                Vec2::new(r.width as f32, r.height as f32),
            ),
        };

        self.queue_quad(
            target,
            sampler,
            QuadPlacement {
                anchor,
                offset: -(options.scale * options.origin),
                size: options.scale * size,
                rotation: options.rotation,
                source,
                tint: options.tint,
                layer_depth: options.layer_depth,
            },
        )
    }

    /// Validate the target/sampler pair, build four vertices and hand them to
    /// the batch.
    pub(super) fn queue_quad<S: Sampler + ?Sized>(
        &mut self,
        target: RenderTarget,
        sampler: &S,
        quad: QuadPlacement,
    ) -> Result<()> {
        let sampler_id = sampler.sampler_id();
        if let (RenderTarget::FrameBuffer(t), SamplerId::FrameBuffer(s)) = (target, sampler_id) {
            if t == s {
                return Err(Error::invalid_argument(
                    "sampler",
                    format!("cannot sample {s} while drawing into it"),
                ));
            }
        }

        let vertices = build_quad(&quad, sampler.sampler_size());
        self.batch
            .push_quad(&mut self.backend, target, sampler_id, vertices)
    }

    pub(super) fn ensure_drawing(&self) -> Result<()> {
        if self.drawing {
            Ok(())
        } else {
            Err(Error::DrawNotInProgress)
        }
    }

    // ── Textures ──────────────────────────────────────────────────────

    /// Create an uninitialized texture.
    pub fn create_texture(&mut self, width: u32, height: u32) -> Result<Texture> {
        check_size(width, height)?;
        let id = self.backend.create_texture(width, height, None)?;
        log::debug!("created {id} ({width}x{height})");
        Ok(Texture { id, width, height })
    }

    /// Create a texture from tightly packed RGBA8 bytes.
    pub fn create_texture_with_data(&mut self, width: u32, height: u32, data: &[u8]) -> Result<Texture> {
        check_size(width, height)?;
        check_data_len(width, height, 4, data.len())?;
        let id = self.backend.create_texture(width, height, Some(data))?;
        log::debug!("created {id} ({width}x{height}) with data");
        Ok(Texture { id, width, height })
    }

    pub fn create_texture_from_surface(&mut self, surface: &Surface) -> Result<Texture> {
        self.create_texture_with_data(surface.width(), surface.height(), surface.as_bytes())
    }

    /// Decode an image file and upload it.
    pub fn load_texture(&mut self, path: impl AsRef<Path>) -> Result<Texture> {
        let surface = Surface::load(path)?;
        self.create_texture_from_surface(&surface)
    }

    /// Decode an in-memory image and upload it.
    pub fn load_texture_from_memory(&mut self, bytes: &[u8]) -> Result<Texture> {
        let surface = Surface::from_memory(bytes)?;
        self.create_texture_from_surface(&surface)
    }

    /// Replace the full contents of a texture with RGBA8 bytes.
    pub fn set_texture_data(&mut self, texture: &Texture, data: &[u8]) -> Result<()> {
        check_data_len(texture.width, texture.height, 4, data.len())?;
        if self.batch.references_sampler(texture.sampler_id()) {
            self.batch.flush(&mut self.backend, FlushReason::DataChanged)?;
        }
        self.backend.set_texture_data(texture.id, data)
    }

    pub fn free_texture(&mut self, texture: Texture) -> Result<()> {
        if self.batch.references_sampler(texture.sampler_id()) {
            self.batch.flush(&mut self.backend, FlushReason::Free)?;
        }
        log::debug!("freeing {}", texture.id);
        self.backend.free_texture(texture.id)
    }

    /// Free the texture backing a font.
    pub fn free_font(&mut self, font: Font) -> Result<()> {
        self.free_texture(font.into_texture())
    }

    // ── Frame buffers ─────────────────────────────────────────────────

    pub fn create_frame_buffer(&mut self, width: u32, height: u32) -> Result<FrameBuffer> {
        check_size(width, height)?;
        let id = self.backend.create_frame_buffer(width, height)?;
        log::debug!("created {id} ({width}x{height})");
        Ok(FrameBuffer { id, width, height })
    }

    /// Replace the full contents of a frame buffer.
    pub fn set_frame_buffer_data(&mut self, frame_buffer: &FrameBuffer, data: &[Pixel]) -> Result<()> {
        check_data_len(frame_buffer.width, frame_buffer.height, 1, data.len())?;
        if self.references_frame_buffer(frame_buffer) {
            self.batch.flush(&mut self.backend, FlushReason::DataChanged)?;
        }
        self.backend.set_frame_buffer_data(frame_buffer.id, data)
    }

    pub fn free_frame_buffer(&mut self, frame_buffer: FrameBuffer) -> Result<()> {
        if self.references_frame_buffer(&frame_buffer) {
            self.batch.flush(&mut self.backend, FlushReason::Free)?;
        }
        log::debug!("freeing {}", frame_buffer.id);
        self.backend.free_frame_buffer(frame_buffer.id)
    }

    fn references_frame_buffer(&self, frame_buffer: &FrameBuffer) -> bool {
        self.batch.references_sampler(frame_buffer.sampler_id())
            || self.batch.references_target(RenderTarget::from(frame_buffer))
    }
}

/// Corners in top-left, top-right, bottom-right, bottom-left order.
fn build_quad(quad: &QuadPlacement, (sw, sh): (u32, u32)) -> [Vertex; 4] {
    let QuadPlacement {
        anchor,
        offset,
        size,
        rotation,
        source,
        tint,
        layer_depth,
    } = *quad;

    let corners = [
        offset,
        offset + Vec2::new(size.x, 0.0),
        offset + size,
        offset + Vec2::new(0.0, size.y),
    ];

    // A 1x1 sampler is a solid color; every UV samples the same texel.
    let uv = |x: i32, y: i32| {
        if sw == 1 && sh == 1 {
            [0.0, 0.0]
        } else {
            [x as f32 / sw as f32, y as f32 / sh as f32]
        }
    };
    let uvs = [
        uv(source.left(), source.top()),
        uv(source.right(), source.top()),
        uv(source.right(), source.bottom()),
        uv(source.left(), source.bottom()),
    ];

    let rotation = Vec2::from_angle(rotation);
    let color = tint.to_array();

    std::array::from_fn(|i| {
        let p = anchor + rotation.rotate(corners[i]);
        Vertex {
            position: [p.x, p.y, layer_depth],
            color,
            uv: uvs[i],
        }
    })
}

pub(super) fn check_layer_depth(layer_depth: f32) -> Result<()> {
    if (0.0..=1.0).contains(&layer_depth) {
        Ok(())
    } else {
        Err(Error::invalid_argument(
            "layer_depth",
            format!("must be within [0, 1], was {layer_depth}"),
        ))
    }
}

/// A source rectangle needs a non-negative size and edges that fit in `i32`.
fn check_source(source: Rectangle) -> Result<Rectangle> {
    let fits = source.width >= 0
        && source.height >= 0
        && source.x.checked_add(source.width).is_some()
        && source.y.checked_add(source.height).is_some();
    if fits {
        Ok(source)
    } else {
        Err(Error::invalid_argument(
            "source",
            format!("{source:?} has a negative size or overflowing edges"),
        ))
    }
}

fn check_size(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::invalid_argument(
            "size",
            format!("width and height must be at least 1, was {width}x{height}"),
        ));
    }
    Ok(())
}

fn check_data_len(width: u32, height: u32, per_pixel: usize, len: usize) -> Result<()> {
    let expected = width as usize * height as usize * per_pixel;
    if len != expected {
        return Err(Error::invalid_argument(
            "data",
            format!("expected length of data to be {expected} but was {len}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;
    use crate::graphics::testing::{BackendCall, RecordingBackend};

    fn context() -> GraphicsContext<RecordingBackend> {
        GraphicsContext::new(RecordingBackend::new(800, 600), DEFAULT_MAX_VERTICES).unwrap()
    }

    fn positions(vertices: &[Vertex]) -> Vec<[f32; 2]> {
        vertices
            .iter()
            .map(|v| [v.position[0], v.position[1]])
            .collect()
    }

    fn assert_close(actual: [f32; 2], expected: [f32; 2]) {
        assert!(
            (actual[0] - expected[0]).abs() < 1e-4 && (actual[1] - expected[1]).abs() < 1e-4,
            "{actual:?} != {expected:?}"
        );
    }

    #[test]
    fn max_vertices_is_validated_and_rounded() {
        assert!(GraphicsContext::new(RecordingBackend::new(1, 1), 3).is_err());
        assert!(GraphicsContext::new(RecordingBackend::new(1, 1), MAX_VERTICES_LIMIT + 1).is_err());

        let ctx = GraphicsContext::new(RecordingBackend::new(1, 1), 10).unwrap();
        assert_eq!(ctx.max_vertices(), 8);
        let ctx = GraphicsContext::new(RecordingBackend::new(1, 1), MAX_VERTICES_LIMIT).unwrap();
        assert_eq!(ctx.max_vertices(), MAX_VERTICES_LIMIT);
    }

    #[test]
    fn begin_twice_fails() {
        let mut ctx = context();
        ctx.begin().unwrap();
        assert!(matches!(ctx.begin(), Err(Error::DrawAlreadyInProgress)));
    }

    #[test]
    fn drawing_outside_a_pass_fails() {
        let mut ctx = context();
        let tex = ctx.create_texture(2, 2).unwrap();
        let result = ctx.draw_sprite(ctx.back_buffer(), &tex, Vec2::ZERO, SpriteOptions::default());
        assert!(matches!(result, Err(Error::DrawNotInProgress)));
        assert!(matches!(ctx.end(), Err(Error::DrawNotInProgress)));
    }

    #[test]
    fn texture_change_flushes_exactly_once() {
        let mut ctx = context();
        let a = ctx.create_texture(4, 4).unwrap();
        let b = ctx.create_texture(4, 4).unwrap();
        let target = ctx.back_buffer();

        ctx.begin().unwrap();
        ctx.draw_sprite(target, &a, Vec2::ZERO, SpriteOptions::default()).unwrap();
        ctx.draw_sprite(target, &a, Vec2::ONE, SpriteOptions::default()).unwrap();
        assert!(ctx.backend().draws().is_empty());

        ctx.draw_sprite(target, &b, Vec2::ZERO, SpriteOptions::default()).unwrap();
        assert_eq!(
            ctx.backend().draws(),
            vec![(target, a.sampler_id(), 8)]
        );

        let stats = ctx.end().unwrap();
        assert_eq!(
            ctx.backend().draws(),
            vec![(target, a.sampler_id(), 8), (target, b.sampler_id(), 4)]
        );
        assert_eq!(stats.draw_calls, 2);
        assert_eq!(stats.quads, 3);
        assert_eq!(stats.flushes(FlushReason::SamplerChanged), 1);
        assert_eq!(stats.flushes(FlushReason::End), 1);
    }

    #[test]
    fn target_change_flushes() {
        let mut ctx = context();
        let tex = ctx.create_texture(4, 4).unwrap();
        let fb = ctx.create_frame_buffer(64, 64).unwrap();

        ctx.begin().unwrap();
        ctx.draw_sprite(&fb, &tex, Vec2::ZERO, SpriteOptions::default())
            .unwrap();
        ctx.draw_sprite(ctx.back_buffer(), &tex, Vec2::ZERO, SpriteOptions::default())
            .unwrap();
        let stats = ctx.end().unwrap();

        assert_eq!(stats.flushes(FlushReason::TargetChanged), 1);
        assert_eq!(
            ctx.backend().draws(),
            vec![
                (RenderTarget::from(&fb), tex.sampler_id(), 4),
                (RenderTarget::BackBuffer, tex.sampler_id(), 4),
            ]
        );
    }

    #[test]
    fn full_buffer_flushes_before_next_quad() {
        let mut ctx = GraphicsContext::new(RecordingBackend::new(800, 600), 8).unwrap();
        let tex = ctx.create_texture(4, 4).unwrap();
        let target = ctx.back_buffer();

        ctx.begin().unwrap();
        ctx.draw_sprite(target, &tex, Vec2::ZERO, SpriteOptions::default()).unwrap();
        ctx.draw_sprite(target, &tex, Vec2::ZERO, SpriteOptions::default()).unwrap();
        assert!(ctx.backend().draws().is_empty());
        ctx.draw_sprite(target, &tex, Vec2::ZERO, SpriteOptions::default()).unwrap();
        assert_eq!(ctx.backend().draws(), vec![(target, tex.sampler_id(), 8)]);

        let stats = ctx.end().unwrap();
        assert_eq!(stats.flushes(FlushReason::BufferFull), 1);
        assert_eq!(stats.quads, 3);
    }

    #[test]
    fn empty_pass_never_draws() {
        let mut ctx = context();
        ctx.begin().unwrap();
        let stats = ctx.end().unwrap();
        assert_eq!(stats.draw_calls, 0);
        assert!(ctx.backend().draws().is_empty());
    }

    #[test]
    fn quad_corners_and_uvs() {
        let mut ctx = context();
        let tex = ctx.create_texture(100, 50).unwrap();

        ctx.begin().unwrap();
        ctx.draw_sprite(
            ctx.back_buffer(),
            &tex,
            Vec2::new(10.0, 20.0),
            SpriteOptions::new()
                .with_source(Rectangle::new(25, 10, 50, 20))
                .with_tint(Color::RED)
                .with_layer_depth(0.5),
        )
        .unwrap();
        ctx.end().unwrap();

        let v = ctx.backend().drawn_vertices(0);
        assert_eq!(
            positions(&v),
            vec![[10.0, 20.0], [60.0, 20.0], [60.0, 40.0], [10.0, 40.0]]
        );
        assert_eq!(v[0].uv, [0.25, 0.2]);
        assert_eq!(v[1].uv, [0.75, 0.2]);
        assert_eq!(v[2].uv, [0.75, 0.6]);
        assert_eq!(v[3].uv, [0.25, 0.6]);
        assert!(v.iter().all(|v| v.color == Color::RED.to_array()));
        assert!(v.iter().all(|v| v.position[2] == 0.5));
    }

    #[test]
    fn one_by_one_sampler_uses_zero_uv() {
        let mut ctx = context();
        let pixel = ctx.create_texture_with_data(1, 1, &[255, 255, 255, 255]).unwrap();

        ctx.begin().unwrap();
        ctx.draw_sprite(
            ctx.back_buffer(),
            &pixel,
            Rectangle::new(0, 0, 30, 10),
            SpriteOptions::default(),
        )
        .unwrap();
        ctx.end().unwrap();

        let v = ctx.backend().drawn_vertices(0);
        assert!(v.iter().all(|v| v.uv == [0.0, 0.0]));
        assert_eq!(positions(&v)[2], [30.0, 10.0]);
    }

    #[test]
    fn origin_scale_and_rotation() {
        let mut ctx = context();
        let tex = ctx.create_texture(10, 20).unwrap();

        ctx.begin().unwrap();
        ctx.draw_sprite(
            ctx.back_buffer(),
            &tex,
            Vec2::new(100.0, 100.0),
            SpriteOptions::new()
                .with_origin(Vec2::new(5.0, 10.0))
                .with_scale(Vec2::splat(2.0)),
        )
        .unwrap();
        ctx.draw_sprite(
            ctx.back_buffer(),
            &tex,
            Vec2::new(100.0, 100.0),
            SpriteOptions::new().with_rotation(FRAC_PI_2),
        )
        .unwrap();
        ctx.end().unwrap();

        let v = ctx.backend().drawn_vertices(0);
        let p = positions(&v);
        assert_eq!(p[0], [90.0, 80.0]);
        assert_eq!(p[2], [110.0, 120.0]);

        // A quarter turn maps +X onto +Y (clockwise on screen).
        assert_close(p[4], [100.0, 100.0]);
        assert_close(p[5], [100.0, 110.0]);
        assert_close(p[6], [80.0, 110.0]);
        assert_close(p[7], [80.0, 100.0]);
    }

    #[test]
    fn layer_depth_must_be_normalized() {
        let mut ctx = context();
        let tex = ctx.create_texture(1, 1).unwrap();
        ctx.begin().unwrap();
        for depth in [-0.1, 1.5, f32::NAN] {
            let result = ctx.draw_sprite(
                ctx.back_buffer(),
                &tex,
                Vec2::ZERO,
                SpriteOptions::new().with_layer_depth(depth),
            );
            assert!(matches!(
                result,
                Err(Error::InvalidArgument { name: "layer_depth", .. })
            ));
        }
    }

    #[test]
    fn frame_buffer_cannot_sample_itself() {
        let mut ctx = context();
        let fb = ctx.create_frame_buffer(8, 8).unwrap();
        ctx.begin().unwrap();
        let result = ctx.draw_sprite(&fb, &fb, Vec2::ZERO, SpriteOptions::default());
        assert!(matches!(result, Err(Error::InvalidArgument { name: "sampler", .. })));

        // Sampling it into the back buffer is fine.
        ctx.draw_sprite(ctx.back_buffer(), &fb, Vec2::ZERO, SpriteOptions::default())
            .unwrap();
    }

    #[test]
    fn clear_flushes_pending_batch_for_same_target() {
        let mut ctx = context();
        let tex = ctx.create_texture(2, 2).unwrap();
        let fb = ctx.create_frame_buffer(8, 8).unwrap();

        ctx.begin().unwrap();
        ctx.draw_sprite(ctx.back_buffer(), &tex, Vec2::ZERO, SpriteOptions::default())
            .unwrap();
        ctx.clear(&fb, Color::BLACK).unwrap();
        assert!(ctx.backend().draws().is_empty());

        ctx.clear(ctx.back_buffer(), Color::BLACK).unwrap();
        let calls = ctx.backend().calls();
        let n = calls.len();
        assert!(matches!(calls[n - 2], BackendCall::Draw { .. }));
        assert!(matches!(
            calls[n - 1],
            BackendCall::Clear {
                target: RenderTarget::BackBuffer,
                ..
            }
        ));
        assert_eq!(ctx.end().unwrap().flushes(FlushReason::Clear), 1);
    }

    #[test]
    fn freeing_a_batched_texture_flushes_first() {
        let mut ctx = context();
        let used = ctx.create_texture(2, 2).unwrap();
        let unused = ctx.create_texture(2, 2).unwrap();
        let used_id = used.id();

        ctx.begin().unwrap();
        ctx.draw_sprite(ctx.back_buffer(), &used, Vec2::ZERO, SpriteOptions::default())
            .unwrap();

        ctx.free_texture(unused).unwrap();
        assert!(ctx.backend().draws().is_empty());

        ctx.free_texture(used).unwrap();
        let calls = ctx.backend().calls();
        let n = calls.len();
        assert!(matches!(calls[n - 2], BackendCall::Draw { .. }));
        assert_eq!(calls[n - 1], BackendCall::FreeTexture(used_id));
        assert_eq!(ctx.backend().live_textures(), 0);

        let stats = ctx.end().unwrap();
        assert_eq!(stats.flushes(FlushReason::Free), 1);
        assert_eq!(stats.draw_calls, 1);
    }

    #[test]
    fn replacing_batched_frame_buffer_pixels_flushes_first() {
        let mut ctx = context();
        let fb = ctx.create_frame_buffer(2, 2).unwrap();

        ctx.begin().unwrap();
        ctx.draw_sprite(ctx.back_buffer(), &fb, Vec2::ZERO, SpriteOptions::default())
            .unwrap();
        ctx.set_frame_buffer_data(&fb, &[Pixel::RED; 4]).unwrap();
        let stats = ctx.end().unwrap();
        assert_eq!(stats.flushes(FlushReason::DataChanged), 1);
    }

    #[test]
    fn clearing_a_sampled_frame_buffer_flushes_first() {
        let mut ctx = context();
        let fb = ctx.create_frame_buffer(4, 4).unwrap();

        ctx.begin().unwrap();
        ctx.draw_sprite(ctx.back_buffer(), &fb, Vec2::ZERO, SpriteOptions::default())
            .unwrap();
        ctx.clear(&fb, Color::WHITE).unwrap();

        let calls = ctx.backend().calls();
        let n = calls.len();
        assert!(matches!(
            calls[n - 2],
            BackendCall::Draw {
                target: RenderTarget::BackBuffer,
                ..
            }
        ));
        assert_eq!(
            calls[n - 1],
            BackendCall::Clear {
                target: RenderTarget::from(&fb),
                color: Color::WHITE,
            }
        );
        assert_eq!(ctx.end().unwrap().flushes(FlushReason::Clear), 1);
    }

    #[test]
    fn replacing_batched_texture_pixels_flushes_first() {
        let mut ctx = context();
        let tex = ctx.create_texture(2, 2).unwrap();
        let other = ctx.create_texture(2, 2).unwrap();

        ctx.begin().unwrap();
        ctx.draw_sprite(ctx.back_buffer(), &tex, Vec2::ZERO, SpriteOptions::default())
            .unwrap();
        ctx.set_texture_data(&other, &[255; 16]).unwrap();
        assert!(ctx.backend().draws().is_empty());

        ctx.set_texture_data(&tex, &[0; 16]).unwrap();
        let calls = ctx.backend().calls();
        let n = calls.len();
        assert!(matches!(calls[n - 2], BackendCall::Draw { .. }));
        assert_eq!(calls[n - 1], BackendCall::SetTextureData { id: tex.id(), len: 16 });

        let stats = ctx.end().unwrap();
        assert_eq!(stats.flushes(FlushReason::DataChanged), 1);
        assert_eq!(stats.draw_calls, 1);
    }

    #[test]
    fn freeing_the_batch_target_flushes_first() {
        let mut ctx = context();
        let tex = ctx.create_texture(2, 2).unwrap();
        let fb = ctx.create_frame_buffer(8, 8).unwrap();
        let fb_id = fb.id();

        ctx.begin().unwrap();
        ctx.draw_sprite(&fb, &tex, Vec2::ZERO, SpriteOptions::default())
            .unwrap();
        ctx.free_frame_buffer(fb).unwrap();

        let calls = ctx.backend().calls();
        let n = calls.len();
        assert!(matches!(
            calls[n - 2],
            BackendCall::Draw {
                target: RenderTarget::FrameBuffer(id),
                ..
            } if id == fb_id
        ));
        assert_eq!(calls[n - 1], BackendCall::FreeFrameBuffer(fb_id));
        assert_eq!(ctx.backend().live_frame_buffers(), 0);

        let stats = ctx.end().unwrap();
        assert_eq!(stats.flushes(FlushReason::Free), 1);
        assert_eq!(stats.draw_calls, 1);
    }

    #[test]
    fn source_rectangle_is_validated() {
        let mut ctx = context();
        let tex = ctx.create_texture(4, 4).unwrap();
        ctx.begin().unwrap();
        for source in [
            Rectangle::new(i32::MAX, 0, 1, 1),
            Rectangle::new(0, i32::MAX, 1, 1),
            Rectangle::new(0, 0, -1, 4),
            Rectangle::new(0, 0, 4, -1),
        ] {
            let result = ctx.draw_sprite(
                ctx.back_buffer(),
                &tex,
                Vec2::ZERO,
                SpriteOptions::new().with_source(source),
            );
            assert!(matches!(result, Err(Error::InvalidArgument { name: "source", .. })));
        }

        // Sources may extend past the texture; the sampler clamps.
        ctx.draw_sprite(
            ctx.back_buffer(),
            &tex,
            Vec2::ZERO,
            SpriteOptions::new().with_source(Rectangle::new(-2, -2, 8, 8)),
        )
        .unwrap();
        assert_eq!(ctx.end().unwrap().quads, 1);
    }

    #[test]
    fn texture_arguments_are_validated() {
        let mut ctx = context();
        assert!(ctx.create_texture(0, 4).is_err());
        assert!(ctx.create_frame_buffer(4, 0).is_err());
        assert!(matches!(
            ctx.create_texture_with_data(2, 2, &[0; 15]),
            Err(Error::InvalidArgument { name: "data", .. })
        ));

        let tex = ctx.create_texture_with_data(2, 2, &[0; 16]).unwrap();
        assert!(ctx.set_texture_data(&tex, &[0; 8]).is_err());
        ctx.set_texture_data(&tex, &[255; 16]).unwrap();

        let fb = ctx.create_frame_buffer(2, 2).unwrap();
        assert!(ctx.set_frame_buffer_data(&fb, &[Pixel::RED; 3]).is_err());
    }

    #[test]
    fn texture_from_surface_keeps_dimensions() {
        let mut ctx = context();
        let surface = Surface::new(3, 5);
        let tex = ctx.create_texture_from_surface(&surface).unwrap();
        assert_eq!(tex.size(), Size::new(3, 5));
        assert!(matches!(
            ctx.backend().calls().last(),
            Some(BackendCall::CreateTexture {
                width: 3,
                height: 5,
                has_data: true,
                ..
            })
        ));
    }

    #[test]
    fn present_requires_closed_pass() {
        let mut ctx = context();
        ctx.begin().unwrap();
        assert!(matches!(ctx.present(), Err(Error::DrawAlreadyInProgress)));
        ctx.end().unwrap();
        ctx.present().unwrap();
        assert_eq!(ctx.backend().calls().last(), Some(&BackendCall::Present));
    }

    #[test]
    fn abandon_drops_pending_quads() {
        let mut ctx = context();
        let texture = ctx.create_texture(4, 4).unwrap();
        ctx.begin().unwrap();
        ctx.draw_sprite(RenderTarget::BackBuffer, &texture, Vec2::ZERO, SpriteOptions::default())
            .unwrap();
        ctx.abandon();

        assert!(!ctx.is_drawing());
        ctx.begin().unwrap();
        ctx.end().unwrap();
        assert!(ctx.backend().draws().is_empty());
    }

    #[test]
    fn resize_updates_back_buffer_size() {
        let mut ctx = context();
        ctx.resize(1024, 768);
        assert_eq!(ctx.back_buffer_size(), Size::new(1024, 768));
    }
}
