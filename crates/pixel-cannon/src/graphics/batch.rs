//! # Batch: Accumulate Quads, Flush on State Change
//!
//! Every sprite and glyph is turned into four vertices on the CPU and
//! appended to one fixed-capacity buffer. Nothing reaches the GPU until the
//! batch *flushes*: the pending vertices go to
//! [`GraphicsBackend::draw`] as a single indexed draw call and the buffer is
//! reset.
//!
//! A batch is only valid for one render target and one sampler, so a flush
//! happens when either of them changes, and when the buffer has no room for
//! another quad:
//!
//! ```text
//! draw(target A, texture 1)  ─┐
//! draw(target A, texture 1)   ├─ one batch
//! draw(target A, texture 1)  ─┘
//! draw(target A, texture 2)  ─── SamplerChanged: flush 3 quads, start new batch
//! draw(target B, texture 2)  ─── TargetChanged: flush 1 quad, start new batch
//! end()                      ─── End: flush 1 quad
//! ```
//!
//! Order is preserved exactly. Two sprites that share a texture but have a
//! different sprite drawn between them end up in separate batches; nothing
//! is reordered to merge them.
//!
//! ## Comparison
//!
//! - **XNA / MonoGame `SpriteBatch`** (deferred mode): the same
//!   flush-on-texture-change policy with a fixed vertex array.
//! - **Love2D**: automatic batching of consecutive same-texture draws, also
//!   order-preserving.

use std::fmt;

use crate::error::Result;

use super::backend::GraphicsBackend;
use super::resource::{RenderTarget, SamplerId};
use super::vertex::Vertex;

/// Why a batch was sent to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlushReason {
    /// The next quad targets a different render target.
    TargetChanged,
    /// The next quad samples from a different texture or frame buffer.
    SamplerChanged,
    /// The vertex buffer had no room for another quad.
    BufferFull,
    /// `end()` was called.
    End,
    /// The target of the pending batch is about to be cleared.
    Clear,
    /// A resource the pending batch references is about to be freed.
    Free,
    /// A resource the pending batch references is about to get new pixels.
    DataChanged,
}

impl FlushReason {
    const COUNT: usize = 7;

    pub const ALL: [FlushReason; Self::COUNT] = [
        FlushReason::TargetChanged,
        FlushReason::SamplerChanged,
        FlushReason::BufferFull,
        FlushReason::End,
        FlushReason::Clear,
        FlushReason::Free,
        FlushReason::DataChanged,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for FlushReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FlushReason::TargetChanged => "target changed",
            FlushReason::SamplerChanged => "sampler changed",
            FlushReason::BufferFull => "buffer full",
            FlushReason::End => "end",
            FlushReason::Clear => "clear",
            FlushReason::Free => "free",
            FlushReason::DataChanged => "data changed",
        };
        f.write_str(s)
    }
}

/// Counters for the current `begin()` / `end()` pass.
///
/// Only flushes that actually issued a draw call are counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Number of backend draw calls.
    pub draw_calls: u32,
    /// Number of quads sent to the backend.
    pub quads: u32,
    flushes: [u32; FlushReason::COUNT],
}

impl RenderStats {
    /// Draw calls caused by `reason`.
    pub fn flushes(&self, reason: FlushReason) -> u32 {
        self.flushes[reason.index()]
    }

    pub fn vertices(&self) -> u32 {
        self.quads * 4
    }
}

impl fmt::Display for RenderStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} draw calls, {} quads", self.draw_calls, self.quads)?;
        for reason in FlushReason::ALL {
            let n = self.flushes(reason);
            if n > 0 {
                write!(f, ", {reason}: {n}")?;
            }
        }
        Ok(())
    }
}

/// The CPU-side vertex accumulator.
pub(crate) struct SpriteBatch {
    vertices: Vec<Vertex>,
    capacity: usize,
    target: Option<RenderTarget>,
    sampler: Option<SamplerId>,
    stats: RenderStats,
}

impl SpriteBatch {
    /// `capacity` is in vertices and must already be a non-zero multiple of 4.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity >= 4 && capacity % 4 == 0);
        Self {
            vertices: Vec::with_capacity(capacity),
            capacity,
            target: None,
            sampler: None,
            stats: RenderStats::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of pending vertices.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = RenderStats::default();
    }

    /// Drop pending vertices without drawing them.
    pub fn discard(&mut self) {
        self.vertices.clear();
        self.target = None;
        self.sampler = None;
    }

    /// Forget the current target and sampler. Pending vertices must have
    /// been flushed already.
    pub fn reset_state(&mut self) {
        debug_assert!(self.vertices.is_empty());
        self.target = None;
        self.sampler = None;
    }

    /// What would force a flush before a quad for `target` / `sampler` could
    /// be appended, if anything.
    pub fn break_reason(&self, target: RenderTarget, sampler: SamplerId) -> Option<FlushReason> {
        if self.vertices.is_empty() {
            None
        } else if self.target != Some(target) {
            Some(FlushReason::TargetChanged)
        } else if self.sampler != Some(sampler) {
            Some(FlushReason::SamplerChanged)
        } else if self.vertices.len() + 4 > self.capacity {
            Some(FlushReason::BufferFull)
        } else {
            None
        }
    }

    /// Append one quad, flushing first if the batch cannot take it.
    pub fn push_quad<B: GraphicsBackend>(
        &mut self,
        backend: &mut B,
        target: RenderTarget,
        sampler: SamplerId,
        quad: [Vertex; 4],
    ) -> Result<()> {
        if let Some(reason) = self.break_reason(target, sampler) {
            self.flush(backend, reason)?;
        }

        self.target = Some(target);
        self.sampler = Some(sampler);
        self.vertices.extend_from_slice(&quad);
        Ok(())
    }

    /// Send pending vertices to the backend. An empty batch draws nothing.
    pub fn flush<B: GraphicsBackend>(&mut self, backend: &mut B, reason: FlushReason) -> Result<()> {
        if self.vertices.is_empty() {
            return Ok(());
        }
        let (Some(target), Some(sampler)) = (self.target, self.sampler) else {
            // Vertices are only ever pushed together with a target and sampler.
            self.vertices.clear();
            return Ok(());
        };

        let quads = (self.vertices.len() / 4) as u32;
        log::trace!("flush ({reason}): {quads} quads to {target} sampling {sampler}");

        // Clear even when the backend fails so a broken batch is not retried.
        let result = backend.draw(target, sampler, &self.vertices);
        self.vertices.clear();
        result?;

        self.stats.draw_calls += 1;
        self.stats.quads += quads;
        self.stats.flushes[reason.index()] += 1;
        Ok(())
    }

    /// `true` if pending vertices sample from or draw into the resource.
    pub fn references_sampler(&self, sampler: SamplerId) -> bool {
        !self.vertices.is_empty() && self.sampler == Some(sampler)
    }

    pub fn references_target(&self, target: RenderTarget) -> bool {
        !self.vertices.is_empty() && self.target == Some(target)
    }
}
