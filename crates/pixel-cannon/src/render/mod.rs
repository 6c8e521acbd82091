//! # Render: The wgpu Backend
//!
//! - [`gpu`]: device, queue and window surface ([`GpuContext`])
//! - [`pipeline`]: shader, bind group layouts and the shared buffers
//! - [`backend`]: [`WgpuBackend`], the [`GraphicsBackend`](crate::graphics::GraphicsBackend)
//!   that turns batch flushes into render passes

pub mod backend;
pub mod gpu;
pub(crate) mod pipeline;

pub use backend::WgpuBackend;
pub use gpu::GpuContext;
