//! Error type shared by every fallible call in the crate.
//!
//! Errors are shallow: a bad argument, a stale handle, an image the decoder
//! does not understand, or a GPU object that could not be created. Nothing is
//! retried; the caller decides what to do.

use std::path::PathBuf;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong inside PixelCannon.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An argument was out of range or otherwise unusable.
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument {
        name: &'static str,
        reason: String,
    },

    /// `begin()` was called while a batch was already open.
    #[error("draw already in progress")]
    DrawAlreadyInProgress,

    /// A draw call was made outside `begin()` / `end()`, or `end()` was called
    /// without a matching `begin()`.
    #[error("draw not currently in progress")]
    DrawNotInProgress,

    /// A texture or frame buffer handle no longer refers to a live resource.
    #[error("invalid {kind} handle {handle}")]
    InvalidHandle { kind: &'static str, handle: String },

    /// The image data is in a format the decoder does not support.
    #[error("unsupported image format: {0}")]
    UnsupportedImageFormat(String),

    /// The image decoder failed for a reason other than an unknown format.
    #[error("failed to decode image: {0}")]
    Image(#[source] image::ImageError),

    /// Reading a file from disk failed.
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The font file could not be parsed or rasterized.
    #[error("font error: {0}")]
    Font(String),

    /// The configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// wgpu could not create a surface for the window.
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    /// No GPU adapter is compatible with the window surface.
    #[error("no suitable GPU adapter: {0}")]
    RequestAdapter(#[from] wgpu::RequestAdapterError),

    /// The adapter refused to create a device.
    #[error("failed to create GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    /// Acquiring the next surface texture failed.
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    /// The windowing event loop failed.
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    /// The window could not be created.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
}

impl Error {
    pub(crate) fn invalid_argument(name: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        match e {
            image::ImageError::Unsupported(u) => Error::UnsupportedImageFormat(u.to_string()),
            other => Error::Image(other),
        }
    }
}
