//! Rendering error types.

use texbake_core::TargetId;
use thiserror::Error;

use crate::device::ShaderHandle;

/// Errors that can occur during rendering, readback, and encoding.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The target id does not name a live target.
    #[error("render target {0:?} does not exist")]
    TargetNotFound(TargetId),

    /// Targets and readbacks must have a positive size.
    #[error("invalid target size {width}x{height}")]
    InvalidTargetSize { width: u32, height: u32 },

    /// A readback was requested with no active target bound.
    #[error("no active render target bound for readback")]
    NoActiveTarget,

    /// The readback region does not fit the active target.
    #[error("readback of {width}x{height} exceeds target of {target_width}x{target_height}")]
    ReadOutOfBounds {
        width: u32,
        height: u32,
        target_width: u32,
        target_height: u32,
    },

    /// The camera has no target texture to render into.
    #[error("camera '{0}' has no target texture")]
    NoCameraTarget(String),

    /// A shader handle was not issued by this device.
    #[error("unknown shader handle {0:?}")]
    UnknownShader(ShaderHandle),

    /// Pixel data does not match its declared dimensions.
    #[error("invalid image data")]
    InvalidImageData,

    /// Image encoding failed.
    #[error("image encoding error: {0}")]
    ImageError(#[from] image::ImageError),

    /// The device can no longer render.
    #[error("device lost: {0}")]
    DeviceLost(String),
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;
