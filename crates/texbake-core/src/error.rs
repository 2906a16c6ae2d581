//! Error types for texbake.

use std::path::PathBuf;

use thiserror::Error;

/// How an error affects a running bake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Fatal before any pass runs; nothing is rendered.
    Configuration,
    /// A shader could not be resolved; the affected pass is skipped.
    Resolution,
    /// Capture, encode, or write failed; only the affected pass fails.
    Capture,
    /// Anything else; the bake aborts after restoring scene state.
    Runtime,
}

/// The main error type for texbake operations.
#[derive(Error, Debug)]
pub enum BakeError {
    /// No camera was named for the bake.
    #[error("no camera selected for baking")]
    NoCamera,

    /// The named camera does not exist in the scene.
    #[error("camera '{0}' not found in scene")]
    CameraNotFound(String),

    /// Output resolution must be positive in both dimensions.
    #[error("invalid output resolution {width}x{height}")]
    InvalidResolution { width: u32, height: u32 },

    /// The output folder could not be created or is read-only.
    #[error("output folder '{}' is not writable: {reason}", path.display())]
    OutputNotWritable { path: PathBuf, reason: String },

    /// The device cannot substitute shaders for a render call.
    #[error("render device '{0}' does not support replacement shaders")]
    UnsupportedDevice(String),

    /// A shader named in the shader table is unknown to the device.
    #[error("shader '{0}' could not be resolved")]
    ShaderNotFound(String),

    /// Reading back or encoding a framebuffer failed.
    #[error("capture error: {0}")]
    CaptureError(String),

    /// Writing an encoded image failed.
    #[error("failed to write '{}': {source}", path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An earlier pass of the same bake already wrote this path.
    #[error("duplicate output path '{}'", .0.display())]
    DuplicateOutput(PathBuf),

    /// The device failed while rendering.
    #[error("render error: {0}")]
    RenderError(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl BakeError {
    /// Classifies this error; the pass runner contains or propagates it by
    /// class.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            BakeError::NoCamera
            | BakeError::CameraNotFound(_)
            | BakeError::InvalidResolution { .. }
            | BakeError::OutputNotWritable { .. }
            | BakeError::UnsupportedDevice(_)
            | BakeError::JsonError(_) => ErrorClass::Configuration,
            BakeError::ShaderNotFound(_) => ErrorClass::Resolution,
            BakeError::CaptureError(_)
            | BakeError::WriteError { .. }
            | BakeError::DuplicateOutput(_) => ErrorClass::Capture,
            BakeError::RenderError(_) | BakeError::IoError(_) => ErrorClass::Runtime,
        }
    }
}

/// A specialized Result type for texbake operations.
pub type Result<T> = std::result::Result<T, BakeError>;
