//! Rendering backend for texbake.
//!
//! This crate provides everything between the bake orchestrator and pixels
//! on disk:
//! - The [`RenderDevice`] seam and its CPU implementation [`SoftwareDevice`]
//! - Offscreen targets with scoped ownership ([`ScopedTargets`])
//! - Scoped replacement-shader binding ([`ShaderOverride`])
//! - Framebuffer readback ([`capture`]) and image encoding ([`encode_target`])

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod capture;
pub mod device;
pub mod encode;
pub mod error;
pub mod shader;
pub mod software;
pub mod target;

pub use capture::{capture, PixelBuffer, PixelFormat, ReadRect};
pub use device::{RenderDevice, Replacement, ShaderHandle};
pub use encode::{encode_pixels, encode_target, EncodedImage, Encoding};
pub use error::{RenderError, RenderResult};
pub use shader::{with_shader_override, ShaderOverride};
pub use software::{BuiltinProgram, RenderRecord, SoftwareDevice, RENDER_TYPE_TAG, STANDARD_SHADER};
pub use target::{ScopedTargets, TargetDescriptor, TextureFormat};
