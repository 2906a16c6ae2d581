//! Core abstractions for texbake.
//!
//! This crate provides the types the bake orchestrator works with:
//! - The scene model ([`Scene`], [`Camera`], [`Light`], [`MeshObject`])
//! - [`StateGuard`] for capturing and restoring render-affecting state
//! - [`LightIsolation`] for one-light-at-a-time iteration
//! - The declarative pass table ([`PassSpec`], [`schedule`])
//! - Configuration ([`BakeOptions`]) and errors

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]

pub mod camera;
pub mod error;
pub mod isolation;
pub mod layer_mask;
pub mod light;
pub mod options;
pub mod pass;
pub mod scene;
pub mod state;

pub use camera::{Camera, ClearFlags, Projection, TargetId};
pub use error::{BakeError, ErrorClass, Result};
pub use isolation::{for_each_light, IsolatedLight, LightIsolation};
pub use layer_mask::LayerMask;
pub use light::{Light, LightKind};
pub use options::{BakeOptions, PassToggles, ShaderSlot, ShaderTable};
pub use pass::{schedule, shader_label, PassKind, PassSpec, PerLightKind, ShaderRef};
pub use scene::{Material, MeshObject, Scene};
pub use state::{CameraState, LightRecord, LightRegistry, StateGuard};

// Re-export glam types for convenience
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
