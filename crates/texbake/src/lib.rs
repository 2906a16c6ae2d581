//! texbake: batch texture baking from a fixed camera.
//!
//! A bake renders one camera through a fixed schedule of passes and writes
//! one image per pass (or per pass and light):
//!
//! | Pass   | Renders                                     | File                       |
//! |--------|---------------------------------------------|----------------------------|
//! | Depth  | linear depth                                | `{cam}_Depth.exr`          |
//! | Albedo | albedo shader override                      | `{cam}_Albedo.png`         |
//! | AO     | ambient occlusion shader override           | `{cam}_AO.png`             |
//! | Alpha  | alpha shader override                       | `{cam}_Alpha.png`          |
//! | Normal | normal shader override                      | `{cam}_Normal.png`         |
//! | Shaded | bound materials, one light at a time        | `{cam}_Shaded_{light}.png` |
//! | Shadow | shadow receiver shader, one light at a time | `{cam}_Shadow_{light}.png` |
//!
//! Camera and light state is restored and every offscreen target released
//! when a bake returns, whether it completed, failed, or unwound.
//!
//! # Quick Start
//!
//! ```no_run
//! use texbake::*;
//!
//! let mut scene = Scene::from_json_file("scene.json").unwrap();
//! let options = BakeOptions::default().with_output_folder("sprites");
//! let mut device = SoftwareDevice::new();
//! let mut host = FsHost::new();
//!
//! let result = run_bake(&mut scene, "Front", &options, &mut device, &mut host);
//! println!("{result}");
//! ```

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod bake;
pub mod cli;
pub mod host;
mod pass_runner;
pub mod report;

pub use bake::{run_bake, run_bake_shared, run_batch, BakeOrchestrator, BakePhase};
pub use host::{BakeHost, FsHost, MemoryHost};
pub use report::{BakeResult, BakeState, PassOutcome, PassStatus};

// Re-export core types
pub use texbake_core::{
    schedule, BakeError, BakeOptions, Camera, ClearFlags, ErrorClass, LayerMask, Light, LightKind,
    Material, MeshObject, PassKind, PassSpec, PassToggles, Projection, Result, Scene, ShaderSlot,
    ShaderTable, TargetId,
};
pub use texbake_core::{Mat4, Quat, Vec2, Vec3, Vec4};

// Re-export render types
pub use texbake_render::{
    BuiltinProgram, EncodedImage, Encoding, RenderDevice, RenderError, RenderRecord, SoftwareDevice,
};
