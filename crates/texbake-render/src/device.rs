//! The render device seam.
//!
//! The bake never draws anything itself. It asks a [`RenderDevice`] to
//! resolve shaders, allocate targets, render a camera, and read pixels back.
//! [`crate::SoftwareDevice`] is the CPU reference implementation.

use texbake_core::{Camera, Scene, TargetId};

use crate::capture::{PixelBuffer, PixelFormat, ReadRect};
use crate::error::RenderResult;
use crate::target::TargetDescriptor;

/// Handle to a shader known to a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u32);

/// A replacement shader bound for the next render call.
///
/// Every object whose material carries a value for `tag` that the shader
/// declares is drawn with the shader instead of its own material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub shader: ShaderHandle,
    pub tag: String,
}

/// A device that can render a scene camera into offscreen targets and read
/// the results back.
pub trait RenderDevice {
    /// Device name for logs.
    fn name(&self) -> &str;

    /// Whether [`RenderDevice::set_replacement`] is honored.
    fn supports_replacement_shaders(&self) -> bool {
        true
    }

    /// Resolves a shader by its logical name.
    fn find_shader(&self, name: &str) -> Option<ShaderHandle>;

    /// Allocates a target.
    fn create_target(&mut self, desc: &TargetDescriptor) -> RenderResult<TargetId>;

    /// Releases a target. Unknown ids are ignored.
    fn destroy_target(&mut self, id: TargetId);

    /// Descriptor of a live target.
    fn target_descriptor(&self, id: TargetId) -> Option<&TargetDescriptor>;

    /// Number of targets currently allocated.
    fn allocated_targets(&self) -> usize;

    /// Binds or clears the replacement shader used by render calls.
    fn set_replacement(&mut self, replacement: Option<Replacement>);

    /// The currently bound replacement shader.
    fn replacement(&self) -> Option<&Replacement>;

    /// Renders `camera` into its target texture. Blocks until the target is
    /// ready for readback.
    fn render(&mut self, scene: &Scene, camera: &Camera) -> RenderResult<()>;

    /// Renders linear depth of `camera`'s view into its target texture.
    fn render_depth(&mut self, scene: &Scene, camera: &Camera) -> RenderResult<()>;

    /// Copies `src` into `dst`, converting between their formats. Both
    /// targets must have the same size.
    fn blit(&mut self, src: TargetId, dst: TargetId) -> RenderResult<()>;

    /// Binds the target pixel reads come from.
    fn set_active_target(&mut self, target: Option<TargetId>);

    /// The target pixel reads come from.
    fn active_target(&self) -> Option<TargetId>;

    /// Reads `rect` of the active target in `format`.
    fn read_pixels(&self, rect: ReadRect, format: PixelFormat) -> RenderResult<PixelBuffer>;
}
