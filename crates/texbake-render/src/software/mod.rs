//! CPU reference implementation of [`RenderDevice`].
//!
//! `SoftwareDevice` rasterizes mesh objects into in-memory targets. It ships
//! the bake shaders under their default names, honors replacement shaders
//! by `RenderType` tag, traces shadow rays against active casters, and keeps
//! a log of every render call for inspection.

mod programs;
mod raster;
mod texture;

use std::collections::HashMap;

use glam::Vec4;
use texbake_core::{
    Camera, ClearFlags, LayerMask, Material, MeshObject, Scene, ShaderSlot, TargetId,
};

use crate::capture::{PixelBuffer, PixelFormat, ReadRect};
use crate::device::{RenderDevice, Replacement, ShaderHandle};
use crate::error::{RenderError, RenderResult};
use crate::target::TargetDescriptor;

pub use programs::BuiltinProgram;

use programs::ShadingContext;
use texture::{quantize, Texture};

/// Material tag replacement shaders are usually matched on.
pub const RENDER_TYPE_TAG: &str = "RenderType";

/// Name of the shader objects are drawn with when no replacement is bound.
pub const STANDARD_SHADER: &str = "Standard";

/// Render types the shadow receiver shaders draw.
const SHADOW_RECEIVER_TYPES: &[&str] = &["Opaque", "TransparentCutout"];

/// Render records kept by a new device.
const DEFAULT_LOG_CAPACITY: usize = 1024;

/// A shader registered on the device.
#[derive(Debug, Clone)]
struct ShaderEntry {
    name: String,
    program: BuiltinProgram,
    /// `RenderType` values this shader replaces. Empty means all.
    render_types: Vec<String>,
}

impl ShaderEntry {
    /// Whether an object with `material` is drawn when this shader replaces
    /// on `tag`. Objects without a matching tag value are not drawn at all.
    fn replaces(&self, tag: &str, material: &Material) -> bool {
        if tag.is_empty() {
            return true;
        }
        tag == RENDER_TYPE_TAG
            && (self.render_types.is_empty()
                || self.render_types.iter().any(|t| *t == material.render_type))
    }
}

/// One call to [`RenderDevice::render`] or [`RenderDevice::render_depth`].
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRecord {
    /// Camera rendered.
    pub camera: String,
    /// Replacement shader bound, by name.
    pub shader: Option<String>,
    /// Lights that were live during the call, in scene order.
    pub live_lights: Vec<String>,
    pub culling_mask: LayerMask,
    pub near: f32,
    /// Whether this was a depth render.
    pub depth: bool,
}

/// A CPU rasterizer implementing [`RenderDevice`].
#[derive(Debug)]
pub struct SoftwareDevice {
    shaders: Vec<ShaderEntry>,
    targets: HashMap<TargetId, Texture>,
    next_target: u64,
    replacement: Option<Replacement>,
    active_target: Option<TargetId>,
    replacement_supported: bool,
    render_log: Vec<RenderRecord>,
    log_capacity: usize,
}

impl SoftwareDevice {
    /// Creates a device with the standard shader and every bake shader
    /// registered under its default name.
    #[must_use]
    pub fn new() -> Self {
        let mut device = Self {
            shaders: Vec::new(),
            targets: HashMap::new(),
            next_target: 1,
            replacement: None,
            active_target: None,
            replacement_supported: true,
            render_log: Vec::new(),
            log_capacity: DEFAULT_LOG_CAPACITY,
        };
        device.register_shader(STANDARD_SHADER, BuiltinProgram::StandardLit, &[]);
        for slot in ShaderSlot::ALL {
            let (program, render_types): (BuiltinProgram, &[&str]) = match slot {
                ShaderSlot::Albedo => (BuiltinProgram::Albedo, &[]),
                ShaderSlot::Normal => (BuiltinProgram::Normal, &[]),
                ShaderSlot::AmbientOcclusion => (BuiltinProgram::AmbientOcclusion, &[]),
                ShaderSlot::Alpha => (BuiltinProgram::Alpha, &[]),
                ShaderSlot::Shadow => (BuiltinProgram::ShadowReceiver, SHADOW_RECEIVER_TYPES),
                ShaderSlot::ShadowInverted => {
                    (BuiltinProgram::ShadowReceiverInverted, SHADOW_RECEIVER_TYPES)
                }
            };
            device.register_shader(slot.default_shader_name(), program, render_types);
        }
        device
    }

    /// Sets whether replacement shaders are supported.
    #[must_use]
    pub fn with_replacement_support(mut self, supported: bool) -> Self {
        self.replacement_supported = supported;
        self
    }

    /// Keeps at most `capacity` render records, dropping the oldest first.
    /// Zero turns recording off.
    #[must_use]
    pub fn with_render_log_capacity(mut self, capacity: usize) -> Self {
        self.log_capacity = capacity;
        self.render_log.truncate(capacity);
        self
    }

    /// Registers `program` under `name`, replacing any shader already using
    /// that name. `render_types` lists the `RenderType` values it replaces;
    /// empty means every value.
    pub fn register_shader(
        &mut self,
        name: &str,
        program: BuiltinProgram,
        render_types: &[&str],
    ) -> ShaderHandle {
        let entry = ShaderEntry {
            name: name.to_string(),
            program,
            render_types: render_types.iter().map(ToString::to_string).collect(),
        };
        if let Some(index) = self.shaders.iter().position(|s| s.name == name) {
            self.shaders[index] = entry;
            return handle_for(index);
        }
        self.shaders.push(entry);
        handle_for(self.shaders.len() - 1)
    }

    /// Removes a shader so it no longer resolves by name.
    ///
    /// Handles issued for other shaders stay valid.
    pub fn unregister_shader(&mut self, name: &str) {
        if let Some(entry) = self.shaders.iter_mut().find(|s| s.name == name) {
            entry.name.clear();
        }
    }

    /// The most recent render calls, oldest first.
    #[must_use]
    pub fn render_log(&self) -> &[RenderRecord] {
        &self.render_log
    }

    /// Forgets the render log.
    pub fn clear_render_log(&mut self) {
        self.render_log.clear();
    }

    fn shader(&self, handle: ShaderHandle) -> RenderResult<&ShaderEntry> {
        self.shaders
            .get(handle.0 as usize)
            .ok_or(RenderError::UnknownShader(handle))
    }

    fn record(&mut self, scene: &Scene, camera: &Camera, shader: Option<String>, depth: bool) {
        if self.log_capacity == 0 {
            return;
        }
        if self.render_log.len() >= self.log_capacity {
            let excess = self.render_log.len() + 1 - self.log_capacity;
            self.render_log.drain(..excess);
        }
        self.render_log.push(RenderRecord {
            camera: camera.name.clone(),
            shader,
            live_lights: scene
                .live_light_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            culling_mask: camera.culling_mask,
            near: camera.near,
            depth,
        });
    }
}

impl Default for SoftwareDevice {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::cast_possible_truncation)]
fn handle_for(index: usize) -> ShaderHandle {
    ShaderHandle(index as u32)
}

fn camera_target(camera: &Camera) -> RenderResult<TargetId> {
    camera
        .target_texture
        .ok_or_else(|| RenderError::NoCameraTarget(camera.name.clone()))
}

fn visible<'s>(scene: &'s Scene, camera: &Camera) -> impl Iterator<Item = &'s MeshObject> {
    let mask = camera.culling_mask;
    scene
        .objects
        .iter()
        .filter(move |o| o.active && mask.contains(o.layer))
}

impl RenderDevice for SoftwareDevice {
    fn name(&self) -> &str {
        "software"
    }

    fn supports_replacement_shaders(&self) -> bool {
        self.replacement_supported
    }

    fn find_shader(&self, name: &str) -> Option<ShaderHandle> {
        if name.is_empty() {
            return None;
        }
        self.shaders
            .iter()
            .position(|s| s.name == name)
            .map(handle_for)
    }

    fn create_target(&mut self, desc: &TargetDescriptor) -> RenderResult<TargetId> {
        desc.validate()?;
        let id = TargetId(self.next_target);
        self.next_target += 1;
        self.targets.insert(id, Texture::new(desc.clone()));
        Ok(id)
    }

    fn destroy_target(&mut self, id: TargetId) {
        self.targets.remove(&id);
        if self.active_target == Some(id) {
            self.active_target = None;
        }
    }

    fn target_descriptor(&self, id: TargetId) -> Option<&TargetDescriptor> {
        self.targets.get(&id).map(|t| &t.desc)
    }

    fn allocated_targets(&self) -> usize {
        self.targets.len()
    }

    fn set_replacement(&mut self, replacement: Option<Replacement>) {
        self.replacement = replacement;
    }

    fn replacement(&self) -> Option<&Replacement> {
        self.replacement.as_ref()
    }

    fn render(&mut self, scene: &Scene, camera: &Camera) -> RenderResult<()> {
        let target = camera_target(camera)?;
        let replacement = match &self.replacement {
            Some(r) => Some((self.shader(r.shader)?.clone(), r.tag.clone())),
            None => None,
        };
        let texture = self
            .targets
            .get_mut(&target)
            .ok_or(RenderError::TargetNotFound(target))?;

        match camera.clear_flags {
            ClearFlags::Skybox => {
                texture.fill(scene.sky_color);
                texture.clear_depth();
            }
            ClearFlags::SolidColor => {
                texture.fill(camera.background);
                texture.clear_depth();
            }
            ClearFlags::DepthOnly => texture.clear_depth(),
            ClearFlags::Nothing => {}
        }

        let ctx = ShadingContext::new(scene, camera);
        for object in visible(scene, camera) {
            let program = match &replacement {
                None => BuiltinProgram::StandardLit,
                Some((entry, tag)) if entry.replaces(tag, &object.material) => entry.program,
                Some(_) => continue,
            };
            raster::draw_object(object, camera, texture, |fragment| {
                programs::shade(program, fragment, &ctx)
            });
        }

        let shader = replacement.map(|(entry, _)| entry.name);
        log::trace!(
            "rendered camera '{}' into {target:?} with {}",
            camera.name,
            shader.as_deref().unwrap_or(STANDARD_SHADER)
        );
        self.record(scene, camera, shader, false);
        Ok(())
    }

    fn render_depth(&mut self, scene: &Scene, camera: &Camera) -> RenderResult<()> {
        let target = camera_target(camera)?;
        let texture = self
            .targets
            .get_mut(&target)
            .ok_or(RenderError::TargetNotFound(target))?;

        texture.fill(Vec4::ONE);
        texture.clear_depth();
        let range = (camera.far - camera.near).max(f32::EPSILON);
        for object in visible(scene, camera) {
            raster::draw_object(object, camera, texture, |fragment| {
                Vec4::splat(((fragment.view_depth - camera.near) / range).clamp(0.0, 1.0))
            });
        }

        log::trace!("rendered depth of camera '{}' into {target:?}", camera.name);
        self.record(scene, camera, None, true);
        Ok(())
    }

    fn blit(&mut self, src: TargetId, dst: TargetId) -> RenderResult<()> {
        let source = self.targets.get(&src).ok_or(RenderError::TargetNotFound(src))?;
        let (width, height) = (source.width(), source.height());
        let pixels = source.pixels().to_vec();
        let dest = self
            .targets
            .get_mut(&dst)
            .ok_or(RenderError::TargetNotFound(dst))?;
        if dest.width() != width || dest.height() != height {
            return Err(RenderError::InvalidTargetSize {
                width: dest.width(),
                height: dest.height(),
            });
        }
        dest.copy_from(&pixels);
        Ok(())
    }

    fn set_active_target(&mut self, target: Option<TargetId>) {
        self.active_target = target;
    }

    fn active_target(&self) -> Option<TargetId> {
        self.active_target
    }

    fn read_pixels(&self, rect: ReadRect, format: PixelFormat) -> RenderResult<PixelBuffer> {
        let id = self.active_target.ok_or(RenderError::NoActiveTarget)?;
        let texture = self.targets.get(&id).ok_or(RenderError::TargetNotFound(id))?;
        let fits = |offset: u32, len: u32, limit: u32| {
            offset.checked_add(len).is_some_and(|end| end <= limit)
        };
        if !fits(rect.x, rect.width, texture.width()) || !fits(rect.y, rect.height, texture.height())
        {
            return Err(RenderError::ReadOutOfBounds {
                width: rect.width,
                height: rect.height,
                target_width: texture.width(),
                target_height: texture.height(),
            });
        }

        let rows = rect.y..rect.y + rect.height;
        let texels = rows.flat_map(|y| (rect.x..rect.x + rect.width).map(move |x| (x, y)));
        Ok(match format {
            PixelFormat::Rgba8 => PixelBuffer::Rgba8 {
                width: rect.width,
                height: rect.height,
                data: texels.flat_map(|(x, y)| quantize(texture.get(x, y))).collect(),
            },
            PixelFormat::Rgba32F => PixelBuffer::Rgba32F {
                width: rect.width,
                height: rect.height,
                data: texels.flat_map(|(x, y)| texture.get(x, y).to_array()).collect(),
            },
        })
    }
}
