//! Executes one scheduled pass: bind the shader override, render, capture,
//! encode, and write.
//!
//! Errors are contained by [`ErrorClass`]: an unresolved shader skips the
//! pass, a capture, encode, or write failure fails it, and anything else
//! aborts the bake.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use texbake_core::{
    for_each_light, BakeError, BakeOptions, ErrorClass, PassKind, PassSpec, Result, Scene,
    ShaderRef, TargetId,
};
use texbake_render::{encode_target, with_shader_override, RenderDevice, ShaderHandle};

use crate::host::BakeHost;
use crate::report::PassOutcome;

/// The offscreen targets a bake renders into.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BakeTargets {
    pub(crate) color: TargetId,
    pub(crate) depth: Option<TargetId>,
}

pub(crate) struct PassRunner<'a, D: RenderDevice + ?Sized, H: BakeHost + ?Sized> {
    pub(crate) device: &'a mut D,
    pub(crate) host: &'a mut H,
    pub(crate) options: &'a BakeOptions,
    pub(crate) camera: &'a str,
    /// Near clip plane of the camera before the bake.
    pub(crate) base_near: f32,
    pub(crate) targets: BakeTargets,
    /// Paths written so far in this bake.
    pub(crate) written: HashSet<PathBuf>,
}

impl<D: RenderDevice + ?Sized, H: BakeHost + ?Sized> PassRunner<'_, D, H> {
    /// Runs `pass` against `scene`, returning one outcome per output.
    ///
    /// Only errors that abort the bake are returned as `Err`.
    pub(crate) fn run(&mut self, scene: &mut Scene, pass: &PassSpec) -> Result<Vec<PassOutcome>> {
        let shader = match pass.shader().map(|shader| self.resolve(shader)).transpose() {
            Ok(shader) => shader,
            Err(err) => return Ok(vec![contain(err, pass, None, None)?]),
        };

        let target = match pass.kind {
            PassKind::Depth => self
                .targets
                .depth
                .ok_or_else(|| BakeError::RenderError("no depth target allocated".to_string()))?,
            PassKind::ShaderOverride(_) | PassKind::PerLight(_) => self.targets.color,
        };
        let camera = scene
            .camera_mut(self.camera)
            .ok_or_else(|| BakeError::CameraNotFound(self.camera.to_string()))?;
        camera.culling_mask = pass.culling_mask;
        camera.near = pass.near_clip.unwrap_or(self.base_near);
        camera.target_texture = Some(target);

        if !pass.is_per_light() {
            return Ok(vec![self.render_once(scene, pass, shader, target, None)?]);
        }
        if scene.lights.is_empty() {
            log::warn!("skipping {} pass: scene has no lights", pass.label);
            return Ok(vec![PassOutcome::skipped(&pass.label, "scene has no lights")]);
        }

        let mut outcomes = Vec::with_capacity(scene.lights.len());
        for_each_light(scene, |light| {
            let outcome =
                self.render_once(light.scene(), pass, shader, target, Some(light.name()))?;
            outcomes.push(outcome);
            Ok::<(), BakeError>(())
        })?;
        Ok(outcomes)
    }

    fn resolve(&self, shader: &ShaderRef) -> Result<ShaderHandle> {
        let name = shader
            .shader_name(self.options)
            .ok_or_else(|| BakeError::ShaderNotFound(shader.describe()))?;
        self.device
            .find_shader(name)
            .ok_or_else(|| BakeError::ShaderNotFound(name.to_string()))
    }

    fn render_once(
        &mut self,
        scene: &Scene,
        pass: &PassSpec,
        shader: Option<ShaderHandle>,
        target: TargetId,
        light: Option<&str>,
    ) -> Result<PassOutcome> {
        let path = pass.output_path(&self.options.output_folder, self.camera, light);
        match self.render_and_write(scene, pass, shader, target, &path) {
            Ok(()) => {
                log::info!("wrote {}", path.display());
                Ok(PassOutcome::succeeded(&pass.label, light, path))
            }
            Err(err) => contain(err, pass, light, Some(path)),
        }
    }

    fn render_and_write(
        &mut self,
        scene: &Scene,
        pass: &PassSpec,
        shader: Option<ShaderHandle>,
        target: TargetId,
        path: &Path,
    ) -> Result<()> {
        if self.written.contains(path) {
            return Err(BakeError::DuplicateOutput(path.to_path_buf()));
        }
        let camera = scene
            .camera(self.camera)
            .ok_or_else(|| BakeError::CameraNotFound(self.camera.to_string()))?;

        let rendered = match pass.kind {
            PassKind::Depth => self.device.render_depth(scene, camera),
            PassKind::ShaderOverride(_) | PassKind::PerLight(_) => {
                let tag = self.options.replacement_tag.as_str();
                with_shader_override(&mut *self.device, shader, tag, |device| {
                    device.render(scene, camera)
                })
            }
        };
        rendered.map_err(|e| BakeError::RenderError(e.to_string()))?;

        let image = encode_target(
            &mut *self.device,
            target,
            self.options.output_width,
            self.options.output_height,
            path,
        )
        .map_err(|e| BakeError::CaptureError(e.to_string()))?;
        self.host.write_file(image.path(), image.bytes())?;
        self.written.insert(path.to_path_buf());
        Ok(())
    }
}

/// Turns a pass error into an outcome, or hands it back when it aborts the
/// bake.
fn contain(
    err: BakeError,
    pass: &PassSpec,
    light: Option<&str>,
    path: Option<PathBuf>,
) -> Result<PassOutcome> {
    match err.class() {
        ErrorClass::Resolution => {
            log::warn!("skipping {} pass: {err}", pass.label);
            Ok(PassOutcome::skipped(&pass.label, err.to_string()))
        }
        ErrorClass::Capture => {
            log::error!("{} pass failed: {err}", pass.label);
            Ok(PassOutcome::failed(&pass.label, light, path, err.to_string()))
        }
        ErrorClass::Configuration | ErrorClass::Runtime => Err(err),
    }
}
