//! The bake orchestrator.
//!
//! A bake runs one camera through the pass schedule:
//!
//! ```text
//! Idle -> Preparing -> Running(0) -> ... -> Running(n) -> Restoring -> Done
//!            |                 \___________________________/
//!            v                              | runtime error
//!          Failed  <----------- Restoring <-'
//! ```
//!
//! Configuration errors fail the bake in `Preparing`, before any scene state
//! is touched. Once running, a skipped or failed pass never stops the
//! schedule; only a render failure aborts it. Scene state is restored and
//! every offscreen target released on every path, including unwinding.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use texbake_core::{
    schedule, BakeError, BakeOptions, ClearFlags, PassKind, PassSpec, Result, Scene, StateGuard,
};
use texbake_render::{RenderDevice, RenderError, ScopedTargets, TargetDescriptor};

use crate::host::BakeHost;
use crate::pass_runner::{BakeTargets, PassRunner};
use crate::report::{BakeResult, BakeState, PassOutcome};

/// Where a bake currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BakePhase {
    Idle,
    /// Validating configuration.
    Preparing,
    /// Running the pass at this schedule index.
    Running(usize),
    /// Putting scene state back.
    Restoring,
    Done,
    Failed,
}

fn advance(phase: &mut BakePhase, next: BakePhase) {
    log::debug!("bake phase {phase:?} -> {next:?}");
    *phase = next;
}

fn runtime(err: RenderError) -> BakeError {
    BakeError::RenderError(err.to_string())
}

/// Drives bakes on one device, writing through one host.
pub struct BakeOrchestrator<'a, D: RenderDevice + ?Sized, H: BakeHost + ?Sized> {
    device: &'a mut D,
    host: &'a mut H,
    options: &'a BakeOptions,
    phase: BakePhase,
}

impl<'a, D: RenderDevice + ?Sized, H: BakeHost + ?Sized> BakeOrchestrator<'a, D, H> {
    /// Creates an idle orchestrator.
    pub fn new(device: &'a mut D, host: &'a mut H, options: &'a BakeOptions) -> Self {
        Self {
            device,
            host,
            options,
            phase: BakePhase::Idle,
        }
    }

    /// Phase of the most recent bake.
    pub fn phase(&self) -> BakePhase {
        self.phase
    }

    /// Bakes `camera`, then notifies the host once if the bake completed.
    pub fn bake(&mut self, scene: &mut Scene, camera: &str) -> BakeResult {
        let result = self.bake_camera(scene, camera);
        if result.state == BakeState::Done {
            self.host.refresh_assets();
        }
        result
    }

    /// Bakes each camera in turn, then notifies the host once if any bake
    /// completed.
    pub fn bake_batch<S: AsRef<str>>(
        &mut self,
        scene: &mut Scene,
        cameras: &[S],
    ) -> Result<Vec<BakeResult>> {
        if cameras.is_empty() {
            return Err(BakeError::NoCamera);
        }
        let results: Vec<BakeResult> = cameras
            .iter()
            .map(|camera| self.bake_camera(scene, camera.as_ref()))
            .collect();
        if results.iter().any(|r| r.state == BakeState::Done) {
            self.host.refresh_assets();
        }
        Ok(results)
    }

    fn bake_camera(&mut self, scene: &mut Scene, camera: &str) -> BakeResult {
        advance(&mut self.phase, BakePhase::Preparing);
        if let Err(err) = self.prepare(scene, camera) {
            log::error!("bake of camera '{camera}' failed before rendering: {err}");
            advance(&mut self.phase, BakePhase::Failed);
            return BakeResult {
                camera: camera.to_string(),
                state: BakeState::Failed,
                passes: Vec::new(),
                error: Some(err.to_string()),
            };
        }

        let passes = schedule(self.options);
        let mut outcomes = Vec::with_capacity(passes.len());
        match self.run_schedule(scene, camera, &passes, &mut outcomes) {
            Ok(()) => {
                advance(&mut self.phase, BakePhase::Done);
                let result = BakeResult {
                    camera: camera.to_string(),
                    state: BakeState::Done,
                    passes: outcomes,
                    error: None,
                };
                log::info!("{result}");
                result
            }
            Err(err) => {
                log::error!("bake of camera '{camera}' aborted: {err}");
                advance(&mut self.phase, BakePhase::Failed);
                BakeResult {
                    camera: camera.to_string(),
                    state: BakeState::Failed,
                    passes: outcomes,
                    error: Some(err.to_string()),
                }
            }
        }
    }

    fn prepare(&mut self, scene: &Scene, camera: &str) -> Result<()> {
        self.options.validate()?;
        scene.camera_index(camera)?;
        if !self.device.supports_replacement_shaders() {
            return Err(BakeError::UnsupportedDevice(self.device.name().to_string()));
        }
        self.host.ensure_directory(&self.options.output_folder)
    }

    fn run_schedule(
        &mut self,
        scene: &mut Scene,
        camera: &str,
        passes: &[PassSpec],
        outcomes: &mut Vec<PassOutcome>,
    ) -> Result<()> {
        let (width, height) = (self.options.output_width, self.options.output_height);
        let mut device = ScopedTargets::new(&mut *self.device);
        let color = device
            .create(&TargetDescriptor::color("bake color target", width, height))
            .map_err(runtime)?;
        let depth = if passes.iter().any(|p| p.kind == PassKind::Depth) {
            let desc = TargetDescriptor::depth("bake depth target", width, height);
            Some(device.create(&desc).map_err(runtime)?)
        } else {
            None
        };

        let mut guard = StateGuard::acquire(scene, camera)?;
        let base_near = guard.camera_state().near;
        let cam = guard.camera_mut();
        cam.target_texture = Some(color);
        cam.clear_flags = ClearFlags::SolidColor;
        cam.background = self.options.clear_color;

        let mut runner = PassRunner {
            device: &mut *device,
            host: &mut *self.host,
            options: self.options,
            camera,
            base_near,
            targets: BakeTargets { color, depth },
            written: HashSet::new(),
        };
        let mut status = Ok(());
        for (index, pass) in passes.iter().enumerate() {
            advance(&mut self.phase, BakePhase::Running(index));
            match runner.run(&mut guard, pass) {
                Ok(pass_outcomes) => outcomes.extend(pass_outcomes),
                Err(err) => {
                    log::error!("{} pass aborted the bake: {err}", pass.label);
                    status = Err(err);
                    break;
                }
            }
        }

        advance(&mut self.phase, BakePhase::Restoring);
        guard.restore();
        drop(device);
        status
    }
}

/// Bakes `camera` in `scene` with `options`.
pub fn run_bake<D, H>(
    scene: &mut Scene,
    camera: &str,
    options: &BakeOptions,
    device: &mut D,
    host: &mut H,
) -> BakeResult
where
    D: RenderDevice + ?Sized,
    H: BakeHost + ?Sized,
{
    BakeOrchestrator::new(device, host, options).bake(scene, camera)
}

/// Bakes every camera in `cameras`. An empty list is a configuration error.
pub fn run_batch<D, H, S>(
    scene: &mut Scene,
    cameras: &[S],
    options: &BakeOptions,
    device: &mut D,
    host: &mut H,
) -> Result<Vec<BakeResult>>
where
    D: RenderDevice + ?Sized,
    H: BakeHost + ?Sized,
    S: AsRef<str>,
{
    BakeOrchestrator::new(device, host, options).bake_batch(scene, cameras)
}

/// Bakes `camera` in a shared scene, holding the lock for the whole bake so
/// no two bakes mutate the scene at once.
///
/// A lock poisoned by a panicking bake is still usable: the panicking bake
/// restored scene state while unwinding.
pub fn run_bake_shared<D, H>(
    scene: &Mutex<Scene>,
    camera: &str,
    options: &BakeOptions,
    device: &mut D,
    host: &mut H,
) -> BakeResult
where
    D: RenderDevice + ?Sized,
    H: BakeHost + ?Sized,
{
    let mut scene = scene.lock().unwrap_or_else(PoisonError::into_inner);
    run_bake(&mut scene, camera, options, device, host)
}
