//! Snapshot and guaranteed restoration of render-affecting scene state.
//!
//! A bake mutates the live scene in place: it retargets the camera, changes
//! its clear settings, culling mask, and near plane, and toggles light
//! flags. [`StateGuard`] captures all of it on entry and puts it back on
//! every exit path, including unwinding.

use std::ops::{Deref, DerefMut};

use glam::{Quat, Vec4};

use crate::camera::{Camera, ClearFlags, TargetId};
use crate::error::Result;
use crate::layer_mask::LayerMask;
use crate::scene::Scene;

/// Every camera field a bake pass may mutate.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraState {
    pub rotation: Quat,
    pub background: Vec4,
    pub clear_flags: ClearFlags,
    pub target_texture: Option<TargetId>,
    pub culling_mask: LayerMask,
    pub near: f32,
}

impl CameraState {
    /// Reads the snapshot from `camera`.
    #[must_use]
    pub fn capture(camera: &Camera) -> Self {
        Self {
            rotation: camera.rotation,
            background: camera.background,
            clear_flags: camera.clear_flags,
            target_texture: camera.target_texture,
            culling_mask: camera.culling_mask,
            near: camera.near,
        }
    }

    /// Writes the snapshot back into `camera`.
    pub fn apply(&self, camera: &mut Camera) {
        camera.rotation = self.rotation;
        camera.background = self.background;
        camera.clear_flags = self.clear_flags;
        camera.target_texture = self.target_texture;
        camera.culling_mask = self.culling_mask;
        camera.near = self.near;
    }
}

/// Recorded flags of one light.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightRecord {
    pub name: String,
    pub enabled: bool,
    pub object_active: bool,
}

/// Snapshot of every light's flags, in the scene's native order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LightRegistry {
    records: Vec<LightRecord>,
}

impl LightRegistry {
    /// Reads the flags of every light in `scene`, inactive ones included.
    #[must_use]
    pub fn capture(scene: &Scene) -> Self {
        Self {
            records: scene
                .lights
                .iter()
                .map(|light| LightRecord {
                    name: light.name.clone(),
                    enabled: light.enabled,
                    object_active: light.object_active,
                })
                .collect(),
        }
    }

    /// Writes every recorded flag back into `scene`.
    ///
    /// Lights are matched by position; the scene's light list cannot change
    /// while a bake holds it.
    pub fn restore(&self, scene: &mut Scene) {
        for (light, record) in scene.lights.iter_mut().zip(&self.records) {
            light.enabled = record.enabled;
            light.object_active = record.object_active;
        }
    }

    /// Recorded flags of the light at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&LightRecord> {
        self.records.get(index)
    }

    /// Iterates the records in scene order.
    pub fn iter(&self) -> impl Iterator<Item = &LightRecord> {
        self.records.iter()
    }

    /// Number of recorded lights.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the scene had no lights.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Captures camera and light state for the duration of a bake.
///
/// All scene access during the bake goes through the guard. State is
/// restored exactly once: by [`StateGuard::restore`], or by `Drop` if the
/// guard goes out of scope first.
pub struct StateGuard<'a> {
    scene: &'a mut Scene,
    camera_index: usize,
    camera_state: CameraState,
    light_registry: LightRegistry,
    restored: bool,
}

impl<'a> StateGuard<'a> {
    /// Snapshots the camera named `camera` and every light in `scene`.
    pub fn acquire(scene: &'a mut Scene, camera: &str) -> Result<Self> {
        let camera_index = scene.camera_index(camera)?;
        let camera_state = CameraState::capture(&scene.cameras[camera_index]);
        let light_registry = LightRegistry::capture(scene);
        log::debug!(
            "captured state of camera '{camera}' and {} light(s)",
            light_registry.len()
        );
        Ok(Self {
            scene,
            camera_index,
            camera_state,
            light_registry,
            restored: false,
        })
    }

    /// The guarded camera.
    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.scene.cameras[self.camera_index]
    }

    /// The guarded camera, mutably.
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.scene.cameras[self.camera_index]
    }

    /// The camera snapshot taken on entry.
    #[must_use]
    pub fn camera_state(&self) -> &CameraState {
        &self.camera_state
    }

    /// The light snapshot taken on entry.
    #[must_use]
    pub fn light_registry(&self) -> &LightRegistry {
        &self.light_registry
    }

    /// Restores the captured state now.
    pub fn restore(mut self) {
        self.restore_in_place();
    }

    fn restore_in_place(&mut self) {
        if self.restored {
            return;
        }
        self.restored = true;
        let camera = &mut self.scene.cameras[self.camera_index];
        self.camera_state.apply(camera);
        self.light_registry.restore(&mut *self.scene);
        log::debug!("restored state of camera '{}'", self.scene.cameras[self.camera_index].name);
    }
}

impl Deref for StateGuard<'_> {
    type Target = Scene;

    fn deref(&self) -> &Scene {
        &*self.scene
    }
}

impl DerefMut for StateGuard<'_> {
    fn deref_mut(&mut self) -> &mut Scene {
        &mut *self.scene
    }
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        self.restore_in_place();
    }
}
