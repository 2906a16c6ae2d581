//! Scene lights.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Light type and its geometric parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum LightKind {
    /// Infinitely distant light shining along `direction`.
    Directional { direction: Vec3 },
    /// Omnidirectional light with a finite range.
    Point { position: Vec3, range: f32 },
}

/// A light in the scene.
///
/// A light contributes only when the light itself is enabled and its owning
/// object is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Light {
    /// Display name, interpolated into per-light output file names.
    pub name: String,
    /// Light type.
    pub kind: LightKind,
    /// Linear color.
    #[serde(default = "Light::default_color")]
    pub color: Vec3,
    /// Intensity multiplier.
    #[serde(default = "Light::default_intensity")]
    pub intensity: f32,
    /// Whether the light component is enabled.
    #[serde(default = "Light::default_flag")]
    pub enabled: bool,
    /// Whether the object owning the light is active.
    #[serde(default = "Light::default_flag")]
    pub object_active: bool,
}

impl Light {
    fn default_color() -> Vec3 {
        Vec3::ONE
    }

    fn default_intensity() -> f32 {
        1.0
    }

    fn default_flag() -> bool {
        true
    }

    /// Creates an enabled white directional light.
    #[must_use]
    pub fn directional(name: impl Into<String>, direction: Vec3) -> Self {
        Self {
            name: name.into(),
            kind: LightKind::Directional { direction },
            color: Vec3::ONE,
            intensity: 1.0,
            enabled: true,
            object_active: true,
        }
    }

    /// Creates an enabled white point light.
    #[must_use]
    pub fn point(name: impl Into<String>, position: Vec3, range: f32) -> Self {
        Self {
            name: name.into(),
            kind: LightKind::Point { position, range },
            color: Vec3::ONE,
            intensity: 1.0,
            enabled: true,
            object_active: true,
        }
    }

    /// Returns whether this light currently contributes to rendering.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.enabled && self.object_active
    }

    /// Direction from `point` toward the light, and the distance to it
    /// (`f32::INFINITY` for directional lights).
    #[must_use]
    pub fn direction_from(&self, point: Vec3) -> (Vec3, f32) {
        match self.kind {
            LightKind::Directional { direction } => (-direction.normalize_or_zero(), f32::INFINITY),
            LightKind::Point { position, .. } => {
                let offset = position - point;
                let distance = offset.length();
                (offset.normalize_or_zero(), distance)
            }
        }
    }

    /// Distance falloff at `distance` from the light, in `[0, 1]`.
    #[must_use]
    pub fn attenuation(&self, distance: f32) -> f32 {
        match self.kind {
            LightKind::Directional { .. } => 1.0,
            LightKind::Point { range, .. } => {
                if range <= 0.0 || distance >= range {
                    0.0
                } else {
                    let falloff = 1.0 - distance / range;
                    falloff * falloff
                }
            }
        }
    }
}
