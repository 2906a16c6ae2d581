//! Fragment programs run by the software device.

use glam::{Mat4, Vec3, Vec4};
use texbake_core::{Camera, Light, MeshObject, Scene};

use super::raster::Fragment;

/// Offset applied to shadow ray origins to avoid self-intersection.
const SHADOW_BIAS: f32 = 1e-3;

/// What a software shader computes per fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinProgram {
    /// Base color lit by ambient plus every live light, with cast shadows.
    StandardLit,
    /// Unlit base color.
    Albedo,
    /// View-space normal remapped to `[0, 1]`.
    Normal,
    /// Per-vertex ambient occlusion as grayscale.
    AmbientOcclusion,
    /// Base color alpha as grayscale.
    Alpha,
    /// White where lit, black where shadowed.
    ShadowReceiver,
    /// Black where lit, white where shadowed.
    ShadowReceiverInverted,
}

/// Per-render inputs shared by every fragment.
pub(crate) struct ShadingContext<'a> {
    scene: &'a Scene,
    view: Mat4,
    lights: Vec<&'a Light>,
}

impl<'a> ShadingContext<'a> {
    pub(crate) fn new(scene: &'a Scene, camera: &Camera) -> Self {
        Self {
            scene,
            view: camera.view_matrix(),
            lights: scene.lights.iter().filter(|l| l.is_live()).collect(),
        }
    }

    /// Fraction of `light` reaching `position` after falloff and occlusion.
    fn visibility(&self, light: &Light, position: Vec3) -> f32 {
        let (direction, distance) = light.direction_from(position);
        let falloff = light.attenuation(distance);
        if falloff <= 0.0 || direction == Vec3::ZERO {
            return 0.0;
        }
        let origin = position + direction * SHADOW_BIAS;
        if occluded(self.scene, origin, direction, distance - SHADOW_BIAS) {
            0.0
        } else {
            falloff
        }
    }

    /// Share of live lights that reach `position` unoccluded.
    #[allow(clippy::cast_precision_loss)]
    fn lit_fraction(&self, position: Vec3) -> f32 {
        if self.lights.is_empty() {
            return 0.0;
        }
        let reached = self
            .lights
            .iter()
            .filter(|light| self.visibility(light, position) > 0.0)
            .count();
        reached as f32 / self.lights.len() as f32
    }
}

pub(crate) fn shade(program: BuiltinProgram, fragment: &Fragment<'_>, ctx: &ShadingContext<'_>) -> Vec4 {
    let base = fragment.object.material.base_color;
    match program {
        BuiltinProgram::StandardLit => {
            let irradiance = ctx.lights.iter().fold(ctx.scene.ambient, |sum, light| {
                let (direction, _) = light.direction_from(fragment.position);
                let lambert = fragment.normal.dot(direction).max(0.0);
                if lambert <= 0.0 {
                    return sum;
                }
                sum + light.color
                    * light.intensity
                    * lambert
                    * ctx.visibility(light, fragment.position)
            });
            (base.truncate() * irradiance).extend(base.w)
        }
        BuiltinProgram::Albedo => base,
        BuiltinProgram::Normal => {
            let n = ctx.view.transform_vector3(fragment.normal).normalize_or_zero();
            (n * 0.5 + Vec3::splat(0.5)).extend(1.0)
        }
        BuiltinProgram::AmbientOcclusion => Vec3::splat(fragment.occlusion).extend(1.0),
        BuiltinProgram::Alpha => Vec3::splat(base.w).extend(1.0),
        BuiltinProgram::ShadowReceiver => {
            Vec3::splat(ctx.lit_fraction(fragment.position)).extend(1.0)
        }
        BuiltinProgram::ShadowReceiverInverted => {
            Vec3::splat(1.0 - ctx.lit_fraction(fragment.position)).extend(1.0)
        }
    }
}

/// Whether a ray hits any active shadow caster before `max_distance`.
///
/// Casters are tested regardless of any camera culling mask.
pub(crate) fn occluded(scene: &Scene, origin: Vec3, direction: Vec3, max_distance: f32) -> bool {
    scene
        .objects
        .iter()
        .filter(|o| o.active && o.casts_shadows)
        .flat_map(MeshObject::triangle_vertices)
        .any(|(_, tri)| intersect(origin, direction, tri).is_some_and(|t| t < max_distance))
}

/// Möller–Trumbore ray/triangle intersection, returning the hit distance.
fn intersect(origin: Vec3, direction: Vec3, [a, b, c]: [Vec3; 3]) -> Option<f32> {
    let e1 = b - a;
    let e2 = c - a;
    let p = direction.cross(e2);
    let det = e1.dot(p);
    if det.abs() < 1e-8 {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(e1);
    let v = direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = e2.dot(q) * inv_det;
    (t > 1e-6).then_some(t)
}
