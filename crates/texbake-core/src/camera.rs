//! Bake camera and view math.

use glam::{Mat4, Quat, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::layer_mask::LayerMask;

/// Opaque handle to an offscreen render target owned by a render device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(pub u64);

/// What the camera clears before drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearFlags {
    /// Clear color to the scene sky color, and depth.
    #[default]
    Skybox,
    /// Clear color to the camera background color, and depth.
    SolidColor,
    /// Clear depth only.
    DepthOnly,
    /// Clear nothing.
    Nothing,
}

/// Camera projection.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Projection {
    /// Perspective projection using the camera's vertical field of view.
    #[default]
    Perspective,
    /// Orthographic projection with the given half height in world units.
    Orthographic { half_height: f32 },
}

/// A camera in the scene being baked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    /// Display name, used as the output file prefix.
    pub name: String,
    /// Camera position in world space.
    pub position: Vec3,
    /// World rotation. The camera looks down its local -Z.
    pub rotation: Quat,
    /// Vertical field of view in radians.
    pub fov: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
    /// Projection mode.
    pub projection: Projection,
    /// Clear color used with [`ClearFlags::SolidColor`].
    pub background: Vec4,
    /// Clear behavior.
    pub clear_flags: ClearFlags,
    /// Render target, or `None` to render to the display.
    pub target_texture: Option<TargetId>,
    /// Layers visible to this camera.
    pub culling_mask: LayerMask,
}

impl Camera {
    /// Creates a camera at `(0, 0, 3)` looking at the origin.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: Vec3::new(0.0, 0.0, 3.0),
            rotation: Quat::IDENTITY,
            fov: std::f32::consts::FRAC_PI_4,
            near: 0.3,
            far: 1000.0,
            projection: Projection::Perspective,
            background: Vec4::new(0.19, 0.30, 0.47, 0.0),
            clear_flags: ClearFlags::Skybox,
            target_texture: None,
            culling_mask: LayerMask::EVERYTHING,
        }
    }

    /// Points the camera at `target` keeping `up` as the vertical reference.
    #[must_use]
    pub fn looking_at(mut self, position: Vec3, target: Vec3, up: Vec3) -> Self {
        self.position = position;
        let view = Mat4::look_at_rh(position, target, up);
        let (_, rotation, _) = view.inverse().to_scale_rotation_translation();
        self.rotation = rotation;
        self
    }

    /// Returns the view matrix.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }

    /// Returns the projection matrix for the given aspect ratio (width / height).
    #[must_use]
    pub fn projection_matrix(&self, aspect_ratio: f32) -> Mat4 {
        match self.projection {
            Projection::Perspective => {
                Mat4::perspective_rh(self.fov, aspect_ratio, self.near, self.far)
            }
            Projection::Orthographic { half_height } => {
                let half_width = half_height * aspect_ratio;
                Mat4::orthographic_rh(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    self.near,
                    self.far,
                )
            }
        }
    }

    /// Returns the combined view-projection matrix.
    #[must_use]
    pub fn view_projection_matrix(&self, aspect_ratio: f32) -> Mat4 {
        self.projection_matrix(aspect_ratio) * self.view_matrix()
    }

    /// Returns the camera's forward direction.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Distance from the camera plane to `point` along the forward axis.
    #[must_use]
    pub fn view_depth(&self, point: Vec3) -> f32 {
        (point - self.position).dot(self.forward())
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new("Camera")
    }
}
