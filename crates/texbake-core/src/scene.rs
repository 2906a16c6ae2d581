//! The live scene a bake reads from and temporarily mutates.

use std::path::Path;

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::error::{BakeError, Result};
use crate::light::Light;

/// Default replacement tag value for materials.
pub const DEFAULT_RENDER_TYPE: &str = "Opaque";

/// The material bound to a mesh object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Material name.
    pub name: String,
    /// Base color (linear RGB plus alpha).
    pub base_color: Vec4,
    /// Value of the material's `RenderType` tag, matched against the tags a
    /// replacement shader declares.
    pub render_type: String,
}

impl Material {
    /// Creates an opaque material with the given base color.
    #[must_use]
    pub fn new(name: impl Into<String>, base_color: Vec4) -> Self {
        Self {
            name: name.into(),
            base_color,
            render_type: DEFAULT_RENDER_TYPE.to_string(),
        }
    }

    /// Sets the render type tag.
    #[must_use]
    pub fn with_render_type(mut self, render_type: impl Into<String>) -> Self {
        self.render_type = render_type.into();
        self
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new("Default", Vec4::ONE)
    }
}

/// A triangle mesh placed in world space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshObject {
    /// Object name.
    pub name: String,
    /// Scene layer (0..32), tested against camera culling masks.
    #[serde(default)]
    pub layer: u8,
    /// Whether the object is active in the scene.
    #[serde(default = "MeshObject::default_true")]
    pub active: bool,
    /// Whether the object occludes light for shadow receivers.
    #[serde(default = "MeshObject::default_true")]
    pub casts_shadows: bool,
    /// World-space vertex positions.
    pub positions: Vec<Vec3>,
    /// Per-vertex normals. Missing normals fall back to face normals.
    #[serde(default)]
    pub normals: Vec<Vec3>,
    /// Per-vertex ambient occlusion in `[0, 1]`. Empty means unoccluded.
    #[serde(default)]
    pub occlusion: Vec<f32>,
    /// Triangle vertex indices.
    pub triangles: Vec<[u32; 3]>,
    /// Bound material.
    #[serde(default)]
    pub material: Material,
}

impl MeshObject {
    fn default_true() -> bool {
        true
    }

    /// Creates a mesh from positions and triangles.
    #[must_use]
    pub fn new(name: impl Into<String>, positions: Vec<Vec3>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            name: name.into(),
            layer: 0,
            active: true,
            casts_shadows: true,
            positions,
            normals: Vec::new(),
            occlusion: Vec::new(),
            triangles,
            material: Material::default(),
        }
    }

    /// Creates a horizontal square of side `2 * half_extent` centered at
    /// `center`, facing +Y.
    #[must_use]
    pub fn plane(name: impl Into<String>, center: Vec3, half_extent: f32) -> Self {
        let h = half_extent;
        let positions = vec![
            center + Vec3::new(-h, 0.0, -h),
            center + Vec3::new(h, 0.0, -h),
            center + Vec3::new(h, 0.0, h),
            center + Vec3::new(-h, 0.0, h),
        ];
        let mut mesh = Self::new(name, positions, vec![[0, 2, 1], [0, 3, 2]]);
        mesh.normals = vec![Vec3::Y; 4];
        mesh
    }

    /// Creates an axis-aligned square of side `2 * half_extent` centered at
    /// `center`, facing +Z.
    #[must_use]
    pub fn quad(name: impl Into<String>, center: Vec3, half_extent: f32) -> Self {
        let h = half_extent;
        let positions = vec![
            center + Vec3::new(-h, -h, 0.0),
            center + Vec3::new(h, -h, 0.0),
            center + Vec3::new(h, h, 0.0),
            center + Vec3::new(-h, h, 0.0),
        ];
        let mut mesh = Self::new(name, positions, vec![[0, 1, 2], [0, 2, 3]]);
        mesh.normals = vec![Vec3::Z; 4];
        mesh
    }

    /// Sets the layer.
    #[must_use]
    pub fn with_layer(mut self, layer: u8) -> Self {
        self.layer = layer;
        self
    }

    /// Sets the material.
    #[must_use]
    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    /// Sets per-vertex occlusion.
    #[must_use]
    pub fn with_occlusion(mut self, occlusion: Vec<f32>) -> Self {
        self.occlusion = occlusion;
        self
    }

    /// Normal at vertex `index`, or `fallback` when the mesh has none.
    #[must_use]
    pub fn normal(&self, index: usize, fallback: Vec3) -> Vec3 {
        self.normals.get(index).copied().unwrap_or(fallback)
    }

    /// Occlusion at vertex `index` (1.0 means unoccluded).
    #[must_use]
    pub fn occlusion_at(&self, index: usize) -> f32 {
        self.occlusion.get(index).copied().unwrap_or(1.0)
    }

    /// Iterates triangles as world-space vertex triples with their indices.
    pub fn triangle_vertices(&self) -> impl Iterator<Item = ([usize; 3], [Vec3; 3])> + '_ {
        self.triangles.iter().filter_map(|tri| {
            let idx = tri.map(|i| i as usize);
            let a = *self.positions.get(idx[0])?;
            let b = *self.positions.get(idx[1])?;
            let c = *self.positions.get(idx[2])?;
            Some((idx, [a, b, c]))
        })
    }
}

/// Everything a bake reads: cameras, lights in native order, and meshes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    /// Cameras, looked up by name.
    pub cameras: Vec<Camera>,
    /// Lights in the scene's native enumeration order, including inactive ones.
    pub lights: Vec<Light>,
    /// Mesh objects.
    pub objects: Vec<MeshObject>,
    /// Ambient light added to every lit surface.
    pub ambient: Vec3,
    /// Color used by [`crate::ClearFlags::Skybox`].
    pub sky_color: Vec4,
}

impl Scene {
    /// Creates an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a scene description from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Adds a camera.
    #[must_use]
    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.cameras.push(camera);
        self
    }

    /// Adds a light.
    #[must_use]
    pub fn with_light(mut self, light: Light) -> Self {
        self.lights.push(light);
        self
    }

    /// Adds a mesh object.
    #[must_use]
    pub fn with_object(mut self, object: MeshObject) -> Self {
        self.objects.push(object);
        self
    }

    /// Index of the camera named `name`.
    pub fn camera_index(&self, name: &str) -> Result<usize> {
        if name.is_empty() {
            return Err(BakeError::NoCamera);
        }
        self.cameras
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| BakeError::CameraNotFound(name.to_string()))
    }

    /// Camera named `name`.
    #[must_use]
    pub fn camera(&self, name: &str) -> Option<&Camera> {
        self.cameras.iter().find(|c| c.name == name)
    }

    /// Mutable camera named `name`.
    pub fn camera_mut(&mut self, name: &str) -> Option<&mut Camera> {
        self.cameras.iter_mut().find(|c| c.name == name)
    }

    /// Names of the lights that currently contribute to rendering.
    #[must_use]
    pub fn live_light_names(&self) -> Vec<&str> {
        self.lights
            .iter()
            .filter(|l| l.is_live())
            .map(|l| l.name.as_str())
            .collect()
    }
}
