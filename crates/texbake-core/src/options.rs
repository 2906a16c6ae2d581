//! Bake configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use glam::Vec4;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{BakeError, Result};
use crate::layer_mask::LayerMask;

/// Logical shader slots the bake resolves by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShaderSlot {
    Albedo,
    Normal,
    AmbientOcclusion,
    Alpha,
    Shadow,
    ShadowInverted,
}

impl ShaderSlot {
    /// All slots in declaration order.
    pub const ALL: [ShaderSlot; 6] = [
        ShaderSlot::Albedo,
        ShaderSlot::Normal,
        ShaderSlot::AmbientOcclusion,
        ShaderSlot::Alpha,
        ShaderSlot::Shadow,
        ShaderSlot::ShadowInverted,
    ];

    /// Default shader name for this slot.
    #[must_use]
    pub fn default_shader_name(self) -> &'static str {
        match self {
            ShaderSlot::Albedo => "Bake/Albedo",
            ShaderSlot::Normal => "Bake/Normal",
            ShaderSlot::AmbientOcclusion => "Bake/AmbientOcclusion",
            ShaderSlot::Alpha => "Bake/Alpha",
            ShaderSlot::Shadow => "Bake/ShadowReceiver",
            ShaderSlot::ShadowInverted => "Bake/ShadowReceiverInverted",
        }
    }
}

/// Shader names keyed by slot.
///
/// Deserialized tables are merged over the defaults: slots missing from the
/// JSON keep their default shader, and a slot mapped to `""` is unbound.
/// Serialization writes every slot so unbound slots survive a round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderTable(BTreeMap<ShaderSlot, String>);

impl ShaderTable {
    /// Creates an empty table; every lookup misses.
    #[must_use]
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Shader name bound to `slot`.
    #[must_use]
    pub fn get(&self, slot: ShaderSlot) -> Option<&str> {
        self.0.get(&slot).map(String::as_str)
    }

    /// Binds `slot` to `name`.
    pub fn set(&mut self, slot: ShaderSlot, name: impl Into<String>) {
        self.0.insert(slot, name.into());
    }

    /// Unbinds `slot`.
    pub fn remove(&mut self, slot: ShaderSlot) {
        self.0.remove(&slot);
    }
}

impl Default for ShaderTable {
    fn default() -> Self {
        Self(
            ShaderSlot::ALL
                .iter()
                .map(|&slot| (slot, slot.default_shader_name().to_string()))
                .collect(),
        )
    }
}

impl Serialize for ShaderTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(ShaderSlot::ALL.len()))?;
        for slot in ShaderSlot::ALL {
            map.serialize_entry(&slot, self.get(slot).unwrap_or(""))?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ShaderTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let overrides = BTreeMap::<ShaderSlot, String>::deserialize(deserializer)?;
        let mut table = Self::default();
        for (slot, name) in overrides {
            if name.is_empty() {
                table.remove(slot);
            } else {
                table.set(slot, name);
            }
        }
        Ok(table)
    }
}

/// Per-pass enable flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct PassToggles {
    pub depth: bool,
    pub albedo: bool,
    pub ambient_occlusion: bool,
    pub alpha: bool,
    pub normal: bool,
    pub shaded: bool,
    pub shadow: bool,
}

impl Default for PassToggles {
    fn default() -> Self {
        Self {
            depth: true,
            albedo: true,
            ambient_occlusion: true,
            alpha: true,
            normal: true,
            shaded: true,
            shadow: true,
        }
    }
}

impl PassToggles {
    /// All passes disabled.
    #[must_use]
    pub fn none() -> Self {
        Self {
            depth: false,
            albedo: false,
            ambient_occlusion: false,
            alpha: false,
            normal: false,
            shaded: false,
            shadow: false,
        }
    }
}

/// Configuration for one bake invocation. Read-only to the bake.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BakeOptions {
    /// Output width in pixels.
    pub output_width: u32,
    /// Output height in pixels.
    pub output_height: u32,
    /// Folder receiving the baked images.
    pub output_folder: PathBuf,
    /// Layers rendered by the material passes.
    pub common_render_mask: LayerMask,
    /// Layers rendered by the shadow passes.
    pub shadow_receiver_mask: LayerMask,
    /// Shader names per slot.
    pub shaders: ShaderTable,
    /// Which passes run.
    pub passes: PassToggles,
    /// Near clip plane used by the shadow passes.
    pub shadow_near_clip: f32,
    /// Use the inverted shadow receiver shader.
    pub invert_shadow_color: bool,
    /// File extension for the depth pass.
    pub depth_extension: String,
    /// File extension for every color pass.
    pub color_extension: String,
    /// Background color the camera clears to during the bake.
    pub clear_color: Vec4,
    /// Material tag a replacement shader is matched on.
    pub replacement_tag: String,
    /// Extra shader-override passes, by shader name.
    pub custom_shaders: Vec<String>,
}

impl Default for BakeOptions {
    fn default() -> Self {
        Self {
            output_width: 1024,
            output_height: 1024,
            output_folder: PathBuf::from("RenderedSprites"),
            common_render_mask: LayerMask::EVERYTHING,
            shadow_receiver_mask: LayerMask::EVERYTHING,
            shaders: ShaderTable::default(),
            passes: PassToggles::default(),
            shadow_near_clip: 0.01,
            invert_shadow_color: false,
            depth_extension: "exr".to_string(),
            color_extension: "png".to_string(),
            clear_color: Vec4::ZERO,
            replacement_tag: "RenderType".to_string(),
            custom_shaders: Vec::new(),
        }
    }
}

impl BakeOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads options from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Sets the output resolution.
    #[must_use]
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.output_width = width;
        self.output_height = height;
        self
    }

    /// Sets the output folder.
    #[must_use]
    pub fn with_output_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.output_folder = folder.into();
        self
    }

    /// Sets the pass toggles.
    #[must_use]
    pub fn with_passes(mut self, passes: PassToggles) -> Self {
        self.passes = passes;
        self
    }

    /// Sets the culling masks for material and shadow passes.
    #[must_use]
    pub fn with_masks(mut self, common: LayerMask, shadow_receiver: LayerMask) -> Self {
        self.common_render_mask = common;
        self.shadow_receiver_mask = shadow_receiver;
        self
    }

    /// Sets the shader table.
    #[must_use]
    pub fn with_shaders(mut self, shaders: ShaderTable) -> Self {
        self.shaders = shaders;
        self
    }

    /// Sets the depth and color file extensions.
    #[must_use]
    pub fn with_extensions(mut self, depth: impl Into<String>, color: impl Into<String>) -> Self {
        self.depth_extension = depth.into();
        self.color_extension = color.into();
        self
    }

    /// Checks the options for configuration errors.
    pub fn validate(&self) -> Result<()> {
        if self.output_width == 0 || self.output_height == 0 {
            return Err(BakeError::InvalidResolution {
                width: self.output_width,
                height: self.output_height,
            });
        }
        Ok(())
    }
}
