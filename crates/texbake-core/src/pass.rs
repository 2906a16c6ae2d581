//! The bake pass table.
//!
//! Every pass is data: a [`PassKind`] plus the camera settings it renders
//! with. Adding a pass means adding an entry to [`schedule`], not a new code
//! path in the orchestrator.

use std::path::{Path, PathBuf};

use crate::layer_mask::LayerMask;
use crate::options::{BakeOptions, ShaderSlot};

/// Label used when a pass renders with the bound materials.
pub const DEFAULT_SHADER_LABEL: &str = "Default";

/// Reference to the shader a pass overrides with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderRef {
    /// Resolved through the shader table.
    Slot(ShaderSlot),
    /// Resolved by shader name directly.
    Named(String),
}

impl ShaderRef {
    /// Shader name this reference resolves to under `options`, if any.
    #[must_use]
    pub fn shader_name<'a>(&'a self, options: &'a BakeOptions) -> Option<&'a str> {
        match self {
            ShaderRef::Slot(slot) => options.shaders.get(*slot),
            ShaderRef::Named(name) => Some(name.as_str()),
        }
    }

    /// Human-readable description for logs.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            ShaderRef::Slot(slot) => format!("{slot:?} slot"),
            ShaderRef::Named(name) => format!("shader '{name}'"),
        }
    }
}

/// Kind of per-light pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PerLightKind {
    /// Bound materials lit by one light at a time.
    Shaded,
    /// Shadow receiver shader, one light at a time.
    Shadow(ShaderRef),
}

/// What a pass renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassKind {
    /// Depth-only render into a floating-point target.
    Depth,
    /// One render with every material substituted by the given shader.
    ShaderOverride(ShaderRef),
    /// One render per isolated light.
    PerLight(PerLightKind),
}

/// A scheduled bake pass. Immutable once scheduled.
#[derive(Debug, Clone, PartialEq)]
pub struct PassSpec {
    /// What to render.
    pub kind: PassKind,
    /// Output name suffix.
    pub label: String,
    /// Camera culling mask for this pass.
    pub culling_mask: LayerMask,
    /// Near clip plane override.
    pub near_clip: Option<f32>,
    /// Output file extension, which also selects the encoding.
    pub extension: String,
}

impl PassSpec {
    /// Shader this pass overrides with, or `None` for bound materials.
    #[must_use]
    pub fn shader(&self) -> Option<&ShaderRef> {
        match &self.kind {
            PassKind::ShaderOverride(shader) | PassKind::PerLight(PerLightKind::Shadow(shader)) => {
                Some(shader)
            }
            PassKind::Depth | PassKind::PerLight(PerLightKind::Shaded) => None,
        }
    }

    /// Whether the pass produces one output per isolated light.
    #[must_use]
    pub fn is_per_light(&self) -> bool {
        matches!(self.kind, PassKind::PerLight(_))
    }

    /// Output path `{folder}/{camera}_{label}[_{light}].{ext}`.
    #[must_use]
    pub fn output_path(&self, folder: &Path, camera: &str, light: Option<&str>) -> PathBuf {
        let stem = match light {
            Some(light) => format!("{camera}_{}_{light}", self.label),
            None => format!("{camera}_{}", self.label),
        };
        folder.join(format!("{stem}.{}", self.extension))
    }
}

/// Label for a pass overriding with `shader_name`: path separators become
/// underscores so the label is a single file name component.
#[must_use]
pub fn shader_label(shader_name: Option<&str>) -> String {
    match shader_name {
        Some(name) if !name.is_empty() => name.replace('/', "_"),
        _ => DEFAULT_SHADER_LABEL.to_string(),
    }
}

/// Builds the pass schedule for `options`, in execution order.
///
/// Depth, albedo, ambient occlusion, alpha, and normal come first, followed
/// by any custom override passes, then the shaded and shadow per-light
/// groups. Only the shadow group overrides the near clip plane.
#[must_use]
pub fn schedule(options: &BakeOptions) -> Vec<PassSpec> {
    let toggles = &options.passes;
    let common = options.common_render_mask;
    let color = |kind: PassKind, label: &str| PassSpec {
        kind,
        label: label.to_string(),
        culling_mask: common,
        near_clip: None,
        extension: options.color_extension.clone(),
    };

    let mut passes = Vec::new();
    if toggles.depth {
        passes.push(PassSpec {
            kind: PassKind::Depth,
            label: "Depth".to_string(),
            culling_mask: common,
            near_clip: None,
            extension: options.depth_extension.clone(),
        });
    }
    let overrides = [
        (toggles.albedo, ShaderSlot::Albedo, "Albedo"),
        (toggles.ambient_occlusion, ShaderSlot::AmbientOcclusion, "AO"),
        (toggles.alpha, ShaderSlot::Alpha, "Alpha"),
        (toggles.normal, ShaderSlot::Normal, "Normal"),
    ];
    for (enabled, slot, label) in overrides {
        if enabled {
            passes.push(color(PassKind::ShaderOverride(ShaderRef::Slot(slot)), label));
        }
    }
    for name in &options.custom_shaders {
        passes.push(color(
            PassKind::ShaderOverride(ShaderRef::Named(name.clone())),
            &shader_label(Some(name)),
        ));
    }
    if toggles.shaded {
        passes.push(color(PassKind::PerLight(PerLightKind::Shaded), "Shaded"));
    }
    if toggles.shadow {
        let slot = if options.invert_shadow_color {
            ShaderSlot::ShadowInverted
        } else {
            ShaderSlot::Shadow
        };
        passes.push(PassSpec {
            kind: PassKind::PerLight(PerLightKind::Shadow(ShaderRef::Slot(slot))),
            label: "Shadow".to_string(),
            culling_mask: options.shadow_receiver_mask,
            near_clip: Some(options.shadow_near_clip),
            extension: options.color_extension.clone(),
        });
    }
    passes
}
