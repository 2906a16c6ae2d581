//! Scoped replacement-shader binding.
//!
//! A replacement shader must affect exactly one render call. [`ShaderOverride`]
//! binds it on creation and unbinds it on drop, so a later, unrelated render
//! always sees the bound materials again.

use std::ops::{Deref, DerefMut};

use crate::device::{RenderDevice, Replacement, ShaderHandle};

/// Holds a replacement shader bound on a device until dropped.
pub struct ShaderOverride<'d, D: RenderDevice + ?Sized> {
    device: &'d mut D,
    previous: Option<Replacement>,
}

impl<'d, D: RenderDevice + ?Sized> ShaderOverride<'d, D> {
    /// Binds `shader` (or clears any binding when `None`) matched on `tag`.
    pub fn bind(device: &'d mut D, shader: Option<ShaderHandle>, tag: &str) -> Self {
        let previous = device.replacement().cloned();
        device.set_replacement(shader.map(|shader| Replacement {
            shader,
            tag: tag.to_string(),
        }));
        Self { device, previous }
    }
}

impl<D: RenderDevice + ?Sized> Deref for ShaderOverride<'_, D> {
    type Target = D;

    fn deref(&self) -> &D {
        &*self.device
    }
}

impl<D: RenderDevice + ?Sized> DerefMut for ShaderOverride<'_, D> {
    fn deref_mut(&mut self) -> &mut D {
        &mut *self.device
    }
}

impl<D: RenderDevice + ?Sized> Drop for ShaderOverride<'_, D> {
    fn drop(&mut self) {
        self.device.set_replacement(self.previous.take());
    }
}

/// Runs `f` with `shader` bound as the replacement shader, then unbinds it.
pub fn with_shader_override<D, R, F>(
    device: &mut D,
    shader: Option<ShaderHandle>,
    tag: &str,
    f: F,
) -> R
where
    D: RenderDevice + ?Sized,
    F: FnOnce(&mut D) -> R,
{
    let mut binding = ShaderOverride::bind(device, shader, tag);
    f(&mut *binding)
}
