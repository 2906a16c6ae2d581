//! Offscreen render targets and their scoped ownership.

use std::ops::{Deref, DerefMut};

use texbake_core::TargetId;

use crate::device::RenderDevice;
use crate::error::{RenderError, RenderResult};

/// Pixel storage format of a render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureFormat {
    /// 8 bits per channel RGBA.
    #[default]
    Rgba8Unorm,
    /// 32-bit float RGBA.
    Rgba32Float,
    /// Single 32-bit float channel, used for depth.
    R32Float,
}

impl TextureFormat {
    /// Whether the format stores floating-point values.
    #[must_use]
    pub fn is_float(self) -> bool {
        matches!(self, TextureFormat::Rgba32Float | TextureFormat::R32Float)
    }
}

/// Describes a render target to allocate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDescriptor {
    /// Debug label.
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    /// Depth buffer precision in bits (0 for none).
    pub depth_bits: u32,
}

impl TargetDescriptor {
    /// A color target with a 24-bit depth buffer.
    #[must_use]
    pub fn color(label: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            label: label.into(),
            width,
            height,
            format: TextureFormat::Rgba8Unorm,
            depth_bits: 24,
        }
    }

    /// A single-channel float target for depth output.
    #[must_use]
    pub fn depth(label: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            label: label.into(),
            width,
            height,
            format: TextureFormat::R32Float,
            depth_bits: 24,
        }
    }

    /// Sets the format.
    #[must_use]
    pub fn with_format(mut self, format: TextureFormat) -> Self {
        self.format = format;
        self
    }

    /// Checks the descriptor has a positive size.
    pub fn validate(&self) -> RenderResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidTargetSize {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// Borrows a device and owns the targets created through it.
///
/// Every target created with [`ScopedTargets::create`] is destroyed when the
/// scope drops, on success, error, or unwind. The scope dereferences to the
/// device so it can be used for rendering in between.
pub struct ScopedTargets<'d, D: RenderDevice + ?Sized> {
    device: &'d mut D,
    owned: Vec<TargetId>,
}

impl<'d, D: RenderDevice + ?Sized> ScopedTargets<'d, D> {
    /// Opens a scope over `device`.
    pub fn new(device: &'d mut D) -> Self {
        Self {
            device,
            owned: Vec::new(),
        }
    }

    /// Allocates a target owned by this scope.
    pub fn create(&mut self, desc: &TargetDescriptor) -> RenderResult<TargetId> {
        desc.validate()?;
        let id = self.device.create_target(desc)?;
        log::trace!("allocated target '{}' as {id:?}", desc.label);
        self.owned.push(id);
        Ok(id)
    }

    /// Destroys one owned target before the scope ends.
    pub fn release(&mut self, id: TargetId) {
        if let Some(pos) = self.owned.iter().position(|&owned| owned == id) {
            self.owned.swap_remove(pos);
            self.device.destroy_target(id);
        }
    }

    /// Targets this scope currently owns.
    #[must_use]
    pub fn owned(&self) -> &[TargetId] {
        &self.owned
    }
}

impl<D: RenderDevice + ?Sized> Deref for ScopedTargets<'_, D> {
    type Target = D;

    fn deref(&self) -> &D {
        &*self.device
    }
}

impl<D: RenderDevice + ?Sized> DerefMut for ScopedTargets<'_, D> {
    fn deref_mut(&mut self) -> &mut D {
        &mut *self.device
    }
}

impl<D: RenderDevice + ?Sized> Drop for ScopedTargets<'_, D> {
    fn drop(&mut self) {
        for id in self.owned.drain(..).rev() {
            if self.device.active_target() == Some(id) {
                self.device.set_active_target(None);
            }
            self.device.destroy_target(id);
            log::trace!("destroyed target {id:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SoftwareDevice;

    #[test]
    fn test_scope_destroys_targets() {
        let mut device = SoftwareDevice::new();
        {
            let mut scope = ScopedTargets::new(&mut device);
            scope.create(&TargetDescriptor::color("a", 4, 4)).unwrap();
            scope.create(&TargetDescriptor::depth("b", 4, 4)).unwrap();
            assert_eq!(scope.allocated_targets(), 2);
        }
        assert_eq!(device.allocated_targets(), 0);
    }

    #[test]
    fn test_scope_release_early() {
        let mut device = SoftwareDevice::new();
        let mut scope = ScopedTargets::new(&mut device);
        let id = scope.create(&TargetDescriptor::color("a", 2, 2)).unwrap();
        scope.release(id);
        assert!(scope.owned().is_empty());
        assert_eq!(scope.allocated_targets(), 0);
    }

    #[test]
    fn test_zero_sized_target_rejected() {
        let mut device = SoftwareDevice::new();
        let mut scope = ScopedTargets::new(&mut device);
        let err = scope.create(&TargetDescriptor::color("a", 0, 8)).unwrap_err();
        assert!(matches!(err, RenderError::InvalidTargetSize { width: 0, height: 8 }));
        assert!(scope.owned().is_empty());
    }

    #[test]
    fn test_scope_clears_stale_active_binding() {
        let mut device = SoftwareDevice::new();
        {
            let mut scope = ScopedTargets::new(&mut device);
            let id = scope.create(&TargetDescriptor::color("a", 2, 2)).unwrap();
            scope.set_active_target(Some(id));
        }
        assert_eq!(device.active_target(), None);
    }

    #[test]
    fn test_float_formats() {
        assert!(TextureFormat::R32Float.is_float());
        assert!(TextureFormat::Rgba32Float.is_float());
        assert!(!TextureFormat::Rgba8Unorm.is_float());
    }
}
