//! Framebuffer readback into CPU memory.

use texbake_core::TargetId;

use crate::device::RenderDevice;
use crate::error::{RenderError, RenderResult};

/// Layout of pixels read back from a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8 bits per channel RGBA.
    Rgba8,
    /// 32-bit float RGBA.
    Rgba32F,
}

/// A rectangle of pixels to read, origin at the top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ReadRect {
    /// The full `width × height` region at the origin.
    #[must_use]
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

/// Pixels read back from a target, row-major from the top-left.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelBuffer {
    Rgba8 {
        width: u32,
        height: u32,
        data: Vec<u8>,
    },
    Rgba32F {
        width: u32,
        height: u32,
        data: Vec<f32>,
    },
}

impl PixelBuffer {
    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        match self {
            PixelBuffer::Rgba8 { width, .. } | PixelBuffer::Rgba32F { width, .. } => *width,
        }
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        match self {
            PixelBuffer::Rgba8 { height, .. } | PixelBuffer::Rgba32F { height, .. } => *height,
        }
    }

    /// Format of the stored pixels.
    #[must_use]
    pub fn format(&self) -> PixelFormat {
        match self {
            PixelBuffer::Rgba8 { .. } => PixelFormat::Rgba8,
            PixelBuffer::Rgba32F { .. } => PixelFormat::Rgba32F,
        }
    }

    /// RGBA of the pixel at `(x, y)`, normalized to `[0, 1]` for 8-bit data.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let offset = ((y * self.width() + x) * 4) as usize;
        match self {
            PixelBuffer::Rgba8 { data, .. } => {
                let px = data.get(offset..offset + 4)?;
                Some(px_to_f32([px[0], px[1], px[2], px[3]]))
            }
            PixelBuffer::Rgba32F { data, .. } => {
                let px = data.get(offset..offset + 4)?;
                Some([px[0], px[1], px[2], px[3]])
            }
        }
    }
}

fn px_to_f32(px: [u8; 4]) -> [f32; 4] {
    px.map(|c| f32::from(c) / 255.0)
}

/// Binds a target as the readback source and unbinds it on drop.
struct ActiveTargetBinding<'d, D: RenderDevice + ?Sized> {
    device: &'d mut D,
}

impl<'d, D: RenderDevice + ?Sized> ActiveTargetBinding<'d, D> {
    fn bind(device: &'d mut D, target: TargetId) -> Self {
        device.set_active_target(Some(target));
        Self { device }
    }
}

impl<D: RenderDevice + ?Sized> Drop for ActiveTargetBinding<'_, D> {
    fn drop(&mut self) {
        self.device.set_active_target(None);
    }
}

/// Reads the full `width × height` region of `target` at the origin.
///
/// The target is bound as the active readback source for the duration of
/// the read; no active binding remains afterward.
pub fn capture<D: RenderDevice + ?Sized>(
    device: &mut D,
    target: TargetId,
    width: u32,
    height: u32,
    format: PixelFormat,
) -> RenderResult<PixelBuffer> {
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidTargetSize { width, height });
    }
    let binding = ActiveTargetBinding::bind(device, target);
    binding
        .device
        .read_pixels(ReadRect::full(width, height), format)
}
