//! Per-target pixel and depth storage for the software device.

use glam::Vec4;

use crate::target::{TargetDescriptor, TextureFormat};

/// CPU storage for one render target: a color plane plus a depth buffer.
#[derive(Debug, Clone)]
pub(crate) struct Texture {
    pub(crate) desc: TargetDescriptor,
    color: Vec<Vec4>,
    depth: Vec<f32>,
}

impl Texture {
    pub(crate) fn new(desc: TargetDescriptor) -> Self {
        let len = desc.width as usize * desc.height as usize;
        Self {
            desc,
            color: vec![Vec4::ZERO; len],
            depth: vec![f32::INFINITY; len],
        }
    }

    pub(crate) fn width(&self) -> u32 {
        self.desc.width
    }

    pub(crate) fn height(&self) -> u32 {
        self.desc.height
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.desc.width as usize + x as usize
    }

    pub(crate) fn fill(&mut self, color: Vec4) {
        let stored = convert(self.desc.format, color);
        self.color.fill(stored);
    }

    pub(crate) fn clear_depth(&mut self) {
        self.depth.fill(f32::INFINITY);
    }

    /// Writes `color` at `(x, y)` if `depth` passes the depth test.
    pub(crate) fn write_tested(&mut self, x: u32, y: u32, depth: f32, color: Vec4) -> bool {
        let i = self.index(x, y);
        if depth >= self.depth[i] {
            return false;
        }
        self.depth[i] = depth;
        self.color[i] = convert(self.desc.format, color);
        true
    }

    pub(crate) fn depth_at(&self, x: u32, y: u32) -> f32 {
        self.depth[self.index(x, y)]
    }

    pub(crate) fn get(&self, x: u32, y: u32) -> Vec4 {
        self.color[self.index(x, y)]
    }

    pub(crate) fn pixels(&self) -> &[Vec4] {
        &self.color
    }

    /// Overwrites every pixel, converting into this texture's format.
    pub(crate) fn copy_from(&mut self, pixels: &[Vec4]) {
        let format = self.desc.format;
        for (dst, src) in self.color.iter_mut().zip(pixels) {
            *dst = convert(format, *src);
        }
    }
}

/// Converts a color to what `format` can hold.
fn convert(format: TextureFormat, color: Vec4) -> Vec4 {
    match format {
        TextureFormat::Rgba8Unorm => Vec4::from_array(quantize(color).map(|c| f32::from(c) / 255.0)),
        TextureFormat::Rgba32Float => color,
        TextureFormat::R32Float => Vec4::new(color.x, color.x, color.x, 1.0),
    }
}

/// Quantizes a color to 8 bits per channel.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn quantize(color: Vec4) -> [u8; 4] {
    color
        .to_array()
        .map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}
