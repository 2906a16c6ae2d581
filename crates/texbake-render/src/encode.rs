//! Encoding captured framebuffers into image files.
//!
//! The encoding is chosen from the destination file extension:
//! `.exr` writes 32-bit float RGBA through a temporary float target,
//! `.tga` and `.jpg`/`.jpeg` write from the 8-bit capture, and anything
//! else writes 8-bit RGBA PNG.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};
use texbake_core::TargetId;

use crate::capture::{capture, PixelBuffer, PixelFormat};
use crate::device::RenderDevice;
use crate::error::{RenderError, RenderResult};
use crate::target::{ScopedTargets, TargetDescriptor, TextureFormat};

/// Output encoding selected from a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// OpenEXR, 32-bit float RGBA.
    Exr,
    /// PNG, 8-bit RGBA.
    Png,
    /// Truevision TGA, 8-bit RGBA.
    Tga,
    /// JPEG, 8-bit RGB.
    Jpeg,
}

impl Encoding {
    /// Selects the encoding for `path`'s extension; unknown or missing
    /// extensions encode as PNG.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "exr" => Encoding::Exr,
            "tga" => Encoding::Tga,
            "jpg" | "jpeg" => Encoding::Jpeg,
            _ => Encoding::Png,
        }
    }

    /// Pixel layout the capture must be read in.
    #[must_use]
    pub fn pixel_format(self) -> PixelFormat {
        match self {
            Encoding::Exr => PixelFormat::Rgba32F,
            Encoding::Png | Encoding::Tga | Encoding::Jpeg => PixelFormat::Rgba8,
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            Encoding::Exr => ImageFormat::OpenExr,
            Encoding::Png => ImageFormat::Png,
            Encoding::Tga => ImageFormat::Tga,
            Encoding::Jpeg => ImageFormat::Jpeg,
        }
    }
}

/// Encoded image bytes and their destination. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    path: PathBuf,
    encoding: Encoding,
    bytes: Vec<u8>,
}

impl EncodedImage {
    /// Destination path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Encoding used.
    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Encoded file contents.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the image, returning its path and bytes.
    #[must_use]
    pub fn into_parts(self) -> (PathBuf, Vec<u8>) {
        (self.path, self.bytes)
    }
}

/// Encodes a pixel buffer with `encoding`.
///
/// EXR requires float pixels; the 8-bit encodings require 8-bit pixels.
pub fn encode_pixels(pixels: &PixelBuffer, encoding: Encoding) -> RenderResult<Vec<u8>> {
    let image = match (pixels, encoding) {
        (PixelBuffer::Rgba32F { width, height, data }, Encoding::Exr) => {
            let buffer: ImageBuffer<Rgba<f32>, Vec<f32>> =
                ImageBuffer::from_raw(*width, *height, data.clone())
                    .ok_or(RenderError::InvalidImageData)?;
            DynamicImage::ImageRgba32F(buffer)
        }
        (PixelBuffer::Rgba8 { width, height, data }, Encoding::Jpeg) => {
            let buffer: ImageBuffer<Rgba<u8>, Vec<u8>> =
                ImageBuffer::from_raw(*width, *height, data.clone())
                    .ok_or(RenderError::InvalidImageData)?;
            // JPEG has no alpha channel
            DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(buffer).to_rgb8())
        }
        (PixelBuffer::Rgba8 { width, height, data }, Encoding::Png | Encoding::Tga) => {
            let buffer: ImageBuffer<Rgba<u8>, Vec<u8>> =
                ImageBuffer::from_raw(*width, *height, data.clone())
                    .ok_or(RenderError::InvalidImageData)?;
            DynamicImage::ImageRgba8(buffer)
        }
        _ => return Err(RenderError::InvalidImageData),
    };

    let mut cursor = Cursor::new(Vec::new());
    image.write_to(&mut cursor, encoding.image_format())?;
    Ok(cursor.into_inner())
}

/// Captures `target` and encodes it for `path`.
///
/// For EXR an 8-bit target is first blitted into a temporary float target,
/// which is destroyed before returning; `target` itself is never replaced.
/// Float targets are read back directly.
pub fn encode_target<D: RenderDevice + ?Sized>(
    device: &mut D,
    target: TargetId,
    width: u32,
    height: u32,
    path: impl Into<PathBuf>,
) -> RenderResult<EncodedImage> {
    let path = path.into();
    let encoding = Encoding::from_path(&path);

    let pixels = match encoding {
        Encoding::Exr
            if device
                .target_descriptor(target)
                .is_some_and(|desc| desc.format.is_float()) =>
        {
            capture(device, target, width, height, PixelFormat::Rgba32F)?
        }
        Encoding::Exr => {
            let mut scope = ScopedTargets::new(device);
            let float_target = scope.create(
                &TargetDescriptor::color("float conversion target", width, height)
                    .with_format(TextureFormat::Rgba32Float),
            )?;
            scope.blit(target, float_target)?;
            capture(&mut *scope, float_target, width, height, PixelFormat::Rgba32F)?
        }
        Encoding::Png | Encoding::Tga | Encoding::Jpeg => {
            capture(device, target, width, height, encoding.pixel_format())?
        }
    };

    let bytes = encode_pixels(&pixels, encoding)?;
    log::debug!(
        "encoded {}x{} capture as {encoding:?} ({} bytes)",
        width,
        height,
        bytes.len()
    );
    Ok(EncodedImage {
        path,
        encoding,
        bytes,
    })
}
